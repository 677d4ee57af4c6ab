//! Explicit multi-component, multi-phase Darcy flow solver for basin modelling
//!
//! The solver transports hydrocarbon components through the rock volume of a basin
//! over one pressure/temperature time-step, sub-stepping with an adaptive explicit
//! Euler scheme. Grid geometry, constitutive laws, the PVT flash and the chemistry
//! source terms are supplied through the traits in [grid] and [model].

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod darcy;
pub mod grid;
pub mod interp;
pub mod model;
pub mod prelude;
