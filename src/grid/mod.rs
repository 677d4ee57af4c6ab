//! Implements the rank-local element grid, the subdomain and the property store

mod element_grid;
mod index;
mod property_store;
mod samples;
mod subdomain;
pub use crate::grid::element_grid::*;
pub use crate::grid::index::*;
pub use crate::grid::property_store::*;
pub use crate::grid::samples::*;
pub use crate::grid::subdomain::*;
