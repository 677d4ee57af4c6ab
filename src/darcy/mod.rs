//! Implements the explicit multi-component Darcy flow solver

mod darcy_calculations;
mod explicit_flow_solver;
mod flow_state;
mod statistics;
pub use crate::darcy::darcy_calculations::*;
pub use crate::darcy::explicit_flow_solver::*;
pub use crate::darcy::flow_state::*;
pub use crate::darcy::statistics::*;
