//! Makes available common structures needed to run a Darcy flow simulation
//!
//! You may write `use darcysim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{ComponentId, FlowConfig, FundamentalProperty, PhaseId, PvtComponents, Saturation, TimeLevel};
pub use crate::base::{ParamAdsorption, ParamCapillary, ParamLithology, ParamRelPerm, SampleParams};
pub use crate::base::{DEFAULT_OUT_DIR, DEFAULT_TEST_DIR, NUM_COMPONENTS};
pub use crate::darcy::{DarcyErrorIndicator, ExplicitFlowSolver, FlowState, FlowStatistics};
pub use crate::grid::{Formation, GlobalIndex, PropertyStore, PropertyTable, SampleSubdomains, Subdomain};
pub use crate::model::{
    AdsorptionRegistry, ConstantExpulsion, NoExpulsion, PvtFlash, SinglePhaseFlash, SourceTermProvider, WilsonFlash,
};
