//! Implements the constitutive laws and the chemistry/PVT collaborators

mod adsorption;
mod capillary;
mod compaction;
mod otgc;
mod pvt_flash;
mod relative_permeability;
mod source_term;
pub use crate::model::adsorption::*;
pub use crate::model::capillary::*;
pub use crate::model::compaction::*;
pub use crate::model::otgc::*;
pub use crate::model::pvt_flash::*;
pub use crate::model::relative_permeability::*;
pub use crate::model::source_term::*;
