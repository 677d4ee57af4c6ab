use crate::base::PvtComponents;
use crate::grid::{GlobalIndex, SubdomainElement};
use std::collections::HashMap;

/// Defines the chemistry collaborator supplying the expelled hydrocarbons
pub trait SourceTermProvider {
    /// Returns the mass (kg) of each component that would be expelled into a source-rock
    /// element over the whole time-step at the expulsion rate reached at λ
    fn expulsion(&self, element: &SubdomainElement, lambda: f64) -> PvtComponents;
}

/// Implements a provider that expels nothing
pub struct NoExpulsion;

impl SourceTermProvider for NoExpulsion {
    fn expulsion(&self, _element: &SubdomainElement, _lambda: f64) -> PvtComponents {
        PvtComponents::new()
    }
}

/// Implements a provider with a constant expulsion rate
///
/// All source-rock elements expel `masses` per time-step unless an element-specific value is given.
pub struct ConstantExpulsion {
    masses: PvtComponents,
    elements: HashMap<GlobalIndex, PvtComponents>,
}

impl ConstantExpulsion {
    /// Allocates a new instance
    pub fn new(masses: PvtComponents) -> Self {
        ConstantExpulsion {
            masses,
            elements: HashMap::new(),
        }
    }

    /// Sets the expelled masses of one element
    pub fn set_element(&mut self, index: GlobalIndex, masses: PvtComponents) -> &mut Self {
        self.elements.insert(index, masses);
        self
    }
}

impl SourceTermProvider for ConstantExpulsion {
    fn expulsion(&self, element: &SubdomainElement, _lambda: f64) -> PvtComponents {
        *self.elements.get(&element.index).unwrap_or(&self.masses)
    }
}

/// Implements a provider whose expulsion rate varies linearly over the time-step
pub struct LinearExpulsion {
    start: PvtComponents,
    end: PvtComponents,
}

impl LinearExpulsion {
    /// Allocates a new instance given the rates (as masses per time-step) at λ = 0 and λ = 1
    pub fn new(start: PvtComponents, end: PvtComponents) -> Self {
        LinearExpulsion { start, end }
    }
}

impl SourceTermProvider for LinearExpulsion {
    fn expulsion(&self, _element: &SubdomainElement, lambda: f64) -> PvtComponents {
        self.start * (1.0 - lambda) + self.end * lambda
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
