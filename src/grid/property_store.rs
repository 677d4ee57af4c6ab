use super::{GlobalIndex, SubdomainElement};
use crate::base::{FundamentalProperty, TimeLevel};
use std::collections::{HashMap, HashSet};
use std::ops::Deref;

/// Defines the constitutive-law provider supplying the fundamental properties
pub trait PropertyProvider {
    /// Returns the value of a property of an element at the start or end of the time-step
    fn value(&self, element: &SubdomainElement, property: FundamentalProperty, level: TimeLevel) -> f64;
}

/// Holds the fundamental properties of a subdomain and their activation state
///
/// Property values may only be accessed while the property is activated.
pub struct PropertyStore {
    provider: Box<dyn PropertyProvider>,
    activated: HashSet<FundamentalProperty>,
}

/// Keeps a set of properties activated while alive
///
/// Dropping the guard deactivates exactly the properties that were not
/// activated when the guard was created.
pub struct ActivatedProperties<'a> {
    store: &'a mut PropertyStore,
    newly_activated: Vec<FundamentalProperty>,
}

impl PropertyStore {
    /// Allocates a new instance with no activated property
    pub fn new(provider: Box<dyn PropertyProvider>) -> Self {
        PropertyStore {
            provider,
            activated: HashSet::new(),
        }
    }

    /// Returns true if the property is activated
    pub fn is_activated(&self, property: FundamentalProperty) -> bool {
        self.activated.contains(&property)
    }

    /// Activates a property permanently (until [PropertyStore::deactivate] is called)
    pub fn activate_permanently(&mut self, property: FundamentalProperty) {
        self.activated.insert(property);
    }

    /// Deactivates a property
    pub fn deactivate(&mut self, property: FundamentalProperty) {
        self.activated.remove(&property);
    }

    /// Activates the properties for the lifetime of the returned guard
    pub fn activate(&mut self, properties: &[FundamentalProperty]) -> ActivatedProperties<'_> {
        let mut newly_activated = Vec::new();
        for property in properties {
            if self.activated.insert(*property) {
                newly_activated.push(*property);
            }
        }
        ActivatedProperties {
            store: self,
            newly_activated,
        }
    }

    /// Returns the value of a property at the start of the time-step
    pub fn compute_previous_property(&self, element: &SubdomainElement, property: FundamentalProperty) -> f64 {
        debug_assert!(self.is_activated(property), "property {} is not activated", property.name());
        self.provider.value(element, property, TimeLevel::Previous)
    }

    /// Returns the value of a property at the end of the time-step
    pub fn compute_property(&self, element: &SubdomainElement, property: FundamentalProperty) -> f64 {
        debug_assert!(self.is_activated(property), "property {} is not activated", property.name());
        self.provider.value(element, property, TimeLevel::Current)
    }
}

impl<'a> ActivatedProperties<'a> {
    /// Returns the properties activated by this guard
    pub fn newly_activated(&self) -> &[FundamentalProperty] {
        &self.newly_activated
    }
}

impl<'a> Deref for ActivatedProperties<'a> {
    type Target = PropertyStore;
    fn deref(&self) -> &PropertyStore {
        &*self.store
    }
}

impl<'a> Drop for ActivatedProperties<'a> {
    fn drop(&mut self) {
        for property in &self.newly_activated {
            self.store.activated.remove(property);
        }
    }
}

/// Implements an in-memory constitutive-law provider
///
/// Values are looked up per element first, then per k-layer, then from the uniform defaults.
#[derive(Clone, Debug, Default)]
pub struct PropertyTable {
    defaults: HashMap<FundamentalProperty, (f64, f64)>,
    layers: HashMap<(usize, FundamentalProperty), (f64, f64)>,
    elements: HashMap<(GlobalIndex, FundamentalProperty), (f64, f64)>,
}

impl PropertyTable {
    /// Allocates a new instance with all properties equal to zero
    pub fn new() -> Self {
        PropertyTable::default()
    }

    /// Sets the value of a property for all elements
    pub fn set_uniform(&mut self, property: FundamentalProperty, previous: f64, current: f64) -> &mut Self {
        self.defaults.insert(property, (previous, current));
        self
    }

    /// Sets the value of a property for all elements of a k-layer
    pub fn set_layer(&mut self, k: usize, property: FundamentalProperty, previous: f64, current: f64) -> &mut Self {
        self.layers.insert((k, property), (previous, current));
        self
    }

    /// Sets the value of a property for one element
    pub fn set_element(
        &mut self,
        index: GlobalIndex,
        property: FundamentalProperty,
        previous: f64,
        current: f64,
    ) -> &mut Self {
        self.elements.insert((index, property), (previous, current));
        self
    }

    /// Returns the (previous, current) pair of a property of an element
    pub fn pair(&self, index: GlobalIndex, property: FundamentalProperty) -> (f64, f64) {
        if let Some(pair) = self.elements.get(&(index, property)) {
            return *pair;
        }
        if let Some(pair) = self.layers.get(&(index.k, property)) {
            return *pair;
        }
        self.defaults.get(&property).copied().unwrap_or((0.0, 0.0))
    }
}

impl PropertyProvider for PropertyTable {
    fn value(&self, element: &SubdomainElement, property: FundamentalProperty, level: TimeLevel) -> f64 {
        let (previous, current) = self.pair(element.index, property);
        match level {
            TimeLevel::Previous => previous,
            TimeLevel::Current => current,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{PropertyStore, PropertyTable};
    use crate::base::FundamentalProperty as P;
    use crate::grid::{GlobalIndex, SubdomainElement};

    fn element(i: usize, k: usize) -> SubdomainElement {
        SubdomainElement {
            index: GlobalIndex::new(i, 0, k),
            formation: 0,
        }
    }

    #[test]
    fn property_table_works() {
        let mut table = PropertyTable::new();
        table
            .set_uniform(P::Temperature, 50.0, 60.0)
            .set_layer(1, P::Temperature, 40.0, 45.0)
            .set_element(GlobalIndex::new(1, 0, 1), P::Temperature, 30.0, 35.0);
        assert_eq!(table.pair(GlobalIndex::new(0, 0, 0), P::Temperature), (50.0, 60.0));
        assert_eq!(table.pair(GlobalIndex::new(0, 0, 1), P::Temperature), (40.0, 45.0));
        assert_eq!(table.pair(GlobalIndex::new(1, 0, 1), P::Temperature), (30.0, 35.0));
        assert_eq!(table.pair(GlobalIndex::new(1, 0, 1), P::Ves), (0.0, 0.0));
    }

    #[test]
    fn activation_guard_restores_the_previous_state() {
        let mut table = PropertyTable::new();
        table.set_uniform(P::PorePressure, 10.0, 12.0);
        let mut store = PropertyStore::new(Box::new(table));
        store.activate_permanently(P::Depth);
        {
            let guard = store.activate(&[P::Depth, P::PorePressure]);
            assert_eq!(guard.newly_activated(), &[P::PorePressure]);
            assert!(guard.is_activated(P::Depth));
            assert!(guard.is_activated(P::PorePressure));
            assert_eq!(guard.compute_previous_property(&element(0, 0), P::PorePressure), 10.0);
            assert_eq!(guard.compute_property(&element(0, 0), P::PorePressure), 12.0);
        }
        assert!(store.is_activated(P::Depth));
        assert!(!store.is_activated(P::PorePressure));
    }

    #[test]
    fn activation_guard_cleans_up_on_early_return() {
        fn failing(store: &mut PropertyStore) -> Result<(), &'static str> {
            let _guard = store.activate(&[P::Temperature]);
            Err("stop")
        }
        let mut store = PropertyStore::new(Box::new(PropertyTable::new()));
        assert_eq!(failing(&mut store).err(), Some("stop"));
        assert!(!store.is_activated(P::Temperature));
    }
}
