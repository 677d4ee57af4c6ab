use crate::base::FundamentalProperty;
use crate::grid::{ElementGrid, GlobalIndex, PropertyStore, Subdomain};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the start and end values of a property of one element
///
/// ```text
/// p(λ) = (1 - λ) p₀ + λ p₁
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementTemporalPropertyInterpolator {
    pub property_start: f64,
    pub property_end: f64,
}

impl ElementTemporalPropertyInterpolator {
    /// Allocates a new instance
    pub fn new(property_start: f64, property_end: f64) -> Self {
        ElementTemporalPropertyInterpolator {
            property_start,
            property_end,
        }
    }

    /// Returns the value at λ (extrapolates if λ is outside [0, 1])
    #[inline]
    pub fn interpolate(&self, lambda: f64) -> f64 {
        (1.0 - lambda) * self.property_start + lambda * self.property_end
    }
}

/// Interpolates one fundamental property of all elements of a subdomain over a time-step
pub struct TemporalPropertyInterpolator {
    property: Option<FundamentalProperty>,
    values: ElementGrid<ElementTemporalPropertyInterpolator>,
    vector_retrieved: bool,
    n_exchange: usize,
}

impl TemporalPropertyInterpolator {
    /// Allocates a new instance
    pub fn new(subdomain: &Subdomain) -> Self {
        TemporalPropertyInterpolator {
            property: None,
            values: subdomain.new_grid(ElementTemporalPropertyInterpolator::default()),
            vector_retrieved: false,
            n_exchange: 0,
        }
    }

    /// Computes the start and end values of a property for every active element
    ///
    /// The property must be activated in the store. Calling this function again
    /// restores the previous view and overwrites all values.
    pub fn set_property(
        &mut self,
        subdomain: &Subdomain,
        properties: &PropertyStore,
        property: FundamentalProperty,
    ) -> Result<(), StrError> {
        if !properties.is_activated(property) {
            return Err("property must be activated before it is interpolated");
        }
        if self.vector_retrieved {
            self.restore_vector();
        }
        self.retrieve_vector();
        for element in subdomain.elements() {
            let start = properties.compute_previous_property(&element, property);
            let end = properties.compute_property(&element, property);
            self.values[element.index] = ElementTemporalPropertyInterpolator::new(start, end);
        }
        self.property = Some(property);
        Ok(())
    }

    /// Returns the interpolated value of an element at λ
    #[inline]
    pub fn value(&self, index: GlobalIndex, lambda: f64) -> f64 {
        debug_assert!(self.property.is_some(), "set_property must be called first");
        self.values[index].interpolate(lambda)
    }

    /// Returns the interpolator of an element
    pub fn get(&self, index: GlobalIndex) -> &ElementTemporalPropertyInterpolator {
        &self.values[index]
    }

    /// Returns the interpolated property, if any
    pub fn property(&self) -> Option<FundamentalProperty> {
        self.property
    }

    /// Returns true if the (ghost-exchanged) view of the values is held
    pub fn is_vector_retrieved(&self) -> bool {
        self.vector_retrieved
    }

    /// Returns the number of retrieve operations performed so far
    pub fn n_exchange(&self) -> usize {
        self.n_exchange
    }

    /// Releases the view of the values
    pub fn restore_vector(&mut self) {
        self.vector_retrieved = false;
    }

    fn retrieve_vector(&mut self) {
        // single rank: the ghost ring is empty, nothing to exchange
        self.vector_retrieved = true;
        self.n_exchange += 1;
    }
}

impl Drop for TemporalPropertyInterpolator {
    fn drop(&mut self) {
        if self.vector_retrieved {
            self.restore_vector();
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ElementTemporalPropertyInterpolator, TemporalPropertyInterpolator};
    use crate::base::{FundamentalProperty as P, SampleParams};
    use crate::grid::{GlobalIndex, PropertyStore, PropertyTable, SampleSubdomains};
    use russell_lab::approx_eq;

    #[test]
    fn element_interpolator_works() {
        let e = ElementTemporalPropertyInterpolator::new(10.0, 20.0);
        assert_eq!(e.interpolate(0.0), 10.0);
        assert_eq!(e.interpolate(1.0), 20.0);
        assert_eq!(e.interpolate(0.5), 15.0);
        assert_eq!(e.interpolate(2.0), 30.0);
    }

    #[test]
    fn set_property_and_value_work() {
        let subdomain = SampleSubdomains::chain(3, SampleParams::param_sandstone()).unwrap();
        let mut table = PropertyTable::new();
        table.set_uniform(P::Temperature, 50.0, 60.0);
        table.set_element(GlobalIndex::new(2, 0, 0), P::Temperature, 70.0, 90.0);
        let mut store = PropertyStore::new(Box::new(table));

        let mut interpolator = TemporalPropertyInterpolator::new(&subdomain);
        assert_eq!(
            interpolator.set_property(&subdomain, &store, P::Temperature).err(),
            Some("property must be activated before it is interpolated")
        );
        assert!(!interpolator.is_vector_retrieved());

        let properties = store.activate(&[P::Temperature]);
        interpolator.set_property(&subdomain, &properties, P::Temperature).unwrap();
        assert!(interpolator.is_vector_retrieved());
        assert_eq!(interpolator.property(), Some(P::Temperature));
        for element in subdomain.elements() {
            let (start, end) = if element.index.i == 2 { (70.0, 90.0) } else { (50.0, 60.0) };
            assert_eq!(interpolator.value(element.index, 0.0), start);
            assert_eq!(interpolator.value(element.index, 1.0), end);
            approx_eq(interpolator.value(element.index, 0.5), 0.5 * (start + end), 1e-15);
        }

        // calling again restores the view before retrieving it once more
        interpolator.set_property(&subdomain, &properties, P::Temperature).unwrap();
        assert!(interpolator.is_vector_retrieved());
        assert_eq!(interpolator.n_exchange(), 2);
        interpolator.restore_vector();
        assert!(!interpolator.is_vector_retrieved());
    }
}
