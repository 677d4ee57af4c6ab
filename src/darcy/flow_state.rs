use crate::base::{FundamentalProperty, ImmobileSpeciesValues, PvtComponents, Saturation};
use crate::grid::{ElementGrid, GlobalIndex, PropertyStore, Subdomain};
use crate::interp::{InterpolatorCalculator, PoreVolumeCalculator};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the per-element state of the hydrocarbons in a subdomain
///
/// Concentrations are given in kg per m³ of pore space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowState {
    /// Time of the state (Ma)
    pub time: f64,

    /// Concentrations of the mobile (free) components
    pub concentrations: ElementGrid<PvtComponents>,

    /// Concentrations of the immobile species
    pub immobiles: ElementGrid<ImmobileSpeciesValues>,

    /// Concentration of adsorbed methane
    pub adsorbed: ElementGrid<f64>,

    /// Saturations
    pub saturations: ElementGrid<Saturation>,

    /// Vapour/liquid equilibrium ratios of the last flash (zero where undefined)
    pub k_values: ElementGrid<PvtComponents>,

    /// Time (Ma) at which each element first contained hydrocarbons
    pub time_of_invasion: ElementGrid<Option<f64>>,
}

impl FlowState {
    /// Allocates a new instance with no hydrocarbons
    pub fn new(subdomain: &Subdomain, time: f64) -> Self {
        FlowState {
            time,
            concentrations: subdomain.new_grid(PvtComponents::new()),
            immobiles: subdomain.new_grid(ImmobileSpeciesValues::new()),
            adsorbed: subdomain.new_grid(0.0),
            saturations: subdomain.new_grid(Saturation::new()),
            k_values: subdomain.new_grid(PvtComponents::new()),
            time_of_invasion: subdomain.new_grid(None),
        }
    }

    /// Returns the pore volume (m³) of an element at λ of the upcoming time-step
    pub fn pore_volume(
        subdomain: &Subdomain,
        store: &mut PropertyStore,
        index: GlobalIndex,
        lambda: f64,
    ) -> Result<f64, StrError> {
        let element = subdomain.element(index).ok_or("index is out of bounds")?;
        let properties = store.activate(&[FundamentalProperty::Ves, FundamentalProperty::MaxVes]);
        let calculator = PoreVolumeCalculator::new(subdomain, &properties);
        let mut values = [0.0; 2];
        calculator.compute(&element, lambda, &mut values);
        Ok(values[0])
    }

    /// Sets the masses (kg) of the mobile components of an element at the start of the upcoming time-step
    pub fn set_mass(
        &mut self,
        subdomain: &Subdomain,
        store: &mut PropertyStore,
        index: GlobalIndex,
        masses: &PvtComponents,
    ) -> Result<(), StrError> {
        let pore_volume = FlowState::pore_volume(subdomain, store, index, 0.0)?;
        if pore_volume <= 0.0 {
            return Err("cannot set the mass of an element without pore volume");
        }
        self.concentrations[index] = *masses * (1.0 / pore_volume);
        Ok(())
    }

    /// Returns the masses (kg) of the mobile components of an element at λ
    pub fn element_mass(
        &self,
        subdomain: &Subdomain,
        store: &mut PropertyStore,
        index: GlobalIndex,
        lambda: f64,
    ) -> Result<PvtComponents, StrError> {
        let pore_volume = FlowState::pore_volume(subdomain, store, index, lambda)?;
        Ok(self.concentrations[index] * pore_volume)
    }

    /// Returns the total hydrocarbon mass (kg) at λ, including immobile and adsorbed hydrocarbons
    pub fn total_hc_mass(&self, subdomain: &Subdomain, store: &mut PropertyStore, lambda: f64) -> Result<f64, StrError> {
        let mut total = 0.0;
        for element in subdomain.elements() {
            let index = element.index;
            let pore_volume = FlowState::pore_volume(subdomain, store, index, lambda)?;
            let density = self.concentrations[index].sum() + self.immobiles[index].sum() + self.adsorbed[index];
            total += density * pore_volume;
        }
        Ok(total)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FlowState;
    use crate::base::{ComponentId, FundamentalProperty as P, PvtComponents, SampleParams};
    use crate::grid::{GlobalIndex, PropertyStore, PropertyTable, SampleSubdomains};
    use russell_lab::approx_eq;

    #[test]
    fn set_mass_and_total_mass_work() {
        let mut subdomain = SampleSubdomains::chain(3, SampleParams::param_uniform_rock(0.2, 10.0)).unwrap();
        subdomain.set_solid_thickness(GlobalIndex::new(2, 0, 0), 0.0).unwrap();
        let mut store = PropertyStore::new(Box::new(PropertyTable::new()));
        let mut state = FlowState::new(&subdomain, 10.0);
        let a = GlobalIndex::new(0, 0, 0);
        let masses = PvtComponents::single(ComponentId::C1, 500.0);
        state.set_mass(&subdomain, &mut store, a, &masses).unwrap();
        approx_eq(state.concentrations[a][ComponentId::C1], 500.0 / 25000.0, 1e-15);
        approx_eq(state.element_mass(&subdomain, &mut store, a, 1.0).unwrap()[ComponentId::C1], 500.0, 1e-10);
        state.adsorbed[GlobalIndex::new(1, 0, 0)] = 0.01;
        approx_eq(state.total_hc_mass(&subdomain, &mut store, 0.0).unwrap(), 750.0, 1e-10);
        assert_eq!(
            state.set_mass(&subdomain, &mut store, GlobalIndex::new(2, 0, 0), &masses).err(),
            Some("cannot set the mass of an element without pore volume")
        );
        assert_eq!(
            state.set_mass(&subdomain, &mut store, GlobalIndex::new(3, 0, 0), &masses).err(),
            Some("index is out of bounds")
        );
        // activation does not leak
        assert!(!store.is_activated(P::Ves));
    }
}
