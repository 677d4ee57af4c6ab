use super::FlowState;
use crate::base::{ComponentId, ElementFaceValues, Face, FlowConfig, ImmobileSpeciesValues};
use crate::base::{PhaseId, PvtComponents, Saturation, SaturationError, NUM_COMPONENTS};
use crate::grid::{Boolean3DArray, ElementGrid, GlobalIndex, Subdomain};
use crate::interp::{SourceTermCalculator, TemporalEvaluator, TemporalPropertyInterpolator};
use crate::model::{AdsorptionFunction, FlashResult, OtgcSimulator, PvtFlash};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the reasons why a concentration update fails
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationError {
    /// A component mass became negative beyond the tolerance
    NegativeMassBeyondTolerance,

    /// A component mass is NaN or infinite
    NotFinite,
}

/// Holds the phase split of the mobile components of every element
pub struct PhaseState {
    /// Results of the last flash (phase compositions kept in sync with the concentrations)
    pub flash: ElementGrid<FlashResult>,

    /// Fraction of the mass of each component in the vapour phase (from the last flash)
    pub vapour_split: ElementGrid<PvtComponents>,

    /// Indicates that the element has been flashed at least once
    pub flashed: Boolean3DArray,

    /// Concentrations (kg/m³) passed to the last flash
    pub feed: ElementGrid<PvtComponents>,
}

impl PhaseState {
    /// Allocates a new instance
    pub fn new(subdomain: &Subdomain) -> Self {
        PhaseState {
            flash: subdomain.new_grid(FlashResult::default()),
            vapour_split: subdomain.new_grid(PvtComponents::new()),
            flashed: subdomain.new_grid(false),
            feed: subdomain.new_grid(PvtComponents::new()),
        }
    }
}

/// Implements the per-time-step numerical kernels of the Darcy flow
pub struct DarcyCalculations<'a> {
    config: &'a FlowConfig,
}

impl<'a> DarcyCalculations<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a FlowConfig) -> Self {
        DarcyCalculations { config }
    }

    /// Adds the chemistry source term of all source-rock elements
    ///
    /// * `source_term` -- masses (kg) added to each element (accumulated)
    /// * `contains_hc` -- set to true wherever mass is added
    /// * `lambda` -- position at which the expulsion rate is evaluated
    /// * `fraction_scaling` -- fraction of the whole time-step covered by the addition
    /// * `layer_mass_added` -- total mass (kg) added per formation (accumulated)
    pub fn compute_source_term(
        &self,
        subdomain: &Subdomain,
        source_term: &mut ElementGrid<PvtComponents>,
        contains_hc: &mut Boolean3DArray,
        evaluator: &mut TemporalEvaluator<SourceTermCalculator<'_>>,
        pore_volumes: &ElementGrid<f64>,
        lambda: f64,
        fraction_scaling: f64,
        layer_mass_added: &mut [f64],
    ) -> Result<(), StrError> {
        let mut values = [0.0; NUM_COMPONENTS];
        for (f, _) in subdomain.active_source_rock_layers() {
            for element in subdomain.layer_elements(f) {
                if pore_volumes[element.index] <= 0.0 {
                    continue;
                }
                evaluator.evaluate(&element, lambda, &mut values)?;
                let mut added = PvtComponents { values };
                added.values.iter_mut().for_each(|m| *m = f64::max(*m, 0.0) * fraction_scaling);
                let total = added.sum();
                if total > 0.0 {
                    source_term[element.index] += added;
                    contains_hc[element.index] = true;
                    layer_mass_added[f] += total;
                }
            }
        }
        Ok(())
    }

    /// Flashes the elements containing hydrocarbons
    ///
    /// Elements that have never been flashed, or that gained a component absent from the
    /// last flash, are always flashed; the others only if `force` is true.
    ///
    /// Returns the number of flashes performed or the first element whose flash failed.
    pub fn flash_components(
        &self,
        subdomain: &Subdomain,
        flash: &dyn PvtFlash,
        concentrations: &ElementGrid<PvtComponents>,
        contains_hc: &Boolean3DArray,
        pressure: &TemporalPropertyInterpolator,
        temperature: &TemporalPropertyInterpolator,
        lambda: f64,
        force: bool,
        phases: &mut PhaseState,
    ) -> Result<usize, (GlobalIndex, StrError)> {
        let mut count = 0;
        for element in subdomain.elements() {
            let index = element.index;
            if !contains_hc[index] {
                continue;
            }
            let masses = &concentrations[index];
            let gained = masses
                .values
                .iter()
                .zip(phases.feed[index].values.iter())
                .any(|(m, f)| *m > 0.0 && *f <= 0.0);
            if phases.flashed[index] && !force && !gained {
                continue;
            }
            let result = flash
                .compute_with_lumping(temperature.value(index, lambda), pressure.value(index, lambda), masses)
                .map_err(|e| (index, e))?;
            let mut split = PvtComponents::new();
            for c in 0..NUM_COMPONENTS {
                if masses.values[c] > 0.0 {
                    split.values[c] = result.phase_composition[PhaseId::Vapour].values[c] / masses.values[c];
                }
            }
            phases.flash[index] = result;
            phases.vapour_split[index] = split;
            phases.feed[index] = *masses;
            phases.flashed[index] = true;
            count += 1;
        }
        Ok(count)
    }

    /// Splits the current concentrations into phases using the vapour fractions of the last flash
    pub fn resplit_components(
        &self,
        subdomain: &Subdomain,
        concentrations: &ElementGrid<PvtComponents>,
        phases: &mut PhaseState,
    ) {
        for element in subdomain.elements() {
            let index = element.index;
            let masses = &concentrations[index];
            let split = &phases.vapour_split[index];
            let composition = &mut phases.flash[index].phase_composition;
            for c in 0..NUM_COMPONENTS {
                let m = f64::max(masses.values[c], 0.0);
                let vapour = m * split.values[c];
                composition[PhaseId::Vapour].values[c] = vapour;
                composition[PhaseId::Liquid].values[c] = m - vapour;
            }
        }
    }

    /// Computes the saturation of one element
    fn element_saturation(
        &self,
        result: &FlashResult,
        immobiles: &ImmobileSpeciesValues,
    ) -> (Saturation, Option<SaturationError>) {
        let mut volumes = [0.0; 2];
        let total = result.phase_composition.total().sum();
        for phase in PhaseId::ALL {
            let mass = result.phase_composition.phase_sum(phase);
            if mass > 0.0 {
                let density = result.densities[phase];
                if density.is_nan() || density <= 0.0 {
                    // traces below the content threshold are never flashed and occupy no volume
                    if total <= self.config.hc_content_epsilon {
                        continue;
                    }
                    return (Saturation::new(), Some(SaturationError::ZeroTotalVolume));
                }
                volumes[phase.index()] = mass / density;
            }
        }
        let immobile = if self.config.use_immobile_saturation {
            immobiles.retained_volume(&self.config.immobile_densities)
        } else {
            0.0
        };
        Saturation::from_volumes(
            volumes[PhaseId::Vapour.index()],
            volumes[PhaseId::Liquid.index()],
            immobile,
            self.config.saturation_tolerance,
        )
    }

    /// Converts the phase compositions into saturations
    ///
    /// Pinched-out elements are skipped. Returns the first element whose saturation failed.
    pub fn set_saturations(
        &self,
        subdomain: &Subdomain,
        phases: &PhaseState,
        immobiles: &ElementGrid<ImmobileSpeciesValues>,
        pore_volumes: &ElementGrid<f64>,
        saturations: &mut ElementGrid<Saturation>,
    ) -> Option<(GlobalIndex, SaturationError)> {
        let mut first_error = None;
        for element in subdomain.elements() {
            let index = element.index;
            if pore_volumes[index] <= 0.0 {
                continue;
            }
            let (saturation, error) = self.element_saturation(&phases.flash[index], &immobiles[index]);
            saturations[index] = saturation;
            if let Some(e) = error {
                first_error.get_or_insert((index, e));
            }
        }
        first_error
    }

    /// Converts the phase compositions into saturations and derives the K-values
    ///
    /// ```text
    /// Kᵢ = yᵢ / xᵢ   (zero where the component is absent from a phase)
    /// ```
    pub fn set_saturations_with_k_values(
        &self,
        subdomain: &Subdomain,
        phases: &PhaseState,
        immobiles: &ElementGrid<ImmobileSpeciesValues>,
        pore_volumes: &ElementGrid<f64>,
        saturations: &mut ElementGrid<Saturation>,
        k_values: &mut ElementGrid<PvtComponents>,
    ) -> Option<(GlobalIndex, SaturationError)> {
        let first_error = self.set_saturations(subdomain, phases, immobiles, pore_volumes, saturations);
        for element in subdomain.elements() {
            let index = element.index;
            let composition = &phases.flash[index].phase_composition;
            let y = composition[PhaseId::Vapour].moles();
            let x = composition[PhaseId::Liquid].moles();
            let (ny, nx) = (y.sum(), x.sum());
            let mut k = PvtComponents::new();
            if ny > 0.0 && nx > 0.0 {
                for c in 0..NUM_COMPONENTS {
                    if x.values[c] > 0.0 && y.values[c] > 0.0 {
                        k.values[c] = (y.values[c] / ny) / (x.values[c] / nx);
                    }
                }
            }
            k_values[index] = k;
        }
        first_error
    }

    /// Computes the mass (kg) held by each element at the start of a sub-step
    pub fn compute_temporal_contributions(
        &self,
        subdomain: &Subdomain,
        concentrations: &ElementGrid<PvtComponents>,
        pore_volumes: &ElementGrid<f64>,
        temporal: &mut ElementGrid<PvtComponents>,
    ) {
        for element in subdomain.elements() {
            let index = element.index;
            temporal[index] = concentrations[index] * pore_volumes[index];
        }
    }

    /// Updates the concentrations from the temporal, source and transport contributions (kg)
    ///
    /// Small negative masses are truncated to zero. Returns the first element whose update failed.
    pub fn set_concentrations(
        &self,
        subdomain: &Subdomain,
        temporal: &ElementGrid<PvtComponents>,
        source_term: &ElementGrid<PvtComponents>,
        transport: &ElementGrid<PvtComponents>,
        pore_volumes: &ElementGrid<f64>,
        concentrations: &mut ElementGrid<PvtComponents>,
    ) -> Option<(GlobalIndex, ConcentrationError)> {
        let mut first_error = None;
        for element in subdomain.elements() {
            let index = element.index;
            let pore_volume = pore_volumes[index];
            if pore_volume <= 0.0 {
                concentrations[index] = PvtComponents::new();
                continue;
            }
            let mut mass = temporal[index] + source_term[index] + transport[index];
            if !mass.is_finite() {
                first_error.get_or_insert((index, ConcentrationError::NotFinite));
                continue;
            }
            let positive: f64 = mass.values.iter().map(|m| f64::max(*m, 0.0)).sum();
            let allowed = self.config.concentration_tolerance * f64::max(positive, f64::MIN_POSITIVE);
            for m in mass.values.iter_mut() {
                if *m < 0.0 {
                    if -*m <= allowed {
                        *m = 0.0;
                    } else {
                        first_error.get_or_insert((index, ConcentrationError::NegativeMassBeyondTolerance));
                    }
                }
            }
            concentrations[index] = mass * (1.0 / pore_volume);
        }
        first_error
    }

    /// Rescales the retained (immobile and adsorbed) concentrations after a change of pore volume
    pub fn rescale_retained(
        &self,
        subdomain: &Subdomain,
        pore_volumes_start: &ElementGrid<f64>,
        pore_volumes_end: &ElementGrid<f64>,
        state: &mut FlowState,
    ) {
        for element in subdomain.elements() {
            let index = element.index;
            let (v0, v1) = (pore_volumes_start[index], pore_volumes_end[index]);
            if v0 <= 0.0 || v1 <= 0.0 {
                continue;
            }
            let ratio = v0 / v1;
            state.immobiles[index].values.iter_mut().for_each(|m| *m *= ratio);
            state.adsorbed[index] *= ratio;
        }
    }

    /// Cracks the hydrocarbons retained in the pore space over a time window
    ///
    /// * `time_start`, `time_end` -- physical window (Ma)
    /// * `lambda_start`, `lambda_end` -- the corresponding positions within the flow time-step
    ///
    /// Does nothing if secondary cracking is disabled.
    pub fn apply_otgc(
        &self,
        otgc: &OtgcSimulator,
        subdomain: &Subdomain,
        temperature: &TemporalPropertyInterpolator,
        pore_volumes: &ElementGrid<f64>,
        state: &mut FlowState,
        time_start: f64,
        time_end: f64,
        lambda_start: f64,
        lambda_end: f64,
    ) {
        if !self.config.use_otgc {
            return;
        }
        for element in subdomain.elements() {
            let index = element.index;
            if pore_volumes[index] <= 0.0 {
                continue;
            }
            if state.concentrations[index].sum() + state.immobiles[index].sum() <= 0.0 {
                continue;
            }
            let t0 = temperature.value(index, lambda_start);
            let t1 = temperature.value(index, lambda_end);
            otgc.apply(
                time_start,
                time_end,
                t0,
                t1,
                &mut state.concentrations[index],
                &mut state.immobiles[index],
            );
        }
    }

    /// Partitions methane between the free and adsorbed states of source-rock elements
    ///
    /// * `functions` -- adsorption function of each formation, if any
    pub fn apply_adsorption(
        &self,
        subdomain: &Subdomain,
        functions: &[Option<Box<dyn AdsorptionFunction>>],
        pressure: &TemporalPropertyInterpolator,
        temperature: &TemporalPropertyInterpolator,
        pore_volumes: &ElementGrid<f64>,
        lambda: f64,
        state: &mut FlowState,
    ) {
        for (f, _) in subdomain.active_source_rock_layers() {
            let function = match &functions[f] {
                Some(function) => function,
                None => continue,
            };
            for element in subdomain.layer_elements(f) {
                let index = element.index;
                if pore_volumes[index] <= 0.0 {
                    continue;
                }
                let capacity = function.capacity(temperature.value(index, lambda), pressure.value(index, lambda));
                let total = state.concentrations[index][ComponentId::C1] + state.adsorbed[index];
                let adsorbed = f64::max(0.0, f64::min(capacity, total));
                state.adsorbed[index] = adsorbed;
                state.concentrations[index][ComponentId::C1] = total - adsorbed;
            }
        }
    }

    /// Averages the face permeabilities of abutting elements
    ///
    /// The averaged value of an internal face is the arithmetic mean of the own values of the
    /// two elements sharing it; boundary faces keep their own value.
    pub fn compute_average_permeabilities(
        &self,
        subdomain: &Subdomain,
        own: &ElementGrid<ElementFaceValues>,
        averaged: &mut ElementGrid<ElementFaceValues>,
    ) {
        // collect own values
        for element in subdomain.elements() {
            averaged[element.index] = own[element.index];
        }
        // add the neighbour's value of the opposite face
        for element in subdomain.elements() {
            for face in Face::ALL {
                if let Some(other) = subdomain.neighbour(element.index, face) {
                    averaged[element.index][face] += own[other][face.opposite()];
                }
            }
        }
        // recover the mean
        for element in subdomain.elements() {
            for face in Face::ALL {
                if subdomain.neighbour(element.index, face).is_some() {
                    averaged[element.index][face] *= 0.5;
                }
            }
        }
    }

    /// Returns the total hydrocarbon mass (kg), including immobile and adsorbed hydrocarbons
    pub fn total_hc_mass(&self, subdomain: &Subdomain, state: &FlowState, pore_volumes: &ElementGrid<f64>) -> f64 {
        let mut total = 0.0;
        for element in subdomain.elements() {
            let index = element.index;
            let density = state.concentrations[index].sum() + state.immobiles[index].sum() + state.adsorbed[index];
            total += density * pore_volumes[index];
        }
        total
    }

    /// Records the time at which elements first contain hydrocarbons
    ///
    /// An already recorded time is never overwritten. Returns the number of newly invaded elements.
    pub fn set_time_of_element_invasion(
        &self,
        subdomain: &Subdomain,
        concentrations: &ElementGrid<PvtComponents>,
        time: f64,
        time_of_invasion: &mut ElementGrid<Option<f64>>,
    ) -> usize {
        let mut count = 0;
        for element in subdomain.elements() {
            let index = element.index;
            if time_of_invasion[index].is_none() && concentrations[index].sum() > self.config.hc_content_epsilon {
                time_of_invasion[index] = Some(time);
                count += 1;
            }
        }
        count
    }

    /// Assigns to pinched-out elements the pore-volume-weighted saturation of their vertical neighbours
    pub fn average_global_saturation(
        &self,
        subdomain: &Subdomain,
        pore_volumes: &ElementGrid<f64>,
        saturations: &mut ElementGrid<Saturation>,
    ) {
        for element in subdomain.elements() {
            let index = element.index;
            if pore_volumes[index] > 0.0 {
                continue;
            }
            let mut sum = Saturation {
                water: 0.0,
                vapour: 0.0,
                liquid: 0.0,
                immobile: 0.0,
            };
            let mut weight = 0.0;
            for face in [Face::Bottom, Face::Top] {
                if let Some(other) = subdomain.neighbour(index, face) {
                    let volume = pore_volumes[other];
                    if volume > 0.0 {
                        sum.add_scaled(volume, &saturations[other]);
                        weight += volume;
                    }
                }
            }
            saturations[index] = if weight > 0.0 {
                let mut average = Saturation::new();
                average.water = 0.0;
                average.add_scaled(1.0 / weight, &sum);
                average
            } else {
                Saturation::new()
            };
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
