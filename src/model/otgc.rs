use crate::base::{ComponentId, ImmobileSpeciesId, ImmobileSpeciesValues, PvtComponents};
use crate::base::{CELSIUS_TO_KELVIN, GAS_CONSTANT, SECONDS_PER_MA};
use crate::StrError;

/// Identifies a species taking part in secondary cracking
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrackingSpecies {
    Component(ComponentId),
    Immobile(ImmobileSpeciesId),
}

/// Holds a first-order Arrhenius reaction
#[derive(Clone, Debug)]
pub struct CrackingReaction {
    /// Species being cracked
    pub reactant: CrackingSpecies,

    /// Products with their mass fractions (adding up to one)
    pub products: Vec<(CrackingSpecies, f64)>,

    /// Frequency factor (1/s)
    pub frequency_factor: f64,

    /// Activation energy (J/mol)
    pub activation_energy: f64,
}

impl CrackingReaction {
    /// Returns the rate constant (1/s) at the given temperature (℃)
    pub fn rate(&self, temperature: f64) -> f64 {
        let tt = temperature + CELSIUS_TO_KELVIN;
        self.frequency_factor * f64::exp(-self.activation_energy / (GAS_CONSTANT * tt))
    }
}

/// Implements the secondary (oil to gas) cracking of the retained hydrocarbons
///
/// Each reaction is integrated exactly over a sub-window with constant temperature:
///
/// ```text
/// Δm = m · (1 - exp(-k(T) Δt))
/// ```
///
/// The reactions are applied from heavy to light within each sub-window; mass is conserved.
pub struct OtgcSimulator {
    reactions: Vec<CrackingReaction>,
    n_sub_window: usize,
}

fn reaction(reactant: CrackingSpecies, products: &[(CrackingSpecies, f64)], activation_energy: f64) -> CrackingReaction {
    CrackingReaction {
        reactant,
        products: products.to_vec(),
        frequency_factor: 1.0e14,
        activation_energy,
    }
}

impl OtgcSimulator {
    /// Allocates a new instance with the given reactions
    pub fn new(reactions: Vec<CrackingReaction>, n_sub_window: usize) -> Result<Self, StrError> {
        if n_sub_window < 1 {
            return Err("n_sub_window must be ≥ 1");
        }
        for r in &reactions {
            let sum: f64 = r.products.iter().map(|(_, f)| f).sum();
            if f64::abs(sum - 1.0) > 1e-12 {
                return Err("the product fractions of a reaction must add up to one");
            }
            if r.products.iter().any(|(_, f)| *f < 0.0) {
                return Err("the product fractions of a reaction must be non-negative");
            }
        }
        Ok(OtgcSimulator { reactions, n_sub_window })
    }

    /// Allocates a new instance with the default reaction scheme
    pub fn new_default() -> Self {
        use self::CrackingSpecies::{Component as C, Immobile as I};
        use ComponentId::*;
        use ImmobileSpeciesId::*;
        let reactions = vec![
            reaction(C(Asphaltene), &[(I(Precoke), 0.6), (C(C15PlusAro), 0.3), (C(C1), 0.1)], 230e3),
            reaction(
                C(Resin),
                &[(I(Precoke), 0.4), (C(C15PlusAro), 0.4), (C(C6To14Aro), 0.1), (C(C1), 0.1)],
                225e3,
            ),
            reaction(I(Precoke), &[(I(Coke1), 0.7), (I(Hetero1), 0.1), (C(C1), 0.2)], 230e3),
            reaction(I(Hetero1), &[(I(Coke2), 0.9), (C(COx), 0.1)], 240e3),
            reaction(C(C15PlusAro), &[(I(Coke1), 0.5), (C(C6To14Aro), 0.3), (C(C1), 0.2)], 240e3),
            reaction(
                C(C15PlusSat),
                &[(C(C6To14Sat), 0.6), (C(C5), 0.1), (C(C4), 0.1), (C(C3), 0.1), (C(C1), 0.1)],
                235e3,
            ),
            reaction(C(C6To14Aro), &[(I(Coke2), 0.6), (C(C2), 0.1), (C(C1), 0.3)], 245e3),
            reaction(
                C(C6To14Sat),
                &[(C(C5), 0.3), (C(C4), 0.2), (C(C3), 0.2), (C(C2), 0.1), (C(C1), 0.2)],
                245e3,
            ),
            reaction(C(C5), &[(C(C3), 0.3), (C(C2), 0.3), (C(C1), 0.4)], 250e3),
            reaction(C(C4), &[(C(C2), 0.5), (C(C1), 0.5)], 250e3),
            reaction(C(C3), &[(C(C2), 0.3), (C(C1), 0.7)], 252e3),
            reaction(C(C2), &[(C(C1), 0.8), (I(CokeS), 0.2)], 255e3),
        ];
        OtgcSimulator {
            reactions,
            n_sub_window: 4,
        }
    }

    /// Returns the reactions
    pub fn reactions(&self) -> &[CrackingReaction] {
        &self.reactions
    }

    /// Cracks the retained hydrocarbons over a time window
    ///
    /// * `time_start`, `time_end` -- physical time window (Ma)
    /// * `temperature_start`, `temperature_end` -- temperatures (℃) at the window ends; linearly interpolated within
    /// * `components` -- concentrations of the mobile components (modified)
    /// * `immobiles` -- concentrations of the immobile species (modified)
    pub fn apply(
        &self,
        time_start: f64,
        time_end: f64,
        temperature_start: f64,
        temperature_end: f64,
        components: &mut PvtComponents,
        immobiles: &mut ImmobileSpeciesValues,
    ) {
        let dt = (time_end - time_start) * SECONDS_PER_MA / (self.n_sub_window as f64);
        if dt <= 0.0 {
            return;
        }
        for w in 0..self.n_sub_window {
            let xi = (w as f64 + 0.5) / (self.n_sub_window as f64);
            let temperature = (1.0 - xi) * temperature_start + xi * temperature_end;
            for r in &self.reactions {
                let available = get(r.reactant, components, immobiles);
                if available <= 0.0 {
                    continue;
                }
                let cracked = available * (1.0 - f64::exp(-r.rate(temperature) * dt));
                *get_mut(r.reactant, components, immobiles) -= cracked;
                for (product, fraction) in &r.products {
                    *get_mut(*product, components, immobiles) += fraction * cracked;
                }
            }
        }
    }
}

fn get(species: CrackingSpecies, components: &PvtComponents, immobiles: &ImmobileSpeciesValues) -> f64 {
    match species {
        CrackingSpecies::Component(id) => components[id],
        CrackingSpecies::Immobile(id) => immobiles[id],
    }
}

fn get_mut<'a>(
    species: CrackingSpecies,
    components: &'a mut PvtComponents,
    immobiles: &'a mut ImmobileSpeciesValues,
) -> &'a mut f64 {
    match species {
        CrackingSpecies::Component(id) => &mut components[id],
        CrackingSpecies::Immobile(id) => &mut immobiles[id],
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{CrackingReaction, CrackingSpecies, OtgcSimulator};
    use crate::base::{ComponentId, ImmobileSpeciesId, ImmobileSpeciesValues, PvtComponents, SECONDS_PER_MA};
    use russell_lab::approx_eq;

    #[test]
    fn new_captures_errors() {
        let bad = CrackingReaction {
            reactant: CrackingSpecies::Component(ComponentId::C2),
            products: vec![(CrackingSpecies::Component(ComponentId::C1), 0.9)],
            frequency_factor: 1.0,
            activation_energy: 0.0,
        };
        assert_eq!(
            OtgcSimulator::new(vec![bad.clone()], 1).err(),
            Some("the product fractions of a reaction must add up to one")
        );
        assert_eq!(OtgcSimulator::new(vec![], 0).err(), Some("n_sub_window must be ≥ 1"));
    }

    #[test]
    fn single_reaction_is_integrated_exactly() {
        let r = CrackingReaction {
            reactant: CrackingSpecies::Component(ComponentId::C2),
            products: vec![
                (CrackingSpecies::Component(ComponentId::C1), 0.75),
                (CrackingSpecies::Immobile(ImmobileSpeciesId::CokeS), 0.25),
            ],
            frequency_factor: 1.0 / SECONDS_PER_MA,
            activation_energy: 0.0,
        };
        let otgc = OtgcSimulator::new(vec![r], 3).unwrap();
        let mut components = PvtComponents::single(ComponentId::C2, 8.0);
        let mut immobiles = ImmobileSpeciesValues::new();
        otgc.apply(10.0, 12.0, 100.0, 120.0, &mut components, &mut immobiles);
        // k = 1/Ma over 2 Ma
        let left = 8.0 * f64::exp(-2.0);
        approx_eq(components[ComponentId::C2], left, 1e-13);
        approx_eq(components[ComponentId::C1], 0.75 * (8.0 - left), 1e-13);
        approx_eq(immobiles[ImmobileSpeciesId::CokeS], 0.25 * (8.0 - left), 1e-13);
    }

    #[test]
    fn default_scheme_conserves_mass_and_produces_gas() {
        let otgc = OtgcSimulator::new_default();
        let mut components = PvtComponents::new();
        components[ComponentId::C15PlusSat] = 50.0;
        components[ComponentId::Asphaltene] = 10.0;
        components[ComponentId::C1] = 5.0;
        let mut immobiles = ImmobileSpeciesValues::new();
        otgc.apply(0.0, 5.0, 180.0, 200.0, &mut components, &mut immobiles);
        approx_eq(components.sum() + immobiles.sum(), 65.0, 1e-12);
        assert!(components[ComponentId::C15PlusSat] < 50.0);
        assert!(components[ComponentId::C1] > 5.0);
        assert!(immobiles.sum() > 0.0);

        // nothing happens without time
        let before = components;
        otgc.apply(5.0, 5.0, 200.0, 200.0, &mut components, &mut immobiles);
        assert_eq!(components, before);
    }
}
