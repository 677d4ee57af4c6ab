use crate::base::{ComponentId, PhaseId, PvtComponents, PvtPhaseComponents, PvtPhaseValues};
use crate::base::{CELSIUS_TO_KELVIN, GAS_CONSTANT, MPA_TO_PA, NUM_COMPONENTS};
use crate::StrError;

/// Holds the results of a flash
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlashResult {
    /// Component values split into vapour and liquid (same unit as the input)
    pub phase_composition: PvtPhaseComponents,

    /// Phase densities (kg/m³)
    pub densities: PvtPhaseValues,

    /// Phase viscosities (Pa·s)
    pub viscosities: PvtPhaseValues,
}

/// Defines the phase-equilibrium collaborator
pub trait PvtFlash {
    /// Splits a composition into vapour and liquid phases
    ///
    /// * `temperature` -- temperature (℃)
    /// * `pressure` -- pressure (MPa)
    /// * `masses` -- component masses or concentrations (any mass-based unit)
    fn compute_with_lumping(&self, temperature: f64, pressure: f64, masses: &PvtComponents) -> Result<FlashResult, StrError>;
}

/// Holds the critical constants and liquid properties of a component
#[derive(Clone, Copy, Debug)]
struct ComponentProperties {
    /// Critical temperature (K)
    tc: f64,

    /// Critical pressure (MPa)
    pc: f64,

    /// Acentric factor
    omega: f64,

    /// Liquid density at surface conditions (kg/m³)
    rho_liquid: f64,

    /// Liquid viscosity at 20 ℃ (Pa·s)
    mu_liquid: f64,
}

const fn props(tc: f64, pc: f64, omega: f64, rho_liquid: f64, mu_liquid: f64) -> ComponentProperties {
    ComponentProperties {
        tc,
        pc,
        omega,
        rho_liquid,
        mu_liquid,
    }
}

/// Lists the component properties in component order
const COMPONENT_PROPERTIES: [ComponentProperties; NUM_COMPONENTS] = [
    props(1100.0, 0.80, 1.50, 1100.0, 10.0),    // asphaltenes
    props(1000.0, 1.00, 1.30, 1050.0, 1.0),     // resins
    props(850.0, 1.30, 1.00, 1000.0, 2.0e-2),   // C15+Aro
    props(780.0, 1.20, 0.90, 850.0, 1.0e-2),    // C15+Sat
    props(650.0, 2.60, 0.45, 880.0, 1.5e-3),    // C6-14Aro
    props(620.0, 2.20, 0.50, 750.0, 1.2e-3),    // C6-14Sat
    props(469.7, 3.37, 0.251, 626.0, 2.4e-4),   // C5
    props(425.1, 3.796, 0.200, 579.0, 1.8e-4),  // C4
    props(369.8, 4.248, 0.152, 500.0, 1.1e-4),  // C3
    props(305.3, 4.872, 0.100, 450.0, 6.0e-5),  // C2
    props(190.6, 4.599, 0.011, 300.0, 3.0e-5),  // C1
    props(304.2, 7.383, 0.224, 770.0, 7.0e-5),  // COx
    props(126.2, 3.390, 0.037, 800.0, 5.0e-5),  // N2
];

/// Reference temperature for the liquid viscosities (K)
const MU_REFERENCE_TEMPERATURE: f64 = 293.15;

/// Activation temperature of the liquid viscosity (K)
const MU_ACTIVATION_TEMPERATURE: f64 = 1500.0;

/// Vapour viscosity at the reference temperature (Pa·s)
const MU_VAPOUR_REFERENCE: f64 = 1.2e-5;

/// Implements a flash with Wilson K-values and the Rachford-Rice equation
///
/// The vapour phase is an ideal gas. The liquid density follows an ideal
/// mixing rule of the component liquid densities.
pub struct WilsonFlash {
    /// Tolerance of the Rachford-Rice solver
    pub tolerance: f64,

    /// Maximum number of iterations of the Rachford-Rice solver
    pub n_iteration_max: usize,
}

impl WilsonFlash {
    /// Allocates a new instance
    pub fn new() -> Self {
        WilsonFlash {
            tolerance: 1e-12,
            n_iteration_max: 200,
        }
    }

    /// Calculates the Wilson K-values
    ///
    /// ```text
    /// Kᵢ = (Pcᵢ / P) · exp(5.373 (1 + ωᵢ) (1 - Tcᵢ / T))
    /// ```
    pub fn k_values(&self, temperature: f64, pressure: f64) -> PvtComponents {
        let tt = temperature + CELSIUS_TO_KELVIN;
        let mut k = PvtComponents::new();
        for (c, p) in COMPONENT_PROPERTIES.iter().enumerate() {
            k.values[c] = (p.pc / pressure) * f64::exp(5.373 * (1.0 + p.omega) * (1.0 - p.tc / tt));
        }
        k
    }

    /// Solves the Rachford-Rice equation for the vapour mole fraction
    ///
    /// ```text
    /// Σ zᵢ (Kᵢ - 1) / (1 + V (Kᵢ - 1)) = 0
    /// ```
    fn rachford_rice(&self, z: &PvtComponents, k: &PvtComponents) -> Result<f64, StrError> {
        let f = |v: f64| -> (f64, f64) {
            let mut g = 0.0;
            let mut dg = 0.0;
            for c in 0..NUM_COMPONENTS {
                let a = k.values[c] - 1.0;
                let den = 1.0 + v * a;
                g += z.values[c] * a / den;
                dg -= z.values[c] * a * a / (den * den);
            }
            (g, dg)
        };
        let (g0, _) = f(0.0);
        if g0 <= 0.0 {
            return Ok(0.0);
        }
        let (g1, _) = f(1.0);
        if g1 >= 0.0 {
            return Ok(1.0);
        }
        // g decreases monotonically in (0, 1): safeguarded Newton
        let (mut lo, mut hi) = (0.0, 1.0);
        let mut v = 0.5;
        for _ in 0..self.n_iteration_max {
            let (g, dg) = f(v);
            if g > 0.0 {
                lo = v;
            } else {
                hi = v;
            }
            if f64::abs(g) < self.tolerance || hi - lo < self.tolerance {
                return Ok(v);
            }
            let newton = if dg != 0.0 { v - g / dg } else { f64::NAN };
            v = if newton > lo && newton < hi { newton } else { 0.5 * (lo + hi) };
        }
        Err("Rachford-Rice solver did not converge")
    }

    /// Calculates the viscosity of a liquid with the given mass fractions
    fn liquid_viscosity(&self, fractions: &PvtComponents, tt: f64) -> f64 {
        let mut ln_mu = 0.0;
        for (c, p) in COMPONENT_PROPERTIES.iter().enumerate() {
            ln_mu += fractions.values[c] * f64::ln(p.mu_liquid);
        }
        f64::exp(ln_mu + MU_ACTIVATION_TEMPERATURE * (1.0 / tt - 1.0 / MU_REFERENCE_TEMPERATURE))
    }

    /// Calculates the density of a liquid with the given mass fractions
    fn liquid_density(&self, fractions: &PvtComponents) -> f64 {
        let mut specific_volume = 0.0;
        for (c, p) in COMPONENT_PROPERTIES.iter().enumerate() {
            specific_volume += fractions.values[c] / p.rho_liquid;
        }
        1.0 / specific_volume
    }

    /// Calculates the density of an ideal gas with the given mass fractions
    fn vapour_density(&self, fractions: &PvtComponents, tt: f64, pressure: f64) -> f64 {
        let molar_mass = 1.0 / fractions.moles().sum();
        pressure * MPA_TO_PA * molar_mass / (GAS_CONSTANT * tt)
    }
}

impl PvtFlash for WilsonFlash {
    fn compute_with_lumping(&self, temperature: f64, pressure: f64, masses: &PvtComponents) -> Result<FlashResult, StrError> {
        if pressure <= 0.0 {
            return Err("pressure must be positive to flash");
        }
        if !masses.is_finite() {
            return Err("cannot flash a composition with non-finite masses");
        }
        let tt = temperature + CELSIUS_TO_KELVIN;
        let mut masses = *masses;
        masses.values.iter_mut().for_each(|m| *m = f64::max(*m, 0.0));
        let total = masses.sum();

        // feed used for the properties of absent phases
        let feed = if total > 0.0 {
            masses * (1.0 / total)
        } else {
            let mut res = PvtComponents::single(ComponentId::C1, 0.5);
            res[ComponentId::C15PlusSat] = 0.5;
            res
        };

        // vapour fraction per component
        let mut result = FlashResult::default();
        if total > 0.0 {
            let moles = masses.moles();
            let z = moles * (1.0 / moles.sum());
            let k = self.k_values(temperature, pressure);
            let v = self.rachford_rice(&z, &k)?;
            for c in 0..NUM_COMPONENTS {
                let beta = if v >= 1.0 {
                    1.0
                } else {
                    v * k.values[c] / (1.0 + v * (k.values[c] - 1.0))
                };
                let vapour = masses.values[c] * beta;
                result.phase_composition[PhaseId::Vapour].values[c] = vapour;
                result.phase_composition[PhaseId::Liquid].values[c] = masses.values[c] - vapour;
            }
        }

        // phase properties
        for phase in PhaseId::ALL {
            let fractions = if result.phase_composition.phase_sum(phase) > 0.0 {
                result.phase_composition.mass_fractions(phase)
            } else {
                feed
            };
            let (rho, mu) = match phase {
                PhaseId::Vapour => (
                    self.vapour_density(&fractions, tt, pressure),
                    MU_VAPOUR_REFERENCE * f64::powf(tt / MU_REFERENCE_TEMPERATURE, 0.7),
                ),
                PhaseId::Liquid => (self.liquid_density(&fractions), self.liquid_viscosity(&fractions, tt)),
            };
            result.densities[phase] = rho;
            result.viscosities[phase] = mu;
        }
        Ok(result)
    }
}

/// Implements a trivial flash placing all components in the liquid phase
pub struct SinglePhaseFlash {
    /// Density of both phases (kg/m³)
    pub density: f64,

    /// Viscosity of both phases (Pa·s)
    pub viscosity: f64,
}

impl SinglePhaseFlash {
    /// Allocates a new instance
    pub fn new(density: f64, viscosity: f64) -> Self {
        SinglePhaseFlash { density, viscosity }
    }
}

impl PvtFlash for SinglePhaseFlash {
    fn compute_with_lumping(&self, _temperature: f64, _pressure: f64, masses: &PvtComponents) -> Result<FlashResult, StrError> {
        let mut result = FlashResult::default();
        result.phase_composition[PhaseId::Liquid] = *masses;
        result.densities = PvtPhaseValues::uniform(self.density);
        result.viscosities = PvtPhaseValues::uniform(self.viscosity);
        Ok(result)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{PvtFlash, SinglePhaseFlash, WilsonFlash};
    use crate::base::{ComponentId, PhaseId, PvtComponents};
    use russell_lab::approx_eq;

    #[test]
    fn methane_is_vapour_and_heavy_oil_is_liquid() {
        let flash = WilsonFlash::new();
        let gas = flash
            .compute_with_lumping(80.0, 20.0, &PvtComponents::single(ComponentId::C1, 10.0))
            .unwrap();
        approx_eq(gas.phase_composition.phase_sum(PhaseId::Vapour), 10.0, 1e-12);
        assert_eq!(gas.phase_composition.phase_sum(PhaseId::Liquid), 0.0);
        // ideal gas: ρ = P M / (R T)
        approx_eq(gas.densities[PhaseId::Vapour], 20e6 * 0.01604 / (8.314462618 * 353.15), 1e-9);

        let oil = flash
            .compute_with_lumping(80.0, 20.0, &PvtComponents::single(ComponentId::C15PlusSat, 10.0))
            .unwrap();
        approx_eq(oil.phase_composition.phase_sum(PhaseId::Liquid), 10.0, 1e-12);
        approx_eq(oil.densities[PhaseId::Liquid], 850.0, 1e-10);
        assert!(oil.viscosities[PhaseId::Liquid] > oil.viscosities[PhaseId::Vapour]);
    }

    #[test]
    fn two_phase_flash_conserves_mass() {
        let flash = WilsonFlash::new();
        let mut masses = PvtComponents::new();
        masses[ComponentId::C1] = 3.0;
        masses[ComponentId::C3] = 1.0;
        masses[ComponentId::C6To14Sat] = 2.0;
        masses[ComponentId::C15PlusSat] = 4.0;
        let res = flash.compute_with_lumping(100.0, 10.0, &masses).unwrap();
        let vapour = res.phase_composition.phase_sum(PhaseId::Vapour);
        let liquid = res.phase_composition.phase_sum(PhaseId::Liquid);
        assert!(vapour > 0.0 && liquid > 0.0);
        approx_eq(vapour + liquid, 10.0, 1e-12);
        for id in ComponentId::ALL {
            approx_eq(res.phase_composition.total()[id], masses[id], 1e-12);
        }
        // methane prefers the vapour; heavy components prefer the liquid
        let wv = res.phase_composition.mass_fractions(PhaseId::Vapour);
        let wl = res.phase_composition.mass_fractions(PhaseId::Liquid);
        assert!(wv[ComponentId::C1] > wl[ComponentId::C1]);
        assert!(wv[ComponentId::C15PlusSat] < wl[ComponentId::C15PlusSat]);
        assert!(res.densities[PhaseId::Liquid] > res.densities[PhaseId::Vapour]);
    }

    #[test]
    fn flash_captures_errors() {
        let flash = WilsonFlash::new();
        let masses = PvtComponents::single(ComponentId::C1, 1.0);
        assert_eq!(
            flash.compute_with_lumping(50.0, 0.0, &masses).err(),
            Some("pressure must be positive to flash")
        );
        let bad = PvtComponents::single(ComponentId::C1, f64::NAN);
        assert_eq!(
            flash.compute_with_lumping(50.0, 10.0, &bad).err(),
            Some("cannot flash a composition with non-finite masses")
        );
        let empty = flash.compute_with_lumping(50.0, 10.0, &PvtComponents::new()).unwrap();
        assert_eq!(empty.phase_composition.total().sum(), 0.0);
        assert!(empty.densities[PhaseId::Vapour] > 0.0);
        assert!(empty.densities[PhaseId::Liquid] > 0.0);
    }

    #[test]
    fn single_phase_flash_works() {
        let flash = SinglePhaseFlash::new(800.0, 1e-3);
        let masses = PvtComponents::single(ComponentId::C1, 2.0);
        let res = flash.compute_with_lumping(0.0, 0.0, &masses).unwrap();
        assert_eq!(res.phase_composition[PhaseId::Liquid], masses);
        assert_eq!(res.phase_composition.phase_sum(PhaseId::Vapour), 0.0);
        assert_eq!(res.densities.values, [800.0, 800.0]);
        assert_eq!(res.viscosities.values, [1e-3, 1e-3]);
    }
}
