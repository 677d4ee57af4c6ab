use serde::{Deserialize, Serialize};

/// Holds parameters for the compaction and permeability laws of a lithology
///
/// ```text
/// φ = φmin + (φ0 - φmin) · exp(-c · max(σ', σ'max))
/// kv = k0 · 10^(a · (φ - φ0))
/// kh = anisotropy · kv
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamLithology {
    /// Surface porosity φ0
    pub surface_porosity: f64,

    /// Minimum porosity φmin
    pub minimum_porosity: f64,

    /// Compaction coefficient c (1/MPa)
    pub compaction_coefficient: f64,

    /// Vertical permeability at surface porosity k0 (mD)
    pub surface_permeability: f64,

    /// Permeability change per unit of porosity a (log10 mD)
    pub permeability_gradient: f64,

    /// Ratio between horizontal and vertical permeabilities
    pub anisotropy: f64,

    /// Capillary entry pressure of the (water-wet) rock (MPa)
    pub capillary_entry_pressure: f64,
}

impl ParamLithology {
    /// Validates the parameters
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.surface_porosity <= 0.0 || self.surface_porosity >= 1.0 {
            return Some(format!(
                "surface_porosity = {:?} is incorrect; it must be in (0, 1)",
                self.surface_porosity
            ));
        }
        if self.minimum_porosity < 0.0 || self.minimum_porosity > self.surface_porosity {
            return Some(format!(
                "minimum_porosity = {:?} is incorrect; it must be in [0, surface_porosity]",
                self.minimum_porosity
            ));
        }
        if self.compaction_coefficient < 0.0 {
            return Some(format!(
                "compaction_coefficient = {:?} is incorrect; it must be ≥ 0.0",
                self.compaction_coefficient
            ));
        }
        if self.surface_permeability < 0.0 {
            return Some(format!(
                "surface_permeability = {:?} is incorrect; it must be ≥ 0.0",
                self.surface_permeability
            ));
        }
        if self.anisotropy <= 0.0 {
            return Some(format!(
                "anisotropy = {:?} is incorrect; it must be > 0.0",
                self.anisotropy
            ));
        }
        if self.capillary_entry_pressure < 0.0 {
            return Some(format!(
                "capillary_entry_pressure = {:?} is incorrect; it must be ≥ 0.0",
                self.capillary_entry_pressure
            ));
        }
        None
    }
}

/// Holds parameters for the Brooks-Corey relative permeability of hydrocarbon phases
///
/// ```text
/// kr = ((S - Sr) / (1 - Sr - Swr))^n
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRelPerm {
    /// Residual hydrocarbon saturation Sr (before scaling)
    pub residual_hc_saturation: f64,

    /// Irreducible water saturation Swr
    pub residual_water_saturation: f64,

    /// Brooks-Corey exponent n
    pub exponent: f64,
}

/// Holds parameters for the Brooks-Corey capillary pressure curve
///
/// ```text
/// pc = pe · Swe^(-1/λ)    (capped at pc_max)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamCapillary {
    /// Pore size distribution index λ
    pub lambda: f64,

    /// Maximum capillary pressure (MPa)
    pub pc_max: f64,
}

/// Holds parameters for the adsorption of methane in a source rock
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamAdsorption {
    /// Key of the adsorption function in the adsorption registry
    pub function: String,

    /// Langmuir capacity (kg/m³ of pore space); per wt% TOC for the TOC-based function
    pub capacity: f64,

    /// Langmuir pressure (MPa)
    pub langmuir_pressure: f64,

    /// Relative loss of capacity per ℃ above the surface temperature
    pub temperature_coefficient: f64,
}
