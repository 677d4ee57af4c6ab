use super::{ParamAdsorption, ParamCapillary, ParamLithology, ParamRelPerm};

/// Holds samples of lithology and fluid-rock interaction parameters
pub struct SampleParams {}

impl SampleParams {
    /// Returns sample parameters for a clean sandstone
    pub fn param_sandstone() -> ParamLithology {
        ParamLithology {
            surface_porosity: 0.41,
            minimum_porosity: 0.03,
            compaction_coefficient: 0.031, // 1/MPa
            surface_permeability: 6000.0,  // mD
            permeability_gradient: 15.0,
            anisotropy: 1.0,
            capillary_entry_pressure: 0.01, // MPa
        }
    }

    /// Returns sample parameters for a typical shale (seal or source rock)
    pub fn param_shale() -> ParamLithology {
        ParamLithology {
            surface_porosity: 0.70,
            minimum_porosity: 0.05,
            compaction_coefficient: 0.083, // 1/MPa
            surface_permeability: 0.01,    // mD
            permeability_gradient: 8.0,
            anisotropy: 1.5,
            capillary_entry_pressure: 1.0, // MPa
        }
    }

    /// Returns a lithology with constant porosity and permeability
    ///
    /// * `porosity` -- constant porosity
    /// * `permeability` -- constant (isotropic) permeability in mD
    pub fn param_uniform_rock(porosity: f64, permeability: f64) -> ParamLithology {
        ParamLithology {
            surface_porosity: porosity,
            minimum_porosity: porosity,
            compaction_coefficient: 0.0,
            surface_permeability: permeability,
            permeability_gradient: 0.0,
            anisotropy: 1.0,
            capillary_entry_pressure: 0.0,
        }
    }

    /// Returns sample Brooks-Corey relative permeability parameters
    pub fn param_rel_perm(residual_hc_saturation: f64) -> ParamRelPerm {
        ParamRelPerm {
            residual_hc_saturation,
            residual_water_saturation: 0.1,
            exponent: 2.0,
        }
    }

    /// Returns sample capillary pressure parameters
    pub fn param_capillary() -> ParamCapillary {
        ParamCapillary {
            lambda: 2.0,
            pc_max: 50.0, // MPa
        }
    }

    /// Returns sample Langmuir adsorption parameters
    ///
    /// * `toc_based` -- selects the function whose capacity is proportional to the TOC of the formation
    pub fn param_adsorption(toc_based: bool) -> ParamAdsorption {
        if toc_based {
            ParamAdsorption {
                function: "LangmuirTOC".to_string(),
                capacity: 0.8, // kg/m³ per wt% TOC
                langmuir_pressure: 8.0,
                temperature_coefficient: 0.005,
            }
        } else {
            ParamAdsorption {
                function: "Langmuir".to_string(),
                capacity: 4.0, // kg/m³
                langmuir_pressure: 8.0,
                temperature_coefficient: 0.005,
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
