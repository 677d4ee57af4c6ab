use crate::base::{ParamLithology, MILLI_DARCY_TO_M2};

/// Implements the compaction and permeability laws of a lithology
///
/// ```text
/// φ  = φmin + (φ0 - φmin) · exp(-c · max(σ', σ'max))
/// kv = k0 · 10^(a · (φ - φ0))
/// kh = anisotropy · kv
/// ```
pub struct CompactionModel<'a> {
    param: &'a ParamLithology,
}

impl<'a> CompactionModel<'a> {
    /// Allocates a new instance
    pub fn new(param: &'a ParamLithology) -> Self {
        CompactionModel { param }
    }

    /// Calculates the porosity given the (maximum) vertical effective stresses in MPa
    pub fn porosity(&self, ves: f64, max_ves: f64) -> f64 {
        let p = self.param;
        let sigma = f64::max(f64::max(ves, max_ves), 0.0);
        p.minimum_porosity + (p.surface_porosity - p.minimum_porosity) * f64::exp(-p.compaction_coefficient * sigma)
    }

    /// Calculates the vertical permeability in m²
    pub fn permeability_vertical(&self, porosity: f64) -> f64 {
        let p = self.param;
        let md = p.surface_permeability * f64::powf(10.0, p.permeability_gradient * (porosity - p.surface_porosity));
        md * MILLI_DARCY_TO_M2
    }

    /// Calculates the horizontal permeability in m²
    pub fn permeability_horizontal(&self, porosity: f64) -> f64 {
        self.param.anisotropy * self.permeability_vertical(porosity)
    }

    /// Calculates the bulk thickness of an element given the thickness of its solid part
    ///
    /// Returns zero for pinched-out elements.
    pub fn element_thickness(&self, solid_thickness: f64, porosity: f64) -> f64 {
        if solid_thickness <= 0.0 {
            return 0.0;
        }
        solid_thickness / (1.0 - porosity)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
