use crate::base::ParamCapillary;

/// Implements the Brooks-Corey capillary pressure
///
/// ```text
/// Swe = (Sw - Swr) / (1 - Swr)
/// pc  = min(pe · Swe^(-1/λ), pc_max)
/// ```
pub struct CapillaryModel {
    lambda: f64,
    pc_max: f64,
    residual_water_saturation: f64,
}

impl CapillaryModel {
    /// Allocates a new instance
    pub fn new(param: &ParamCapillary, residual_water_saturation: f64) -> Self {
        CapillaryModel {
            lambda: param.lambda,
            pc_max: param.pc_max,
            residual_water_saturation,
        }
    }

    /// Calculates the capillary pressure (MPa)
    ///
    /// * `entry_pressure` -- capillary entry pressure of the rock (MPa)
    /// * `water_saturation` -- water saturation
    pub fn calc(&self, entry_pressure: f64, water_saturation: f64) -> f64 {
        if entry_pressure <= 0.0 {
            return 0.0;
        }
        let swr = self.residual_water_saturation;
        let swe = (water_saturation - swr) / (1.0 - swr);
        if swe <= 0.0 {
            return self.pc_max;
        }
        f64::min(entry_pressure * f64::powf(f64::min(swe, 1.0), -1.0 / self.lambda), self.pc_max)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
