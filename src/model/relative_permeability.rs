use crate::base::ParamRelPerm;

/// Implements the Brooks-Corey relative permeability of a hydrocarbon phase
///
/// ```text
///       ⎧ 0                              if S ≤ Sr
/// kr =  ⎨ ((S - Sr) / (1 - Sr - Swr))ⁿ   if Sr < S < 1 - Swr
///       ⎩ 1                              otherwise
/// ```
pub struct RelPermModel {
    residual_hc_saturation: f64,
    residual_water_saturation: f64,
    exponent: f64,
}

impl RelPermModel {
    /// Allocates a new instance
    ///
    /// * `scaling` -- scaling of the residual hydrocarbon saturation
    pub fn new(param: &ParamRelPerm, scaling: f64) -> Self {
        RelPermModel {
            residual_hc_saturation: param.residual_hc_saturation * scaling,
            residual_water_saturation: param.residual_water_saturation,
            exponent: param.exponent,
        }
    }

    /// Returns the (scaled) residual hydrocarbon saturation
    pub fn residual_hc_saturation(&self) -> f64 {
        self.residual_hc_saturation
    }

    /// Calculates the relative permeability of a phase with saturation `s`
    pub fn calc(&self, s: f64) -> f64 {
        let sr = self.residual_hc_saturation;
        if s <= sr {
            return 0.0;
        }
        let den = 1.0 - sr - self.residual_water_saturation;
        let se = f64::min((s - sr) / den, 1.0);
        f64::powf(se, self.exponent)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
