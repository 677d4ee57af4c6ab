use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds the volume fractions of the pore space occupied by each phase
///
/// The four fractions add up to one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Saturation {
    pub water: f64,
    pub vapour: f64,
    pub liquid: f64,
    pub immobile: f64,
}

/// Defines the reasons why a saturation cannot be computed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaturationError {
    /// There is hydrocarbon mass but no pore volume to hold it
    ZeroTotalVolume,

    /// The hydrocarbon volume exceeds the pore volume
    ExceedsPoreVolume,

    /// Some input volume is NaN or infinite
    NotFinite,
}

impl Saturation {
    /// Returns a fully water-saturated state
    pub fn new() -> Self {
        Saturation {
            water: 1.0,
            vapour: 0.0,
            liquid: 0.0,
            immobile: 0.0,
        }
    }

    /// Computes the saturation from hydrocarbon volumes per unit pore volume
    ///
    /// On error, the returned saturation is finite and normalised so that callers
    /// may keep going and report the failure later.
    pub fn from_volumes(vapour: f64, liquid: f64, immobile: f64, tolerance: f64) -> (Saturation, Option<SaturationError>) {
        if !vapour.is_finite() || !liquid.is_finite() || !immobile.is_finite() {
            return (Saturation::new(), Some(SaturationError::NotFinite));
        }
        let (vapour, liquid, immobile) = (f64::max(vapour, 0.0), f64::max(liquid, 0.0), f64::max(immobile, 0.0));
        let hc = vapour + liquid + immobile;
        if hc > 1.0 + tolerance {
            let saturation = Saturation {
                water: 0.0,
                vapour: vapour / hc,
                liquid: liquid / hc,
                immobile: immobile / hc,
            };
            return (saturation, Some(SaturationError::ExceedsPoreVolume));
        }
        let saturation = Saturation {
            water: f64::max(1.0 - hc, 0.0),
            vapour,
            liquid,
            immobile,
        };
        (saturation, None)
    }

    /// Returns the total hydrocarbon saturation
    pub fn hc(&self) -> f64 {
        self.vapour + self.liquid + self.immobile
    }

    /// Returns the sum of all fractions
    pub fn sum(&self) -> f64 {
        self.water + self.hc()
    }

    /// Performs self += alpha * other
    pub fn add_scaled(&mut self, alpha: f64, other: &Saturation) {
        self.water += alpha * other.water;
        self.vapour += alpha * other.vapour;
        self.liquid += alpha * other.liquid;
        self.immobile += alpha * other.immobile;
    }
}

impl Default for Saturation {
    fn default() -> Self {
        Saturation::new()
    }
}

impl fmt::Display for Saturation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sw = {:.6}, Sv = {:.6}, Sl = {:.6}, Si = {:.6}",
            self.water, self.vapour, self.liquid, self.immobile
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Saturation, SaturationError};
    use russell_lab::approx_eq;

    #[test]
    fn from_volumes_works() {
        let (s, err) = Saturation::from_volumes(0.1, 0.2, 0.05, 1e-9);
        assert_eq!(err, None);
        approx_eq(s.water, 0.65, 1e-15);
        approx_eq(s.sum(), 1.0, 1e-15);
        approx_eq(s.hc(), 0.35, 1e-15);
        assert_eq!(
            format!("{}", s),
            "Sw = 0.650000, Sv = 0.100000, Sl = 0.200000, Si = 0.050000"
        );
    }

    #[test]
    fn from_volumes_captures_errors() {
        let (s, err) = Saturation::from_volumes(1.0, 1.0, 0.0, 1e-9);
        assert_eq!(err, Some(SaturationError::ExceedsPoreVolume));
        assert_eq!(s.water, 0.0);
        approx_eq(s.sum(), 1.0, 1e-15);

        let (s, err) = Saturation::from_volumes(f64::NAN, 0.0, 0.0, 1e-9);
        assert_eq!(err, Some(SaturationError::NotFinite));
        assert_eq!(s, Saturation::new());
    }

    #[test]
    fn small_excess_is_tolerated() {
        let (s, err) = Saturation::from_volumes(0.5, 0.5 + 1e-12, 0.0, 1e-9);
        assert_eq!(err, None);
        assert_eq!(s.water, 0.0);
    }
}
