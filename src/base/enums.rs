use serde::{Deserialize, Serialize};

/// Defines the fundamental properties supplied by the constitutive-law provider
///
/// Pressures are given in MPa, temperatures in ℃, depths in m (positive downwards).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FundamentalProperty {
    /// Depth of the element centre
    Depth,

    /// Vertical effective stress
    Ves,

    /// Historical maximum of the vertical effective stress
    MaxVes,

    /// Hydrostatic pressure
    HydrostaticPressure,

    /// Lithostatic pressure
    LithostaticPressure,

    /// Pore (water) pressure
    PorePressure,

    /// Temperature
    Temperature,
}

impl FundamentalProperty {
    /// Holds all fundamental properties
    pub const ALL: [FundamentalProperty; 7] = [
        FundamentalProperty::Depth,
        FundamentalProperty::Ves,
        FundamentalProperty::MaxVes,
        FundamentalProperty::HydrostaticPressure,
        FundamentalProperty::LithostaticPressure,
        FundamentalProperty::PorePressure,
        FundamentalProperty::Temperature,
    ];

    /// Returns the name of the property
    pub fn name(&self) -> &'static str {
        match self {
            FundamentalProperty::Depth => "Depth",
            FundamentalProperty::Ves => "Ves",
            FundamentalProperty::MaxVes => "MaxVes",
            FundamentalProperty::HydrostaticPressure => "HydroStaticPressure",
            FundamentalProperty::LithostaticPressure => "LithoStaticPressure",
            FundamentalProperty::PorePressure => "Pressure",
            FundamentalProperty::Temperature => "Temperature",
        }
    }
}

/// Selects the start (previous) or end (current) of a pressure/temperature time-step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeLevel {
    Previous,
    Current,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
