use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

/// Defines the number of (lumped) hydrocarbon components
pub const NUM_COMPONENTS: usize = 13;

/// Defines the number of mobile hydrocarbon phases
pub const NUM_PHASES: usize = 2;

/// Enumerates the lumped hydrocarbon components
///
/// The order is fixed for the whole run; all component vectors use these indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    Asphaltene,
    Resin,
    C15PlusAro,
    C15PlusSat,
    C6To14Aro,
    C6To14Sat,
    C5,
    C4,
    C3,
    C2,
    C1,
    COx,
    N2,
}

impl ComponentId {
    /// Holds all components in index order
    pub const ALL: [ComponentId; NUM_COMPONENTS] = [
        ComponentId::Asphaltene,
        ComponentId::Resin,
        ComponentId::C15PlusAro,
        ComponentId::C15PlusSat,
        ComponentId::C6To14Aro,
        ComponentId::C6To14Sat,
        ComponentId::C5,
        ComponentId::C4,
        ComponentId::C3,
        ComponentId::C2,
        ComponentId::C1,
        ComponentId::COx,
        ComponentId::N2,
    ];

    /// Returns the position of the component in the component vectors
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the name of the component
    pub fn name(self) -> &'static str {
        match self {
            ComponentId::Asphaltene => "asphaltenes",
            ComponentId::Resin => "resins",
            ComponentId::C15PlusAro => "C15+Aro",
            ComponentId::C15PlusSat => "C15+Sat",
            ComponentId::C6To14Aro => "C6-14Aro",
            ComponentId::C6To14Sat => "C6-14Sat",
            ComponentId::C5 => "C5",
            ComponentId::C4 => "C4",
            ComponentId::C3 => "C3",
            ComponentId::C2 => "C2",
            ComponentId::C1 => "C1",
            ComponentId::COx => "COx",
            ComponentId::N2 => "N2",
        }
    }

    /// Returns the molar mass in kg/mol
    pub fn molar_mass(self) -> f64 {
        match self {
            ComponentId::Asphaltene => 0.7979,
            ComponentId::Resin => 0.6105,
            ComponentId::C15PlusAro => 0.4613,
            ComponentId::C15PlusSat => 0.2656,
            ComponentId::C6To14Aro => 0.1346,
            ComponentId::C6To14Sat => 0.1424,
            ComponentId::C5 => 0.07215,
            ComponentId::C4 => 0.05812,
            ComponentId::C3 => 0.04410,
            ComponentId::C2 => 0.03007,
            ComponentId::C1 => 0.01604,
            ComponentId::COx => 0.04401,
            ComponentId::N2 => 0.02801,
        }
    }
}

/// Holds one value (mass, concentration, K-value, ...) per hydrocarbon component
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PvtComponents {
    pub values: [f64; NUM_COMPONENTS],
}

impl PvtComponents {
    /// Allocates a new instance with all values equal to zero
    pub fn new() -> Self {
        PvtComponents {
            values: [0.0; NUM_COMPONENTS],
        }
    }

    /// Allocates a new instance with a single non-zero component
    pub fn single(component: ComponentId, value: f64) -> Self {
        let mut res = PvtComponents::new();
        res[component] = value;
        res
    }

    /// Sets all values to the given one
    pub fn fill(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    /// Returns the sum of all values
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Returns the smallest value
    pub fn min(&self) -> f64 {
        self.values.iter().fold(f64::INFINITY, |acc, v| f64::min(acc, *v))
    }

    /// Performs self += alpha * other
    pub fn add_scaled(&mut self, alpha: f64, other: &PvtComponents) {
        for c in 0..NUM_COMPONENTS {
            self.values[c] += alpha * other.values[c];
        }
    }

    /// Multiplies all values by alpha
    pub fn scale(&mut self, alpha: f64) {
        self.values.iter_mut().for_each(|v| *v *= alpha);
    }

    /// Returns the number of moles per unit of the stored mass quantity
    pub fn moles(&self) -> PvtComponents {
        let mut res = PvtComponents::new();
        for id in ComponentId::ALL {
            res[id] = self[id] / id.molar_mass();
        }
        res
    }

    /// Returns true if all values are finite
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

impl Default for PvtComponents {
    fn default() -> Self {
        PvtComponents::new()
    }
}

impl Index<ComponentId> for PvtComponents {
    type Output = f64;
    #[inline]
    fn index(&self, id: ComponentId) -> &f64 {
        &self.values[id.index()]
    }
}

impl IndexMut<ComponentId> for PvtComponents {
    #[inline]
    fn index_mut(&mut self, id: ComponentId) -> &mut f64 {
        &mut self.values[id.index()]
    }
}

impl Add for PvtComponents {
    type Output = PvtComponents;
    fn add(mut self, other: PvtComponents) -> PvtComponents {
        self += other;
        self
    }
}

impl Sub for PvtComponents {
    type Output = PvtComponents;
    fn sub(mut self, other: PvtComponents) -> PvtComponents {
        self.add_scaled(-1.0, &other);
        self
    }
}

impl AddAssign for PvtComponents {
    fn add_assign(&mut self, other: PvtComponents) {
        self.add_scaled(1.0, &other);
    }
}

impl Mul<f64> for PvtComponents {
    type Output = PvtComponents;
    fn mul(mut self, alpha: f64) -> PvtComponents {
        self.scale(alpha);
        self
    }
}

/// Enumerates the mobile hydrocarbon phases
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseId {
    Vapour,
    Liquid,
}

impl PhaseId {
    /// Holds all phases in index order
    pub const ALL: [PhaseId; NUM_PHASES] = [PhaseId::Vapour, PhaseId::Liquid];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Holds one value (density, viscosity, pressure, ...) per phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PvtPhaseValues {
    pub values: [f64; NUM_PHASES],
}

impl PvtPhaseValues {
    /// Allocates a new instance with all values equal to zero
    pub fn new() -> Self {
        PvtPhaseValues { values: [0.0; NUM_PHASES] }
    }

    /// Allocates a new instance with the same value for both phases
    pub fn uniform(value: f64) -> Self {
        PvtPhaseValues {
            values: [value; NUM_PHASES],
        }
    }
}

impl Index<PhaseId> for PvtPhaseValues {
    type Output = f64;
    #[inline]
    fn index(&self, id: PhaseId) -> &f64 {
        &self.values[id.index()]
    }
}

impl IndexMut<PhaseId> for PvtPhaseValues {
    #[inline]
    fn index_mut(&mut self, id: PhaseId) -> &mut f64 {
        &mut self.values[id.index()]
    }
}

/// Holds the component values split into vapour and liquid phases
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PvtPhaseComponents {
    pub phases: [PvtComponents; NUM_PHASES],
}

impl PvtPhaseComponents {
    /// Allocates a new instance with all values equal to zero
    pub fn new() -> Self {
        PvtPhaseComponents {
            phases: [PvtComponents::new(); NUM_PHASES],
        }
    }

    /// Sets all values to zero
    pub fn zero(&mut self) {
        self.phases.iter_mut().for_each(|p| p.fill(0.0));
    }

    /// Returns the sum of the values of one phase
    pub fn phase_sum(&self, phase: PhaseId) -> f64 {
        self.phases[phase.index()].sum()
    }

    /// Returns the sum over both phases
    pub fn total(&self) -> PvtComponents {
        self.phases[0] + self.phases[1]
    }

    /// Returns the mass fractions of the components in one phase (zero if the phase is absent)
    pub fn mass_fractions(&self, phase: PhaseId) -> PvtComponents {
        let sum = self.phase_sum(phase);
        if sum <= 0.0 {
            return PvtComponents::new();
        }
        self.phases[phase.index()] * (1.0 / sum)
    }
}

impl Index<PhaseId> for PvtPhaseComponents {
    type Output = PvtComponents;
    #[inline]
    fn index(&self, id: PhaseId) -> &PvtComponents {
        &self.phases[id.index()]
    }
}

impl IndexMut<PhaseId> for PvtPhaseComponents {
    #[inline]
    fn index_mut(&mut self, id: PhaseId) -> &mut PvtComponents {
        &mut self.phases[id.index()]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
