use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Defines the number of immobile (retained) species
pub const NUM_IMMOBILE_SPECIES: usize = 5;

/// Enumerates the immobile species produced by secondary cracking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImmobileSpeciesId {
    Precoke,
    Coke1,
    Hetero1,
    Coke2,
    CokeS,
}

impl ImmobileSpeciesId {
    /// Holds all species in index order
    pub const ALL: [ImmobileSpeciesId; NUM_IMMOBILE_SPECIES] = [
        ImmobileSpeciesId::Precoke,
        ImmobileSpeciesId::Coke1,
        ImmobileSpeciesId::Hetero1,
        ImmobileSpeciesId::Coke2,
        ImmobileSpeciesId::CokeS,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the name of the species
    pub fn name(self) -> &'static str {
        match self {
            ImmobileSpeciesId::Precoke => "precoke",
            ImmobileSpeciesId::Coke1 => "coke1",
            ImmobileSpeciesId::Hetero1 => "hetero1",
            ImmobileSpeciesId::Coke2 => "coke2",
            ImmobileSpeciesId::CokeS => "cokeS",
        }
    }

    /// Returns the default density in kg/m³
    pub fn default_density(self) -> f64 {
        match self {
            ImmobileSpeciesId::Precoke => 1100.0,
            ImmobileSpeciesId::Coke1 => 1200.0,
            ImmobileSpeciesId::Hetero1 => 1000.0,
            ImmobileSpeciesId::Coke2 => 1200.0,
            ImmobileSpeciesId::CokeS => 1300.0,
        }
    }

    /// Returns the default densities of all species
    pub fn default_densities() -> [f64; NUM_IMMOBILE_SPECIES] {
        let mut res = [0.0; NUM_IMMOBILE_SPECIES];
        for id in ImmobileSpeciesId::ALL {
            res[id.index()] = id.default_density();
        }
        res
    }
}

/// Holds the retained immobile species of one element
///
/// Values are concentrations in kg per m³ of pore space, like the mobile components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImmobileSpeciesValues {
    pub values: [f64; NUM_IMMOBILE_SPECIES],
}

impl ImmobileSpeciesValues {
    /// Allocates a new instance with all values equal to zero
    pub fn new() -> Self {
        ImmobileSpeciesValues {
            values: [0.0; NUM_IMMOBILE_SPECIES],
        }
    }

    /// Returns the sum of all species
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Returns the volume occupied by the retained species per unit pore volume
    pub fn retained_volume(&self, densities: &[f64; NUM_IMMOBILE_SPECIES]) -> f64 {
        let mut volume = 0.0;
        for s in 0..NUM_IMMOBILE_SPECIES {
            volume += self.values[s] / densities[s];
        }
        volume
    }
}

impl Index<ImmobileSpeciesId> for ImmobileSpeciesValues {
    type Output = f64;
    #[inline]
    fn index(&self, id: ImmobileSpeciesId) -> &f64 {
        &self.values[id.index()]
    }
}

impl IndexMut<ImmobileSpeciesId> for ImmobileSpeciesValues {
    #[inline]
    fn index_mut(&mut self, id: ImmobileSpeciesId) -> &mut f64 {
        &mut self.values[id.index()]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ImmobileSpeciesId, ImmobileSpeciesValues};
    use russell_lab::approx_eq;

    #[test]
    fn retained_volume_works() {
        let densities = ImmobileSpeciesId::default_densities();
        let mut values = ImmobileSpeciesValues::new();
        assert_eq!(values.retained_volume(&densities), 0.0);
        values[ImmobileSpeciesId::Coke1] = 120.0;
        values[ImmobileSpeciesId::Hetero1] = 50.0;
        approx_eq(values.retained_volume(&densities), 0.1 + 0.05, 1e-15);
        assert_eq!(values.sum(), 170.0);
    }
}
