use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Defines the number of faces of a (cuboid) element
pub const NUM_FACES: usize = 6;

/// Identifies the faces of a cuboid element
///
/// The `k` index increases upwards (towards the surface), hence `Bottom` is the
/// deep face and `Top` the shallow one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Bottom,
    Front,
    Right,
    Back,
    Left,
    Top,
}

impl Face {
    /// Holds all faces in index order
    pub const ALL: [Face; NUM_FACES] = [Face::Bottom, Face::Front, Face::Right, Face::Back, Face::Left, Face::Top];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the face of the neighbour that coincides with this face
    pub fn opposite(self) -> Face {
        match self {
            Face::Bottom => Face::Top,
            Face::Front => Face::Back,
            Face::Right => Face::Left,
            Face::Back => Face::Front,
            Face::Left => Face::Right,
            Face::Top => Face::Bottom,
        }
    }

    /// Returns the (i,j,k) increments to reach the neighbour across this face
    pub fn offset(self) -> (isize, isize, isize) {
        match self {
            Face::Bottom => (0, 0, -1),
            Face::Front => (0, -1, 0),
            Face::Right => (1, 0, 0),
            Face::Back => (0, 1, 0),
            Face::Left => (-1, 0, 0),
            Face::Top => (0, 0, 1),
        }
    }

    /// Returns true if the face normal is vertical
    pub fn is_vertical(self) -> bool {
        matches!(self, Face::Bottom | Face::Top)
    }
}

/// Holds one value (flux, permeability, area, ...) per element face
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementFaceValues {
    pub values: [f64; NUM_FACES],
}

impl ElementFaceValues {
    /// Allocates a new instance with all values equal to zero
    pub fn new() -> Self {
        ElementFaceValues { values: [0.0; NUM_FACES] }
    }

    /// Sets all values to the given one
    pub fn fill(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    /// Returns the sum of all values
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Multiplies all values by alpha
    pub fn scale(&mut self, alpha: f64) {
        self.values.iter_mut().for_each(|v| *v *= alpha);
    }
}

impl Index<Face> for ElementFaceValues {
    type Output = f64;
    #[inline]
    fn index(&self, face: Face) -> &f64 {
        &self.values[face.index()]
    }
}

impl IndexMut<Face> for ElementFaceValues {
    #[inline]
    fn index_mut(&mut self, face: Face) -> &mut f64 {
        &mut self.values[face.index()]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
