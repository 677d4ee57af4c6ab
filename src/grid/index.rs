use crate::base::Face;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds the global (i,j,k) index of an element
///
/// The k index increases upwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalIndex {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

/// Holds the index of an element relative to the first (ghost-inclusive) element of a local array
///
/// Local indices are only produced by [crate::grid::ElementGrid::to_local], thus
/// global and local indices cannot be mixed up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalIndex {
    pub(crate) i: usize,
    pub(crate) j: usize,
    pub(crate) k: usize,
}

impl GlobalIndex {
    /// Allocates a new instance
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        GlobalIndex { i, j, k }
    }

    /// Returns the index of the element across the given face
    ///
    /// Returns None if the neighbour would have a negative index. The upper bounds
    /// are checked by the subdomain.
    pub fn neighbour(self, face: Face) -> Option<GlobalIndex> {
        let (di, dj, dk) = face.offset();
        Some(GlobalIndex {
            i: self.i.checked_add_signed(di)?,
            j: self.j.checked_add_signed(dj)?,
            k: self.k.checked_add_signed(dk)?,
        })
    }
}

impl fmt::Display for GlobalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.i, self.j, self.k)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::GlobalIndex;
    use crate::base::Face;

    #[test]
    fn neighbour_works() {
        let index = GlobalIndex::new(0, 1, 2);
        assert_eq!(index.neighbour(Face::Left), None);
        assert_eq!(index.neighbour(Face::Right), Some(GlobalIndex::new(1, 1, 2)));
        assert_eq!(index.neighbour(Face::Front), Some(GlobalIndex::new(0, 0, 2)));
        assert_eq!(index.neighbour(Face::Back), Some(GlobalIndex::new(0, 2, 2)));
        assert_eq!(index.neighbour(Face::Bottom), Some(GlobalIndex::new(0, 1, 1)));
        assert_eq!(index.neighbour(Face::Top), Some(GlobalIndex::new(0, 1, 3)));
        assert_eq!(format!("{}", index), "(0,1,2)");
    }
}
