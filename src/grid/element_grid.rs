use super::{GlobalIndex, LocalIndex};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Holds one value per element of a rank-local (ghost-inclusive) block of the grid
///
/// The values are stored contiguously with i running fastest, then j, then k.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementGrid<T> {
    /// First (ghost-inclusive) global index of the block
    first: GlobalIndex,

    /// Number of elements along i, j, and k
    dims: (usize, usize, usize),

    /// Contiguous storage
    data: Vec<T>,
}

/// Holds one flag per element (e.g., contains or transports hydrocarbons)
pub type Boolean3DArray = ElementGrid<bool>;

impl<T: Clone> ElementGrid<T> {
    /// Allocates a new instance covering first..=last with all values equal to `value`
    pub fn new(first: GlobalIndex, last: GlobalIndex, value: T) -> Self {
        debug_assert!(last.i >= first.i && last.j >= first.j && last.k >= first.k);
        let dims = (last.i - first.i + 1, last.j - first.j + 1, last.k - first.k + 1);
        ElementGrid {
            first,
            dims,
            data: vec![value; dims.0 * dims.1 * dims.2],
        }
    }

    /// Sets all values
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value.clone());
    }
}

impl<T> ElementGrid<T> {
    /// Translates a global index into a local one
    ///
    /// The index must lie within the ghost-inclusive bounds of the block.
    #[inline]
    pub fn to_local(&self, index: GlobalIndex) -> LocalIndex {
        debug_assert!(self.contains(index), "index {} is out of bounds", index);
        LocalIndex {
            i: index.i - self.first.i,
            j: index.j - self.first.j,
            k: index.k - self.first.k,
        }
    }

    /// Returns true if the global index lies within the block
    #[inline]
    pub fn contains(&self, index: GlobalIndex) -> bool {
        index.i >= self.first.i
            && index.j >= self.first.j
            && index.k >= self.first.k
            && index.i < self.first.i + self.dims.0
            && index.j < self.first.j + self.dims.1
            && index.k < self.first.k + self.dims.2
    }

    /// Returns the number of elements along i, j, and k
    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    /// Returns the total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn offset(&self, local: LocalIndex) -> usize {
        (local.k * self.dims.1 + local.j) * self.dims.0 + local.i
    }

    /// Returns an iterator over (global index, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (GlobalIndex, &T)> + '_ {
        let (ni, nj, _) = self.dims;
        self.data.iter().enumerate().map(move |(p, v)| {
            let index = GlobalIndex {
                i: self.first.i + p % ni,
                j: self.first.j + (p / ni) % nj,
                k: self.first.k + p / (ni * nj),
            };
            (index, v)
        })
    }

    /// Returns an iterator over the values
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }
}

impl<T> Index<LocalIndex> for ElementGrid<T> {
    type Output = T;
    #[inline]
    fn index(&self, local: LocalIndex) -> &T {
        &self.data[self.offset(local)]
    }
}

impl<T> IndexMut<LocalIndex> for ElementGrid<T> {
    #[inline]
    fn index_mut(&mut self, local: LocalIndex) -> &mut T {
        let p = self.offset(local);
        &mut self.data[p]
    }
}

impl<T> Index<GlobalIndex> for ElementGrid<T> {
    type Output = T;
    #[inline]
    fn index(&self, index: GlobalIndex) -> &T {
        &self[self.to_local(index)]
    }
}

impl<T> IndexMut<GlobalIndex> for ElementGrid<T> {
    #[inline]
    fn index_mut(&mut self, index: GlobalIndex) -> &mut T {
        let local = self.to_local(index);
        &mut self[local]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Boolean3DArray, ElementGrid};
    use crate::grid::GlobalIndex;

    #[test]
    fn index_transformation_works() {
        let first = GlobalIndex::new(2, 3, 1);
        let last = GlobalIndex::new(4, 4, 2);
        let mut grid = ElementGrid::new(first, last, 0.0);
        assert_eq!(grid.dims(), (3, 2, 2));
        assert_eq!(grid.len(), 12);
        assert!(grid.contains(GlobalIndex::new(4, 4, 2)));
        assert!(!grid.contains(GlobalIndex::new(1, 3, 1)));
        assert!(!grid.contains(GlobalIndex::new(2, 5, 1)));
        let index = GlobalIndex::new(3, 4, 2);
        let local = grid.to_local(index);
        assert_eq!((local.i, local.j, local.k), (1, 1, 1));
        grid[index] = 7.0;
        assert_eq!(grid[local], 7.0);
        let found: Vec<_> = grid.iter().filter(|(_, v)| **v > 0.0).map(|(g, _)| g).collect();
        assert_eq!(found, &[index]);
        grid.fill(1.0);
        assert_eq!(grid.values().sum::<f64>(), 12.0);
    }

    #[test]
    fn iteration_order_is_i_fastest() {
        let grid: Boolean3DArray = ElementGrid::new(GlobalIndex::new(0, 0, 0), GlobalIndex::new(1, 1, 1), false);
        let order: Vec<_> = grid.iter().map(|(g, _)| (g.i, g.j, g.k)).collect();
        assert_eq!(
            order,
            &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0), (0, 0, 1), (1, 0, 1), (0, 1, 1), (1, 1, 1)]
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn new_panics_on_reversed_bounds() {
        ElementGrid::new(GlobalIndex::new(1, 0, 0), GlobalIndex::new(0, 0, 0), 0.0);
    }
}
