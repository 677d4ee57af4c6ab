use super::{ElementGrid, GlobalIndex};
use crate::base::{Face, ParamAdsorption, ParamLithology};
use crate::StrError;

/// Holds a geological layer
#[derive(Clone, Debug)]
pub struct Formation {
    /// Name of the formation (used in error messages)
    pub name: String,

    /// First k index of the formation (inclusive)
    pub first_k: usize,

    /// Last k index of the formation (inclusive)
    pub last_k: usize,

    /// Compaction and permeability parameters
    pub lithology: ParamLithology,

    /// Indicates that the formation generates hydrocarbons
    pub source_rock: bool,

    /// Total organic carbon content (wt%); only meaningful for source rocks
    pub toc: Option<f64>,

    /// Adsorption parameters; only meaningful for source rocks
    pub adsorption: Option<ParamAdsorption>,
}

impl Formation {
    /// Allocates a new (non-source-rock) formation
    pub fn new(name: &str, first_k: usize, last_k: usize, lithology: ParamLithology) -> Self {
        Formation {
            name: name.to_string(),
            first_k,
            last_k,
            lithology,
            source_rock: false,
            toc: None,
            adsorption: None,
        }
    }

    /// Turns the formation into a source rock
    pub fn set_source_rock(&mut self, toc: Option<f64>, adsorption: Option<ParamAdsorption>) -> &mut Self {
        self.source_rock = true;
        self.toc = toc;
        self.adsorption = adsorption;
        self
    }

    /// Returns true if the formation contains the k-layer
    #[inline]
    pub fn contains_layer(&self, k: usize) -> bool {
        k >= self.first_k && k <= self.last_k
    }
}

/// Holds an element of the subdomain
///
/// The formation is referenced by its position in [Subdomain::formations].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubdomainElement {
    pub index: GlobalIndex,
    pub formation: usize,
}

/// Holds the rock volume undergoing Darcy flow
///
/// The local block covers all elements of the grid; with a single rank the ghost ring is empty.
#[derive(Clone, Debug)]
pub struct Subdomain {
    /// Number of elements along x (i)
    pub nx: usize,

    /// Number of elements along y (j)
    pub ny: usize,

    /// Number of elements along z (k)
    pub nz: usize,

    /// Plan size of the elements along x (m)
    pub dx: f64,

    /// Plan size of the elements along y (m)
    pub dy: f64,

    /// Formations ordered by k
    pub formations: Vec<Formation>,

    /// Thickness of the solid (porosity-free) part of each element (m)
    solid_thickness: ElementGrid<f64>,
}

impl Subdomain {
    /// Allocates a new instance
    ///
    /// The formations must cover the k-layers 0..nz contiguously without overlaps.
    pub fn new(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        formations: Vec<Formation>,
        solid_thickness: f64,
    ) -> Result<Self, StrError> {
        if nx < 1 || ny < 1 {
            return Err("nx and ny must be ≥ 1");
        }
        if dx <= 0.0 || dy <= 0.0 {
            return Err("dx and dy must be > 0.0");
        }
        if formations.is_empty() {
            return Err("at least one formation is required");
        }
        if solid_thickness < 0.0 {
            return Err("solid thickness must be ≥ 0.0");
        }
        let mut formations = formations;
        formations.sort_by_key(|f| f.first_k);
        let mut next_k = 0;
        for formation in &formations {
            if formation.first_k != next_k || formation.last_k < formation.first_k {
                return Err("formations must cover the k-layers contiguously");
            }
            next_k = formation.last_k + 1;
        }
        let nz = next_k;
        let first = GlobalIndex::new(0, 0, 0);
        let last = GlobalIndex::new(nx - 1, ny - 1, nz - 1);
        Ok(Subdomain {
            nx,
            ny,
            nz,
            dx,
            dy,
            formations,
            solid_thickness: ElementGrid::new(first, last, solid_thickness),
        })
    }

    /// Returns the first i index of the local block (ghost-inclusive)
    pub fn first_i(&self) -> usize {
        0
    }

    /// Returns the last i index of the local block (ghost-inclusive)
    pub fn last_i(&self) -> usize {
        self.nx - 1
    }

    /// Returns the first j index of the local block (ghost-inclusive)
    pub fn first_j(&self) -> usize {
        0
    }

    /// Returns the last j index of the local block (ghost-inclusive)
    pub fn last_j(&self) -> usize {
        self.ny - 1
    }

    /// Returns the first k index of the local block (ghost-inclusive)
    pub fn first_k(&self) -> usize {
        0
    }

    /// Returns the last k index of the local block (ghost-inclusive)
    pub fn last_k(&self) -> usize {
        self.nz - 1
    }

    /// Returns the first index of the local block
    pub fn first(&self) -> GlobalIndex {
        GlobalIndex::new(self.first_i(), self.first_j(), self.first_k())
    }

    /// Returns the last index of the local block
    pub fn last(&self) -> GlobalIndex {
        GlobalIndex::new(self.last_i(), self.last_j(), self.last_k())
    }

    /// Allocates a new grid covering the local block
    pub fn new_grid<T: Clone>(&self, value: T) -> ElementGrid<T> {
        ElementGrid::new(self.first(), self.last(), value)
    }

    /// Returns the position of the formation containing the k-layer
    pub fn formation_of(&self, k: usize) -> Option<usize> {
        self.formations.iter().position(|f| f.contains_layer(k))
    }

    /// Returns the element at the given index
    pub fn element(&self, index: GlobalIndex) -> Option<SubdomainElement> {
        if index.i > self.last_i() || index.j > self.last_j() {
            return None;
        }
        let formation = self.formation_of(index.k)?;
        Some(SubdomainElement { index, formation })
    }

    /// Returns the formation of an element
    #[inline]
    pub fn formation(&self, element: &SubdomainElement) -> &Formation {
        &self.formations[element.formation]
    }

    /// Returns the lithology of an element
    #[inline]
    pub fn lithology(&self, element: &SubdomainElement) -> &ParamLithology {
        &self.formations[element.formation].lithology
    }

    /// Returns an iterator over the active formations (with their position)
    pub fn active_layers(&self) -> impl Iterator<Item = (usize, &Formation)> + '_ {
        self.formations.iter().enumerate()
    }

    /// Returns an iterator over the active source-rock formations (with their position)
    pub fn active_source_rock_layers(&self) -> impl Iterator<Item = (usize, &Formation)> + '_ {
        self.active_layers().filter(|(_, f)| f.source_rock)
    }

    /// Returns the elements of one formation in (k, j, i) order, i running fastest
    pub fn layer_elements(&self, formation: usize) -> impl Iterator<Item = SubdomainElement> + '_ {
        let f = &self.formations[formation];
        (f.first_k..=f.last_k).flat_map(move |k| {
            (self.first_j()..=self.last_j()).flat_map(move |j| {
                (self.first_i()..=self.last_i()).map(move |i| SubdomainElement {
                    index: GlobalIndex::new(i, j, k),
                    formation,
                })
            })
        })
    }

    /// Returns all elements of all active formations
    pub fn elements(&self) -> impl Iterator<Item = SubdomainElement> + '_ {
        self.active_layers().flat_map(move |(f, _)| self.layer_elements(f))
    }

    /// Returns the number of elements
    pub fn n_element(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Returns the element across the given face, if any
    pub fn neighbour(&self, index: GlobalIndex, face: Face) -> Option<GlobalIndex> {
        let other = index.neighbour(face)?;
        if other.i > self.last_i() || other.j > self.last_j() || other.k > self.last_k() {
            return None;
        }
        Some(other)
    }

    /// Returns the solid thickness of an element (m)
    #[inline]
    pub fn solid_thickness(&self, index: GlobalIndex) -> f64 {
        self.solid_thickness[index]
    }

    /// Sets the solid thickness of an element (m)
    ///
    /// A zero thickness marks a pinched-out element.
    pub fn set_solid_thickness(&mut self, index: GlobalIndex, value: f64) -> Result<(), StrError> {
        if !self.solid_thickness.contains(index) {
            return Err("index is out of bounds");
        }
        if value < 0.0 {
            return Err("solid thickness must be ≥ 0.0");
        }
        self.solid_thickness[index] = value;
        Ok(())
    }

    /// Returns true if the element is pinched out
    #[inline]
    pub fn is_pinched(&self, index: GlobalIndex) -> bool {
        self.solid_thickness[index] <= 0.0
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Formation, Subdomain};
    use crate::base::{Face, SampleParams};
    use crate::grid::GlobalIndex;

    fn two_formations() -> Vec<Formation> {
        let mut source = Formation::new("source", 0, 1, SampleParams::param_shale());
        source.set_source_rock(Some(5.0), None);
        let carrier = Formation::new("carrier", 2, 2, SampleParams::param_sandstone());
        vec![carrier, source]
    }

    #[test]
    fn new_captures_errors() {
        let lith = SampleParams::param_sandstone();
        assert_eq!(
            Subdomain::new(0, 1, 1.0, 1.0, vec![Formation::new("a", 0, 0, lith)], 1.0).err(),
            Some("nx and ny must be ≥ 1")
        );
        assert_eq!(
            Subdomain::new(1, 1, 0.0, 1.0, vec![Formation::new("a", 0, 0, lith)], 1.0).err(),
            Some("dx and dy must be > 0.0")
        );
        assert_eq!(
            Subdomain::new(1, 1, 1.0, 1.0, Vec::new(), 1.0).err(),
            Some("at least one formation is required")
        );
        let gap = vec![Formation::new("a", 0, 0, lith), Formation::new("b", 2, 3, lith)];
        assert_eq!(
            Subdomain::new(1, 1, 1.0, 1.0, gap, 1.0).err(),
            Some("formations must cover the k-layers contiguously")
        );
    }

    #[test]
    fn layers_and_elements_work() {
        let mut subdomain = Subdomain::new(2, 1, 10.0, 10.0, two_formations(), 5.0).unwrap();
        assert_eq!((subdomain.nx, subdomain.ny, subdomain.nz), (2, 1, 3));
        assert_eq!(subdomain.formations[0].name, "source");
        assert_eq!(subdomain.formation_of(2), Some(1));
        assert_eq!(subdomain.formation_of(3), None);
        assert_eq!(subdomain.elements().count(), 6);
        assert_eq!(subdomain.n_element(), 6);
        let sources: Vec<_> = subdomain.active_source_rock_layers().map(|(f, _)| f).collect();
        assert_eq!(sources, &[0]);
        let indices: Vec<_> = subdomain.layer_elements(0).map(|e| (e.index.i, e.index.k)).collect();
        assert_eq!(indices, &[(0, 0), (1, 0), (0, 1), (1, 1)]);
        let element = subdomain.element(GlobalIndex::new(1, 0, 2)).unwrap();
        assert_eq!(subdomain.formation(&element).name, "carrier");
        assert_eq!(subdomain.neighbour(element.index, Face::Top), None);
        assert_eq!(subdomain.neighbour(element.index, Face::Right), None);
        assert_eq!(subdomain.neighbour(element.index, Face::Left), Some(GlobalIndex::new(0, 0, 2)));
        assert!(!subdomain.is_pinched(element.index));
        subdomain.set_solid_thickness(element.index, 0.0).unwrap();
        assert!(subdomain.is_pinched(element.index));
        assert_eq!(
            subdomain.set_solid_thickness(GlobalIndex::new(5, 0, 0), 1.0).err(),
            Some("index is out of bounds")
        );
    }
}
