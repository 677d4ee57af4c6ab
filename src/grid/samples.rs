use super::{Formation, Subdomain};
use crate::base::ParamLithology;
use crate::StrError;

/// Holds samples of subdomains
pub struct SampleSubdomains {}

impl SampleSubdomains {
    /// Returns a flat 2×2×1 subdomain with one formation
    ///
    /// ```text
    ///   j
    ///   ↑
    /// +---+---+
    /// | 2 | 3 |
    /// +---+---+    100 m × 100 m × 10 m (solid)
    /// | 0 | 1 |
    /// +---+---+ → i
    /// ```
    pub fn flat_2x2x1(lithology: ParamLithology) -> Result<Subdomain, StrError> {
        let formation = Formation::new("flat", 0, 0, lithology);
        Subdomain::new(2, 2, 100.0, 100.0, vec![formation], 10.0)
    }

    /// Returns a horizontal chain of n elements along i
    ///
    /// ```text
    /// +---+---+-...-+---+ → i
    /// | 0 | 1 |     |n-1|   100 m × 100 m × 10 m (solid)
    /// +---+---+-...-+---+
    /// ```
    pub fn chain(n: usize, lithology: ParamLithology) -> Result<Subdomain, StrError> {
        let formation = Formation::new("chain", 0, 0, lithology);
        Subdomain::new(n, 1, 100.0, 100.0, vec![formation], 10.0)
    }

    /// Returns a vertical column of n elements with one formation per layer
    ///
    /// The bottom formation is a source rock. Formation names are "layer-k".
    pub fn column(n: usize, source: ParamLithology, carrier: ParamLithology) -> Result<Subdomain, StrError> {
        let mut formations = Vec::new();
        for k in 0..n {
            let lithology = if k == 0 { source } else { carrier };
            let mut formation = Formation::new(&format!("layer-{}", k), k, k, lithology);
            if k == 0 {
                formation.set_source_rock(Some(5.0), None);
            }
            formations.push(formation);
        }
        Subdomain::new(1, 1, 100.0, 100.0, formations, 10.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
