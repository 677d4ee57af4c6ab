use crate::base::{Face, FundamentalProperty, NUM_COMPONENTS, NUM_FACES};
use crate::grid::{PropertyStore, Subdomain, SubdomainElement};
use crate::model::{CompactionModel, SourceTermProvider};

/// Computes the vector of values sampled by a [crate::interp::MultiPropertyTemporalInterpolator]
pub trait InterpolatorCalculator {
    /// Returns the number of values computed per element
    fn n_value(&self) -> usize;

    /// Computes the values of an element at λ
    fn compute(&self, element: &SubdomainElement, lambda: f64, values: &mut [f64]);
}

/// Returns the porosity of an element at λ and its rate of change dφ/dλ
fn porosity_and_rate(subdomain: &Subdomain, properties: &PropertyStore, element: &SubdomainElement, lambda: f64) -> (f64, f64) {
    let ves0 = properties.compute_previous_property(element, FundamentalProperty::Ves);
    let ves1 = properties.compute_property(element, FundamentalProperty::Ves);
    let max0 = properties.compute_previous_property(element, FundamentalProperty::MaxVes);
    let max1 = properties.compute_property(element, FundamentalProperty::MaxVes);
    let ves = (1.0 - lambda) * ves0 + lambda * ves1;
    let max_ves = (1.0 - lambda) * max0 + lambda * max1;
    let (sigma, dsigma) = if ves >= max_ves {
        (ves, ves1 - ves0)
    } else {
        (max_ves, max1 - max0)
    };
    let lithology = subdomain.lithology(element);
    let model = CompactionModel::new(lithology);
    let phi = model.porosity(ves, max_ves);
    let dphi = if sigma > 0.0 {
        -lithology.compaction_coefficient * (phi - lithology.minimum_porosity) * dsigma
    } else {
        0.0
    };
    (phi, dphi)
}

/// Computes the pore volume (m³) and the rock compression dVp/dλ (m³)
///
/// ```text
/// Vp = dx dy hs φ / (1 - φ)
/// ```
pub struct PoreVolumeCalculator<'a> {
    subdomain: &'a Subdomain,
    properties: &'a PropertyStore,
}

impl<'a> PoreVolumeCalculator<'a> {
    pub fn new(subdomain: &'a Subdomain, properties: &'a PropertyStore) -> Self {
        PoreVolumeCalculator { subdomain, properties }
    }
}

impl<'a> InterpolatorCalculator for PoreVolumeCalculator<'a> {
    fn n_value(&self) -> usize {
        2
    }

    fn compute(&self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) {
        let solid = self.subdomain.solid_thickness(element.index);
        if solid <= 0.0 {
            values[0] = 0.0;
            values[1] = 0.0;
            return;
        }
        let (phi, dphi) = porosity_and_rate(self.subdomain, self.properties, element, lambda);
        let base = self.subdomain.dx * self.subdomain.dy * solid;
        values[0] = base * phi / (1.0 - phi);
        values[1] = base * dphi / ((1.0 - phi) * (1.0 - phi));
    }
}

/// Computes the areas (m²) of the six faces of an element
pub struct FaceAreaCalculator<'a> {
    subdomain: &'a Subdomain,
    properties: &'a PropertyStore,
}

impl<'a> FaceAreaCalculator<'a> {
    pub fn new(subdomain: &'a Subdomain, properties: &'a PropertyStore) -> Self {
        FaceAreaCalculator { subdomain, properties }
    }
}

impl<'a> InterpolatorCalculator for FaceAreaCalculator<'a> {
    fn n_value(&self) -> usize {
        NUM_FACES
    }

    fn compute(&self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) {
        let (phi, _) = porosity_and_rate(self.subdomain, self.properties, element, lambda);
        let model = CompactionModel::new(self.subdomain.lithology(element));
        let thickness = model.element_thickness(self.subdomain.solid_thickness(element.index), phi);
        let (dx, dy) = (self.subdomain.dx, self.subdomain.dy);
        for face in Face::ALL {
            values[face.index()] = match face {
                Face::Bottom | Face::Top => dx * dy,
                Face::Left | Face::Right => dy * thickness,
                Face::Front | Face::Back => dx * thickness,
            };
        }
    }
}

/// Computes the permeabilities (m²) normal to the six faces of an element
pub struct FacePermeabilityCalculator<'a> {
    subdomain: &'a Subdomain,
    properties: &'a PropertyStore,
}

impl<'a> FacePermeabilityCalculator<'a> {
    pub fn new(subdomain: &'a Subdomain, properties: &'a PropertyStore) -> Self {
        FacePermeabilityCalculator { subdomain, properties }
    }
}

impl<'a> InterpolatorCalculator for FacePermeabilityCalculator<'a> {
    fn n_value(&self) -> usize {
        NUM_FACES
    }

    fn compute(&self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) {
        let (phi, _) = porosity_and_rate(self.subdomain, self.properties, element, lambda);
        let model = CompactionModel::new(self.subdomain.lithology(element));
        let kv = model.permeability_vertical(phi);
        let kh = model.permeability_horizontal(phi);
        for face in Face::ALL {
            values[face.index()] = if face.is_vertical() { kv } else { kh };
        }
    }
}

/// Computes the chemistry source term (kg per time-step) of a source-rock element
pub struct SourceTermCalculator<'a> {
    provider: &'a dyn SourceTermProvider,
}

impl<'a> SourceTermCalculator<'a> {
    pub fn new(provider: &'a dyn SourceTermProvider) -> Self {
        SourceTermCalculator { provider }
    }
}

impl<'a> InterpolatorCalculator for SourceTermCalculator<'a> {
    fn n_value(&self) -> usize {
        NUM_COMPONENTS
    }

    fn compute(&self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) {
        let masses = self.provider.expulsion(element, lambda);
        values.copy_from_slice(&masses.values);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
