use super::InterpolatorCalculator;
use crate::grid::{ElementGrid, GlobalIndex, Subdomain, SubdomainElement};
use crate::StrError;
use russell_lab::{InterpGrid, InterpLagrange, InterpParams, Vector};

/// Holds the samples of the values of one element at the interpolation points
#[derive(Clone, Debug)]
pub struct ElementInterpolant {
    /// One vector of samples (degree + 1 entries) per value
    samples: Vec<Vector>,
}

impl ElementInterpolant {
    /// Returns the samples of the v-th value
    pub fn samples(&self, v: usize) -> &Vector {
        &self.samples[v]
    }
}

/// Caches polynomial temporal interpolants of vector-valued element properties
///
/// The interpolants are fitted on a uniform grid of λ ∈ [0, 1] and built with a
/// two-phase protocol: [MultiPropertyTemporalInterpolator::prepare] computes the
/// samples of an element if absent; [MultiPropertyTemporalInterpolator::get] only reads.
/// One instance lives for one time-step.
pub struct MultiPropertyTemporalInterpolator<C: InterpolatorCalculator> {
    calculator: C,
    interp: InterpLagrange,
    lambdas: Vec<f64>,
    cache: ElementGrid<Option<ElementInterpolant>>,
    workspace: Vec<f64>,
    n_computation: usize,
}

impl<C: InterpolatorCalculator> MultiPropertyTemporalInterpolator<C> {
    /// Allocates a new instance
    ///
    /// * `degree` -- degree of the interpolating polynomial
    pub fn new(subdomain: &Subdomain, calculator: C, degree: usize) -> Result<Self, StrError> {
        let mut params = InterpParams::new();
        params.grid_type = InterpGrid::Uniform;
        let interp = InterpLagrange::new(degree, Some(params))?;
        let points = interp.get_points();
        let lambdas = (0..points.dim()).map(|p| (points[p] + 1.0) / 2.0).collect();
        let n_value = calculator.n_value();
        Ok(MultiPropertyTemporalInterpolator {
            calculator,
            interp,
            lambdas,
            cache: subdomain.new_grid(None),
            workspace: vec![0.0; n_value],
            n_computation: 0,
        })
    }

    /// Computes the interpolant of an element unless already computed in this time-step
    pub fn prepare(&mut self, element: &SubdomainElement) {
        if self.cache[element.index].is_some() {
            return;
        }
        let n_value = self.calculator.n_value();
        let mut samples = vec![Vector::new(self.lambdas.len()); n_value];
        for (p, lambda) in self.lambdas.iter().enumerate() {
            self.calculator.compute(element, *lambda, &mut self.workspace);
            for v in 0..n_value {
                samples[v][p] = self.workspace[v];
            }
        }
        self.cache[element.index] = Some(ElementInterpolant { samples });
        self.n_computation += 1;
    }

    /// Returns the interpolant of an element if it has been prepared
    pub fn get(&self, index: GlobalIndex) -> Option<&ElementInterpolant> {
        self.cache[index].as_ref()
    }

    /// Returns true if the interpolant of an element has been prepared
    pub fn is_prepared(&self, index: GlobalIndex) -> bool {
        self.cache[index].is_some()
    }

    /// Returns the number of interpolants computed so far
    pub fn n_computation(&self) -> usize {
        self.n_computation
    }

    /// Returns the λ values at which the calculator is sampled
    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    /// Evaluates the values of an element at λ, preparing the interpolant if needed
    pub fn evaluate(&mut self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) -> Result<(), StrError> {
        self.prepare(element);
        let x = 2.0 * f64::max(0.0, f64::min(lambda, 1.0)) - 1.0;
        let interpolant = match self.cache[element.index].as_ref() {
            Some(i) => i,
            None => return Err("interpolant is not available"),
        };
        for (v, samples) in interpolant.samples.iter().enumerate() {
            values[v] = self.interp.eval(x, samples)?;
        }
        Ok(())
    }
}

/// Evaluates a calculator either through cached interpolants or directly
pub enum TemporalEvaluator<C: InterpolatorCalculator> {
    Interpolated(MultiPropertyTemporalInterpolator<C>),
    Direct(C),
}

impl<C: InterpolatorCalculator> TemporalEvaluator<C> {
    /// Allocates a new instance
    ///
    /// * `interpolate` -- use cached polynomial interpolants of the given degree
    pub fn new(subdomain: &Subdomain, calculator: C, interpolate: bool, degree: usize) -> Result<Self, StrError> {
        if interpolate {
            Ok(TemporalEvaluator::Interpolated(MultiPropertyTemporalInterpolator::new(
                subdomain, calculator, degree,
            )?))
        } else {
            Ok(TemporalEvaluator::Direct(calculator))
        }
    }

    /// Returns the number of values per element
    pub fn n_value(&self) -> usize {
        match self {
            TemporalEvaluator::Interpolated(m) => m.calculator.n_value(),
            TemporalEvaluator::Direct(c) => c.n_value(),
        }
    }

    /// Evaluates the values of an element at λ
    pub fn evaluate(&mut self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) -> Result<(), StrError> {
        match self {
            TemporalEvaluator::Interpolated(m) => m.evaluate(element, lambda, values),
            TemporalEvaluator::Direct(c) => {
                c.compute(element, lambda, values);
                Ok(())
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{MultiPropertyTemporalInterpolator, TemporalEvaluator};
    use crate::base::SampleParams;
    use crate::grid::{GlobalIndex, SampleSubdomains, SubdomainElement};
    use crate::interp::InterpolatorCalculator;
    use russell_lab::approx_eq;
    use std::cell::Cell;

    /// Returns [1 + i λ², 2 - λ] and counts the calls
    struct Quadratic {
        calls: Cell<usize>,
    }

    impl InterpolatorCalculator for Quadratic {
        fn n_value(&self) -> usize {
            2
        }
        fn compute(&self, element: &SubdomainElement, lambda: f64, values: &mut [f64]) {
            self.calls.set(self.calls.get() + 1);
            values[0] = 1.0 + (element.index.i as f64) * lambda * lambda;
            values[1] = 2.0 - lambda;
        }
    }

    #[test]
    fn quadratic_is_reproduced_and_cached() {
        let subdomain = SampleSubdomains::chain(3, SampleParams::param_sandstone()).unwrap();
        let calculator = Quadratic { calls: Cell::new(0) };
        let mut interpolator = MultiPropertyTemporalInterpolator::new(&subdomain, calculator, 2).unwrap();
        assert_eq!(interpolator.lambdas().len(), 3);
        approx_eq(interpolator.lambdas()[0], 0.0, 1e-15);
        approx_eq(interpolator.lambdas()[1], 0.5, 1e-15);
        approx_eq(interpolator.lambdas()[2], 1.0, 1e-15);

        let element = subdomain.element(GlobalIndex::new(2, 0, 0)).unwrap();
        assert!(!interpolator.is_prepared(element.index));
        assert!(interpolator.get(element.index).is_none());
        let mut values = vec![0.0; 2];
        for lambda in [0.0, 0.25, 0.6, 1.0] {
            interpolator.evaluate(&element, lambda, &mut values).unwrap();
            approx_eq(values[0], 1.0 + 2.0 * lambda * lambda, 1e-13);
            approx_eq(values[1], 2.0 - lambda, 1e-13);
        }
        assert!(interpolator.is_prepared(element.index));
        assert_eq!(interpolator.n_computation(), 1);
        assert_eq!(interpolator.calculator.calls.get(), 3);

        // repeated access returns identical samples without recomputation
        let first = interpolator.get(element.index).unwrap().samples(0).clone();
        interpolator.prepare(&element);
        let second = interpolator.get(element.index).unwrap().samples(0).clone();
        assert_eq!(first.as_data(), second.as_data());
        assert_eq!(interpolator.n_computation(), 1);

        // one computation per element
        for e in subdomain.elements() {
            interpolator.prepare(&e);
        }
        assert_eq!(interpolator.n_computation(), 3);
        assert_eq!(interpolator.calculator.calls.get(), 9);
    }

    #[test]
    fn direct_evaluator_calls_the_calculator() {
        let subdomain = SampleSubdomains::chain(1, SampleParams::param_sandstone()).unwrap();
        let calculator = Quadratic { calls: Cell::new(0) };
        let mut evaluator = TemporalEvaluator::new(&subdomain, calculator, false, 2).unwrap();
        assert_eq!(evaluator.n_value(), 2);
        let element = subdomain.element(GlobalIndex::new(0, 0, 0)).unwrap();
        let mut values = vec![0.0; 2];
        evaluator.evaluate(&element, 0.5, &mut values).unwrap();
        evaluator.evaluate(&element, 0.5, &mut values).unwrap();
        assert_eq!(values, &[1.0, 1.5]);
        match evaluator {
            TemporalEvaluator::Direct(c) => assert_eq!(c.calls.get(), 2),
            _ => panic!("direct evaluator expected"),
        }
    }
}
