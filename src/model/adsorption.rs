use crate::base::{ParamAdsorption, STANDARD_TEMPERATURE};
use crate::grid::{Formation, Subdomain};
use std::collections::HashMap;

/// Defines an adsorption isotherm of methane in a source rock
pub trait AdsorptionFunction {
    /// Returns the maximum adsorbed methane concentration (kg/m³ of pore space)
    ///
    /// * `temperature` -- temperature (℃)
    /// * `pressure` -- pore pressure (MPa)
    fn capacity(&self, temperature: f64, pressure: f64) -> f64;
}

/// Implements the Langmuir isotherm with a constant capacity
///
/// ```text
/// c = cmax · P / (P + PL) · max(0, 1 - α (T - Ts))
/// ```
pub struct LangmuirAdsorption {
    capacity: f64,
    langmuir_pressure: f64,
    temperature_coefficient: f64,
}

/// Implements the Langmuir isotherm with a capacity proportional to the TOC of the formation
pub struct LangmuirAdsorptionToc {
    langmuir: LangmuirAdsorption,
}

impl LangmuirAdsorption {
    /// Allocates a new instance
    pub fn new(param: &ParamAdsorption) -> Self {
        LangmuirAdsorption {
            capacity: param.capacity,
            langmuir_pressure: param.langmuir_pressure,
            temperature_coefficient: param.temperature_coefficient,
        }
    }
}

impl AdsorptionFunction for LangmuirAdsorption {
    fn capacity(&self, temperature: f64, pressure: f64) -> f64 {
        if pressure <= 0.0 {
            return 0.0;
        }
        let thermal = f64::max(0.0, 1.0 - self.temperature_coefficient * (temperature - STANDARD_TEMPERATURE));
        self.capacity * pressure / (pressure + self.langmuir_pressure) * thermal
    }
}

impl LangmuirAdsorptionToc {
    /// Allocates a new instance
    ///
    /// Returns an error naming the formation if the formation has no TOC entry.
    pub fn new(param: &ParamAdsorption, formation: &Formation) -> Result<Self, String> {
        let toc = formation.toc.ok_or(format!(
            "formation '{}' has no TOC entry for the TOC-based Langmuir adsorption function",
            formation.name
        ))?;
        let mut langmuir = LangmuirAdsorption::new(param);
        langmuir.capacity *= toc;
        Ok(LangmuirAdsorptionToc { langmuir })
    }
}

impl AdsorptionFunction for LangmuirAdsorptionToc {
    fn capacity(&self, temperature: f64, pressure: f64) -> f64 {
        self.langmuir.capacity(temperature, pressure)
    }
}

/// Defines the factory of an adsorption function
pub type AdsorptionFactory = fn(&ParamAdsorption, &Formation) -> Result<Box<dyn AdsorptionFunction>, String>;

fn build_langmuir(param: &ParamAdsorption, _: &Formation) -> Result<Box<dyn AdsorptionFunction>, String> {
    Ok(Box::new(LangmuirAdsorption::new(param)))
}

fn build_langmuir_toc(param: &ParamAdsorption, formation: &Formation) -> Result<Box<dyn AdsorptionFunction>, String> {
    Ok(Box::new(LangmuirAdsorptionToc::new(param, formation)?))
}

/// Holds the available adsorption functions by key
///
/// The registry is built once at startup and handed to the solver.
pub struct AdsorptionRegistry {
    factories: HashMap<String, AdsorptionFactory>,
}

impl AdsorptionRegistry {
    /// Allocates an empty registry
    pub fn new() -> Self {
        AdsorptionRegistry {
            factories: HashMap::new(),
        }
    }

    /// Allocates a registry with the "Langmuir" and "LangmuirTOC" functions
    pub fn with_defaults() -> Self {
        let mut registry = AdsorptionRegistry::new();
        registry.register("Langmuir", build_langmuir);
        registry.register("LangmuirTOC", build_langmuir_toc);
        registry
    }

    /// Registers (or replaces) a factory
    pub fn register(&mut self, key: &str, factory: AdsorptionFactory) -> &mut Self {
        self.factories.insert(key.to_string(), factory);
        self
    }

    /// Returns true if the key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Builds the adsorption function of a formation
    ///
    /// Returns None if the formation is not an adsorbing source rock.
    pub fn build(&self, formation: &Formation) -> Result<Option<Box<dyn AdsorptionFunction>>, String> {
        if !formation.source_rock {
            return Ok(None);
        }
        let param = match &formation.adsorption {
            Some(p) => p,
            None => return Ok(None),
        };
        let factory = self.factories.get(&param.function).ok_or(format!(
            "adsorption function '{}' requested by formation '{}' is not registered",
            param.function, formation.name
        ))?;
        Ok(Some(factory(param, formation)?))
    }

    /// Builds the adsorption functions of all formations of a subdomain
    pub fn build_all(&self, subdomain: &Subdomain) -> Result<Vec<Option<Box<dyn AdsorptionFunction>>>, String> {
        subdomain.formations.iter().map(|f| self.build(f)).collect()
    }

    /// Validates the adsorption setup of all formations
    ///
    /// Returns a message naming the offending formation, or None if everything is all right.
    pub fn validate(&self, subdomain: &Subdomain) -> Option<String> {
        self.build_all(subdomain).err()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{AdsorptionFunction, AdsorptionRegistry, LangmuirAdsorption};
    use crate::base::SampleParams;
    use crate::grid::{Formation, Subdomain};
    use russell_lab::approx_eq;

    #[test]
    fn langmuir_works() {
        let param = SampleParams::param_adsorption(false);
        let f = LangmuirAdsorption::new(&param);
        assert_eq!(f.capacity(15.0, 0.0), 0.0);
        approx_eq(f.capacity(15.0, 8.0), 2.0, 1e-15);
        approx_eq(f.capacity(115.0, 8.0), 1.0, 1e-15);
        assert_eq!(f.capacity(1000.0, 8.0), 0.0);
    }

    #[test]
    fn registry_builds_and_validates() {
        let registry = AdsorptionRegistry::with_defaults();
        assert!(registry.contains("Langmuir"));
        assert!(registry.contains("LangmuirTOC"));

        let lith = SampleParams::param_shale();
        let mut source = Formation::new("Kimmeridge", 0, 0, lith);
        source.set_source_rock(None, Some(SampleParams::param_adsorption(true)));
        let carrier = Formation::new("Brent", 1, 1, lith);
        let mut subdomain = Subdomain::new(1, 1, 1.0, 1.0, vec![source, carrier], 1.0).unwrap();
        assert_eq!(
            registry.validate(&subdomain),
            Some("formation 'Kimmeridge' has no TOC entry for the TOC-based Langmuir adsorption function".to_string())
        );

        subdomain.formations[0].toc = Some(2.0);
        assert_eq!(registry.validate(&subdomain), None);
        let functions = registry.build_all(&subdomain).unwrap();
        assert!(functions[1].is_none());
        let f = functions[0].as_ref().unwrap();
        // capacity = 0.8 · 2 kg/m³ at P = PL and surface temperature gives 0.8
        approx_eq(f.capacity(15.0, 8.0), 0.8, 1e-15);

        subdomain.formations[0].adsorption.as_mut().unwrap().function = "Freundlich".to_string();
        assert_eq!(
            registry.validate(&subdomain),
            Some("adsorption function 'Freundlich' requested by formation 'Kimmeridge' is not registered".to_string())
        );
        assert_eq!(AdsorptionRegistry::new().contains("Langmuir"), false);
    }
}
