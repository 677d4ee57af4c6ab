use super::{ImmobileSpeciesId, ParamCapillary, ParamRelPerm, NUM_IMMOBILE_SPECIES};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Defines the smallest allowed maximum time-step size (Ma)
pub const CONFIG_MIN_TIME_STEP: f64 = 1e-10;

/// Holds the options of the explicit Darcy flow solver
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Largest sub-step applied by the solver (Ma)
    pub maximum_time_step_size: f64,

    /// Accounts for the pore volume occupied by the immobile species
    pub use_immobile_saturation: bool,

    /// Limits the potential gradient across element faces
    pub limit_grad_pressure: bool,

    /// Maximum potential gradient (Pa/m)
    pub grad_pressure_maximum: f64,

    /// Limits the face permeability used in the fluxes
    pub limit_flux_permeability: bool,

    /// Maximum face permeability (mD)
    pub flux_permeability_maximum: f64,

    /// Adds the capillary pressure to the phase pressures
    pub include_capillary_pressure: bool,

    /// Uses polynomial interpolants for the face permeabilities
    pub interpolate_face_permeability: bool,

    /// Uses polynomial interpolants for the pore volume and rock compression
    pub interpolate_pore_volume: bool,

    /// Uses polynomial interpolants for the face areas
    pub interpolate_face_area: bool,

    /// Decides which elements transport from a saturation estimate instead of the HC content
    pub use_saturation_estimate: bool,

    /// Scaling of the residual hydrocarbon saturation
    pub residual_hc_saturation_scaling: f64,

    /// Minimum number of sub-steps per time-step
    pub time_step_sub_sample: usize,

    /// Number of sub-steps between two applications of secondary cracking
    pub time_step_sub_sample_otgc: usize,

    /// Number of sub-steps between two flashes
    pub time_step_sub_sample_pvt: usize,

    /// Number of sub-steps between two computations of the fluxes
    pub time_step_sub_sample_flux: usize,

    /// Enables secondary cracking (oil to gas cracking) of retained hydrocarbons
    pub use_otgc: bool,

    /// Degree of the polynomial temporal interpolants
    pub interpolator_degree: usize,

    /// Concentration (kg/m³) above which an element is considered to contain hydrocarbons
    pub hc_content_epsilon: f64,

    /// Hydrocarbon density used by the saturation estimate (kg/m³)
    pub estimated_hc_density: f64,

    /// Fraction of the stable time-step that is actually applied
    pub cfl_safety_factor: f64,

    /// Maximum number of sub-steps per time-step
    pub max_n_sub_steps: usize,

    /// Relative tolerance below which negative concentrations are truncated to zero
    pub concentration_tolerance: f64,

    /// Tolerance on the sum of saturations
    pub saturation_tolerance: f64,

    /// Relative permeability parameters
    pub param_rel_perm: ParamRelPerm,

    /// Capillary pressure parameters
    pub param_capillary: ParamCapillary,

    /// Densities of the immobile species (kg/m³)
    pub immobile_densities: [f64; NUM_IMMOBILE_SPECIES],

    /// Prints one line per sub-step
    pub verbose_sub_steps: bool,

    /// Prints the counters and timings at the end of each time-step
    pub verbose_summary: bool,
}

impl FlowConfig {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        FlowConfig {
            maximum_time_step_size: 1.0,
            use_immobile_saturation: true,
            limit_grad_pressure: false,
            grad_pressure_maximum: 1.0e5,
            limit_flux_permeability: false,
            flux_permeability_maximum: 1.0e3,
            include_capillary_pressure: false,
            interpolate_face_permeability: true,
            interpolate_pore_volume: true,
            interpolate_face_area: true,
            use_saturation_estimate: false,
            residual_hc_saturation_scaling: 1.0,
            time_step_sub_sample: 1,
            time_step_sub_sample_otgc: 1,
            time_step_sub_sample_pvt: 1,
            time_step_sub_sample_flux: 1,
            use_otgc: false,
            interpolator_degree: 2,
            hc_content_epsilon: 1e-10,
            estimated_hc_density: 700.0,
            cfl_safety_factor: 0.9,
            max_n_sub_steps: 100_000,
            concentration_tolerance: 1e-10,
            saturation_tolerance: 1e-6,
            param_rel_perm: ParamRelPerm {
                residual_hc_saturation: 0.0,
                residual_water_saturation: 0.1,
                exponent: 2.0,
            },
            param_capillary: ParamCapillary {
                lambda: 2.0,
                pc_max: 50.0,
            },
            immobile_densities: ImmobileSpeciesId::default_densities(),
            verbose_sub_steps: false,
            verbose_summary: false,
        }
    }

    /// Reads a JSON file containing the configuration
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(&path).map_err(|_| "file not found")?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader).map_err(|_| "deserialize failed")?;
        Ok(config)
    }

    /// Sets the largest sub-step applied by the solver (Ma)
    pub fn set_maximum_time_step_size(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONFIG_MIN_TIME_STEP {
            return Err("maximum_time_step_size must be ≥ CONFIG_MIN_TIME_STEP");
        }
        self.maximum_time_step_size = value;
        Ok(self)
    }

    /// Enables the limiter of the potential gradient (Pa/m)
    pub fn set_grad_pressure_limiter(&mut self, maximum: f64) -> Result<&mut Self, StrError> {
        if maximum <= 0.0 {
            return Err("grad_pressure_maximum must be > 0.0");
        }
        self.limit_grad_pressure = true;
        self.grad_pressure_maximum = maximum;
        Ok(self)
    }

    /// Enables the limiter of the face permeability (mD)
    pub fn set_flux_permeability_limiter(&mut self, maximum: f64) -> Result<&mut Self, StrError> {
        if maximum <= 0.0 {
            return Err("flux_permeability_maximum must be > 0.0");
        }
        self.limit_flux_permeability = true;
        self.flux_permeability_maximum = maximum;
        Ok(self)
    }

    /// Sets the scaling of the residual hydrocarbon saturation
    pub fn set_residual_hc_saturation_scaling(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("residual_hc_saturation_scaling must be ≥ 0.0");
        }
        self.residual_hc_saturation_scaling = value;
        Ok(self)
    }

    /// Sets the sub-sampling of the time-step
    ///
    /// * `minimum` -- minimum number of sub-steps per time-step
    /// * `otgc`, `pvt`, `flux` -- number of sub-steps between two updates of secondary cracking, flash and fluxes
    pub fn set_sub_sampling(&mut self, minimum: usize, otgc: usize, pvt: usize, flux: usize) -> Result<&mut Self, StrError> {
        if minimum < 1 || otgc < 1 || pvt < 1 || flux < 1 {
            return Err("sub-sampling numbers must be ≥ 1");
        }
        self.time_step_sub_sample = minimum;
        self.time_step_sub_sample_otgc = otgc;
        self.time_step_sub_sample_pvt = pvt;
        self.time_step_sub_sample_flux = flux;
        Ok(self)
    }

    /// Sets the degree of the polynomial temporal interpolants
    pub fn set_interpolator_degree(&mut self, degree: usize) -> Result<&mut Self, StrError> {
        if degree < 1 {
            return Err("interpolator_degree must be ≥ 1");
        }
        self.interpolator_degree = degree;
        Ok(self)
    }

    /// Sets the density of an immobile species (kg/m³)
    pub fn set_immobile_density(&mut self, species: ImmobileSpeciesId, density: f64) -> Result<&mut Self, StrError> {
        if density <= 0.0 {
            return Err("immobile density must be > 0.0");
        }
        self.immobile_densities[species.index()] = density;
        Ok(self)
    }

    /// Sets the relative permeability parameters
    pub fn set_param_rel_perm(&mut self, param: ParamRelPerm) -> Result<&mut Self, StrError> {
        self.param_rel_perm = param;
        Ok(self)
    }

    /// Sets the capillary pressure parameters and enables the capillary pressure
    pub fn set_param_capillary(&mut self, param: ParamCapillary) -> Result<&mut Self, StrError> {
        self.param_capillary = param;
        self.include_capillary_pressure = true;
        Ok(self)
    }

    /// Returns the residual hydrocarbon saturation after scaling
    #[inline]
    pub fn residual_hc_saturation(&self) -> f64 {
        self.param_rel_perm.residual_hc_saturation * self.residual_hc_saturation_scaling
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.maximum_time_step_size < CONFIG_MIN_TIME_STEP {
            return Some(format!(
                "maximum_time_step_size = {:?} is incorrect; it must be ≥ {:e}",
                self.maximum_time_step_size, CONFIG_MIN_TIME_STEP
            ));
        }
        if self.limit_grad_pressure && self.grad_pressure_maximum <= 0.0 {
            return Some(format!(
                "grad_pressure_maximum = {:?} is incorrect; it must be > 0.0",
                self.grad_pressure_maximum
            ));
        }
        if self.limit_flux_permeability && self.flux_permeability_maximum <= 0.0 {
            return Some(format!(
                "flux_permeability_maximum = {:?} is incorrect; it must be > 0.0",
                self.flux_permeability_maximum
            ));
        }
        if self.residual_hc_saturation_scaling < 0.0 {
            return Some(format!(
                "residual_hc_saturation_scaling = {:?} is incorrect; it must be ≥ 0.0",
                self.residual_hc_saturation_scaling
            ));
        }
        if self.time_step_sub_sample < 1
            || self.time_step_sub_sample_otgc < 1
            || self.time_step_sub_sample_pvt < 1
            || self.time_step_sub_sample_flux < 1
        {
            return Some("sub-sampling numbers are incorrect; they must be ≥ 1".to_string());
        }
        if self.interpolator_degree < 1 {
            return Some(format!(
                "interpolator_degree = {:?} is incorrect; it must be ≥ 1",
                self.interpolator_degree
            ));
        }
        if self.hc_content_epsilon < 0.0 {
            return Some(format!(
                "hc_content_epsilon = {:?} is incorrect; it must be ≥ 0.0",
                self.hc_content_epsilon
            ));
        }
        if self.estimated_hc_density <= 0.0 {
            return Some(format!(
                "estimated_hc_density = {:?} is incorrect; it must be > 0.0",
                self.estimated_hc_density
            ));
        }
        if self.cfl_safety_factor <= 0.0 || self.cfl_safety_factor > 1.0 {
            return Some(format!(
                "cfl_safety_factor = {:?} is incorrect; it must be in (0, 1]",
                self.cfl_safety_factor
            ));
        }
        if self.max_n_sub_steps < self.time_step_sub_sample {
            return Some(format!(
                "max_n_sub_steps = {:?} is incorrect; it must be ≥ time_step_sub_sample",
                self.max_n_sub_steps
            ));
        }
        let rp = &self.param_rel_perm;
        if rp.residual_hc_saturation < 0.0
            || rp.residual_water_saturation < 0.0
            || self.residual_hc_saturation() + rp.residual_water_saturation >= 1.0
        {
            return Some(format!(
                "residual saturations (Sr = {:?}, Swr = {:?}) are incorrect; they must be ≥ 0.0 and add up to less than 1.0",
                self.residual_hc_saturation(),
                rp.residual_water_saturation
            ));
        }
        if rp.exponent < 1.0 {
            return Some(format!(
                "relative permeability exponent = {:?} is incorrect; it must be ≥ 1.0",
                rp.exponent
            ));
        }
        if self.param_capillary.lambda <= 0.0 || self.param_capillary.pc_max < 0.0 {
            return Some(format!(
                "capillary parameters (λ = {:?}, pc_max = {:?}) are incorrect; they must be > 0.0 and ≥ 0.0",
                self.param_capillary.lambda, self.param_capillary.pc_max
            ));
        }
        for species in ImmobileSpeciesId::ALL {
            if self.immobile_densities[species.index()] <= 0.0 {
                return Some(format!("density of immobile species {} must be > 0.0", species.name()));
            }
        }
        None
    }
}

impl fmt::Display for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Darcy flow configuration\n").unwrap();
        write!(f, "========================\n").unwrap();
        write!(f, "maximum_time_step_size = {:?}\n", self.maximum_time_step_size).unwrap();
        write!(f, "use_immobile_saturation = {:?}\n", self.use_immobile_saturation).unwrap();
        write!(
            f,
            "grad_pressure_limiter = {:?} ({:?})\n",
            self.limit_grad_pressure, self.grad_pressure_maximum
        )
        .unwrap();
        write!(
            f,
            "flux_permeability_limiter = {:?} ({:?})\n",
            self.limit_flux_permeability, self.flux_permeability_maximum
        )
        .unwrap();
        write!(f, "include_capillary_pressure = {:?}\n", self.include_capillary_pressure).unwrap();
        write!(
            f,
            "interpolate (permeability, pore volume, area) = ({:?}, {:?}, {:?})\n",
            self.interpolate_face_permeability, self.interpolate_pore_volume, self.interpolate_face_area
        )
        .unwrap();
        write!(f, "use_saturation_estimate = {:?}\n", self.use_saturation_estimate).unwrap();
        write!(
            f,
            "residual_hc_saturation_scaling = {:?}\n",
            self.residual_hc_saturation_scaling
        )
        .unwrap();
        write!(
            f,
            "sub-sampling (minimum, otgc, pvt, flux) = ({}, {}, {}, {})\n",
            self.time_step_sub_sample,
            self.time_step_sub_sample_otgc,
            self.time_step_sub_sample_pvt,
            self.time_step_sub_sample_flux
        )
        .unwrap();
        write!(f, "use_otgc = {:?}\n", self.use_otgc).unwrap();
        write!(f, "interpolator_degree = {:?}\n", self.interpolator_degree).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FlowConfig;
    use crate::base::{ImmobileSpeciesId, ParamRelPerm, DEFAULT_TEST_DIR};
    use crate::StrError;
    use std::fs;

    #[test]
    fn new_works() -> Result<(), StrError> {
        let mut config = FlowConfig::new();
        assert_eq!(config.validate(), None);
        config
            .set_maximum_time_step_size(0.5)?
            .set_grad_pressure_limiter(2.0e4)?
            .set_flux_permeability_limiter(100.0)?
            .set_residual_hc_saturation_scaling(0.5)?
            .set_sub_sampling(4, 2, 1, 1)?
            .set_interpolator_degree(3)?
            .set_immobile_density(ImmobileSpeciesId::Coke2, 1250.0)?;
        assert_eq!(config.validate(), None);
        assert_eq!(config.immobile_densities[ImmobileSpeciesId::Coke2.index()], 1250.0);
        assert_eq!(
            format!("{}", config),
            "Darcy flow configuration\n\
             ========================\n\
             maximum_time_step_size = 0.5\n\
             use_immobile_saturation = true\n\
             grad_pressure_limiter = true (20000.0)\n\
             flux_permeability_limiter = true (100.0)\n\
             include_capillary_pressure = false\n\
             interpolate (permeability, pore volume, area) = (true, true, true)\n\
             use_saturation_estimate = false\n\
             residual_hc_saturation_scaling = 0.5\n\
             sub-sampling (minimum, otgc, pvt, flux) = (4, 2, 1, 1)\n\
             use_otgc = false\n\
             interpolator_degree = 3\n"
        );
        Ok(())
    }

    #[test]
    fn setters_capture_errors() {
        let mut config = FlowConfig::new();
        assert_eq!(
            config.set_maximum_time_step_size(0.0).err(),
            Some("maximum_time_step_size must be ≥ CONFIG_MIN_TIME_STEP")
        );
        assert_eq!(
            config.set_grad_pressure_limiter(0.0).err(),
            Some("grad_pressure_maximum must be > 0.0")
        );
        assert_eq!(
            config.set_flux_permeability_limiter(-1.0).err(),
            Some("flux_permeability_maximum must be > 0.0")
        );
        assert_eq!(
            config.set_sub_sampling(1, 0, 1, 1).err(),
            Some("sub-sampling numbers must be ≥ 1")
        );
        assert_eq!(config.set_interpolator_degree(0).err(), Some("interpolator_degree must be ≥ 1"));
        assert_eq!(
            config.set_immobile_density(ImmobileSpeciesId::Coke1, 0.0).err(),
            Some("immobile density must be > 0.0")
        );
    }

    #[test]
    fn validate_captures_errors() {
        let mut config = FlowConfig::new();
        config.cfl_safety_factor = 1.5;
        assert_eq!(
            config.validate(),
            Some("cfl_safety_factor = 1.5 is incorrect; it must be in (0, 1]".to_string())
        );
        config.cfl_safety_factor = 0.5;
        config.param_rel_perm = ParamRelPerm {
            residual_hc_saturation: 0.6,
            residual_water_saturation: 0.5,
            exponent: 2.0,
        };
        assert!(config.validate().unwrap().starts_with("residual saturations"));
        config.param_rel_perm.residual_hc_saturation = 0.1;
        assert_eq!(config.validate(), None);
        config.immobile_densities[0] = 0.0;
        assert_eq!(
            config.validate(),
            Some("density of immobile species precoke must be > 0.0".to_string())
        );
    }

    #[test]
    fn read_json_works() -> Result<(), StrError> {
        let mut config = FlowConfig::new();
        config.use_otgc = true;
        config.maximum_time_step_size = 0.25;
        let path = format!("{}/flow_config.json", DEFAULT_TEST_DIR);
        fs::create_dir_all(DEFAULT_TEST_DIR).map_err(|_| "cannot create directory")?;
        let json = serde_json::to_string_pretty(&config).map_err(|_| "cannot serialize")?;
        fs::write(&path, json).map_err(|_| "cannot write file")?;
        let read = FlowConfig::read_json(&path)?;
        assert_eq!(read.use_otgc, true);
        assert_eq!(read.maximum_time_step_size, 0.25);
        assert_eq!(FlowConfig::read_json("/tmp/darcysim/__none__.json").err(), Some("file not found"));
        Ok(())
    }
}
