use crate::grid::{ElementGrid, Subdomain};
use crate::StrError;
use russell_lab::format_nanoseconds;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the wall-clock durations (ns) spent in each phase of the work
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FlowTimings {
    pub otgc: u128,
    pub flash: u128,
    pub flux: u128,
    pub pressure: u128,
    pub permeability: u128,
    pub previous: u128,
    pub source: u128,
    pub transport: u128,
    pub mass: u128,
    pub concentration: u128,
    pub saturation: u128,
    pub estimated: u128,
}

/// Holds the counters and timings of one call to the solver
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowStatistics {
    /// Number of flashes
    pub flash_count: usize,

    /// Number of (element, sub-step) pairs with transported mass
    pub transport_count: usize,

    /// Number of sub-steps
    pub n_sub_step: usize,

    /// Number of sub-steps in which each element received mass
    pub transport_in_count: ElementGrid<usize>,

    /// Number of sub-steps in which each element lost mass
    pub transport_out_count: ElementGrid<usize>,

    /// Mass (kg) received by each element
    pub transport_in_mass: ElementGrid<f64>,

    /// Mass (kg) lost by each element
    pub transport_out_mass: ElementGrid<f64>,

    /// Mass (kg) added by the source term to each formation
    pub layer_mass_added: Vec<f64>,

    /// Number of face gradients clamped by the pressure gradient limiter
    pub n_grad_pressure_clamp: usize,

    /// Number of face permeabilities clamped by the permeability limiter
    pub n_permeability_clamp: usize,

    /// Largest sub-step applied (Ma)
    pub max_sub_step_size: f64,

    /// Wall-clock timings
    pub timings: FlowTimings,
}

impl FlowStatistics {
    /// Allocates a new instance
    pub fn new(subdomain: &Subdomain) -> Self {
        FlowStatistics {
            flash_count: 0,
            transport_count: 0,
            n_sub_step: 0,
            transport_in_count: subdomain.new_grid(0),
            transport_out_count: subdomain.new_grid(0),
            transport_in_mass: subdomain.new_grid(0.0),
            transport_out_mass: subdomain.new_grid(0.0),
            layer_mass_added: vec![0.0; subdomain.formations.len()],
            n_grad_pressure_clamp: 0,
            n_permeability_clamp: 0,
            max_sub_step_size: 0.0,
            timings: FlowTimings::default(),
        }
    }

    /// Returns the total mass (kg) added by the source term
    pub fn mass_added(&self) -> f64 {
        self.layer_mass_added.iter().sum()
    }

    /// Reads a JSON file containing the statistics
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
        let stats = serde_json::from_reader(reader).map_err(|_| "deserialize failed")?;
        Ok(stats)
    }

    /// Writes a JSON file with the statistics
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }

    /// Prints the header of the sub-step table
    pub fn print_header(&self, start: f64, end: f64) {
        println!("\nDARCY === EXPLICIT FLOW FROM {} Ma TO {} Ma ===========================", start, end);
        println!("{}", "─".repeat(79));
        println!(
            "{:>8} {:>11} {:>11} {:>11} {:>8} {:>10}",
            "sub-step", "λ", "Δλ", "Δt (Ma)", "flashes", "transports"
        );
        println!("{}", "─".repeat(79));
    }

    /// Prints one line of the sub-step table
    pub fn print_sub_step(&self, lambda: f64, dlambda: f64, dt: f64, n_flash: usize, n_transport: usize) {
        println!(
            "{:>8} {:>11.6e} {:>11.6e} {:>11.6e} {:>8} {:>10}",
            self.n_sub_step, lambda, dlambda, dt, n_flash, n_transport
        );
    }

    /// Prints the counters and timings
    pub fn print_summary(&self) {
        let t = &self.timings;
        println!("{}", "─".repeat(79));
        println!("number of sub-steps  = {}", self.n_sub_step);
        println!("number of flashes    = {}", self.flash_count);
        println!("number of transports = {}", self.transport_count);
        println!("mass added (kg)      = {:e}", self.mass_added());
        println!(
            "limiter clamps       = {} (gradient), {} (permeability)",
            self.n_grad_pressure_clamp, self.n_permeability_clamp
        );
        let rows = [
            ("otgc", t.otgc),
            ("flash", t.flash),
            ("flux", t.flux),
            ("pressure", t.pressure),
            ("permeability", t.permeability),
            ("previous", t.previous),
            ("source", t.source),
            ("transport", t.transport),
            ("mass", t.mass),
            ("concentration", t.concentration),
            ("saturation", t.saturation),
            ("estimated", t.estimated),
        ];
        for (name, ns) in rows {
            println!("{:>13} : {}", name, format_nanoseconds(ns));
        }
        println!("{}", "─".repeat(79));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FlowStatistics;
    use crate::base::{SampleParams, DEFAULT_TEST_DIR};
    use crate::grid::{GlobalIndex, SampleSubdomains};

    #[test]
    fn write_and_read_work() {
        let subdomain = SampleSubdomains::chain(2, SampleParams::param_sandstone()).unwrap();
        let mut stats = FlowStatistics::new(&subdomain);
        stats.flash_count = 7;
        stats.transport_in_count[GlobalIndex::new(1, 0, 0)] = 3;
        stats.layer_mass_added[0] = 2.5;
        stats.timings.flash = 1234;
        let path = format!("{}/flow_statistics.json", DEFAULT_TEST_DIR);
        stats.write(&path).unwrap();
        let read = FlowStatistics::read_json(&path).unwrap();
        assert_eq!(read.flash_count, 7);
        assert_eq!(read.transport_in_count[GlobalIndex::new(1, 0, 0)], 3);
        assert_eq!(read.mass_added(), 2.5);
        assert_eq!(read.timings.flash, 1234);
        assert_eq!(
            FlowStatistics::read_json("/tmp/darcysim/__nothing__.json").err(),
            Some("file not found")
        );
        stats.print_header(0.0, 1.0);
        stats.print_sub_step(0.0, 0.5, 0.5, 1, 0);
        stats.print_summary();
    }
}
