/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/darcysim/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/darcysim/test";

/// Number of seconds in one million years (Ma)
pub const SECONDS_PER_MA: f64 = 1.0e6 * 365.25 * 24.0 * 3600.0;

/// Gravity acceleration (m/s²)
pub const GRAVITY: f64 = 9.807;

/// Converts permeabilities from milli-Darcy to m²
pub const MILLI_DARCY_TO_M2: f64 = 9.869233e-16;

/// Converts pressures from MPa to Pa
pub const MPA_TO_PA: f64 = 1.0e6;

/// Converts temperatures from ℃ to K
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Ideal gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.314462618;

/// Surface (standard) temperature (℃)
pub const STANDARD_TEMPERATURE: f64 = 15.0;

/// Surface (standard) pressure (MPa)
pub const STANDARD_PRESSURE: f64 = 0.101325;
