use darcysim::prelude::*;
use darcysim::StrError;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "darcy_chain",
    about = "Runs the explicit Darcy flow along a horizontal chain of elements"
)]
struct Options {
    /// Number of elements
    #[structopt(short = "n", long, default_value = "3")]
    n_element: usize,

    /// Pore pressure of the first element (MPa)
    #[structopt(long, default_value = "20.0")]
    pressure: f64,

    /// Pressure drop between consecutive elements (MPa)
    #[structopt(long, default_value = "1.0")]
    pressure_drop: f64,

    /// Permeability of the rock (mD)
    #[structopt(long, default_value = "1e-4")]
    permeability: f64,

    /// Initial mass of oil in each element (kg)
    #[structopt(long, default_value = "1e6")]
    mass: f64,

    /// Duration of the time-step (Ma)
    #[structopt(long, default_value = "1.0")]
    duration: f64,

    /// JSON file with the flow configuration
    #[structopt(long)]
    config: Option<String>,

    /// Output directory
    #[structopt(long, default_value = "/tmp/darcysim/results")]
    out_dir: String,

    /// Prints the sub-step table and the timings
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();
    if options.n_element < 1 {
        return Err("the number of elements must be ≥ 1");
    }

    // subdomain and properties
    let subdomain = SampleSubdomains::chain(
        options.n_element,
        SampleParams::param_uniform_rock(0.2, options.permeability),
    )?;
    let mut table = PropertyTable::new();
    table.set_uniform(FundamentalProperty::Temperature, 80.0, 80.0);
    for element in subdomain.elements() {
        let p = options.pressure - options.pressure_drop * (element.index.i as f64);
        table.set_element(element.index, FundamentalProperty::PorePressure, p, p);
        table.set_element(element.index, FundamentalProperty::HydrostaticPressure, p, p);
    }
    let mut store = PropertyStore::new(Box::new(table));

    // configuration
    let mut config = match &options.config {
        Some(path) => FlowConfig::read_json(path)?,
        None => FlowConfig::new(),
    };
    config.verbose_sub_steps = config.verbose_sub_steps || options.verbose;
    config.verbose_summary = config.verbose_summary || options.verbose;

    // initial state
    let mut state = FlowState::new(&subdomain, 0.0);
    let oil = PvtComponents::single(ComponentId::C15PlusSat, options.mass);
    for element in subdomain.elements() {
        state.set_mass(&subdomain, &mut store, element.index, &oil)?;
    }

    // solver
    let flash = SinglePhaseFlash::new(800.0, 1e-3);
    let registry = AdsorptionRegistry::with_defaults();
    let mut solver = ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &subdomain)?;
    let indicator = solver.solve(&subdomain, &mut store, &mut state, 0.0, options.duration)?;

    // results
    let path = format!("{}/darcy_chain_statistics.json", options.out_dir);
    solver.stats.write(&path)?;
    let thin_line = format!("{:─^1$}", "", 79);
    println!("\n{}", thin_line);
    println!("{:>10} {:>16} {:>10} {:>10}", "element", "mass (kg)", "in", "out");
    for element in subdomain.elements() {
        let mass = state.element_mass(&subdomain, &mut store, element.index, 1.0)?;
        println!(
            "{:>10} {:>16.6e} {:>10} {:>10}",
            element.index.to_string(),
            mass.sum(),
            solver.stats.transport_in_count[element.index],
            solver.stats.transport_out_count[element.index]
        );
    }
    println!("{}", thin_line);
    println!("outcome    = {:?}", indicator);
    println!("statistics = {}", path);
    println!("{}\n", thin_line);
    if indicator != DarcyErrorIndicator::NoError {
        return Err("the flow time-step failed");
    }
    Ok(())
}
