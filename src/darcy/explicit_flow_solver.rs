use super::{DarcyCalculations, FlowState, FlowStatistics, PhaseState};
use crate::base::{ElementFaceValues, Face, FlowConfig, FundamentalProperty, PhaseId, PvtComponents};
use crate::base::{PvtPhaseValues, Saturation};
use crate::base::{GRAVITY, MILLI_DARCY_TO_M2, MPA_TO_PA, NUM_FACES, SECONDS_PER_MA};
use crate::grid::{Boolean3DArray, ElementGrid, GlobalIndex, PropertyStore, Subdomain};
use crate::interp::{FaceAreaCalculator, FacePermeabilityCalculator, PoreVolumeCalculator, SourceTermCalculator};
use crate::interp::{TemporalEvaluator, TemporalPropertyInterpolator};
use crate::model::{AdsorptionFunction, AdsorptionRegistry, CapillaryModel, OtgcSimulator, PvtFlash};
use crate::model::{RelPermModel, SourceTermProvider};
use crate::StrError;
use russell_lab::{format_nanoseconds, Stopwatch};
use serde::{Deserialize, Serialize};

/// Defines the outcome of one call to [ExplicitFlowSolver::solve]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DarcyErrorIndicator {
    /// The whole interval was integrated
    NoError,

    /// Some saturation could not be computed
    ErrorInSaturation,

    /// Some concentration became negative or non-finite
    ErrorInConcentration,

    /// The phase-equilibrium calculation of some element failed
    ErrorInFlash,

    /// The number of sub-steps exceeded the configured maximum
    TooManySubSteps,
}

/// Lists the properties required by one call to solve
const REQUIRED_PROPERTIES: [FundamentalProperty; 6] = [
    FundamentalProperty::Depth,
    FundamentalProperty::Ves,
    FundamentalProperty::MaxVes,
    FundamentalProperty::HydrostaticPressure,
    FundamentalProperty::PorePressure,
    FundamentalProperty::Temperature,
];

/// Face values needed by the fluxes of one sub-step
struct FluxWorkspace {
    /// Own face permeabilities (m²)
    own_permeability: ElementGrid<ElementFaceValues>,

    /// Averaged face permeabilities (m²)
    permeability: ElementGrid<ElementFaceValues>,

    /// Face areas (m²)
    area: ElementGrid<ElementFaceValues>,

    /// Phase pressures (Pa)
    pressure: ElementGrid<PvtPhaseValues>,

    /// Net rate of change of the component masses (kg/s)
    net_rate: ElementGrid<PvtComponents>,

    /// Total mass rate entering each element (kg/s)
    in_rate: ElementGrid<f64>,

    /// Total mass rate leaving each element (kg/s)
    out_rate: ElementGrid<f64>,

    /// Mass rate of each phase leaving each element (kg/s)
    phase_out_rate: ElementGrid<PvtPhaseValues>,
}

impl FluxWorkspace {
    fn new(subdomain: &Subdomain) -> Self {
        FluxWorkspace {
            own_permeability: subdomain.new_grid(ElementFaceValues::new()),
            permeability: subdomain.new_grid(ElementFaceValues::new()),
            area: subdomain.new_grid(ElementFaceValues::new()),
            pressure: subdomain.new_grid(PvtPhaseValues::new()),
            net_rate: subdomain.new_grid(PvtComponents::new()),
            in_rate: subdomain.new_grid(0.0),
            out_rate: subdomain.new_grid(0.0),
            phase_out_rate: subdomain.new_grid(PvtPhaseValues::new()),
        }
    }

    fn reset_rates(&mut self) {
        self.net_rate.fill(PvtComponents::new());
        self.in_rate.fill(0.0);
        self.out_rate.fill(0.0);
        self.phase_out_rate.fill(PvtPhaseValues::new());
    }
}

/// Implements the explicit multi-component Darcy flow solver
///
/// Each call to [ExplicitFlowSolver::solve] integrates the hydrocarbon transport over one
/// pressure/temperature time-step. The time-step is split into sub-steps limited by the
/// maximum time-step size, the sub-sampling option and a CFL-like stability condition.
/// Within each sub-step:
///
/// ```text
/// c₁ Vp(λ₁) = c₀ Vp(λ₀) + Σ_faces F Δt + S Δλ
/// ```
///
/// where F are the upwind two-point fluxes of each phase and S is the chemistry source term.
pub struct ExplicitFlowSolver<'a> {
    /// Holds the configuration
    config: &'a FlowConfig,

    /// Holds the phase-equilibrium collaborator
    flash: &'a dyn PvtFlash,

    /// Holds the chemistry source-term collaborator
    source_terms: &'a dyn SourceTermProvider,

    /// Holds the adsorption function of each formation, if any
    adsorption: Vec<Option<Box<dyn AdsorptionFunction>>>,

    /// Holds the secondary cracking simulator
    otgc: OtgcSimulator,

    /// Holds the relative permeability model
    rel_perm: RelPermModel,

    /// Holds the capillary pressure model
    capillary: CapillaryModel,

    /// Holds the counters and timings of the last call to solve
    pub stats: FlowStatistics,
}

impl<'a> ExplicitFlowSolver<'a> {
    /// Allocates a new instance
    ///
    /// * `registry` -- adsorption functions available to the source-rock formations
    pub fn new(
        config: &'a FlowConfig,
        flash: &'a dyn PvtFlash,
        source_terms: &'a dyn SourceTermProvider,
        registry: &AdsorptionRegistry,
        subdomain: &Subdomain,
    ) -> Result<Self, StrError> {
        if let Some(msg) = config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate solver because config.validate() failed");
        }
        for formation in &subdomain.formations {
            if let Some(msg) = formation.lithology.validate() {
                println!("ERROR: formation '{}': {}", formation.name, msg);
                return Err("cannot allocate solver because the lithology parameters are invalid");
            }
        }
        let adsorption = match registry.build_all(subdomain) {
            Ok(functions) => functions,
            Err(msg) => {
                println!("ERROR: {}", msg);
                return Err("cannot allocate solver because the adsorption setup is invalid");
            }
        };
        Ok(ExplicitFlowSolver {
            config,
            flash,
            source_terms,
            adsorption,
            otgc: OtgcSimulator::new_default(),
            rel_perm: RelPermModel::new(&config.param_rel_perm, config.residual_hc_saturation_scaling),
            capillary: CapillaryModel::new(&config.param_capillary, config.param_rel_perm.residual_water_saturation),
            stats: FlowStatistics::new(subdomain),
        })
    }

    /// Replaces the secondary cracking simulator
    pub fn set_otgc(&mut self, otgc: OtgcSimulator) -> &mut Self {
        self.otgc = otgc;
        self
    }

    /// Integrates the hydrocarbon transport from `start` to `end` (Ma)
    ///
    /// The properties required by the solver are activated for the duration of the call;
    /// those not previously active are deactivated on every exit path.
    ///
    /// Returns the aggregated error indicator. On error, the state holds the values reached
    /// when the failure was detected and `state.time` the end of the last completed sub-step.
    pub fn solve(
        &mut self,
        subdomain: &Subdomain,
        store: &mut PropertyStore,
        state: &mut FlowState,
        start: f64,
        end: f64,
    ) -> Result<DarcyErrorIndicator, StrError> {
        if !(end > start) {
            return Err("end time must be greater than start time");
        }
        let config = self.config;
        let interval = end - start;
        let calc = DarcyCalculations::new(config);
        self.stats = FlowStatistics::new(subdomain);
        let mut total_watch = Stopwatch::new();

        // activate properties
        let properties = store.activate(&REQUIRED_PROPERTIES);

        // linear interpolators
        let mut watch = Stopwatch::new();
        let mut pressure = TemporalPropertyInterpolator::new(subdomain);
        let mut temperature = TemporalPropertyInterpolator::new(subdomain);
        let mut depth = TemporalPropertyInterpolator::new(subdomain);
        pressure.set_property(subdomain, &properties, FundamentalProperty::PorePressure)?;
        temperature.set_property(subdomain, &properties, FundamentalProperty::Temperature)?;
        depth.set_property(subdomain, &properties, FundamentalProperty::Depth)?;
        self.stats.timings.pressure += watch.stop();

        // polynomial interpolators
        let degree = config.interpolator_degree;
        let mut pore_volume = TemporalEvaluator::new(
            subdomain,
            PoreVolumeCalculator::new(subdomain, &properties),
            config.interpolate_pore_volume,
            degree,
        )?;
        let mut face_area = TemporalEvaluator::new(
            subdomain,
            FaceAreaCalculator::new(subdomain, &properties),
            config.interpolate_face_area,
            degree,
        )?;
        let mut face_permeability = TemporalEvaluator::new(
            subdomain,
            FacePermeabilityCalculator::new(subdomain, &properties),
            config.interpolate_face_permeability,
            degree,
        )?;
        let mut source = TemporalEvaluator::new(subdomain, SourceTermCalculator::new(self.source_terms), true, degree)?;

        // work arrays
        let mut pore_volumes_start = subdomain.new_grid(0.0);
        let mut pore_volumes_end = subdomain.new_grid(0.0);
        let mut pore_volume_rates = subdomain.new_grid(0.0);
        let mut contains_hc = subdomain.new_grid(false);
        let mut transports_hc = subdomain.new_grid(false);
        let mut phases = PhaseState::new(subdomain);
        let mut temporal = subdomain.new_grid(PvtComponents::new());
        let mut source_term = subdomain.new_grid(PvtComponents::new());
        let mut transport = subdomain.new_grid(PvtComponents::new());
        let mut workspace = FluxWorkspace::new(subdomain);
        let mut stable_dt = f64::INFINITY; // Ma

        if config.verbose_sub_steps {
            self.stats.print_header(start, end);
        }

        let mut indicator = DarcyErrorIndicator::NoError;
        let mut lambda = 0.0;
        let mut lambda_otgc = 0.0;
        let mut values = [0.0; 2];
        while lambda < 1.0 {
            let n = self.stats.n_sub_step;
            if n >= config.max_n_sub_steps {
                indicator = DarcyErrorIndicator::TooManySubSteps;
                break;
            }

            // pore volumes at the start of the sub-step
            watch.reset();
            for element in subdomain.elements() {
                pore_volume.evaluate(&element, lambda, &mut values)?;
                pore_volumes_start[element.index] = values[0];
                pore_volume_rates[element.index] = values[1];
            }
            self.stats.timings.previous += watch.stop();

            // gate the flash and flux work
            watch.reset();
            self.estimate_hc_transport(
                subdomain,
                state,
                &pore_volumes_start,
                &pore_volume_rates,
                lambda,
                &mut contains_hc,
                &mut transports_hc,
            );
            self.stats.timings.estimated += watch.stop();

            // phase split at the start of the sub-step
            watch.reset();
            let force = n % config.time_step_sub_sample_pvt == 0;
            let mut n_flash = match calc.flash_components(
                subdomain,
                self.flash,
                &state.concentrations,
                &contains_hc,
                &pressure,
                &temperature,
                lambda,
                force,
                &mut phases,
            ) {
                Ok(count) => count,
                Err((index, msg)) => {
                    if config.verbose_sub_steps {
                        println!("ERROR: flash of element {} failed: {}", index, msg);
                    }
                    indicator = DarcyErrorIndicator::ErrorInFlash;
                    break;
                }
            };
            self.stats.flash_count += n_flash;
            calc.resplit_components(subdomain, &state.concentrations, &mut phases);
            self.stats.timings.flash += watch.stop();
            watch.reset();
            let error = calc.set_saturations_with_k_values(
                subdomain,
                &phases,
                &state.immobiles,
                &pore_volumes_start,
                &mut state.saturations,
                &mut state.k_values,
            );
            self.stats.timings.saturation += watch.stop();
            if let Some((index, kind)) = error {
                if config.verbose_sub_steps {
                    println!("ERROR: saturation of element {} failed: {:?}", index, kind);
                }
                indicator = DarcyErrorIndicator::ErrorInSaturation;
                break;
            }

            // fluxes
            if n % config.time_step_sub_sample_flux == 0 {
                watch.reset();
                for element in subdomain.elements() {
                    let mut own = [0.0; NUM_FACES];
                    face_permeability.evaluate(&element, lambda, &mut own)?;
                    workspace.own_permeability[element.index].values = own;
                    let mut area = [0.0; NUM_FACES];
                    face_area.evaluate(&element, lambda, &mut area)?;
                    workspace.area[element.index].values = area;
                }
                calc.compute_average_permeabilities(
                    subdomain,
                    &workspace.own_permeability,
                    &mut workspace.permeability,
                );
                self.stats.timings.permeability += watch.stop();

                watch.reset();
                self.compute_pressure(subdomain, &pressure, &state.saturations, lambda, &mut workspace.pressure);
                self.stats.timings.pressure += watch.stop();

                watch.reset();
                stable_dt = self.compute_flux_terms(
                    subdomain,
                    &depth,
                    &phases,
                    &state.saturations,
                    &transports_hc,
                    &pore_volumes_start,
                    lambda,
                    &mut workspace,
                ) / SECONDS_PER_MA;
                self.stats.timings.flux += watch.stop();
            }

            // sub-step size
            let mut dlambda = f64::min(1.0 / (config.time_step_sub_sample as f64), 1.0 - lambda);
            dlambda = f64::min(dlambda, config.maximum_time_step_size / interval);
            dlambda = f64::min(dlambda, stable_dt / interval);
            let lambda_end = if lambda + dlambda > 1.0 - 1e-12 { 1.0 } else { lambda + dlambda };
            let dlambda = lambda_end - lambda;
            let dt = dlambda * interval;
            self.stats.n_sub_step += 1;
            self.stats.max_sub_step_size = f64::max(self.stats.max_sub_step_size, dt);

            // pore volumes at the end of the sub-step
            watch.reset();
            for element in subdomain.elements() {
                pore_volume.evaluate(&element, lambda_end, &mut values)?;
                pore_volumes_end[element.index] = values[0];
            }
            calc.compute_temporal_contributions(subdomain, &state.concentrations, &pore_volumes_start, &mut temporal);
            self.stats.timings.mass += watch.stop();

            // source term
            watch.reset();
            source_term.fill(PvtComponents::new());
            calc.compute_source_term(
                subdomain,
                &mut source_term,
                &mut contains_hc,
                &mut source,
                &pore_volumes_end,
                lambda + 0.5 * dlambda,
                dlambda,
                &mut self.stats.layer_mass_added,
            )?;
            self.stats.timings.source += watch.stop();

            // transport
            watch.reset();
            let n_transport = self.transport_components(subdomain, &workspace, dt * SECONDS_PER_MA, &mut transport);
            self.stats.timings.transport += watch.stop();

            // concentrations
            watch.reset();
            let error = calc.set_concentrations(
                subdomain,
                &temporal,
                &source_term,
                &transport,
                &pore_volumes_end,
                &mut state.concentrations,
            );
            calc.rescale_retained(subdomain, &pore_volumes_start, &pore_volumes_end, state);
            self.stats.timings.concentration += watch.stop();
            if let Some((index, kind)) = error {
                if config.verbose_sub_steps {
                    println!("ERROR: concentration of element {} failed: {:?}", index, kind);
                }
                indicator = DarcyErrorIndicator::ErrorInConcentration;
                break;
            }

            // retained hydrocarbons
            calc.apply_adsorption(
                subdomain,
                &self.adsorption,
                &pressure,
                &temperature,
                &pore_volumes_end,
                lambda_end,
                state,
            );
            let last = lambda_end >= 1.0;
            if (n + 1) % config.time_step_sub_sample_otgc == 0 || last {
                watch.reset();
                calc.apply_otgc(
                    &self.otgc,
                    subdomain,
                    &temperature,
                    &pore_volumes_end,
                    state,
                    start + lambda_otgc * interval,
                    start + lambda_end * interval,
                    lambda_otgc,
                    lambda_end,
                );
                lambda_otgc = lambda_end;
                self.stats.timings.otgc += watch.stop();
            }

            // phase split at the end of the sub-step
            watch.reset();
            for element in subdomain.elements() {
                if state.concentrations[element.index].sum() > config.hc_content_epsilon {
                    contains_hc[element.index] = true;
                }
            }
            let n_flash_end = match calc.flash_components(
                subdomain,
                self.flash,
                &state.concentrations,
                &contains_hc,
                &pressure,
                &temperature,
                lambda_end,
                false,
                &mut phases,
            ) {
                Ok(count) => count,
                Err((index, msg)) => {
                    if config.verbose_sub_steps {
                        println!("ERROR: flash of element {} failed: {}", index, msg);
                    }
                    indicator = DarcyErrorIndicator::ErrorInFlash;
                    break;
                }
            };
            n_flash += n_flash_end;
            self.stats.flash_count += n_flash_end;
            calc.resplit_components(subdomain, &state.concentrations, &mut phases);
            self.stats.timings.flash += watch.stop();

            watch.reset();
            let error = calc.set_saturations_with_k_values(
                subdomain,
                &phases,
                &state.immobiles,
                &pore_volumes_end,
                &mut state.saturations,
                &mut state.k_values,
            );
            self.stats.timings.saturation += watch.stop();

            lambda = lambda_end;
            state.time = start + lambda * interval;
            calc.set_time_of_element_invasion(subdomain, &state.concentrations, state.time, &mut state.time_of_invasion);

            if config.verbose_sub_steps {
                self.stats.print_sub_step(lambda, dlambda, dt, n_flash, n_transport);
            }
            if let Some((index, kind)) = error {
                if config.verbose_sub_steps {
                    println!("ERROR: saturation of element {} failed: {:?}", index, kind);
                }
                indicator = DarcyErrorIndicator::ErrorInSaturation;
                break;
            }
        }

        if self.stats.n_sub_step > 0 {
            calc.average_global_saturation(subdomain, &pore_volumes_end, &mut state.saturations);
        }
        if indicator == DarcyErrorIndicator::NoError {
            state.time = end;
        }
        let elapsed = total_watch.stop();
        if config.verbose_summary {
            self.stats.print_summary();
            println!("total time = {}", format_nanoseconds(elapsed));
        }
        Ok(indicator)
    }

    /// Flags the elements containing hydrocarbons and those able to transport them
    fn estimate_hc_transport(
        &self,
        subdomain: &Subdomain,
        state: &FlowState,
        pore_volumes: &ElementGrid<f64>,
        pore_volume_rates: &ElementGrid<f64>,
        lambda: f64,
        contains_hc: &mut Boolean3DArray,
        transports_hc: &mut Boolean3DArray,
    ) {
        let config = self.config;
        let residual = self.rel_perm.residual_hc_saturation();
        for element in subdomain.elements() {
            let index = element.index;
            let density = state.concentrations[index].sum();
            contains_hc[index] = pore_volumes[index] > 0.0 && density > config.hc_content_epsilon;
            transports_hc[index] = if !contains_hc[index] {
                false
            } else if config.use_saturation_estimate {
                // end-of-step pore volume bounds the saturation from above
                let mass = density * pore_volumes[index];
                let volume = pore_volumes[index] + pore_volume_rates[index] * (1.0 - lambda);
                volume > 0.0 && mass / (config.estimated_hc_density * volume) > residual
            } else {
                true
            };
        }
    }

    /// Computes the phase pressures (Pa) from the water pressure and the capillary pressure
    fn compute_pressure(
        &self,
        subdomain: &Subdomain,
        water_pressure: &TemporalPropertyInterpolator,
        saturations: &ElementGrid<Saturation>,
        lambda: f64,
        phase_pressure: &mut ElementGrid<PvtPhaseValues>,
    ) {
        for element in subdomain.elements() {
            let index = element.index;
            let mut p = water_pressure.value(index, lambda);
            if self.config.include_capillary_pressure {
                let entry = subdomain.lithology(&element).capillary_entry_pressure;
                p += self.capillary.calc(entry, saturations[index].water);
            }
            phase_pressure[index] = PvtPhaseValues::uniform(p * MPA_TO_PA);
        }
    }

    /// Computes the upwind fluxes of all phases across all internal faces
    ///
    /// Returns the stable time-step size in seconds (infinite if nothing flows).
    fn compute_flux_terms(
        &mut self,
        subdomain: &Subdomain,
        depth: &TemporalPropertyInterpolator,
        phases: &PhaseState,
        saturations: &ElementGrid<Saturation>,
        transports_hc: &Boolean3DArray,
        pore_volumes: &ElementGrid<f64>,
        lambda: f64,
        workspace: &mut FluxWorkspace,
    ) -> f64 {
        workspace.reset_rates();
        for element in subdomain.elements() {
            let a = element.index;
            for face in [Face::Right, Face::Back, Face::Top] {
                let b = match subdomain.neighbour(a, face) {
                    Some(b) => b,
                    None => continue,
                };
                if !transports_hc[a] && !transports_hc[b] {
                    continue;
                }
                if pore_volumes[a] <= 0.0 || pore_volumes[b] <= 0.0 {
                    continue;
                }
                for phase in PhaseId::ALL {
                    self.compute_flux_for_phase(subdomain, depth, phases, saturations, transports_hc, lambda, a, b, face, phase, workspace);
                }
            }
        }

        // CFL-like condition on the phase masses
        let mut stable = f64::INFINITY;
        for element in subdomain.elements() {
            let index = element.index;
            for phase in PhaseId::ALL {
                let rate = workspace.phase_out_rate[index][phase];
                if rate > 0.0 {
                    let mass = phases.flash[index].phase_composition.phase_sum(phase) * pore_volumes[index];
                    stable = f64::min(stable, mass / rate);
                }
            }
        }
        stable * self.config.cfl_safety_factor
    }

    /// Computes the two-point upwind flux of one phase across the face shared by `a` and `b`
    fn compute_flux_for_phase(
        &mut self,
        subdomain: &Subdomain,
        depth: &TemporalPropertyInterpolator,
        phases: &PhaseState,
        saturations: &ElementGrid<Saturation>,
        transports_hc: &Boolean3DArray,
        lambda: f64,
        a: GlobalIndex,
        b: GlobalIndex,
        face: Face,
        phase: PhaseId,
        workspace: &mut FluxWorkspace,
    ) {
        let (ra, rb) = (&phases.flash[a], &phases.flash[b]);
        let (ma, mb) = (ra.phase_composition.phase_sum(phase), rb.phase_composition.phase_sum(phase));

        // face density
        let density = match (ma > 0.0, mb > 0.0) {
            (true, true) => 0.5 * (ra.densities[phase] + rb.densities[phase]),
            (true, false) => ra.densities[phase],
            (false, true) => rb.densities[phase],
            (false, false) => return,
        };

        // potential difference (depth is positive downwards)
        let depth_a = depth.value(a, lambda);
        let depth_b = depth.value(b, lambda);
        let dp = workspace.pressure[a][phase] - workspace.pressure[b][phase];
        let potential = dp - density * GRAVITY * (depth_a - depth_b);
        if potential == 0.0 {
            return;
        }

        // distance between centres
        let distance = match face {
            Face::Top | Face::Bottom => {
                let dy = subdomain.dy;
                0.5 * (workspace.area[a][Face::Right] + workspace.area[b][Face::Right]) / dy
            }
            Face::Left | Face::Right => subdomain.dx,
            Face::Front | Face::Back => subdomain.dy,
        };
        if distance <= 0.0 {
            return;
        }
        let mut gradient = potential / distance;
        if self.config.limit_grad_pressure && f64::abs(gradient) > self.config.grad_pressure_maximum {
            gradient = f64::signum(gradient) * self.config.grad_pressure_maximum;
            self.stats.n_grad_pressure_clamp += 1;
        }

        let mut permeability = workspace.permeability[a][face];
        let maximum = self.config.flux_permeability_maximum * MILLI_DARCY_TO_M2;
        if self.config.limit_flux_permeability && permeability > maximum {
            permeability = maximum;
            self.stats.n_permeability_clamp += 1;
        }
        let area = 0.5 * (workspace.area[a][face] + workspace.area[b][face.opposite()]);

        // upwind element
        let (up, down, up_mass) = if gradient > 0.0 { (a, b, ma) } else { (b, a, mb) };
        if !transports_hc[up] || up_mass <= 0.0 {
            return;
        }
        let up_result = &phases.flash[up];
        let viscosity = up_result.viscosities[phase];
        if viscosity <= 0.0 {
            return;
        }
        let s = match phase {
            PhaseId::Vapour => saturations[up].vapour,
            PhaseId::Liquid => saturations[up].liquid,
        };
        let kr = self.rel_perm.calc(s);
        if kr <= 0.0 {
            return;
        }

        // numerical flux
        let volume_rate = permeability * kr / viscosity * area * f64::abs(gradient);
        let mass_rate = volume_rate * up_result.densities[phase];
        if mass_rate <= 0.0 || !mass_rate.is_finite() {
            return;
        }
        let fractions = up_result.phase_composition.mass_fractions(phase);
        workspace.net_rate[up].add_scaled(-mass_rate, &fractions);
        workspace.net_rate[down].add_scaled(mass_rate, &fractions);
        workspace.out_rate[up] += mass_rate;
        workspace.in_rate[down] += mass_rate;
        workspace.phase_out_rate[up][phase] += mass_rate;
    }

    /// Converts the flux rates into transported masses (kg) over `dt` seconds
    ///
    /// Returns the number of elements exchanging mass.
    fn transport_components(
        &mut self,
        subdomain: &Subdomain,
        workspace: &FluxWorkspace,
        dt: f64,
        transport: &mut ElementGrid<PvtComponents>,
    ) -> usize {
        let mut count = 0;
        for element in subdomain.elements() {
            let index = element.index;
            transport[index] = workspace.net_rate[index] * dt;
            let (mass_in, mass_out) = (workspace.in_rate[index] * dt, workspace.out_rate[index] * dt);
            if mass_in > 0.0 {
                self.stats.transport_in_count[index] += 1;
                self.stats.transport_in_mass[index] += mass_in;
            }
            if mass_out > 0.0 {
                self.stats.transport_out_count[index] += 1;
                self.stats.transport_out_mass[index] += mass_out;
            }
            if mass_in > 0.0 || mass_out > 0.0 {
                count += 1;
            }
        }
        self.stats.transport_count += count;
        count
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{DarcyErrorIndicator, ExplicitFlowSolver};
    use crate::base::{ComponentId, FlowConfig, FundamentalProperty as P, PvtComponents, SampleParams};
    use crate::darcy::{FlowState, FlowStatistics};
    use crate::grid::{Formation, GlobalIndex, PropertyStore, PropertyTable, SampleSubdomains, Subdomain};
    use crate::model::{AdsorptionRegistry, ConstantExpulsion, NoExpulsion, SinglePhaseFlash, WilsonFlash};
    use russell_lab::approx_eq;

    /// Returns a chain of n elements with 1e6 kg of oil in the first `n_filled` elements
    ///
    /// The pore pressure drops by `pressure_drop` MPa from one element to the next.
    fn oil_chain(
        n: usize,
        n_filled: usize,
        pressure_drop: f64,
        entry_pressure: f64,
    ) -> (Subdomain, PropertyStore, FlowState) {
        let mut rock = SampleParams::param_uniform_rock(0.2, 1e-4);
        rock.capillary_entry_pressure = entry_pressure;
        let subdomain = SampleSubdomains::chain(n, rock).unwrap();
        let mut table = PropertyTable::new();
        table.set_uniform(P::Temperature, 80.0, 80.0);
        for i in 0..n {
            let p = 20.0 - pressure_drop * (i as f64);
            table.set_element(GlobalIndex::new(i, 0, 0), P::PorePressure, p, p);
        }
        let mut store = PropertyStore::new(Box::new(table));
        let mut state = FlowState::new(&subdomain, 0.0);
        let oil = PvtComponents::single(ComponentId::C15PlusSat, 1e6);
        for i in 0..n_filled {
            state.set_mass(&subdomain, &mut store, GlobalIndex::new(i, 0, 0), &oil).unwrap();
        }
        (subdomain, store, state)
    }

    /// Runs one time-step of 1 Ma with a liquid-only flash and returns the statistics
    fn run_oil_chain(config: &FlowConfig, chain: &mut (Subdomain, PropertyStore, FlowState)) -> FlowStatistics {
        let (subdomain, store, state) = chain;
        let flash = SinglePhaseFlash::new(800.0, 1e-3);
        let registry = AdsorptionRegistry::new();
        let mut solver = ExplicitFlowSolver::new(config, &flash, &NoExpulsion, &registry, subdomain).unwrap();
        let start = state.time;
        let res = solver.solve(subdomain, store, state, start, start + 1.0).unwrap();
        assert_eq!(res, DarcyErrorIndicator::NoError);
        solver.stats
    }

    #[test]
    fn new_captures_errors() {
        let subdomain = SampleSubdomains::chain(2, SampleParams::param_sandstone()).unwrap();
        let flash = SinglePhaseFlash::new(800.0, 1e-3);
        let registry = AdsorptionRegistry::with_defaults();
        let mut config = FlowConfig::new();
        config.cfl_safety_factor = 0.0;
        assert_eq!(
            ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &subdomain).err(),
            Some("cannot allocate solver because config.validate() failed")
        );

        let config = FlowConfig::new();
        let mut lithology = SampleParams::param_sandstone();
        lithology.surface_porosity = 1.5;
        let bad = SampleSubdomains::chain(2, lithology).unwrap();
        assert_eq!(
            ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &bad).err(),
            Some("cannot allocate solver because the lithology parameters are invalid")
        );

        // TOC-based adsorption requested without TOC
        let mut formation = Formation::new("source", 0, 0, SampleParams::param_shale());
        formation.set_source_rock(None, Some(SampleParams::param_adsorption(true)));
        let source = Subdomain::new(1, 1, 100.0, 100.0, vec![formation], 10.0).unwrap();
        assert_eq!(
            ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &source).err(),
            Some("cannot allocate solver because the adsorption setup is invalid")
        );
    }

    #[test]
    fn solve_captures_errors_and_restores_activation() {
        let subdomain = SampleSubdomains::chain(2, SampleParams::param_sandstone()).unwrap();
        let flash = SinglePhaseFlash::new(800.0, 1e-3);
        let registry = AdsorptionRegistry::new();
        let config = FlowConfig::new();
        let mut solver = ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &subdomain).unwrap();
        let mut store = PropertyStore::new(Box::new(PropertyTable::new()));
        store.activate_permanently(P::Temperature);
        let mut state = FlowState::new(&subdomain, 0.0);
        assert_eq!(
            solver.solve(&subdomain, &mut store, &mut state, 1.0, 1.0).err(),
            Some("end time must be greater than start time")
        );
        let res = solver.solve(&subdomain, &mut store, &mut state, 0.0, 2.5).unwrap();
        assert_eq!(res, DarcyErrorIndicator::NoError);
        assert_eq!(state.time, 2.5);
        // maximum time-step size is 1 Ma
        assert_eq!(solver.stats.n_sub_step, 3);
        assert_eq!(solver.stats.flash_count, 0);
        assert!(store.is_activated(P::Temperature));
        assert!(!store.is_activated(P::Ves));
        assert!(!store.is_activated(P::PorePressure));
    }

    #[test]
    fn too_many_sub_steps_is_reported() {
        let subdomain = SampleSubdomains::chain(1, SampleParams::param_sandstone()).unwrap();
        let flash = SinglePhaseFlash::new(800.0, 1e-3);
        let registry = AdsorptionRegistry::new();
        let mut config = FlowConfig::new();
        config.max_n_sub_steps = 4;
        let mut solver = ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &subdomain).unwrap();
        let mut store = PropertyStore::new(Box::new(PropertyTable::new()));
        let mut state = FlowState::new(&subdomain, 0.0);
        let res = solver.solve(&subdomain, &mut store, &mut state, 0.0, 10.0).unwrap();
        assert_eq!(res, DarcyErrorIndicator::TooManySubSteps);
        assert_eq!(solver.stats.n_sub_step, 4);
        approx_eq(state.time, 4.0, 1e-14);
    }

    #[test]
    fn overfilling_the_pore_space_is_reported() {
        let rock = SampleParams::param_uniform_rock(0.2, 1.0);
        let subdomain = SampleSubdomains::column(1, rock, rock).unwrap();
        let flash = SinglePhaseFlash::new(800.0, 1e-3);
        let registry = AdsorptionRegistry::new();
        let config = FlowConfig::new();
        // 25000 m³ of pore space cannot hold 2.5e7 kg of oil at 800 kg/m³
        let expulsion = ConstantExpulsion::new(PvtComponents::single(ComponentId::C15PlusSat, 2.5e7));
        let mut solver = ExplicitFlowSolver::new(&config, &flash, &expulsion, &registry, &subdomain).unwrap();
        let mut store = PropertyStore::new(Box::new(PropertyTable::new()));
        let mut state = FlowState::new(&subdomain, 0.0);
        let res = solver.solve(&subdomain, &mut store, &mut state, 0.0, 1.0).unwrap();
        assert_eq!(res, DarcyErrorIndicator::ErrorInSaturation);
        assert_eq!(state.time_of_invasion[GlobalIndex::new(0, 0, 0)], Some(1.0));
    }

    #[test]
    fn limiters_reduce_the_flux() {
        let a = GlobalIndex::new(0, 0, 0);
        let config = FlowConfig::new();
        let free = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(free.n_sub_step, 1);
        assert_eq!(free.n_grad_pressure_clamp, 0);
        assert_eq!(free.n_permeability_clamp, 0);
        assert!(free.transport_out_mass[a] > 0.0);

        // the potential gradient is 1e4 Pa/m
        let mut config = FlowConfig::new();
        config.set_grad_pressure_limiter(1e3).unwrap();
        let clamped = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(clamped.n_sub_step, 1);
        assert_eq!(clamped.n_grad_pressure_clamp, 2);
        approx_eq(clamped.transport_out_mass[a] / free.transport_out_mass[a], 0.1, 1e-12);

        let mut config = FlowConfig::new();
        config.set_flux_permeability_limiter(1e-5).unwrap();
        let clamped = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(clamped.n_permeability_clamp, 2);
        assert_eq!(clamped.n_grad_pressure_clamp, 0);
        approx_eq(clamped.transport_out_mass[a] / free.transport_out_mass[a], 0.1, 1e-10);
    }

    #[test]
    fn saturation_estimate_gates_the_transport() {
        // the oil saturation is 0.05
        let mut config = FlowConfig::new();
        config.param_rel_perm.residual_hc_saturation = 0.01;
        config.estimated_hc_density = 1e4;
        let stats = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert!(stats.transport_count > 0);

        // the estimate (40 kg/m³ / 1e4 kg/m³) is below the residual saturation
        config.use_saturation_estimate = true;
        let mut chain = oil_chain(3, 3, 1.0, 0.0);
        let stats = run_oil_chain(&config, &mut chain);
        assert_eq!(stats.transport_count, 0);
        let (subdomain, _, state) = &chain;
        for element in subdomain.elements() {
            approx_eq(state.concentrations[element.index].sum(), 40.0, 1e-12);
        }
    }

    #[test]
    fn capillary_pressure_drives_the_flow() {
        let (a, b) = (GlobalIndex::new(0, 0, 0), GlobalIndex::new(1, 0, 0));

        // flat pressure field
        let config = FlowConfig::new();
        let mut chain = oil_chain(2, 1, 0.0, 1.0);
        let stats = run_oil_chain(&config, &mut chain);
        assert_eq!(stats.transport_count, 0);
        assert_eq!(chain.2.concentrations[b].sum(), 0.0);

        // the oil-bearing element has the larger capillary pressure
        let mut config = FlowConfig::new();
        config.include_capillary_pressure = true;
        let mut chain = oil_chain(2, 1, 0.0, 1.0);
        let stats = run_oil_chain(&config, &mut chain);
        assert!(stats.transport_out_count[a] > 0);
        assert!(stats.transport_in_count[b] > 0);
        assert_eq!(stats.transport_out_count[b], 0);
        let state = &chain.2;
        assert!(state.concentrations[b].sum() > 0.0);
        approx_eq(state.concentrations[a].sum() + state.concentrations[b].sum(), 40.0, 1e-10);
        assert_eq!(state.time_of_invasion[b], Some(1.0));
    }

    #[test]
    fn sub_sampling_reuses_flash_and_flux() {
        let a = GlobalIndex::new(0, 0, 0);
        let single = run_oil_chain(&FlowConfig::new(), &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(single.n_sub_step, 1);

        // flash at every sub-step
        let mut config = FlowConfig::new();
        config.set_sub_sampling(4, 1, 1, 1).unwrap();
        let stats = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(stats.n_sub_step, 4);
        assert_eq!(stats.flash_count, 12);

        // flash every second sub-step
        config.set_sub_sampling(4, 1, 2, 1).unwrap();
        let stats = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(stats.n_sub_step, 4);
        assert_eq!(stats.flash_count, 6);

        // the fluxes of the first sub-step are kept for the whole time-step
        config.set_sub_sampling(4, 1, 1, 4).unwrap();
        let stats = run_oil_chain(&config, &mut oil_chain(3, 3, 1.0, 0.0));
        assert_eq!(stats.n_sub_step, 4);
        assert_eq!(stats.transport_out_count[a], 4);
        approx_eq(stats.transport_out_mass[a] / single.transport_out_mass[a], 1.0, 1e-12);
    }

    #[test]
    fn consecutive_calls_continue_the_state() {
        let mut chain = oil_chain(3, 3, 1.0, 0.0);
        let a = GlobalIndex::new(0, 0, 0);
        let config = FlowConfig::new();
        run_oil_chain(&config, &mut chain);
        let after_first = chain.2.concentrations[a].sum();
        assert!(after_first < 40.0);
        let stats = run_oil_chain(&config, &mut chain);
        assert_eq!(stats.flash_count, 3);
        let (subdomain, store, state) = &mut chain;
        assert_eq!(state.time, 2.0);
        assert!(state.concentrations[a].sum() < after_first);
        approx_eq(state.total_hc_mass(subdomain, store, 1.0).unwrap(), 3e6, 1e-6);
    }

    #[test]
    fn traces_of_hydrocarbons_are_accepted() {
        let mut chain = oil_chain(2, 0, 1.0, 0.0);
        let a = GlobalIndex::new(0, 0, 0);
        // below the hydrocarbon content threshold (1e-10 kg/m³)
        chain.2.concentrations[a] = PvtComponents::single(ComponentId::C1, 5e-11);
        let config = FlowConfig::new();
        let stats = run_oil_chain(&config, &mut chain);
        assert_eq!(stats.flash_count, 0);
        let stats = run_oil_chain(&config, &mut chain);
        assert_eq!(stats.transport_count, 0);
        let state = &chain.2;
        assert_eq!(state.time, 2.0);
        assert_eq!(state.saturations[a].water, 1.0);
        approx_eq(state.concentrations[a][ComponentId::C1], 5e-11, 1e-24);
        assert_eq!(state.time_of_invasion[a], None);
    }

    #[test]
    fn flash_failures_are_reported() {
        // no pore pressure is given, thus the flash sees 0 MPa
        let subdomain = SampleSubdomains::chain(1, SampleParams::param_uniform_rock(0.2, 1e-4)).unwrap();
        let mut store = PropertyStore::new(Box::new(PropertyTable::new()));
        let mut state = FlowState::new(&subdomain, 5.0);
        let gas = PvtComponents::single(ComponentId::C1, 1e3);
        state.set_mass(&subdomain, &mut store, GlobalIndex::new(0, 0, 0), &gas).unwrap();
        let flash = WilsonFlash::new();
        let registry = AdsorptionRegistry::new();
        let config = FlowConfig::new();
        let mut solver = ExplicitFlowSolver::new(&config, &flash, &NoExpulsion, &registry, &subdomain).unwrap();
        let res = solver.solve(&subdomain, &mut store, &mut state, 5.0, 6.0).unwrap();
        assert_eq!(res, DarcyErrorIndicator::ErrorInFlash);
        assert_eq!(state.time, 5.0);
        assert_eq!(solver.stats.flash_count, 0);
        assert!(!store.is_activated(P::PorePressure));
    }
}
