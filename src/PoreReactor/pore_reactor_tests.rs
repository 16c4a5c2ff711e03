#[cfg(test)]
mod tests {
    use super::super::bordered_newton::{NewtonOutcome, NonlinearProblem, NonlinearSolver};
    use super::super::collocation::MeshConfig;
    use super::super::enzyme_profile::pore_count_coefficient;
    use super::super::pore_scale::Topology;
    use super::super::reactor_errors::{CascadeError, SolveFailure};
    use super::super::reactor_model::{
        DecayCoefficients, EnzymeProfileSpec, ModelState, ProfileConfig, ReactorModel,
        build_reactor_model,
    };
    use super::super::reactor_output::{check_solution, yields};
    use super::super::reactor_params::{KineticLaw, ReactorConfig, ReactorParams};
    use super::super::solve_orchestrator::{discretize, solve_model_robust, solve_model_robust_with};
    use super::super::solver_config::{
        SolveAttempt, SolverResults, SolveSettings, SolverOptions, SolverStatus,
        TerminationCondition,
    };
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use std::collections::VecDeque;

    fn small_mesh() -> MeshConfig {
        MeshConfig::new(8, 2, 10, 3)
    }

    fn settings() -> SolveSettings {
        SolveSettings::new(100, 1e-6).with_mesh(small_mesh())
    }

    fn single_model() -> ReactorModel {
        let params = ReactorParams::from_config(&ReactorConfig::default()).unwrap();
        build_reactor_model(
            &params,
            Topology::Single,
            &DecayCoefficients::none(&params),
            &ProfileConfig::new(),
        )
        .unwrap()
    }

    /// Faster S1 diffusion and saturable kinetics, enzymes co-immobilized
    fn michaelis_menten_model() -> ReactorModel {
        let mut config = ReactorConfig::default();
        config.diffusivity.insert("S1".to_string(), 1e-6);
        config.kinetics = KineticLaw::MichaelisMenten;
        let params = ReactorParams::from_config(&config).unwrap();
        let decay = DecayCoefficients::from_pairs(&[("Enzyme_A", 0.002), ("Enzyme_B", 0.001)]);
        build_reactor_model(&params, Topology::CoImmobilization, &decay, &ProfileConfig::new())
            .unwrap()
    }

    /// Answers every call with the next scripted result, records the options it was given
    struct ScriptedSolver {
        script: VecDeque<Result<TerminationCondition, SolveFailure>>,
        seen: Vec<SolverOptions>,
    }

    impl ScriptedSolver {
        fn new(script: Vec<Result<TerminationCondition, SolveFailure>>) -> Self {
            Self {
                script: script.into(),
                seen: Vec::new(),
            }
        }
    }

    impl NonlinearSolver for ScriptedSolver {
        fn solve(
            &mut self,
            problem: &dyn NonlinearProblem,
            initial_guess: &DVector<f64>,
            options: &SolverOptions,
        ) -> Result<NewtonOutcome, SolveFailure> {
            assert_eq!(problem.n_unknowns(), initial_guess.len());
            self.seen.push(options.clone());
            let termination = self
                .script
                .pop_front()
                .unwrap_or(Err(SolveFailure::SingularBorderSystem))?;
            Ok(NewtonOutcome {
                solution: initial_guess.clone(),
                termination,
                status: SolverStatus::Ok,
                iterations: 3,
                constraint_violation: 0.0,
                scaled_error: 0.0,
                message: "scripted".to_string(),
            })
        }
    }

    #[test]
    fn test_single_topology_end_to_end() {
        let (model, results) = solve_model_robust(single_model(), &settings()).unwrap();
        assert!(results.is_optimal(), "{:?}", results);
        assert_eq!(results.attempt, SolveAttempt::Primary);
        assert_eq!(model.state(), ModelState::Solved(TerminationCondition::Optimal));

        let s1 = model.bulk_trajectory("S1").unwrap();
        let s3 = model.bulk_trajectory("S3").unwrap();
        assert_eq!(s1.len(), 8 * 2 + 1);
        assert_relative_eq!(s1[0].0, 0.0);
        assert_relative_eq!(s1[s1.len() - 1].0, 480.0, epsilon = 1e-9);
        assert_relative_eq!(s1[0].1, 1000.0, epsilon = 1e-6);
        assert_relative_eq!(s3[0].1, 0.1, epsilon = 1e-6);
        for w in s1.windows(2) {
            assert!(w[1].1 <= w[0].1 + 1e-6, "S1 grows at t = {}", w[1].0);
        }
        assert!(s1[s1.len() - 1].1 < 0.9 * s1[0].1);
        assert!(s3[s3.len() - 1].1 > s3[0].1);

        let quality = check_solution(&model).unwrap();
        assert!(quality.is_within(1e-4), "{:?}", quality);
    }

    #[test]
    fn test_single_topology_pore_profiles() {
        let (model, _) = solve_model_robust(single_model(), &settings()).unwrap();
        let t = 240.0;
        let profile = model.pore_profile("S1", t).unwrap();
        let i = model.nearest_time_index(t).unwrap();
        let bulk = model.bulk_trajectory("S1").unwrap()[i].1;
        assert_relative_eq!(profile[0].1, bulk, epsilon = 1e-6);
        // S1 is consumed inside the pore
        assert!(profile[profile.len() - 1].1 < profile[0].1);
        assert_relative_eq!(profile[profile.len() - 1].0, 2e-4, epsilon = 1e-15);

        let flux = model.flux_trajectory("S1").unwrap();
        assert!(flux.iter().all(|&(_, f)| f > 0.0));
        // the inert end product of the single topology is flat in the pore
        let gradient = model.pore_gradient_profile("S3", t).unwrap();
        assert!(gradient.iter().all(|&(_, g)| (g * 2e-4).abs() < 1e-5));
    }

    #[test]
    fn test_michaelis_menten_co_immobilization() {
        let settings = SolveSettings {
            nonnegative_concentrations: true,
            ..settings()
        };
        let (model, results) = solve_model_robust(michaelis_menten_model(), &settings).unwrap();
        assert!(results.is_optimal(), "{:?}", results);

        let species_sum: Vec<f64> = (0..model.time_points().unwrap().len())
            .map(|i| {
                ["S1", "S2", "S3"]
                    .iter()
                    .map(|s| model.bulk_trajectory(s).unwrap()[i].1)
                    .sum()
            })
            .collect();
        for total in &species_sum {
            assert_relative_eq!(*total, 1000.2, max_relative = 1e-6);
        }
        let y = yields(&model).unwrap();
        assert_eq!(y.len(), 2);
        assert_eq!(y[0].0, "S2");
        assert!(y[1].1 > 0.1 / 1000.0);
        assert!(y.iter().all(|(_, v)| *v >= 0.0 && *v < 1.0));

        let decay = model.decay_values("Enzyme_A").unwrap();
        assert_relative_eq!(decay[0].1, 1.0);
        assert_relative_eq!(
            decay[decay.len() - 1].1,
            (-0.002f64 * 480.0).exp(),
            epsilon = 1e-12
        );
    }

    fn co_immobilization_model(decay: &[(&str, f64)], profiles: ProfileConfig) -> ReactorModel {
        let params = ReactorParams::from_config(&ReactorConfig::default()).unwrap();
        let decay = if decay.is_empty() {
            DecayCoefficients::none(&params)
        } else {
            DecayCoefficients::from_pairs(decay)
        };
        build_reactor_model(&params, Topology::CoImmobilization, &decay, &profiles).unwrap()
    }

    /// Optimal, consistent, S1 consumed and S3 produced over the run
    fn assert_cascade_solved(model: &ReactorModel, results: &SolverResults) {
        assert!(results.is_optimal(), "{:?}", results);
        let quality = check_solution(model).unwrap();
        assert!(quality.is_within(1e-4), "{:?}", quality);

        let s1 = model.bulk_trajectory("S1").unwrap();
        let s3 = model.bulk_trajectory("S3").unwrap();
        for w in s1.windows(2) {
            assert!(w[1].1 <= w[0].1 + 1e-6, "S1 grows at t = {}", w[1].0);
        }
        assert!(s1[s1.len() - 1].1 < s1[0].1);
        assert!(s3[s3.len() - 1].1 > s3[0].1);
    }

    #[test]
    fn test_first_order_co_immobilization_default_profiles() {
        let model = co_immobilization_model(&[], ProfileConfig::new());
        let (model, results) = solve_model_robust(model, &settings()).unwrap();
        assert_cascade_solved(&model, &results);
        assert_eq!(results.attempt, SolveAttempt::Primary);
        // co-immobilized pores are not split between the enzymes
        assert_relative_eq!(model.system().unwrap().effective_pores_count, 5e14);
    }

    #[test]
    fn test_step_profiles_with_decay_and_equalization() {
        let profiles = ProfileConfig::new()
            .with_enzyme("Enzyme_A", EnzymeProfileSpec::step(0.0, 1.0, 0.0, 0.5, 50.0))
            .with_enzyme("Enzyme_B", EnzymeProfileSpec::step(0.0, 1.0, 0.6, 1.0, 80.0))
            .with_equalized_pore_count(true);
        let model =
            co_immobilization_model(&[("Enzyme_A", 0.004), ("Enzyme_B", 0.002)], profiles);
        let (model, results) = solve_model_robust(model, &settings()).unwrap();
        assert_cascade_solved(&model, &results);

        // Enzyme_A sits near the mouth, Enzyme_B near the closed end
        let a = model.enzyme_profile_values("Enzyme_A").unwrap();
        let b = model.enzyme_profile_values("Enzyme_B").unwrap();
        assert!(a[0].1 > a[a.len() - 1].1);
        assert!(b[0].1 < b[b.len() - 1].1);

        let decay = model.decay_values("Enzyme_A").unwrap();
        assert_relative_eq!(
            decay[decay.len() - 1].1,
            (-0.004f64 * 480.0).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pore_count_equalized_on_solved_points() {
        let params = ReactorParams::from_config(&ReactorConfig::default()).unwrap();
        let profiles = ProfileConfig::new()
            .with_enzyme("Enzyme_A", EnzymeProfileSpec::linear(1.0, 0.0))
            .with_equalized_pore_count(true);
        let mut model = build_reactor_model(
            &params,
            Topology::CoImmobilization,
            &DecayCoefficients::none(&params),
            &profiles,
        )
        .unwrap();
        discretize(&mut model, &small_mesh()).unwrap();
        let values: Vec<f64> = model
            .enzyme_profile_values("Enzyme_A")
            .unwrap()
            .iter()
            .map(|&(_, e)| e)
            .collect();
        let coef = pore_count_coefficient(&values, 5.0);
        let system = model.system().unwrap();
        assert_relative_eq!(system.effective_pores_count, 5e14 * coef / 2.0, max_relative = 1e-12);
        // a linear ramp to zero holds about half of the uniform loading
        assert_relative_eq!(system.effective_pores_count, 5e14, max_relative = 0.2);
    }

    #[test]
    fn test_single_topology_splits_pores() {
        let mut model = single_model();
        discretize(&mut model, &small_mesh()).unwrap();
        assert_relative_eq!(model.system().unwrap().effective_pores_count, 2.5e14);
        let e = model.enzyme_profile_values("Enzyme_B").unwrap();
        for &(_, v) in &e {
            assert_relative_eq!(v, 5.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_discretize_only_once() {
        let mut model = single_model();
        discretize(&mut model, &small_mesh()).unwrap();
        assert_eq!(model.state(), ModelState::Discretized);
        let err = discretize(&mut model, &small_mesh()).unwrap_err();
        assert!(matches!(err, CascadeError::Discretization(_)));

        let mut solver = ScriptedSolver::new(vec![Ok(TerminationCondition::Optimal)]);
        let (mut solved, _) = solve_model_robust_with(model, &settings(), &mut solver).unwrap();
        assert!(matches!(
            discretize(&mut solved, &small_mesh()),
            Err(CascadeError::Discretization(_))
        ));
    }

    #[test]
    fn test_first_attempt_success_is_not_retried() {
        let mut solver = ScriptedSolver::new(vec![Ok(TerminationCondition::Optimal)]);
        let (model, results) =
            solve_model_robust_with(single_model(), &settings(), &mut solver).unwrap();
        assert_eq!(solver.seen.len(), 1);
        assert_eq!(solver.seen[0].tol, 1e-6);
        assert_eq!(solver.seen[0].max_iter, 100);
        assert_eq!(results.attempt, SolveAttempt::Primary);
        assert_eq!(results.iterations, 3);
        assert_eq!(model.state(), ModelState::Solved(TerminationCondition::Optimal));
    }

    #[test]
    fn test_non_optimal_termination_is_returned_as_is() {
        let mut solver = ScriptedSolver::new(vec![Ok(TerminationCondition::MaxIterations)]);
        let (model, results) =
            solve_model_robust_with(single_model(), &settings(), &mut solver).unwrap();
        assert_eq!(solver.seen.len(), 1);
        assert_eq!(results.termination, TerminationCondition::MaxIterations);
        assert!(!results.is_optimal());
        assert_eq!(
            model.state(),
            ModelState::Solved(TerminationCondition::MaxIterations)
        );
    }

    #[test]
    fn test_failure_retries_with_relaxed_options() {
        let mut solver = ScriptedSolver::new(vec![
            Err(SolveFailure::SingularJacobian(4)),
            Ok(TerminationCondition::Optimal),
        ]);
        let (_, results) =
            solve_model_robust_with(single_model(), &settings(), &mut solver).unwrap();
        assert_eq!(solver.seen.len(), 2);
        assert_eq!(results.attempt, SolveAttempt::Relaxed);
        assert!(results.is_optimal());
        let relaxed = &solver.seen[1];
        assert_eq!(relaxed.max_iter, 5000);
        assert_eq!(relaxed.tol, 1e-4);
        assert_eq!(relaxed.mu_init, 1e-3);
        assert_eq!(relaxed.bound_relax_factor, 1e-6);
        // the primary options are untouched
        assert_eq!(solver.seen[0], settings().solver_options());
    }

    #[test]
    fn test_double_failure_is_reported_not_raised() {
        let mut solver = ScriptedSolver::new(vec![
            Err(SolveFailure::NonFiniteResidual(2)),
            Err(SolveFailure::SingularBorderSystem),
        ]);
        let model = single_model();
        let (model, results) = solve_model_robust_with(model, &settings(), &mut solver).unwrap();
        assert_eq!(solver.seen.len(), 2);
        assert_eq!(results.termination, TerminationCondition::Error);
        assert_eq!(results.status, SolverStatus::Error);
        assert_eq!(results.attempt, SolveAttempt::Reported);
        assert!(results.constraint_violation.is_nan());
        assert_eq!(results.message, SolveFailure::SingularBorderSystem.to_string());
        assert_eq!(model.state(), ModelState::Solved(TerminationCondition::Error));
        // read queries still answer on the initial guess
        assert_relative_eq!(model.final_bulk("S1").unwrap(), 1000.0);
    }

    #[test]
    fn test_invalid_settings_are_errors() {
        let mut solver = ScriptedSolver::new(vec![]);
        let bad = SolveSettings::new(0, 1e-6).with_mesh(small_mesh());
        let err = solve_model_robust_with(single_model(), &bad, &mut solver).unwrap_err();
        assert!(matches!(err, CascadeError::InvalidParameter(_)));
        assert!(solver.seen.is_empty());

        let bad_constraint = settings().with_constr_viol_tol(0.0);
        let err = solve_model_robust_with(single_model(), &bad_constraint, &mut solver).unwrap_err();
        assert!(matches!(err, CascadeError::InvalidParameter(_)));
        assert!(solver.seen.is_empty());

        let bad_mesh = SolveSettings::new(10, 1e-6).with_mesh(MeshConfig::new(0, 2, 10, 3));
        let err = solve_model_robust_with(single_model(), &bad_mesh, &mut solver).unwrap_err();
        assert!(matches!(err, CascadeError::Discretization(_)));
    }

    #[test]
    fn test_read_interface_unknown_names() {
        let (model, _) = solve_model_robust_with(
            single_model(),
            &settings(),
            &mut ScriptedSolver::new(vec![Ok(TerminationCondition::Optimal)]),
        )
        .unwrap();
        assert!(model.bulk_trajectory("S7").is_err());
        assert!(model.decay_values("Enzyme_Z").is_err());
        assert_eq!(model.nearest_time_index(-5.0).unwrap(), 0);
        let last = model.time_points().unwrap().len() - 1;
        assert_eq!(model.nearest_time_index(1e6).unwrap(), last);
    }
}
