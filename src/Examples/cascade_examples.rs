use crate::PoreReactor::collocation::MeshConfig;
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_model::{
    DecayCoefficients, EnzymeProfileSpec, ProfileConfig, build_reactor_model,
};
use crate::PoreReactor::reactor_output::{check_solution, print_results, print_task, yields};
use crate::PoreReactor::reactor_params::{ReactorConfig, ReactorParams};
use crate::PoreReactor::pore_scale::Topology;
use crate::PoreReactor::solve_orchestrator::solve_model_robust;
use crate::PoreReactor::solver_config::SolveSettings;
use log::{error, info};

pub fn cascade_examples(task: usize) {
    let outcome = match task {
        0 => single_topology(),
        1 => co_immobilization_with_decay(),
        2 => enzyme_ratio_sweep(10.0, 9),
        _ => {
            println!("unknown example {}", task);
            Ok(())
        }
    };
    if let Err(e) = outcome {
        error!("example {} failed: {}", task, e);
    }
}

fn single_topology() -> Result<(), CascadeError> {
    // each enzyme in its own pores, enzymes decay slowly
    let params = ReactorParams::from_config(&ReactorConfig::default())?;
    let decay = DecayCoefficients::from_pairs(&[("Enzyme_A", 0.001), ("Enzyme_B", 0.001)]);
    let model = build_reactor_model(&params, Topology::Single, &decay, &ProfileConfig::new())?;
    print_task(&model);

    let settings = SolveSettings {
        verbose: true,
        ..SolveSettings::new(1000, 1e-4)
    }
    .with_mesh(MeshConfig::new(30, 2, 12, 3));
    let (model, results) = solve_model_robust(model, &settings)?;
    print_results(&model, &results, 10)?;
    let quality = check_solution(&model)?;
    println!("{:?}", quality);
    Ok(())
}

fn co_immobilization_with_decay() -> Result<(), CascadeError> {
    // enzyme A near the entrance, enzyme B in a band deeper in the pore
    let params = ReactorParams::from_config(&ReactorConfig::default())?;
    let profiles = ProfileConfig::new()
        .with_enzyme("Enzyme_A", EnzymeProfileSpec::step(0.0, 1.0, 0.0, 0.5, 50.0))
        .with_enzyme("Enzyme_B", EnzymeProfileSpec::step(0.0, 1.0, 0.6, 1.0, 80.0))
        .with_equalized_pore_count(true);
    let decay = DecayCoefficients::from_pairs(&[("Enzyme_A", 0.004), ("Enzyme_B", 0.002)]);
    let model = build_reactor_model(&params, Topology::CoImmobilization, &decay, &profiles)?;
    print_task(&model);

    let settings = SolveSettings::default().with_mesh(MeshConfig::new(30, 2, 20, 3));
    let (model, results) = solve_model_robust(model, &settings)?;
    print_results(&model, &results, 10)?;
    for enzyme in params.enzymes() {
        let values = model.decay_values(enzyme)?;
        if let Some((t, d)) = values.last() {
            println!("{} activity at t = {}: {:.4}", enzyme, t, d);
        }
    }
    Ok(())
}

/// Splits a fixed total enzyme loading between the two enzymes, one fresh model per point
fn enzyme_ratio_sweep(total_enzyme: f64, num_points: usize) -> Result<(), CascadeError> {
    let base = ReactorParams::from_config(&ReactorConfig::default())?;
    let settings = SolveSettings::default().with_mesh(MeshConfig::new(20, 2, 12, 3));
    let mut rows = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let fraction = if num_points > 1 {
            0.1 + 0.8 * i as f64 / (num_points - 1) as f64
        } else {
            0.5
        };
        let ea_max = fraction * total_enzyme;
        let eb_max = total_enzyme - ea_max;
        info!(
            "configuration {}/{}: EA_max {:.2}, EB_max {:.2}",
            i + 1,
            num_points,
            ea_max,
            eb_max
        );
        let params = base
            .with_max_density("Enzyme_A", ea_max)?
            .with_max_density("Enzyme_B", eb_max)?;
        let model = build_reactor_model(
            &params,
            Topology::CoImmobilization,
            &DecayCoefficients::none(&params),
            &ProfileConfig::new(),
        )?;
        let (model, results) = solve_model_robust(model, &settings)?;
        if results.is_optimal() {
            let y = yields(&model)?;
            info!("S3 yield = {:.4}", y[y.len() - 1].1);
            rows.push((ea_max, eb_max, Some(y)));
        } else {
            info!("failed: {}", results.termination);
            rows.push((ea_max, eb_max, None));
        }
    }
    for (ea, eb, y) in rows {
        match y {
            Some(y) => println!("EA {:5.2} EB {:5.2} yields {:?}", ea, eb, y),
            None => println!("EA {:5.2} EB {:5.2} not converged", ea, eb),
        }
    }
    Ok(())
}
