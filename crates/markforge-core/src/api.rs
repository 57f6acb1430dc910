use crate::acceptance::{AcceptanceProbabilityCalculator, OracleExtract};
use crate::anneal;
use crate::bridge::{pixelized_assign_mode, Pixelized};
use crate::config::{KernelParams, RemovalStrategy, RunConfig};
use crate::configuration::Configuration;
use crate::energy::{CoverageOracle, EnergyContext, EnergyOracle, EnergyStack};
use crate::error::{MppError, MppResult};
use crate::job::RunIdentifier;
use crate::kernel::{
    Birth, BirthPartition, Death, DeathPartition, EnergyWeightedRemoval, KernelProposer,
    MarkFactory, RandomMarkFactory, RemovalPolicy, Replace, UniformRemoval,
};
use crate::mark::{Mark, MarkId, MarkKind};
use crate::optimizer::{OptimizationOutcome, Optimizer, OptimizerOptions, ReportSink};
use crate::partition::Partition;
use crate::scene::SceneDefinition;
use crate::state::MarksFromPartition;
use crate::termination::{self, TerminationCondition};
use std::sync::Arc;
use tracing::info;

pub type SceneOutcome = OptimizationOutcome<MarksFromPartition, Pixelized<MarksFromPartition>>;

pub fn removal_policy(params: &KernelParams) -> MppResult<Box<dyn RemovalPolicy>> {
    Ok(match params.removal {
        RemovalStrategy::Uniform => Box::new(UniformRemoval),
        RemovalStrategy::EnergyWeighted => {
            Box::new(EnergyWeightedRemoval::new(params.removal_exponent)?)
        }
    })
}

/// Birth, death and replace over a candidate pool, weighted as configured.
pub fn partition_kernels(params: &KernelParams) -> MppResult<KernelProposer<MarksFromPartition>> {
    let replace = Replace::<MarksFromPartition>::new(
        Box::new(DeathPartition::new(removal_policy(params)?)),
        Box::new(BirthPartition::new(params.birth_count)?),
        params.replace_repeats,
    )?;
    Ok(KernelProposer::new()
        .with_kernel(params.birth_probability, BirthPartition::new(params.birth_count)?)
        .with_kernel(
            params.death_probability,
            DeathPartition::new(removal_policy(params)?),
        )
        .with_kernel(params.replace_probability, replace))
}

/// Birth, death and replace over freshly generated marks.
pub fn free_kernels(
    params: &KernelParams,
    factory: impl Fn() -> MppResult<Box<dyn MarkFactory>>,
) -> MppResult<KernelProposer<Configuration>> {
    let replace = Replace::<Configuration>::new(
        Box::new(Death::<Configuration>::new(removal_policy(params)?)),
        Box::new(Birth::new(factory()?, params.birth_count)?),
        params.replace_repeats,
    )?;
    Ok(KernelProposer::new()
        .with_kernel(
            params.birth_probability,
            Birth::new(factory()?, params.birth_count)?,
        )
        .with_kernel(
            params.death_probability,
            Death::<Configuration>::new(removal_policy(params)?),
        )
        .with_kernel(params.replace_probability, replace))
}

pub fn random_factory(
    kind: MarkKind,
    min_radius: f64,
    max_radius: f64,
) -> impl Fn() -> MppResult<Box<dyn MarkFactory>> {
    move || {
        RandomMarkFactory::new(kind, min_radius, max_radius)
            .map(|f| Box::new(f) as Box<dyn MarkFactory>)
    }
}

pub fn termination_condition(config: &RunConfig) -> impl TerminationCondition {
    termination::from_params(&config.termination)
}

pub fn acceptance_calculator(config: &RunConfig) -> MppResult<AcceptanceProbabilityCalculator> {
    Ok(AcceptanceProbabilityCalculator::new(anneal::from_params(
        &config.anneal,
    )?))
}

/// Energy context and seeded starting state for a scene.
pub fn prepare_scene(
    scene: &SceneDefinition,
    oracle: Arc<dyn EnergyOracle>,
) -> MppResult<(EnergyContext, MarksFromPartition)> {
    let stack = EnergyStack::try_from(&scene.stack)?;
    let pool = scene
        .pool
        .iter()
        .map(|rec| Mark::try_from(rec).map(Arc::new))
        .collect::<MppResult<Vec<_>>>()?;
    let partition = Partition::from_pool(pool)?;
    let initial: Vec<MarkId> = scene.initial.iter().map(|&id| MarkId(id)).collect();
    let state = MarksFromPartition::seed(partition, &initial)?;
    Ok((EnergyContext::new(oracle, Arc::new(stack)), state))
}

/// Runs a pool-based optimization of `scene` with the reference oracle and
/// pixelized reporting.
pub fn run_scene<K: ReportSink<Pixelized<MarksFromPartition>>>(
    scene: &SceneDefinition,
    config: &RunConfig,
    sink: &mut K,
) -> MppResult<SceneOutcome> {
    config.validate().map_err(MppError::Config)?;
    let run_id = RunIdentifier::from_parts(config, scene).map_err(MppError::Config)?;
    info!(
        "Scene '{}': {} candidates, {} initial, run {}",
        scene.name,
        scene.pool.len(),
        scene.initial.len(),
        run_id.short()
    );

    let (energy, initial) = prepare_scene(scene, Arc::new(CoverageOracle::default()))?;
    let mut optimizer = Optimizer::new(
        partition_kernels(&config.kernels)?,
        OracleExtract::new(energy.clone()),
        pixelized_assign_mode::<MarksFromPartition>(energy.clone()),
        acceptance_calculator(config)?,
        termination_condition(config),
        energy,
    )
    .with_options(OptimizerOptions::from(&config.search));
    optimizer.run(initial, sink)
}
