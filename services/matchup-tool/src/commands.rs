//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use matchup_core::{
    ConditionEngine, MatchupRun, MatchupStrategy, MatchupSummary, OpenReader, Reader,
    ScreeningEngine, ToolContext, UseCaseConfig,
};
use scene_reader::{load_catalog, SceneReader, SceneReaderFactory};
use tracing::{error, info};

use crate::config::ToolConfig;

/// Load a use case and report every configuration problem.
pub fn validate_use_case(path: &Path) -> Result<bool> {
    let use_case = UseCaseConfig::load(path)?;
    let result = use_case.check_valid();
    for message in result.messages() {
        error!(use_case = %path.display(), "{}", message);
    }

    let mut valid = result.is_valid();
    if let Err(e) = ConditionEngine::configure(&use_case) {
        error!(use_case = %path.display(), error = %e, "Invalid condition");
        valid = false;
    }
    if let Err(e) = ScreeningEngine::configure(&use_case) {
        error!(use_case = %path.display(), error = %e, "Invalid screening");
        valid = false;
    }

    if valid {
        info!(use_case = %use_case.name, "Use case configuration is valid");
    }
    Ok(valid)
}

/// Summary file for a run: `<output_path>/<use case>_<start>_<end>.json`.
pub fn summary_path(output_dir: &Path, use_case: &str, config: &ToolConfig) -> PathBuf {
    output_dir.join(format!(
        "{}_{}_{}.json",
        use_case, config.start_date, config.end_date
    ))
}

/// Run the matchup over the scene archive and write the summary.
pub fn run(config: &ToolConfig) -> Result<MatchupRun> {
    config.validate().map_err(|e| anyhow!("Invalid tool configuration: {}", e))?;

    let mut use_case = UseCaseConfig::load(&config.use_case)?;
    if let Some(output_path) = &config.output_path {
        use_case.output_path = Some(output_path.clone());
    }
    if let Some(parallel) = config.parallel {
        use_case.parallel = parallel;
    }

    let validation = use_case.check_valid();
    if !validation.is_valid() {
        for message in validation.messages() {
            error!("{}", message);
        }
        bail!("Use case '{}' is not valid", use_case.name);
    }
    let output_dir = use_case
        .output_path
        .clone()
        .context("Output path not configured")?;

    let (start_date, end_date) = config.processing_window()?;
    let catalog = load_catalog(&config.archive_dir)
        .with_context(|| format!("Failed to load archive {}", config.archive_dir.display()))?;
    let sensors: Vec<String> = use_case.sensors.iter().map(|s| s.name.clone()).collect();

    let context = ToolContext {
        start_date,
        end_date,
        use_case,
        observations: Arc::new(catalog),
        readers: Arc::new(SceneReaderFactory::with_sensors(sensors)),
    };
    let result = MatchupStrategy::new(&context)?.run()?;

    let path = summary_path(&output_dir, &context.use_case.name, config);
    MatchupSummary::new(
        &context.use_case.name,
        start_date,
        end_date,
        &result.stats,
        &result.collection,
    )
    .write(&path)
    .with_context(|| format!("Failed to write summary {}", path.display()))?;

    info!(
        path = %path.display(),
        matchup_sets = result.collection.len(),
        sample_sets = result.collection.num_sample_sets(),
        acceptance_rate = result.stats.acceptance_rate(),
        "Wrote matchup summary"
    );
    Ok(result)
}

/// Time differences in seconds along one line of a scene.
pub fn time_diff(scene: &Path, line: i32) -> Result<Vec<Option<f64>>> {
    time_diff_with(Box::new(SceneReader::new()), scene, line)
}

fn time_diff_with(reader: Box<dyn Reader>, scene: &Path, line: i32) -> Result<Vec<Option<f64>>> {
    let mut reader = OpenReader::open(reader, scene)
        .with_context(|| format!("Failed to open scene {}", scene.display()))?;
    let info = reader.reader_mut().read()?;
    let differences = matchup_core::time_differences(reader.reader(), &info, line)?;
    Ok(differences)
}
