//! diabetes-risk: Diabetes risk prediction terminal application
//!
//! Main entry point. Loads the model artifacts once, then hands the scorer
//! to the TUI.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use diabetes_risk::adapters::sanitize::SanitizingMakeWriter;
use diabetes_risk::application::RiskScorer;
use diabetes_risk::config::Settings;
use diabetes_risk::domain::FeatureSchema;
use diabetes_risk::tui::App;

fn main() -> Result<()> {
    let settings = Settings::from_env();

    // Initialize logging.
    //
    // IMPORTANT: writing logs to the terminal will corrupt the TUI (alternate screen).
    // Default behavior:
    // - interactive TTY: log to a file
    // - non-interactive: log to stdout
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if settings.log_mode.use_file(interactive) {
        if let Some(parent) = settings.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer, settings.sanitize_max_bytes)),
        )
        .init();

    tracing::info!("Starting diabetes-risk...");

    let model_dir = settings.model_path.as_path();
    if !model_dir.exists() {
        return Err(anyhow!(
            "Model path not found at {:?}. Set DIABETES_RISK_MODEL_PATH to a directory containing scaler.json and model.json.",
            model_dir
        ));
    }

    // Refuse to start if the artifacts cannot be loaded, verified or matched
    // against the schema.
    let loader = settings.artifact_loader()?;
    if !loader.verifies_signatures() {
        tracing::warn!("Loading model artifacts WITHOUT signature verification (debug build)");
    }
    let artifacts = loader
        .load(model_dir)
        .map_err(|e| anyhow!("Failed to load model from {:?}: {}", model_dir, e))?;

    let scorer = RiskScorer::new(
        Arc::new(artifacts.scaler),
        Arc::new(artifacts.classifier),
        FeatureSchema::diabetes(),
    )?;

    let mut app = App::with_scorer(scorer);
    app.run()?;

    tracing::info!("diabetes-risk shutdown complete.");
    Ok(())
}
