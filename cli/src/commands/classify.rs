use std::{
	path::{Path, PathBuf},
	process::ExitCode,
	sync::Arc,
};

use anyhow::{Context, Result};
use meatme::{preprocess, Classification, Classifier, Config};
use meatme_core::http::Prediction;
use serde_json::json;

/// Classify every file, printing one JSON object per line. Files that fail are reported and skipped.
pub async fn handle(config: Config, files: Vec<PathBuf>) -> Result<ExitCode> {
	let (classifier, _) = meatme::initialize(&config)
		.await
		.context("Model setup failed")?;

	let mut failed = false;
	for file in files {
		let line = match classify(classifier.clone(), &file).await {
			Ok(classification) => {
				let prediction = Prediction::from(classification);
				json!({
					"file": file,
					"category": prediction.category,
					"confidence": prediction.confidence,
				})
			},
			Err(e) => {
				failed = true;
				tracing::warn!("Could not classify {}: {e:#}", file.display());
				json!({ "file": file, "error": format!("{e:#}") })
			},
		};

		println!("{line}");
	}

	Ok(if failed {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	})
}

async fn classify(classifier: Arc<dyn Classifier>, file: &Path) -> Result<Classification> {
	let bytes = tokio::fs::read(file)
		.await
		.with_context(|| format!("Failed to read {}", file.display()))?;

	tokio::task::spawn_blocking(move || -> Result<Classification> {
		let tensor = preprocess::prepare(&bytes, classifier.input_size())?;

		Ok(classifier.classify(&tensor)?)
	})
	.await
	.context("Classification panicked")?
}
