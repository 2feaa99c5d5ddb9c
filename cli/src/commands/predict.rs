use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use meatme_core::http::{ErrorResponse, Prediction};
use reqwest::multipart::{Form, Part};
use url::Url;

pub async fn handle(file: &Path, url: &Url) -> Result<ExitCode> {
	let bytes = tokio::fs::read(file)
		.await
		.with_context(|| format!("Failed to read {}", file.display()))?;

	let filename = file
		.file_name()
		.map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());
	let form = Form::new().part("image", Part::bytes(bytes).file_name(filename));

	let endpoint = url.join("predict").context("Invalid server URL")?;
	tracing::debug!("Uploading {} to {endpoint}", file.display());

	let res = reqwest::Client::new()
		.post(endpoint.clone())
		.multipart(form)
		.send()
		.await
		.with_context(|| format!("Failed to send request to {endpoint}"))?;

	let status = res.status();
	let text = res.text().await?;

	if status.is_success() {
		let prediction = serde_json::from_str::<Prediction>(&text)
			.with_context(|| format!("Failed to decode prediction response: {text}"))?;

		println!("{}", serde_json::to_string(&prediction)?);
		return Ok(ExitCode::SUCCESS);
	}

	let message = serde_json::from_str::<ErrorResponse>(&text)
		.map_or(text, |response| response.error);
	eprintln!("/predict call returned status {status}: {message}");

	Ok(ExitCode::FAILURE)
}
