use std::{net::SocketAddr, sync::Arc};

use aide::openapi::{self, OpenApi};
use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::get, Extension, Json, Router, Server};
use chrono::Utc;
use meatme_core::Classifier;
use schemars::gen::{SchemaGenerator, SchemaSettings};
use tower_http::trace::TraceLayer;

use crate::{
	onnx::OnnxClassifier,
	routes::{self, system::Setup},
	runner::Runner,
	shutdown::Shutdown,
	Config,
};

/// Fetch and load the model. Nothing is served until this succeeds.
///
/// # Errors
///
/// Returns an error if the model cannot be downloaded, verified or loaded.
pub async fn initialize(config: &Config) -> Result<(Arc<dyn Classifier>, Setup)> {
	let started_at = Utc::now();

	let path = config.artifact().resolve().await?.to_path_buf();
	let categories = config.categories.clone();
	let input_size = config.input_size;

	let classifier = tokio::task::spawn_blocking(move || {
		OnnxClassifier::load(&path, categories, input_size)
	})
	.await
	.context("Model loading panicked")??;

	let setup = Setup {
		started_at,
		completed_at: Utc::now(),
	};
	tracing::info!(
		"Model setup finished in {}ms",
		(setup.completed_at - setup.started_at).num_milliseconds()
	);

	Ok((Arc::new(classifier), setup))
}

/// Load the model, then serve predictions until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if model setup fails or the server cannot bind to the configured address.
pub async fn start(config: Config, shutdown: Shutdown) -> Result<()> {
	let (classifier, setup) = initialize(&config)
		.await
		.context("Model setup failed")?;

	let runner = Runner::new(classifier, config.queue_depth);
	let app = router(runner, setup, &shutdown, config.max_upload_bytes);

	let addr = SocketAddr::from((config.host, config.port));
	tracing::info!("Starting server on {addr}...");

	Server::try_bind(&addr)
		.with_context(|| format!("Failed to bind to {addr}"))?
		.serve(app.into_make_service())
		.with_graceful_shutdown(shutdown.wait())
		.await?;

	tracing::info!("Server stopped");
	Ok(())
}

/// All routes, wired to a running model.
pub fn router(runner: Runner, setup: Setup, shutdown: &Shutdown, max_upload_bytes: usize) -> Router {
	let (router, openapi) = api();

	router
		.route("/openapi.json", get(serve_schema))
		.layer(Extension(Arc::new(openapi)))
		.layer(Extension(runner))
		.layer(Extension(setup))
		.layer(shutdown.extension())
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.layer(TraceLayer::new_for_http())
}

/// The OpenAPI description of the service.
#[must_use]
pub fn schema() -> OpenApi {
	api().1
}

fn api() -> (Router, OpenApi) {
	let mut generator = SchemaGenerator::new(SchemaSettings::openapi3().with(|settings| {
		settings.inline_subschemas = true;
	}));

	let mut openapi = OpenApi {
		info: openapi::Info {
			title: "MeatMe".to_string(),
			description: Some("Meat freshness classification".to_string()),
			version: env!("CARGO_PKG_VERSION").to_string(),
			..openapi::Info::default()
		},
		..OpenApi::default()
	};

	let router = routes::handler().finish_api(&mut openapi);
	routes::predict::document(&mut openapi, &mut generator);

	(router, openapi)
}

async fn serve_schema(Extension(openapi): Extension<Arc<OpenApi>>) -> Json<OpenApi> {
	Json(openapi.as_ref().clone())
}
