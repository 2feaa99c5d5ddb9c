use aide::axum::{
	routing::{get, post},
	ApiRouter,
};
use axum::Extension;
use axum_jsonschema::Json;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
	runner::{Health, Runner},
	shutdown::Agent,
};

pub fn handler() -> ApiRouter {
	ApiRouter::new()
		.api_route("/", get(index))
		.api_route("/health-check", get(health_check))
		.api_route("/shutdown", post(shutdown))
}

/// When model setup ran, recorded once at startup.
#[derive(Debug, Clone, Copy)]
pub struct Setup {
	pub started_at: DateTime<Utc>,
	pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Links {
	/// Where the OpenAPI document is served
	pub openapi_url: &'static str,
	/// Where photos are uploaded for classification
	pub predict_url: &'static str,
}

#[allow(clippy::unused_async)]
async fn index() -> Json<Links> {
	Json(Links {
		openapi_url: "/openapi.json",
		predict_url: "/predict",
	})
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SetupReport {
	/// Always `succeeded`, the server only starts once the model is loaded
	pub status: &'static str,
	pub started_at: DateTime<Utc>,
	pub completed_at: DateTime<Utc>,
	/// Time spent downloading and loading the model
	pub duration_ms: i64,
}

impl From<Setup> for SetupReport {
	fn from(setup: Setup) -> Self {
		Self {
			status: "succeeded",
			started_at: setup.started_at,
			completed_at: setup.completed_at,
			duration_ms: (setup.completed_at - setup.started_at).num_milliseconds(),
		}
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthReport {
	/// State of the prediction worker
	pub status: Health,
	pub setup: SetupReport,
}

#[allow(clippy::unused_async)]
async fn health_check(
	Extension(runner): Extension<Runner>,
	Extension(setup): Extension<Setup>,
) -> Json<HealthReport> {
	Json(HealthReport {
		status: runner.health(),
		setup: setup.into(),
	})
}

async fn shutdown(Extension(agent): Extension<Agent>) -> Json<()> {
	agent.start().await;

	Json(())
}
