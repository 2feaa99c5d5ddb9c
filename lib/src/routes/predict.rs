use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{
	body::Bytes,
	extract::{multipart::MultipartError, Multipart},
	http::Method,
	routing::post,
	Extension, Json,
};
use meatme_core::http::{ErrorResponse, Prediction};
use schemars::gen::SchemaGenerator;

use crate::{
	errors::HTTPError,
	helpers::openapi::{file_form_schema, insert_operation, json_response, operation, MULTIPART},
	runner::Runner,
};

pub const IMAGE_FIELD: &str = "image";

pub fn handler() -> ApiRouter {
	ApiRouter::new().route("/predict", post(predict))
}

/// Describe `POST /predict`, which takes a multipart upload and so is documented by hand.
pub fn document(api: &mut OpenApi, generator: &mut SchemaGenerator) {
	let operation = operation(
		"Classify a photo",
		(MULTIPART, file_form_schema(&[(IMAGE_FIELD, "Photo to classify")])),
		[
			(200, json_response::<Prediction>(generator, "Predicted category")),
			(400, json_response::<ErrorResponse>(generator, "No image was uploaded")),
			(413, json_response::<ErrorResponse>(generator, "Upload is too large")),
			(422, json_response::<ErrorResponse>(generator, "Upload is not a supported image")),
			(500, json_response::<ErrorResponse>(generator, "Inference failed")),
			(503, json_response::<ErrorResponse>(generator, "Model is busy or unavailable")),
		],
	);

	if insert_operation(api, "/predict", &Method::POST, operation).is_none() {
		tracing::warn!("Could not add /predict to the OpenAPI document");
	}
}

async fn predict(
	Extension(runner): Extension<Runner>,
	multipart: Option<Multipart>,
) -> Result<Json<Prediction>, HTTPError> {
	let Some(image) = read_image(multipart).await? else {
		tracing::debug!("Prediction request has no {IMAGE_FIELD:?} file");
		return Err(HTTPError::missing_image());
	};

	tracing::debug!("Received {} byte image", image.len());
	let (classification, predict_time) = runner.run(image).await?;

	tracing::info!(
		category = %classification.category,
		confidence = classification.confidence,
		"Prediction complete in {predict_time:?}"
	);

	Ok(Json(classification.into()))
}

/// Bytes of the first non-empty `image` file, if there is one.
async fn read_image(multipart: Option<Multipart>) -> Result<Option<Bytes>, MultipartError> {
	let Some(mut multipart) = multipart else {
		return Ok(None);
	};

	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some(IMAGE_FIELD) {
			tracing::trace!("Skipping multipart field {:?}", field.name());
			continue;
		}

		// plain form values are not uploads, even under the right name
		if field.file_name().is_none() {
			tracing::trace!("Skipping {IMAGE_FIELD:?} field without a filename");
			continue;
		}

		let bytes = field.bytes().await?;
		if !bytes.is_empty() {
			return Ok(Some(bytes));
		}
	}

	Ok(None)
}
