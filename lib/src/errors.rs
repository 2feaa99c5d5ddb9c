use aide::OperationOutput;
use axum::{
	extract::multipart::MultipartError,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use meatme_core::http::ErrorResponse;

use crate::runner::Error as RunnerError;

pub const MISSING_IMAGE: &str = "No image file provided";

#[derive(Debug)]
pub struct HTTPError {
	message: String,
	status_code: StatusCode,
}

impl HTTPError {
	pub fn new(message: &str) -> Self {
		Self {
			message: message.to_string(),
			status_code: StatusCode::UNPROCESSABLE_ENTITY,
		}
	}

	pub const fn with_status(mut self, status_code: StatusCode) -> Self {
		self.status_code = status_code;
		self
	}

	pub fn missing_image() -> Self {
		Self::new(MISSING_IMAGE).with_status(StatusCode::BAD_REQUEST)
	}
}

impl IntoResponse for HTTPError {
	fn into_response(self) -> Response {
		(
			self.status_code,
			Json(ErrorResponse {
				error: self.message,
			}),
		)
			.into_response()
	}
}

impl OperationOutput for HTTPError {
	type Inner = Self;
}

impl From<MultipartError> for HTTPError {
	fn from(e: MultipartError) -> Self {
		let message = format!("Invalid multipart body: {e}");

		// axum already knows which multipart failures are size limits (413) and which are bad input (400)
		Self::new(&message).with_status(e.into_response().status())
	}
}

impl From<RunnerError> for HTTPError {
	fn from(e: RunnerError) -> Self {
		let status_code = match &e {
			RunnerError::Preprocess(_) => StatusCode::UNPROCESSABLE_ENTITY,
			RunnerError::Busy | RunnerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
			RunnerError::Classify(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};

		Self::new(&e.to_string()).with_status(status_code)
	}
}
