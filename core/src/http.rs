use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Prediction {
	/// Predicted category label
	pub category: String,
	/// Probability of the predicted category, with five decimal places
	pub confidence: String,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
	/// Human-readable description of what went wrong
	pub error: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn prediction_serializes_to_flat_object() {
		let prediction = Prediction {
			category: "Fresh".to_string(),
			confidence: "0.98765".to_string(),
		};

		assert_eq!(
			serde_json::to_value(prediction).unwrap(),
			json!({ "category": "Fresh", "confidence": "0.98765" })
		);
	}

	#[test]
	fn error_response_deserializes() {
		let response: ErrorResponse =
			serde_json::from_value(json!({ "error": "No image file provided" })).unwrap();

		assert_eq!(response.error, "No image file provided");
	}
}
