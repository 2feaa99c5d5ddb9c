use crate::{Categories, Classification, Scores};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Model produced {actual} scores but {expected} categories are configured")]
	ShapeMismatch { expected: usize, actual: usize },

	#[error("Model produced a non-finite score at index {0}")]
	NonFinite(usize),

	#[error("Failed to run inference: {0}")]
	Inference(#[from] anyhow::Error),
}

/// A batch of one image in NHWC layout, channel values scaled into `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
	height: usize,
	width: usize,
	channels: usize,
	data: Vec<f32>,
}

impl ImageTensor {
	/// # Panics
	///
	/// Panics if `data` does not hold exactly `height * width * channels` values.
	#[must_use]
	pub fn new(height: usize, width: usize, channels: usize, data: Vec<f32>) -> Self {
		assert_eq!(
			data.len(),
			height * width * channels,
			"tensor data does not match its shape"
		);

		Self {
			height,
			width,
			channels,
			data,
		}
	}

	/// Shape including the leading batch dimension.
	#[must_use]
	pub const fn shape(&self) -> [usize; 4] {
		[1, self.height, self.width, self.channels]
	}

	#[must_use]
	pub fn as_slice(&self) -> &[f32] {
		&self.data
	}
}

/// A loaded image classification model
pub trait Classifier: Send + Sync {
	/// Labels for each position of the model output
	fn categories(&self) -> &Categories;

	/// Side length, in pixels, of the square images the model accepts
	fn input_size(&self) -> u32;

	/// Run the forward pass, returning one probability per category
	///
	/// # Errors
	///
	/// Returns an error if the underlying inference engine fails.
	fn forward(&self, input: &ImageTensor) -> anyhow::Result<Vec<f32>>;

	/// Run the forward pass and pick the most likely category
	///
	/// # Errors
	///
	/// Returns an error if inference fails or its output cannot be mapped onto the categories.
	fn classify(&self, input: &ImageTensor) -> Result<Classification, Error> {
		let scores = Scores::new(self.forward(input)?);

		scores.top(self.categories())
	}
}
