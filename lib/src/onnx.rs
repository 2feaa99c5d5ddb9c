use std::path::{Path, PathBuf};

use anyhow::Context;
use meatme_core::{Categories, Classifier, ImageTensor};
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to load model from {path}: {source:#}")]
	Load {
		path: PathBuf,
		#[source]
		source: anyhow::Error,
	},

	#[error("Model output shape {0:?} is not a single vector of scores")]
	OutputShape(Vec<usize>),

	#[error("Model outputs {actual} scores but {expected} categories are configured")]
	ShapeMismatch { expected: usize, actual: usize },
}

/// An ONNX image classifier running on tract.
pub struct OnnxClassifier {
	plan: Plan,
	input_size: u32,
	categories: Categories,
}

impl OnnxClassifier {
	/// Load and optimize the model at `path` for `input_size`x`input_size` RGB images.
	///
	/// # Errors
	///
	/// Returns an error if the file is not a loadable ONNX graph, or its output does not line up with `categories`.
	pub fn load(path: &Path, categories: Categories, input_size: u32) -> Result<Self, Error> {
		let size = input_size as usize;
		tracing::info!("Loading model from {}", path.display());

		let load_error = |source| Error::Load {
			path: path.to_path_buf(),
			source,
		};

		let model = tract_onnx::onnx()
			.model_for_path(path)
			.and_then(|model| {
				model.with_input_fact(
					0,
					InferenceFact::dt_shape(f32::datum_type(), tvec!(1, size, size, 3)),
				)
			})
			.and_then(|model| model.into_optimized())
			.map_err(load_error)?;

		let output = model
			.output_fact(0)
			.map(|fact| fact.shape.as_concrete().map(<[usize]>::to_vec))
			.map_err(load_error)?;

		match output {
			Some(shape) => {
				let actual = score_count(&shape).ok_or_else(|| Error::OutputShape(shape.clone()))?;
				if actual != categories.len() {
					return Err(Error::ShapeMismatch {
						expected: categories.len(),
						actual,
					});
				}
			},
			None => tracing::warn!("Model output shape is not fixed, checking it on every prediction"),
		}

		let plan = model.into_runnable().map_err(load_error)?;
		tracing::info!(
			"Model ready: {size}x{size} input, categories [{}]",
			categories
		);

		Ok(Self {
			plan,
			input_size,
			categories,
		})
	}
}

impl Classifier for OnnxClassifier {
	fn categories(&self) -> &Categories {
		&self.categories
	}

	fn input_size(&self) -> u32 {
		self.input_size
	}

	fn forward(&self, input: &ImageTensor) -> anyhow::Result<Vec<f32>> {
		let tensor = Tensor::from_shape(&input.shape(), input.as_slice())?;
		let outputs = self.plan.run(tvec!(tensor.into()))?;

		let scores = outputs
			.first()
			.context("Model produced no outputs")?
			.to_array_view::<f32>()?;

		Ok(scores.iter().copied().collect())
	}
}

/// Number of scores in an output of the given shape, if every dimension but the last is 1.
fn score_count(shape: &[usize]) -> Option<usize> {
	let (last, leading) = shape.split_last()?;

	leading.iter().all(|dim| *dim == 1).then_some(*last)
}
