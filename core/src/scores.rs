use crate::{classifier::Error, http, Categories};

/// Probabilities produced by a single forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores(Vec<f32>);

/// The winning category of a forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
	pub index: usize,
	pub category: String,
	pub confidence: f32,
}

impl Scores {
	#[must_use]
	pub const fn new(scores: Vec<f32>) -> Self {
		Self(scores)
	}

	/// Index of the highest score. Ties resolve to the first occurrence.
	///
	/// # Errors
	///
	/// Returns an error if any score is NaN or infinite.
	pub fn argmax(&self) -> Result<Option<usize>, Error> {
		if let Some(index) = self.0.iter().position(|score| !score.is_finite()) {
			return Err(Error::NonFinite(index));
		}

		let mut best: Option<(usize, f32)> = None;
		for (index, &score) in self.0.iter().enumerate() {
			if best.map_or(true, |(_, top)| score > top) {
				best = Some((index, score));
			}
		}

		Ok(best.map(|(index, _)| index))
	}

	/// Map the highest score onto its category.
	///
	/// # Errors
	///
	/// Returns an error if the number of scores differs from the number of categories, or a score is not finite.
	pub fn top(&self, categories: &Categories) -> Result<Classification, Error> {
		if self.0.len() != categories.len() {
			return Err(Error::ShapeMismatch {
				expected: categories.len(),
				actual: self.0.len(),
			});
		}

		let index = self.argmax()?.ok_or(Error::ShapeMismatch {
			expected: categories.len(),
			actual: 0,
		})?;

		Ok(Classification {
			index,
			confidence: self.0[index],
			category: categories
				.get(index)
				.ok_or(Error::ShapeMismatch {
					expected: categories.len(),
					actual: self.0.len(),
				})?
				.to_string(),
		})
	}
}

impl Classification {
	/// Confidence with exactly five decimal places, as sent over the wire.
	#[must_use]
	pub fn confidence_string(&self) -> String {
		format!("{:.5}", f64::from(self.confidence))
	}
}

impl From<Classification> for http::Prediction {
	fn from(classification: Classification) -> Self {
		Self {
			confidence: classification.confidence_string(),
			category: classification.category,
		}
	}
}
