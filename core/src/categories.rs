use std::{fmt, str::FromStr, sync::Arc};

/// Labels the model was trained on, in output order.
pub const DEFAULT_LABELS: [&str; 4] = ["Half Fresh", "Fresh", "Not Valid Image", "Spoiled"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCategoriesError {
	#[error("At least one category is required")]
	Empty,

	#[error("Category at position {0} is blank")]
	Blank(usize),

	#[error("Category {0:?} is listed more than once")]
	Duplicate(String),
}

/// The ordered set of labels a classifier can predict.
///
/// Index `i` of the model output maps to the label at position `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categories(Arc<[String]>);

impl Categories {
	/// Build a category set from labels, in model output order.
	///
	/// # Errors
	///
	/// Returns an error if there are no labels, a label is blank, or a label is repeated.
	pub fn new<I, S>(labels: I) -> Result<Self, ParseCategoriesError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let labels = labels
			.into_iter()
			.map(|label| label.into().trim().to_string())
			.collect::<Vec<_>>();

		if labels.is_empty() {
			return Err(ParseCategoriesError::Empty);
		}

		for (i, label) in labels.iter().enumerate() {
			if label.is_empty() {
				return Err(ParseCategoriesError::Blank(i));
			}

			if labels[..i].contains(label) {
				return Err(ParseCategoriesError::Duplicate(label.clone()));
			}
		}

		Ok(Self(labels.into()))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn get(&self, index: usize) -> Option<&str> {
		self.0.get(index).map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl Default for Categories {
	fn default() -> Self {
		Self(DEFAULT_LABELS.iter().map(ToString::to_string).collect())
	}
}

impl FromStr for Categories {
	type Err = ParseCategoriesError;

	/// Parse a comma-separated list, e.g. `Fresh,Spoiled`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.trim().is_empty() {
			return Err(ParseCategoriesError::Empty);
		}

		Self::new(s.split(','))
	}
}

impl fmt::Display for Categories {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join(","))
	}
}
