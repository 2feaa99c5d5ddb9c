#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod http;

mod categories;
mod classifier;
mod scores;

pub use categories::{Categories, ParseCategoriesError};
pub use classifier::{Classifier, Error, ImageTensor};
pub use scores::{Classification, Scores};
