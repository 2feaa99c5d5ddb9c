#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub use config::Config;
pub use meatme_core::{Categories, Classification, Classifier};
pub use routes::system::Setup;
pub use runner::{Health, Runner};
pub use server::{initialize, router, schema, start};
pub use shutdown::{Agent, Shutdown};

pub mod artifact;
pub mod onnx;
pub mod preprocess;
pub mod runner;

mod config;
mod errors;
mod helpers;
mod routes;
mod server;
mod shutdown;

#[cfg(test)]
mod testing;
