use std::{net::IpAddr, path::PathBuf, time::Duration};

use meatme_core::Categories;
use url::Url;

use crate::artifact::ModelArtifact;

pub const DEFAULT_MODEL_URL: &str = "https://storage.googleapis.com/cobatest/meatme_model.onnx";

/// Settings for model initialization and the HTTP server.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
	/// Address to listen on
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: IpAddr,

	/// Port to listen on
	#[arg(short, long, env = "PORT", default_value_t = 5000)]
	pub port: u16,

	/// Where to download the ONNX model from at startup
	#[arg(long, env = "MODEL_URL", default_value = DEFAULT_MODEL_URL)]
	pub model_url: Url,

	/// Skip the download and load the model already present at --model-path
	#[arg(long, env = "MODEL_NO_DOWNLOAD")]
	pub no_download: bool,

	/// Local path the model is stored at
	#[arg(long, env = "MODEL_PATH", default_value = "/app/model.onnx")]
	pub model_path: PathBuf,

	/// Expected SHA-256 of the model file, checked before loading
	#[arg(long, env = "MODEL_SHA256")]
	pub model_sha256: Option<String>,

	/// Seconds to wait for the model download before giving up
	#[arg(long, env = "MODEL_DOWNLOAD_TIMEOUT", default_value_t = 300)]
	pub download_timeout: u64,

	/// Comma-separated labels, in model output order
	#[arg(long, env = "CATEGORIES", default_value_t = Categories::default())]
	pub categories: Categories,

	/// Side length, in pixels, images are resized to before inference
	#[arg(long, env = "INPUT_SIZE", default_value_t = 150, value_parser = clap::value_parser!(u32).range(1..))]
	pub input_size: u32,

	/// Predictions allowed to wait for the model before new ones are turned away
	#[arg(long, env = "QUEUE_DEPTH", default_value_t = 8)]
	pub queue_depth: usize,

	/// Largest accepted request body, in bytes
	#[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 16 * 1024 * 1024)]
	pub max_upload_bytes: usize,
}

impl Config {
	#[must_use]
	pub fn artifact(&self) -> ModelArtifact {
		ModelArtifact {
			path: self.model_path.clone(),
			sha256: self.model_sha256.clone(),
			url: (!self.no_download).then(|| self.model_url.clone()),
			timeout: Duration::from_secs(self.download_timeout),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	#[derive(Parser)]
	struct Cli {
		#[command(flatten)]
		config: Config,
	}

	#[test]
	fn defaults_listen_on_port_5000() {
		let config = Cli::parse_from(["meatme"]).config;

		assert_eq!(config.port, 5000);
		assert_eq!(config.host.to_string(), "0.0.0.0");
		assert_eq!(config.input_size, 150);
		assert_eq!(config.categories, Categories::default());
		assert_eq!(config.model_url.as_str(), DEFAULT_MODEL_URL);
	}

	#[test]
	fn no_download_leaves_artifact_without_url() {
		let config = Cli::parse_from([
			"meatme",
			"--no-download",
			"--model-path",
			"model.onnx",
			"--categories",
			"Fresh,Spoiled",
		])
		.config;
		let artifact = config.artifact();

		assert!(artifact.url.is_none());
		assert_eq!(artifact.path, PathBuf::from("model.onnx"));
		assert_eq!(config.categories.len(), 2);
	}

	#[test]
	fn input_size_must_be_positive() {
		assert!(Cli::try_parse_from(["meatme", "--input-size", "0"]).is_err());
		assert_eq!(
			Cli::try_parse_from(["meatme", "--input-size", "224"])
				.unwrap()
				.config
				.input_size,
			224
		);
	}
}
