use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, Subcommand};
use meatme::Config;
use url::Url;

mod classify;
mod predict;
mod schema;
mod serve;

#[derive(Subcommand)]
pub enum Command {
	/// Download the model and serve predictions over HTTP
	Serve(Config),

	/// Classify local image files without starting a server
	Classify {
		#[command(flatten)]
		config: Config,

		/// Images to classify
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},

	/// Upload an image to a running server and print its prediction
	Predict {
		/// Image to upload
		file: PathBuf,

		/// Base URL of the server
		#[arg(long, env = "MEATME_URL", default_value = "http://localhost:5000")]
		url: Url,
	},

	/// Print the OpenAPI document of the HTTP API
	Schema,
}

impl Command {
	/// `serve` with settings taken only from the environment and defaults.
	pub fn serve_from_env() -> Self {
		#[derive(Parser)]
		#[command(name = "meatme")]
		struct Serve {
			#[command(flatten)]
			config: Config,
		}

		Self::Serve(Serve::parse_from(["meatme"]).config)
	}
}

pub async fn exec(command: Command) -> Result<ExitCode> {
	match command {
		Command::Serve(config) => serve::handle(config).await,
		Command::Classify { config, files } => classify::handle(config, files).await,
		Command::Predict { file, url } => predict::handle(&file, &url).await,
		Command::Schema => schema::handle(),
	}
}
