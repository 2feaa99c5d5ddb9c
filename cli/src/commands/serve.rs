use std::process::ExitCode;

use anyhow::Result;
use meatme::{Config, Shutdown};

pub async fn handle(config: Config) -> Result<ExitCode> {
	meatme::start(config, Shutdown::with_signals()).await?;

	Ok(ExitCode::SUCCESS)
}
