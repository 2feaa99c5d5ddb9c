use std::process::ExitCode;

use anyhow::Result;

pub fn handle() -> Result<ExitCode> {
	println!("{}", serde_json::to_string_pretty(&meatme::schema())?);

	Ok(ExitCode::SUCCESS)
}
