#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
	/// Increase log verbosity (-v for debug, -vv for trace)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,

	/// Defaults to `serve`, configured from the environment
	#[command(subcommand)]
	command: Option<commands::Command>,
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	enable_logging(cli.verbose);

	let command = cli.command.unwrap_or_else(commands::Command::serve_from_env);

	match commands::exec(command).await {
		Ok(code) => code,
		Err(e) => {
			tracing::error!("{e:#}");
			ExitCode::FAILURE
		},
	}
}

fn enable_logging(verbose: u8) {
	let log_level = match verbose {
		0 => Level::INFO,
		1 => Level::DEBUG,
		_ => Level::TRACE,
	};

	tracing_subscriber::registry()
		.with(EnvFilter::from_default_env().add_directive(log_level.into()))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
