use axum::Extension;
use tokio::{signal, sync::mpsc};

#[derive(Debug)]
pub struct Shutdown {
	sender: mpsc::Sender<()>,
	receiver: mpsc::Receiver<()>,
}

/// Cloneable handle that can request a shutdown.
#[derive(Debug, Clone)]
pub struct Agent {
	sender: mpsc::Sender<()>,
}

impl Agent {
	pub async fn start(&self) {
		tracing::info!("Shutdown requested");
		self.sender.send(()).await.ok();
	}
}

impl Shutdown {
	/// A shutdown that only triggers through an [`Agent`].
	#[must_use]
	pub fn new() -> Self {
		let (sender, receiver) = mpsc::channel(1);

		Self { sender, receiver }
	}

	/// A shutdown that also triggers on Ctrl+C and SIGTERM.
	///
	/// Must be called from within a Tokio runtime.
	#[must_use]
	pub fn with_signals() -> Self {
		let shutdown = Self::new();
		let agent = shutdown.agent();

		tokio::spawn(async move {
			wait_for_signal().await;
			agent.start().await;
		});

		shutdown
	}

	#[must_use]
	pub fn agent(&self) -> Agent {
		Agent {
			sender: self.sender.clone(),
		}
	}

	#[must_use]
	pub fn extension(&self) -> Extension<Agent> {
		Extension(self.agent())
	}

	/// Resolves once a shutdown has been requested.
	pub async fn wait(mut self) {
		self.receiver.recv().await;
	}
}

impl Default for Shutdown {
	fn default() -> Self {
		Self::new()
	}
}

async fn wait_for_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!("Failed to listen for Ctrl+C: {e}");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!("Failed to listen for SIGTERM: {e}");
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	tracing::info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn agent_triggers_shutdown() {
		let shutdown = Shutdown::new();
		let agent = shutdown.agent();

		agent.start().await;

		tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn waits_until_requested() {
		let shutdown = Shutdown::new();
		let _agent = shutdown.agent();

		assert!(
			tokio::time::timeout(Duration::from_millis(50), shutdown.wait())
				.await
				.is_err()
		);
	}
}
