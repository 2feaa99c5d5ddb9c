use std::{
	any::Any,
	panic::{self, AssertUnwindSafe},
	sync::{atomic::Ordering, Arc},
	time::Duration,
};

use atomic_enum::atomic_enum;
use axum::body::Bytes;
use meatme_core::{Classification, Classifier};
use schemars::JsonSchema;
use tokio::sync::{
	mpsc::{self, error::TrySendError},
	oneshot,
};

use crate::{helpers::with_timing, preprocess};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Runner is busy")]
	Busy,

	#[error("Model is unavailable")]
	Unavailable,

	#[error(transparent)]
	Preprocess(#[from] preprocess::Error),

	#[error(transparent)]
	Classify(#[from] meatme_core::Error),
}

#[atomic_enum]
#[derive(serde::Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
	Ready,
	Busy,
	Unavailable,
}

type Outcome = (Result<Classification, Error>, Duration);
type Job = (oneshot::Sender<Outcome>, Bytes);

/// Hands images to a single worker thread that owns the model.
#[derive(Clone)]
pub struct Runner {
	health: Arc<AtomicHealth>,
	sender: mpsc::Sender<Job>,
}

impl Runner {
	/// Start the worker. Up to `queue_depth` predictions may wait while one is running.
	///
	/// Must be called from within a Tokio runtime.
	pub fn new(classifier: Arc<dyn Classifier>, queue_depth: usize) -> Self {
		let (sender, mut rx) = mpsc::channel::<Job>(queue_depth.max(1));
		let health = Arc::new(AtomicHealth::new(Health::Ready));

		let worker_health = health.clone();
		tokio::task::spawn_blocking(move || {
			while let Some((tx, image)) = rx.blocking_recv() {
				worker_health.store(Health::Busy, Ordering::SeqCst);
				let outcome = with_timing(|| {
					panic::catch_unwind(AssertUnwindSafe(|| predict(classifier.as_ref(), &image)))
						.unwrap_or_else(|payload| Err(panicked(payload.as_ref())))
				});
				worker_health.store(Health::Ready, Ordering::SeqCst);

				if tx.send(outcome).is_err() {
					tracing::debug!("Prediction finished after its request went away");
				}
			}

			tracing::debug!("Runner queue closed, stopping worker");
		});

		Self { health, sender }
	}

	#[must_use]
	pub fn health(&self) -> Health {
		self.health.load(Ordering::SeqCst)
	}

	/// Queue an image for prediction without waiting for the result.
	///
	/// # Errors
	///
	/// Returns `Busy` if the queue is full, or `Unavailable` if the worker has stopped.
	pub fn submit(&self, image: Bytes) -> Result<oneshot::Receiver<Outcome>, Error> {
		let (tx, rx) = oneshot::channel();

		match self.sender.try_send((tx, image)) {
			Ok(()) => Ok(rx),
			Err(TrySendError::Full(_)) => {
				tracing::debug!("Prediction queue is full, turning request away");
				Err(Error::Busy)
			},
			Err(TrySendError::Closed(_)) => Err(self.unavailable()),
		}
	}

	/// Decode, preprocess and classify an image, returning the result and how long the worker took.
	///
	/// # Errors
	///
	/// Returns an error if the runner cannot accept the image, the image cannot be decoded, or inference fails.
	pub async fn run(&self, image: Bytes) -> Result<(Classification, Duration), Error> {
		let pending = self.submit(image)?;
		let (result, predict_time) = pending.await.map_err(|_| self.unavailable())?;

		Ok((result?, predict_time))
	}

	fn unavailable(&self) -> Error {
		tracing::error!("Prediction worker has stopped");
		self.health.store(Health::Unavailable, Ordering::SeqCst);

		Error::Unavailable
	}
}

fn predict(classifier: &dyn Classifier, image: &[u8]) -> Result<Classification, Error> {
	let tensor = preprocess::prepare(image, classifier.input_size())?;

	Ok(classifier.classify(&tensor)?)
}

/// A panic in one prediction fails that request only, the worker keeps serving.
fn panicked(payload: &(dyn Any + Send)) -> Error {
	let message = payload
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("unknown panic");
	tracing::error!("Prediction panicked: {message}");

	meatme_core::Error::Inference(anyhow::anyhow!("Prediction panicked: {message}")).into()
}
