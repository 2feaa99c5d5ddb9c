use std::{
	fs::File,
	io::{BufReader, Read},
	path::{Path, PathBuf},
	time::Duration,
};

use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use url::Url;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to download model from {url}: {source}")]
	Fetch {
		url: Url,
		#[source]
		source: reqwest::Error,
	},

	#[error("Failed to write model to {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Model at {path} expected SHA-256 {expected} but found {actual}")]
	ChecksumMismatch {
		path: PathBuf,
		expected: String,
		actual: String,
	},
}

/// Where the serialized model comes from and where it lives on disk.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
	/// Remote location to fetch the model from. `None` uses the file already at `path`.
	pub url: Option<Url>,
	/// Local path the model is stored at.
	pub path: PathBuf,
	/// Expected SHA-256 digest as hexadecimal.
	pub sha256: Option<String>,
	/// Time allowed for the whole download.
	pub timeout: Duration,
}

impl ModelArtifact {
	/// Make sure the model file is present (and matches its checksum, if one is configured).
	///
	/// # Errors
	///
	/// Returns an error if the download fails, the file cannot be written or read, or the checksum does not match.
	pub async fn resolve(&self) -> Result<&Path, Error> {
		match &self.url {
			Some(url) => self.download(url).await?,
			None => {
				tracing::info!("Using existing model at {}", self.path.display());
				self.verify()?;
			},
		}

		Ok(&self.path)
	}

	/// Checks the file at `path` against the expected digest, if there is one.
	///
	/// # Errors
	///
	/// Returns `ChecksumMismatch` when the digests differ, and propagates I/O errors while reading the file.
	pub fn verify(&self) -> Result<(), Error> {
		let Some(expected) = &self.sha256 else {
			return Ok(());
		};

		self.check_digest(expected, compute_sha256(&self.path)?)
	}

	async fn download(&self, url: &Url) -> Result<(), Error> {
		tracing::info!("Downloading model from {url}");

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).await.map_err(io_error(parent))?;
		}

		// Stream into a sibling file so a failed download never leaves a truncated model behind.
		let partial = self.partial_path();
		let result = self.fetch_into(url, &partial).await;

		let digest = match result {
			Ok(digest) => digest,
			Err(e) => {
				fs::remove_file(&partial).await.ok();
				return Err(e);
			},
		};

		if let Some(expected) = &self.sha256 {
			if let Err(e) = self.check_digest(expected, digest) {
				fs::remove_file(&partial).await.ok();
				return Err(e);
			}
		}

		fs::rename(&partial, &self.path)
			.await
			.map_err(io_error(&self.path))?;

		tracing::info!("Downloaded model to {}", self.path.display());
		Ok(())
	}

	async fn fetch_into(&self, url: &Url, partial: &Path) -> Result<String, Error> {
		let fetch_error = |source| Error::Fetch {
			url: url.clone(),
			source,
		};
		let client = Client::builder()
			.user_agent(format!("meatme/{}", env!("CARGO_PKG_VERSION")))
			.timeout(self.timeout)
			.build()
			.map_err(fetch_error)?;

		let mut response = client
			.get(url.as_str())
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(fetch_error)?;

		let mut file = fs::File::create(partial)
			.await
			.map_err(io_error(partial))?;
		let mut hasher = Sha256::new();
		let mut written = 0;

		while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
			hasher.update(&chunk);
			file.write_all(&chunk)
				.await
				.map_err(io_error(partial))?;
			written += chunk.len();
		}

		file.flush().await.map_err(io_error(partial))?;
		file.sync_all().await.map_err(io_error(partial))?;
		tracing::debug!("Received {written} bytes from {url}");

		Ok(format!("{:x}", hasher.finalize()))
	}

	fn check_digest(&self, expected: &str, actual: String) -> Result<(), Error> {
		let expected = normalise_hex(expected);
		if actual == expected {
			return Ok(());
		}

		Err(Error::ChecksumMismatch {
			path: self.path.clone(),
			expected,
			actual,
		})
	}

	fn partial_path(&self) -> PathBuf {
		let file_name = self
			.path
			.file_name()
			.map_or_else(|| "model".into(), |name| name.to_string_lossy());

		self.path
			.with_file_name(format!(".{file_name}.{}.part", Uuid::new_v4()))
	}
}

/// Computes the SHA-256 digest of the file at `path` as lowercase hexadecimal.
///
/// # Errors
///
/// Returns I/O errors from opening or reading the file.
pub fn compute_sha256(path: &Path) -> Result<String, Error> {
	let mut reader = BufReader::new(File::open(path).map_err(io_error(path))?);
	let mut hasher = Sha256::new();
	let mut buffer = [0_u8; 8192];

	loop {
		let read = reader.read(&mut buffer).map_err(io_error(path))?;
		if read == 0 {
			break;
		}

		hasher.update(&buffer[..read]);
	}

	Ok(format!("{:x}", hasher.finalize()))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error {
	let path = path.to_path_buf();
	move |source| Error::Io { path, source }
}

fn normalise_hex(value: &str) -> String {
	value.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{http::StatusCode, routing::get, Router, Server};
	use std::{env::temp_dir, net::SocketAddr};

	const MODEL_BYTES: &[u8] = b"not really an onnx graph";

	fn model_digest() -> String {
		format!("{:x}", Sha256::digest(MODEL_BYTES))
	}

	async fn serve_model() -> Url {
		let app = Router::new()
			.route("/model.onnx", get(|| async { MODEL_BYTES }))
			.route(
				"/missing.onnx",
				get(|| async { (StatusCode::NOT_FOUND, "not found") }),
			);

		let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
			.serve(app.into_make_service());
		let addr = server.local_addr();
		tokio::spawn(server);

		format!("http://{addr}/").parse().unwrap()
	}

	fn scratch_dir() -> PathBuf {
		temp_dir().join(format!("meatme-artifact-{}", Uuid::new_v4()))
	}

	fn artifact(url: Option<Url>, path: PathBuf, sha256: Option<String>) -> ModelArtifact {
		ModelArtifact {
			url,
			path,
			sha256,
			timeout: Duration::from_secs(10),
		}
	}

	fn leftovers(dir: &Path) -> Vec<PathBuf> {
		std::fs::read_dir(dir)
			.map(|entries| entries.map(|e| e.unwrap().path()).collect())
			.unwrap_or_default()
	}

	#[tokio::test]
	async fn downloads_model_to_path() {
		let base = serve_model().await;
		let dir = scratch_dir();
		let path = dir.join("nested").join("model.onnx");

		let artifact = artifact(Some(base.join("model.onnx").unwrap()), path.clone(), None);
		let resolved = artifact.resolve().await.unwrap();

		assert_eq!(resolved, path.as_path());
		assert_eq!(std::fs::read(&path).unwrap(), MODEL_BYTES);
		assert_eq!(leftovers(&dir.join("nested")), vec![path]);

		std::fs::remove_dir_all(dir).unwrap();
	}

	#[tokio::test]
	async fn accepts_matching_checksum_in_any_case() {
		let base = serve_model().await;
		let dir = scratch_dir();
		let path = dir.join("model.onnx");

		let artifact = artifact(
			Some(base.join("model.onnx").unwrap()),
			path.clone(),
			Some(format!(" {} ", model_digest().to_uppercase())),
		);

		artifact.resolve().await.unwrap();
		assert_eq!(std::fs::read(&path).unwrap(), MODEL_BYTES);

		std::fs::remove_dir_all(dir).unwrap();
	}

	#[tokio::test]
	async fn checksum_mismatch_leaves_nothing_behind() {
		let base = serve_model().await;
		let dir = scratch_dir();
		let path = dir.join("model.onnx");

		let artifact = artifact(
			Some(base.join("model.onnx").unwrap()),
			path,
			Some("00".repeat(32)),
		);
		let error = artifact.resolve().await.unwrap_err();

		assert!(matches!(error, Error::ChecksumMismatch { .. }));
		assert!(leftovers(&dir).is_empty());

		std::fs::remove_dir_all(dir).unwrap();
	}

	#[tokio::test]
	async fn error_status_fails_the_download() {
		let base = serve_model().await;
		let dir = scratch_dir();
		let path = dir.join("model.onnx");

		let artifact = artifact(Some(base.join("missing.onnx").unwrap()), path, None);
		let error = artifact.resolve().await.unwrap_err();

		assert!(matches!(error, Error::Fetch { .. }));
		assert!(leftovers(&dir).is_empty());

		std::fs::remove_dir_all(dir).unwrap();
	}

	#[tokio::test]
	async fn uses_existing_file_without_url() {
		let dir = scratch_dir();
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("model.onnx");
		std::fs::write(&path, MODEL_BYTES).unwrap();

		artifact(None, path.clone(), Some(model_digest()))
			.resolve()
			.await
			.unwrap();

		let error = artifact(None, path, Some("ff".repeat(32)))
			.resolve()
			.await
			.unwrap_err();
		assert!(matches!(error, Error::ChecksumMismatch { .. }));

		std::fs::remove_dir_all(dir).unwrap();
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let error = compute_sha256(&scratch_dir().join("model.onnx")).unwrap_err();

		assert!(matches!(error, Error::Io { .. }));
	}

	#[test]
	fn normalise_hex_lowercases_and_trims() {
		assert_eq!(normalise_hex(" ABCDEF "), "abcdef");
	}
}
