use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::ARTIFACT_SCHEMA_VERSION;
use crate::Artifact;
use crate::KstyleError;
use crate::KstyleResult;

/// How [`prepare`](crate::Templates::prepare) found the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
	/// The cached artifact was newer than its source and was reused.
	Fresh,
	/// The template was compiled and the artifact written.
	Compiled,
}

impl CacheStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fresh => "fresh",
			Self::Compiled => "compiled",
		}
	}
}

pub fn artifact_path(cache_dir: &Path, name: &str) -> PathBuf {
	cache_dir.join(format!("{name}.json"))
}

fn modified(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// An artifact is fresh only when it was modified strictly after its source.
pub fn is_fresh(artifact: &Path, source: &Path) -> bool {
	match (modified(artifact), modified(source)) {
		(Some(artifact), Some(source)) => artifact > source,
		_ => false,
	}
}

/// Read a cached artifact. Unreadable, undecodable or outdated artifacts are
/// treated as missing.
pub fn load(path: &Path) -> Option<Artifact> {
	let bytes = std::fs::read(path).ok()?;
	let artifact: Artifact = match serde_json::from_slice(&bytes) {
		Ok(artifact) => artifact,
		Err(error) => {
			tracing::debug!(path = %path.display(), %error, "discarding unreadable artifact");
			return None;
		}
	};

	if artifact.schema_version != ARTIFACT_SCHEMA_VERSION {
		tracing::debug!(
			path = %path.display(),
			found = artifact.schema_version,
			"discarding artifact with a different schema version"
		);
		return None;
	}

	Some(artifact)
}

/// Persist `artifact` through a temporary file renamed over `path`, so
/// readers never see a partial write.
pub fn save(path: &Path, artifact: &Artifact) -> KstyleResult<()> {
	let cache_write = |reason: String| {
		KstyleError::CacheWrite {
			path: path.to_path_buf(),
			reason,
		}
	};

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(|error| cache_write(error.to_string()))?;
	}

	let payload = serde_json::to_vec(artifact).map_err(|error| cache_write(error.to_string()))?;
	let temp_path = path.with_extension(format!(
		"json.tmp-{}-{}",
		std::process::id(),
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0, |duration| duration.as_nanos())
	));

	std::fs::write(&temp_path, payload).map_err(|error| cache_write(error.to_string()))?;

	if let Err(error) = std::fs::rename(&temp_path, path) {
		let _ = std::fs::remove_file(&temp_path);
		return Err(cache_write(error.to_string()));
	}

	Ok(())
}

/// Delete the artifact at `path`. A missing artifact is not an error.
pub fn remove(path: &Path) -> KstyleResult<()> {
	match std::fs::remove_file(path) {
		Ok(()) => Ok(()),
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(error) => Err(error.into()),
	}
}
