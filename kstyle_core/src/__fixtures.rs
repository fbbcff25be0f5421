use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use tempfile::TempDir;

use crate::StyleConfig;
use crate::Templates;

/// A temporary site with an empty style directory and cache directory.
pub struct Site {
	pub dir: TempDir,
	pub style_dir: PathBuf,
	pub cache_dir: PathBuf,
}

impl Site {
	pub fn new() -> Self {
		let dir = tempfile::tempdir().unwrap();
		let style_dir = dir.path().join("templates/default");
		let cache_dir = dir.path().join("cache/default");
		std::fs::create_dir_all(&style_dir).unwrap();
		std::fs::create_dir_all(&cache_dir).unwrap();

		Self {
			dir,
			style_dir,
			cache_dir,
		}
	}

	pub fn config(&self) -> StyleConfig {
		StyleConfig::new(&self.style_dir, &self.cache_dir)
	}

	pub fn engine(&self) -> Templates {
		Templates::new(self.config()).unwrap()
	}

	pub fn debug_engine(&self) -> Templates {
		Templates::new(self.config().with_debug(true)).unwrap()
	}

	/// Write a template source backdated by a minute, so an artifact written
	/// right after it is always newer.
	pub fn template(&self, name: &str, source: &str) -> PathBuf {
		let path = self.style_dir.join(name);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap();
		}
		std::fs::write(&path, source).unwrap();
		set_modified(&path, SystemTime::now() - Duration::from_secs(60));
		path
	}

	pub fn artifact(&self, name: &str) -> PathBuf {
		self.cache_dir.join(format!("{name}.json"))
	}
}

pub fn set_modified(path: &Path, time: SystemTime) {
	std::fs::File::options()
		.write(true)
		.open(path)
		.unwrap()
		.set_modified(time)
		.unwrap();
}

pub fn render(site: &Site, name: &str, source: &str) -> String {
	site.template(name, source);
	site.engine().render_to_string(name).unwrap()
}
