use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::KstyleError;
use crate::KstyleResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["kstyle.toml", ".kstyle.toml", ".config/kstyle.toml"];

pub const DEFAULT_TEMPLATES_PATH: &str = "templates";
pub const DEFAULT_STYLE: &str = "default";
pub const DEFAULT_LOG_FILE: &str = "template.log";

/// Everything the engine needs to locate templates and artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfig {
	/// Directory holding the template sources.
	pub style_dir: PathBuf,
	/// Directory compiled artifacts are written to.
	pub cache_dir: PathBuf,
	/// Public path of the templates root, used for asset prefixes.
	pub templates_path: String,
	/// Name of the active style below `templates_path`.
	pub style: String,
	/// Public path the site is mounted under, empty at the web root.
	pub site_path: String,
	pub debug: bool,
	/// Name reported by [`Templates::logs`](crate::Templates::logs).
	pub log_file: String,
}

impl StyleConfig {
	pub fn new(style_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
		Self {
			style_dir: style_dir.into(),
			cache_dir: cache_dir.into(),
			templates_path: DEFAULT_TEMPLATES_PATH.to_string(),
			style: DEFAULT_STYLE.to_string(),
			site_path: String::new(),
			debug: false,
			log_file: DEFAULT_LOG_FILE.to_string(),
		}
	}

	#[must_use]
	pub fn with_web_path(mut self, templates_path: impl Into<String>, style: impl Into<String>) -> Self {
		self.templates_path = templates_path.into();
		self.style = style.into();
		self
	}

	#[must_use]
	pub fn with_site_path(mut self, site_path: impl Into<String>) -> Self {
		self.site_path = site_path.into();
		self
	}

	#[must_use]
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	#[must_use]
	pub fn with_log_file(mut self, log_file: impl Into<String>) -> Self {
		self.log_file = log_file.into();
		self
	}

	/// The public path of the active style, e.g. `/site/templates/default`.
	/// Empty segments are skipped and `/` is returned when all are empty.
	pub fn style_path(&self) -> String {
		let segments: Vec<&str> = [&self.site_path, &self.templates_path, &self.style]
			.into_iter()
			.map(|segment| segment.trim_matches('/'))
			.filter(|segment| !segment.is_empty())
			.collect();

		format!("/{}", segments.join("/"))
	}

	/// The prefix inserted before relative asset references.
	pub fn asset_prefix(&self) -> String {
		let path = self.style_path();
		if path.ends_with('/') {
			path
		} else {
			format!("{path}/")
		}
	}

	/// Both directories must already exist.
	pub fn validate(&self) -> KstyleResult<()> {
		for (label, dir) in [("style", &self.style_dir), ("cache", &self.cache_dir)] {
			if !dir.is_dir() {
				return Err(KstyleError::Configuration(format!(
					"{label} directory `{}` does not exist",
					dir.display()
				)));
			}
		}

		Ok(())
	}

	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> KstyleResult<Option<Self>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::from_file(&config_path).map(Some)
	}

	/// Load a config file. Relative directories resolve against the directory
	/// holding the file.
	pub fn from_file(path: &Path) -> KstyleResult<Self> {
		let content = std::fs::read_to_string(path)?;
		let file: ConfigFile = toml::from_str(&content).map_err(|error| {
			KstyleError::ConfigParse {
				path: path.to_path_buf(),
				reason: error.to_string(),
			}
		})?;

		let base = path
			.parent()
			.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
		Ok(file.resolve(&base))
	}
}

/// The on-disk shape of `kstyle.toml`.
///
/// ```toml
/// templates_path = "templates"
/// style = "default"
/// style_dir = "templates/default"
/// cache_dir = "cache/default"
/// site_path = ""
/// debug = false
/// log_file = "template.log"
/// ```
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
	style_dir: Option<PathBuf>,
	cache_dir: Option<PathBuf>,
	templates_path: Option<String>,
	style: Option<String>,
	site_path: Option<String>,
	debug: Option<bool>,
	log_file: Option<String>,
}

impl ConfigFile {
	fn resolve(self, base: &Path) -> StyleConfig {
		let templates_path = self
			.templates_path
			.unwrap_or_else(|| DEFAULT_TEMPLATES_PATH.to_string());
		let style = self.style.unwrap_or_else(|| DEFAULT_STYLE.to_string());

		let style_dir = self.style_dir.unwrap_or_else(|| {
			Path::new(templates_path.trim_matches('/')).join(&style)
		});
		let cache_dir = self
			.cache_dir
			.unwrap_or_else(|| Path::new("cache").join(&style));

		StyleConfig {
			style_dir: base.join(style_dir),
			cache_dir: base.join(cache_dir),
			templates_path,
			style,
			site_path: self.site_path.unwrap_or_default(),
			debug: self.debug.unwrap_or(false),
			log_file: self
				.log_file
				.unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
		}
	}
}
