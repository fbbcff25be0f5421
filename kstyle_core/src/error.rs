use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum KstyleError {
	#[error(transparent)]
	#[diagnostic(code(kstyle::io_error))]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	#[diagnostic(code(kstyle::pattern))]
	Pattern(#[from] regex::Error),

	#[error("invalid configuration: {0}")]
	#[diagnostic(
		code(kstyle::configuration),
		help("check that `style_dir` and `cache_dir` point at existing directories")
	)]
	Configuration(String),

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(
		code(kstyle::config_parse),
		help("check that kstyle.toml is valid TOML")
	)]
	ConfigParse { path: PathBuf, reason: String },

	#[error("Template ERROR: file {name} not exists")]
	#[diagnostic(code(kstyle::source_not_found))]
	SourceNotFound { name: String },

	#[error("invalid template name: `{name}`")]
	#[diagnostic(
		code(kstyle::invalid_template_name),
		help("template names are relative paths inside the style directory without `..`")
	)]
	InvalidTemplateName { name: String },

	#[error("ERROR cache file {}: {reason}", path.display())]
	#[diagnostic(
		code(kstyle::cache_write),
		help("make sure the cache directory exists and is writable")
	)]
	CacheWrite { path: PathBuf, reason: String },

	#[error("syntax error in `{template}`: {message}")]
	#[diagnostic(code(kstyle::code_syntax))]
	CodeSyntax { template: String, message: String },

	#[error("template `{template}` contains the reserved marker character U+E000")]
	#[diagnostic(
		code(kstyle::reserved_marker),
		help("remove the private-use character U+E000 from the template source")
	)]
	ReservedMarker { template: String },

	#[error("runtime error: {message}")]
	#[diagnostic(code(kstyle::runtime))]
	Runtime { message: String },

	#[error("include depth exceeded while rendering `{name}`")]
	#[diagnostic(
		code(kstyle::include_depth),
		help("check for templates that include themselves directly or indirectly")
	)]
	IncludeDepth { name: String },

	#[error("assigned variables must be a mapping of names to values")]
	#[diagnostic(code(kstyle::not_a_mapping))]
	NotAMapping,

	#[error("{operation}: {message}")]
	#[diagnostic(code(kstyle::halted))]
	Halted { operation: String, message: String },
}

impl KstyleError {
	pub(crate) fn runtime(message: impl Into<String>) -> Self {
		Self::Runtime {
			message: message.into(),
		}
	}
}

pub type KstyleResult<T> = Result<T, KstyleError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
