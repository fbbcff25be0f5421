use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

use crate::Artifact;
use crate::CacheStatus;
use crate::Compiler;
use crate::ErrorLog;
use crate::Function;
use crate::HostEnvironment;
use crate::Interpreter;
use crate::KstyleError;
use crate::KstyleResult;
use crate::LogReport;
use crate::RenderContext;
use crate::StyleConfig;
use crate::VariableStore;
use crate::artifact_cache;

/// Nested includes allowed before a render fails.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// What [`Templates::render`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
	/// The captured output.
	Text(String),
	/// The output was written to standard output.
	Emitted,
}

/// The template engine: compiles templates on demand, keeps their artifacts
/// cached on disk and renders them against the assigned variables.
///
/// ```rust,no_run
/// use kstyle_core::StyleConfig;
/// use kstyle_core::Templates;
/// use serde_json::json;
///
/// let config = StyleConfig::new("templates/default", "cache/default");
/// let mut templates = Templates::new(config)?;
/// templates.assign_json(json!({ "title": "Hello" }), false)?;
/// let html = templates.render_to_string("index.html")?;
/// # Ok::<(), kstyle_core::KstyleError>(())
/// ```
#[derive(Debug)]
pub struct Templates {
	config: StyleConfig,
	compiler: Compiler,
	store: VariableStore,
	environment: Option<HostEnvironment>,
	log: ErrorLog,
	/// Functions declared so far in the current render, keyed like
	/// [`Artifact::functions`].
	functions: IndexMap<String, Function>,
	include_depth: usize,
}

impl Templates {
	/// Create an engine. Both configured directories must exist.
	pub fn new(config: StyleConfig) -> KstyleResult<Self> {
		config.validate()?;
		let compiler = Compiler::new(config.asset_prefix())?;
		let log = ErrorLog::new(config.debug);

		Ok(Self {
			config,
			compiler,
			store: VariableStore::new(),
			environment: None,
			log,
			functions: IndexMap::new(),
			include_depth: 0,
		})
	}

	/// In debug mode every render recompiles and the first reported error
	/// halts the render.
	pub fn set_debug(&mut self, debug: bool) {
		self.config.debug = debug;
		self.log.set_debug(debug);
	}

	pub fn is_debug(&self) -> bool {
		self.config.debug
	}

	/// Install the capability superglobal references resolve against.
	pub fn set_environment(&mut self, environment: HostEnvironment) {
		self.environment = Some(environment);
	}

	pub fn environment(&self) -> Option<&HostEnvironment> {
		self.environment.as_ref()
	}

	pub fn assign<I, K>(&mut self, variables: I, merge: bool)
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		self.store.assign(variables, merge);
	}

	/// Assign the entries of a JSON object. Fails for any other value.
	pub fn assign_json(&mut self, variables: Value, merge: bool) -> KstyleResult<()> {
		self.store
			.assign_json(variables, merge)
			.map_err(|error| self.fail(error))
	}

	pub fn variables(&self) -> &VariableStore {
		&self.store
	}

	/// The public path of the active style.
	pub fn style_path(&self) -> String {
		self.config.style_path()
	}

	/// Compile `name` unless its cached artifact is fresh.
	pub fn prepare(&mut self, name: &str) -> KstyleResult<CacheStatus> {
		self.load_artifact(name)
			.map(|(_, status)| status)
			.map_err(|error| self.fail(error))
	}

	/// Drop the cached artifact of `name`, so the next render recompiles it.
	pub fn invalidate(&mut self, name: &str) -> KstyleResult<()> {
		self.source_path(name)
			.map(|_| artifact_cache::artifact_path(&self.config.cache_dir, name))
			.and_then(|path| artifact_cache::remove(&path))
			.map_err(|error| self.fail(error))
	}

	/// Render `name`, returning the text when `capture` is set and writing it
	/// to standard output otherwise.
	pub fn render(&mut self, name: &str, capture: bool) -> KstyleResult<RenderOutput> {
		if capture {
			return self.render_to_string(name).map(RenderOutput::Text);
		}

		let stdout = std::io::stdout();
		self.render_to(name, stdout.lock())?;
		Ok(RenderOutput::Emitted)
	}

	pub fn render_to_string(&mut self, name: &str) -> KstyleResult<String> {
		let mut out = String::new();
		match self.render_into(name, &mut out) {
			Ok(()) => Ok(out),
			Err(error) => Err(self.fail(error)),
		}
	}

	/// Render `name` into `writer`. Nothing is written when the render fails,
	/// except for the halt message in debug mode.
	pub fn render_to<W: Write>(&mut self, name: &str, mut writer: W) -> KstyleResult<()> {
		let (text, halted) = match self.render_to_string(name) {
			Ok(text) => (text, None),
			Err(KstyleError::Halted { operation, message }) => {
				let text = format!("<b>{operation}:</b> {message}");
				(text, Some(KstyleError::Halted { operation, message }))
			}
			Err(error) => return Err(error),
		};

		if let Err(error) = writer
			.write_all(text.as_bytes())
			.and_then(|()| writer.flush())
		{
			return Err(self.fail_during("output", KstyleError::Io(error)));
		}

		halted.map_or(Ok(()), Err)
	}

	/// The root names of the `{$…}` references in the source of `name`.
	pub fn list_variable_names(&mut self, name: &str) -> KstyleResult<Vec<String>> {
		let source = self
			.read_source(name)
			.map_err(|error| self.fail(error))?;
		Ok(self.compiler.variable_names(&source))
	}

	pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
		self.log.errors()
	}

	pub fn log_entries(&self) -> Vec<String> {
		self.log.flatten()
	}

	pub fn logs(&self) -> LogReport {
		self.log.report_with_file(self.config.log_file.clone())
	}

	/// Record `error` under the operation it belongs to and return the error
	/// the caller should see.
	fn fail(&mut self, error: KstyleError) -> KstyleError {
		let operation = operation_for(&error);
		self.fail_during(operation, error)
	}

	fn fail_during(&mut self, operation: &str, error: KstyleError) -> KstyleError {
		if matches!(error, KstyleError::Halted { .. }) {
			return error;
		}

		self.log
			.report(operation, error.to_string())
			.unwrap_or(error)
	}

	fn source_path(&self, name: &str) -> KstyleResult<PathBuf> {
		let valid = !name.is_empty()
			&& Path::new(name)
				.components()
				.all(|component| matches!(component, Component::Normal(_)));
		if !valid {
			return Err(KstyleError::InvalidTemplateName {
				name: name.to_string(),
			});
		}

		Ok(self.config.style_dir.join(name))
	}

	fn read_source(&self, name: &str) -> KstyleResult<String> {
		let path = self.source_path(name)?;
		if !path.is_file() {
			return Err(KstyleError::SourceNotFound {
				name: name.to_string(),
			});
		}

		Ok(std::fs::read_to_string(path)?)
	}

	fn load_artifact(&self, name: &str) -> KstyleResult<(Artifact, CacheStatus)> {
		let source_path = self.source_path(name)?;
		if !source_path.is_file() {
			return Err(KstyleError::SourceNotFound {
				name: name.to_string(),
			});
		}

		let artifact_path = artifact_cache::artifact_path(&self.config.cache_dir, name);
		if !self.config.debug && artifact_cache::is_fresh(&artifact_path, &source_path) {
			if let Some(artifact) = artifact_cache::load(&artifact_path) {
				tracing::debug!(template = name, "using cached artifact");
				return Ok((artifact, CacheStatus::Fresh));
			}
		}

		tracing::debug!(template = name, debug = self.config.debug, "compiling template");
		let source = std::fs::read_to_string(&source_path)?;
		let artifact = self.compiler.compile(name, &source)?;
		artifact_cache::save(&artifact_path, &artifact)?;
		tracing::debug!(
			template = name,
			path = %artifact_path.display(),
			"wrote artifact"
		);

		Ok((artifact, CacheStatus::Compiled))
	}

	fn render_into(&mut self, name: &str, out: &mut String) -> KstyleResult<()> {
		if self.include_depth >= MAX_INCLUDE_DEPTH {
			return Err(KstyleError::IncludeDepth {
				name: name.to_string(),
			});
		}

		let (artifact, _) = self.load_artifact(name)?;
		if self.include_depth == 0 {
			self.functions.clear();
		}
		self.declare_functions(&artifact)?;

		self.include_depth += 1;
		let result = Interpreter::new(&artifact, self).run(out);
		self.include_depth -= 1;

		result
	}

	fn declare_functions(&mut self, artifact: &Artifact) -> KstyleResult<()> {
		for (key, function) in &artifact.functions {
			match self.functions.get(key) {
				Some(declared) if declared != function => {
					return Err(KstyleError::runtime(format!(
						"Cannot redeclare {}()",
						function.name
					)));
				}
				Some(_) => {}
				None => {
					self.functions.insert(key.clone(), function.clone());
				}
			}
		}

		Ok(())
	}
}

impl RenderContext for Templates {
	fn store(&mut self) -> &mut VariableStore {
		&mut self.store
	}

	fn environment(&mut self) -> Option<&mut HostEnvironment> {
		self.environment.as_mut()
	}

	fn include(&mut self, name: &str, out: &mut String) -> KstyleResult<()> {
		self.render_into(name, out)
	}

	fn function(&self, name: &str) -> Option<Function> {
		self.functions.get(name).cloned()
	}
}

/// The operation name an error is recorded under.
fn operation_for(error: &KstyleError) -> &'static str {
	match error {
		KstyleError::SourceNotFound { .. }
		| KstyleError::InvalidTemplateName { .. }
		| KstyleError::Io(_) => "getFile",
		KstyleError::CodeSyntax { .. }
		| KstyleError::ReservedMarker { .. }
		| KstyleError::CacheWrite { .. }
		| KstyleError::Pattern(_) => "compile",
		KstyleError::NotAMapping => "assign",
		_ => "output",
	}
}
