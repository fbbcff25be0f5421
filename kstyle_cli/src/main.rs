use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use kstyle_cli::Commands;
use kstyle_cli::KstyleCli;
use kstyle_cli::OutputFormat;
use kstyle_core::AnyEmptyResult;
use kstyle_core::AnyResult;
use kstyle_core::CacheStatus;
use kstyle_core::DEFAULT_STYLE;
use kstyle_core::DEFAULT_TEMPLATES_PATH;
use kstyle_core::HostEnvironment;
use kstyle_core::KstyleError;
use kstyle_core::StyleConfig;
use kstyle_core::Superglobal;
use kstyle_core::Templates;
use owo_colors::OwoColorize;
use serde_json::Map;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "KSTYLE_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = KstyleCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Render {
			name,
			vars,
			merge,
			query,
			env,
			debug,
			output,
		}) => {
			run_render(
				&args,
				&RenderArgs {
					name,
					vars,
					merge: *merge,
					query,
					env: *env,
					debug: *debug,
					output: output.as_deref(),
				},
			)
		}
		Some(Commands::Vars { name, format }) => run_vars(&args, name, *format),
		Some(Commands::Compile { names, force }) => run_compile(&args, names, *force),
		Some(Commands::Info { format }) => run_info(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `kstyle --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<KstyleError>() {
			Ok(kstyle_err) => {
				let report: miette::Report = (*kstyle_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr, filtered by `KSTYLE_LOG` when set.
fn init_tracing(verbose: bool, use_color: bool) {
	let fallback = if verbose { "kstyle_core=debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &KstyleCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// The config and the file it came from. Without a config file the project
/// root holds `templates/default` and `cache/default`.
fn load_config(args: &KstyleCli) -> AnyResult<(StyleConfig, Option<PathBuf>)> {
	let root = resolve_root(args);
	let path = match &args.config {
		Some(path) => Some(path.clone()),
		None => StyleConfig::resolve_path(&root),
	};

	match path {
		Some(path) => Ok((StyleConfig::from_file(&path)?, Some(path))),
		None => {
			let config = StyleConfig::new(
				root.join(DEFAULT_TEMPLATES_PATH).join(DEFAULT_STYLE),
				root.join("cache").join(DEFAULT_STYLE),
			);
			Ok((config, None))
		}
	}
}

fn load_templates(args: &KstyleCli) -> AnyResult<Templates> {
	let (config, path) = load_config(args)?;
	if let Some(path) = &path {
		tracing::debug!(path = %path.display(), "loaded config");
	}

	Ok(Templates::new(config)?)
}

struct RenderArgs<'a> {
	name: &'a str,
	vars: &'a [PathBuf],
	merge: bool,
	query: &'a [String],
	env: bool,
	debug: bool,
	output: Option<&'a Path>,
}

fn run_render(args: &KstyleCli, render: &RenderArgs<'_>) -> AnyEmptyResult {
	let mut templates = load_templates(args)?;
	if render.debug {
		templates.set_debug(true);
	}

	for path in render.vars {
		let content = std::fs::read_to_string(path)?;
		let variables: Value = serde_json::from_str(&content)
			.map_err(|error| format!("failed to parse `{}`: {error}", path.display()))?;
		templates.assign_json(variables, render.merge)?;
	}

	if render.env || !render.query.is_empty() {
		let mut environment = HostEnvironment::new();
		if render.env {
			environment = environment.with_process_env();
		}
		environment.set(Superglobal::Get, Value::Object(parse_query(render.query)?));
		templates.set_environment(environment);
	}

	match render.output {
		Some(path) => {
			let mut buffer = Vec::new();
			let result = templates.render_to(render.name, &mut buffer);
			if matches!(result, Ok(()) | Err(KstyleError::Halted { .. })) {
				std::fs::write(path, &buffer)?;
			}
			result?;
		}
		None => {
			templates.render(render.name, false)?;
		}
	}

	Ok(())
}

fn parse_query(pairs: &[String]) -> Result<Map<String, Value>, String> {
	pairs
		.iter()
		.map(|pair| {
			pair.split_once('=')
				.map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
				.ok_or_else(|| format!("expected KEY=VALUE, found `{pair}`"))
		})
		.collect()
}

fn run_vars(args: &KstyleCli, name: &str, format: OutputFormat) -> AnyEmptyResult {
	let mut templates = load_templates(args)?;
	let names = templates.list_variable_names(name)?;

	match format {
		OutputFormat::Text => {
			if names.is_empty() {
				println!("No variables found in {name}.");
			}
			for variable in &names {
				println!("{variable}");
			}
		}
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
	}

	Ok(())
}

fn run_compile(args: &KstyleCli, names: &[String], force: bool) -> AnyEmptyResult {
	let mut templates = load_templates(args)?;

	for name in names {
		if force {
			templates.invalidate(name)?;
		}

		let status = templates.prepare(name)?;
		let label = match status {
			CacheStatus::Compiled => colored!(status.as_str(), green),
			CacheStatus::Fresh => colored!(status.as_str(), yellow),
		};
		println!("{label} {name}");
	}

	Ok(())
}

fn run_info(args: &KstyleCli, format: OutputFormat) -> AnyEmptyResult {
	let (config, path) = load_config(args)?;
	let config_file = path.map_or_else(|| "none".to_string(), |path| path.display().to_string());

	match format {
		OutputFormat::Text => {
			println!("{}", colored!("Configuration", bold));
			print_field("Resolved config", &config_file);
			print_field("Style directory", config.style_dir.display());
			print_field("Cache directory", config.cache_dir.display());
			print_field("Style path", config.style_path());
			print_field("Debug", config.debug);
			print_field("Log file", &config.log_file);
		}
		OutputFormat::Json => {
			let output = serde_json::json!({
				"config_file": config_file,
				"style_dir": config.style_dir,
				"cache_dir": config.cache_dir,
				"style_path": config.style_path(),
				"debug": config.debug,
				"log_file": config.log_file,
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
	}

	Ok(())
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("{label:<20} {value}");
}
