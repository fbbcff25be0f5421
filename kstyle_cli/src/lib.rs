use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile and render directive-annotated markup templates.",
	long_about = "kstyle compiles markup templates into cached artifacts and renders them \
	              against a set of variables.\n\nTemplates live in the style directory and \
	              compiled artifacts in the cache directory, both read from `kstyle.toml` \
	              when present.\n\nQuick start:\n  kstyle render index.html --vars data.json\n  \
	              kstyle vars index.html\n  kstyle compile index.html"
)]
pub struct KstyleCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Use this config file instead of discovering `kstyle.toml`.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Render a template to standard output.
	///
	/// The template is compiled first when its cached artifact is missing or
	/// older than the source. Variables are read from JSON files, and later
	/// files override earlier ones unless `--merge` is given.
	Render {
		/// Template name relative to the style directory.
		name: String,

		/// A JSON object whose entries are assigned before rendering. May be
		/// repeated.
		#[arg(long = "vars", value_name = "FILE")]
		vars: Vec<PathBuf>,

		/// Merge the entries of later variable files into earlier ones
		/// instead of replacing them.
		#[arg(long, default_value_t = false)]
		merge: bool,

		/// A `KEY=VALUE` pair exposed to templates as `$_GET['KEY']`. May be
		/// repeated.
		#[arg(long = "get", value_name = "KEY=VALUE")]
		query: Vec<String>,

		/// Expose the process environment to templates as `$_ENV`.
		#[arg(long, default_value_t = false)]
		env: bool,

		/// Always recompile and halt at the first template error.
		#[arg(long, default_value_t = false)]
		debug: bool,

		/// Write the output to this file instead of standard output.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// List the variables a template interpolates.
	///
	/// Prints the root names of the `{$…}` references found in the markup,
	/// sorted and without duplicates. References inside embedded code are not
	/// included.
	Vars {
		/// Template name relative to the style directory.
		name: String,

		/// Output format for the variable names.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Compile templates into the cache without rendering them.
	///
	/// Prints whether each artifact was reused or written. Use `--force` to
	/// recompile fresh artifacts as well.
	Compile {
		/// Template names relative to the style directory.
		#[arg(required = true)]
		names: Vec<String>,

		/// Recompile even when the cached artifact is fresh.
		#[arg(long, default_value_t = false)]
		force: bool,
	},
	/// Print the resolved configuration.
	Info {
		/// Output format for the configuration.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
