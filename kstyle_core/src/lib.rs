//! `kstyle_core` is the engine behind the `kstyle` template tool. It compiles directive-annotated markup templates into cached artifacts and renders them against a store of variables. Presentation markup stays in the template files while the application only assigns data.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template source
//!   → Block extractor (keeps the text between `tmplblock: begin` and `end`)
//!   → Include wiring (`{tmplinclude: name}` becomes a nested render)
//!   → Asset rewriter (prefixes relative stylesheet, image and script paths)
//!   → Interpolation (`{$name['key']}` becomes an output statement)
//!   → Embedded code (`<!-- tmplphp: … -->`, with `##static_begin##` regions)
//!   → Tag code (`tmpltag="#…#"` inside markup tags)
//!   → Parser (builds the artifact IR)
//!   → Artifact cache (JSON under the cache directory, reused while fresh)
//!   → Interpreter (runs the artifact against the variable store)
//! ```
//!
//! ## Key Types
//!
//! - [`Templates`]: the engine, holding the variables and the error log.
//! - [`StyleConfig`]: the style and cache directories plus the public paths,
//!   built directly or loaded from `kstyle.toml`.
//! - [`Artifact`]: the compiled statement tree of one template.
//! - [`VariableStore`]: the values templates render against.
//! - [`HostEnvironment`]: what `$_SESSION`, `$_GET` and friends resolve to.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kstyle_core::StyleConfig;
//! use kstyle_core::Templates;
//! use serde_json::json;
//!
//! let config = StyleConfig::new("templates/default", "cache/default");
//! let mut templates = Templates::new(config).unwrap();
//! templates
//! 	.assign_json(json!({ "user": { "name": "Ada" } }), false)
//! 	.unwrap();
//!
//! // `<p>Hello {$user['name']}</p>` renders as `<p>Hello Ada</p>`
//! let html = templates.render_to_string("hello.html").unwrap();
//! println!("{html}");
//! ```

pub use artifact::*;
pub use artifact_cache::CacheStatus;
pub use assets::*;
pub use compiler::*;
pub use config::*;
pub use directive::Directive;
pub use directive::Piece;
pub use engine::*;
pub use environment::*;
pub use error::*;
pub use interpreter::*;
pub use sink::*;
pub use store::*;
pub use variable::*;

mod artifact;
pub mod artifact_cache;
mod assets;
pub mod builtins;
mod compiler;
pub mod config;
mod directive;
mod engine;
mod environment;
#[allow(unused_assignments)]
mod error;
pub mod escape;
mod interpreter;
pub(crate) mod lexer;
mod parser;
pub(crate) mod patterns;
mod sink;
mod store;
pub(crate) mod tokens;
pub mod value;
mod variable;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
