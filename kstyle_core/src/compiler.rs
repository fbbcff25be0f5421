use std::collections::BTreeSet;

use crate::Artifact;
use crate::AssetRewriter;
use crate::KstyleResult;
use crate::Piece;
use crate::directive;
use crate::escape;
use crate::parser::build_artifact;
use crate::patterns::Patterns;

/// Turns template sources into artifacts by running the passes in order.
#[derive(Debug, Clone)]
pub struct Compiler {
	patterns: Patterns,
	assets: AssetRewriter,
}

impl Compiler {
	pub fn new(asset_prefix: impl Into<String>) -> KstyleResult<Self> {
		Ok(Self {
			patterns: Patterns::new()?,
			assets: AssetRewriter::new(asset_prefix)?,
		})
	}

	pub fn compile(&self, template: &str, source: &str) -> KstyleResult<Artifact> {
		let pieces = self.compile_pieces(template, source)?;
		build_artifact(template, pieces)
	}

	/// Run every pass and return the pieces the artifact is built from.
	pub fn compile_pieces(&self, template: &str, source: &str) -> KstyleResult<Vec<Piece>> {
		escape::validate(template, source)?;

		let unit = directive::extract_block(&self.patterns, source);
		tracing::trace!(template, bytes = unit.len(), "extracted block");

		let pieces = vec![Piece::Markup(unit.to_string())];
		let pieces = directive::wire_includes(&self.patterns, pieces);
		tracing::trace!(template, pieces = pieces.len(), "wired includes");

		let pieces = self.assets.rewrite_pieces(pieces);
		tracing::trace!(template, "rewrote asset paths");

		let pieces = directive::resolve_interpolations(&self.patterns, pieces);
		tracing::trace!(template, pieces = pieces.len(), "resolved interpolations");

		let pieces = directive::compile_code_fragments(&self.patterns, pieces);
		tracing::trace!(template, pieces = pieces.len(), "compiled code fragments");

		let pieces = directive::compile_tag_code(pieces);
		tracing::trace!(template, pieces = pieces.len(), "compiled tag code");

		Ok(directive::normalize_escaped_quotes(&self.patterns, pieces))
	}

	/// Sorted, de-duplicated root names of the `{$…}` references in `source`.
	pub fn variable_names(&self, source: &str) -> Vec<String> {
		directive::variable_references(&self.patterns, source)
			.iter()
			.map(|path| path.root_name().to_string())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}
}
