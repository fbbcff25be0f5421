//! Prefixes relative asset references with the public style path.

use regex::Captures;
use regex::Regex;

use crate::KstyleResult;
use crate::Piece;
use crate::escape;
use crate::escape::DOT_MARKER;

/// Rewrites stylesheet, image and script references inside markup.
#[derive(Debug, Clone)]
pub struct AssetRewriter {
	prefix: String,
	stylesheet: Regex,
	images: [Regex; 3],
	script: Regex,
}

impl AssetRewriter {
	/// `prefix` is the style path with a trailing slash, e.g.
	/// `/templates/default/`.
	pub fn new(prefix: impl Into<String>) -> KstyleResult<Self> {
		let marker = regex::escape(DOT_MARKER);
		let value = r#"[^"'\s<>\\]*"#;

		Ok(Self {
			prefix: prefix.into(),
			stylesheet: Regex::new(&format!(
				r#"(?i)(\bhref\s*=\s*\\?["']?)({value}{marker}css(?:\?{value})?)(\\?["']?)"#
			))?,
			images: [
				Regex::new(&format!(r#"(?i)(\bbackground\s*=\s*\\?["']?)({value})"#))?,
				Regex::new(r#"(?i)(background-image\s*:\s*url\(\s*\\?["']?)([^"')\s\\]*)"#)?,
				Regex::new(&format!(
					r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*\\?["']?)({value})"#
				))?,
			],
			script: Regex::new(&format!(
				r#"(?i)(<script\b[^>]*?\bsrc\s*=\s*\\?["']?)({value})"#
			))?,
		})
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Run the stylesheet, image and script rewrites over every markup piece.
	pub(crate) fn rewrite_pieces(&self, pieces: Vec<Piece>) -> Vec<Piece> {
		pieces
			.into_iter()
			.map(|piece| {
				match piece {
					Piece::Markup(text) => Piece::Markup(self.rewrite(&text)),
					directive => directive,
				}
			})
			.collect()
	}

	pub fn rewrite(&self, text: &str) -> String {
		let text = self.rewrite_styles(text);
		let text = self.rewrite_images(&text);
		self.rewrite_scripts(&text)
	}

	pub fn rewrite_styles(&self, text: &str) -> String {
		escape::with_protected(text, |protected, _| self.apply(&self.stylesheet, protected))
	}

	pub fn rewrite_images(&self, text: &str) -> String {
		escape::with_protected(text, |protected, _| {
			self.images
				.iter()
				.fold(protected.to_string(), |text, pattern| self.apply(pattern, &text))
		})
	}

	pub fn rewrite_scripts(&self, text: &str) -> String {
		escape::with_protected(text, |protected, _| self.apply(&self.script, protected))
	}

	/// Insert the prefix before capture group 2 of every match that needs it.
	fn apply(&self, pattern: &Regex, protected: &str) -> String {
		let prefix = escape::protect(&self.prefix).text;

		pattern
			.replace_all(protected, |captures: &Captures<'_>| {
				let whole = &captures[0];
				let Some(value) = captures.get(2) else {
					return whole.to_string();
				};
				let Some(start) = captures.get(0).map(|found| value.start() - found.start()) else {
					return whole.to_string();
				};

				if is_skipped(value.as_str(), &prefix) {
					return whole.to_string();
				}

				format!("{}{prefix}{}", &whole[..start], &whole[start..])
			})
			.into_owned()
	}
}

/// Whether a reference must be left as written.
fn is_skipped(value: &str, prefix: &str) -> bool {
	let lower = value.to_ascii_lowercase();

	value.is_empty()
		|| value.starts_with(prefix)
		|| value.starts_with('/')
		|| value.starts_with("{$")
		|| ["http:", "https:", "ftp:", "data:"]
			.iter()
			.any(|scheme| lower.starts_with(scheme))
}
