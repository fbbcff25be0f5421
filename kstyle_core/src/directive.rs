//! Directive recognition.
//!
//! A template moves through the passes as a list of [`Piece`]s. Each pass
//! only looks inside the remaining [`Piece::Markup`] and splits it around the
//! directives it recognises, so text claimed by an earlier pass is never seen
//! by a later one.

use std::ops::Range;

use crate::VarPath;
use crate::patterns::Patterns;
use crate::variable::parse_path;

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
	Markup(String),
	Directive(Directive),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
	/// The byte ranges of the begin and end block markers.
	Block {
		begin: Range<usize>,
		end: Range<usize>,
	},
	Include {
		target: String,
	},
	/// Embedded code with its static regions swapped for `##stat_N##`
	/// placeholders, numbered from 1.
	CodeFragment {
		code: String,
		static_regions: Vec<String>,
	},
	TagCode {
		code: String,
	},
	VariableRef {
		path: VarPath,
	},
}

/// Split every markup piece around the matches `find` reports. Matches must
/// be sorted and must not overlap.
fn split_markup<F>(pieces: Vec<Piece>, mut find: F) -> Vec<Piece>
where
	F: FnMut(&str) -> Vec<(Range<usize>, Directive)>,
{
	let mut output = Vec::with_capacity(pieces.len());

	for piece in pieces {
		let Piece::Markup(text) = piece else {
			output.push(piece);
			continue;
		};

		let mut cursor = 0;
		for (range, directive) in find(&text) {
			if range.start > cursor {
				output.push(Piece::Markup(text[cursor..range.start].to_string()));
			}
			output.push(Piece::Directive(directive));
			cursor = range.end;
		}

		if cursor < text.len() {
			output.push(Piece::Markup(text[cursor..].to_string()));
		}
	}

	output
}

/// Locate the first block begin marker and the first end marker after it.
pub(crate) fn find_block(patterns: &Patterns, source: &str) -> Option<Directive> {
	let begin = patterns.block_begin.find(source)?;
	let end = patterns.block_end.find_at(source, begin.end())?;

	Some(Directive::Block {
		begin: begin.range(),
		end: end.range(),
	})
}

/// The text between the block markers, or the whole source without them.
pub(crate) fn extract_block<'a>(patterns: &Patterns, source: &'a str) -> &'a str {
	match find_block(patterns, source) {
		Some(Directive::Block { begin, end }) => &source[begin.end..end.start],
		_ => source,
	}
}

pub(crate) fn wire_includes(patterns: &Patterns, pieces: Vec<Piece>) -> Vec<Piece> {
	split_markup(pieces, |text| {
		patterns
			.include
			.captures_iter(text)
			.filter_map(|captures| {
				let whole = captures.get(0)?;
				let target = captures.get(1)?.as_str().trim();
				if target.is_empty() {
					return None;
				}
				Some((
					whole.range(),
					Directive::Include {
						target: target.to_string(),
					},
				))
			})
			.collect()
	})
}

/// Replace `{$path}` references in markup with variable directives.
///
/// References inside embedded code and tag code are left for the code
/// compilers, which read `{$path}` as string interpolation.
pub(crate) fn resolve_interpolations(patterns: &Patterns, pieces: Vec<Piece>) -> Vec<Piece> {
	split_markup(pieces, |text| {
		let code = code_spans(patterns, text);
		find_interpolations(text)
			.into_iter()
			.filter(|(range, _)| {
				!code
					.iter()
					.any(|span| span.start <= range.start && range.end <= span.end)
			})
			.map(|(range, path)| (range, Directive::VariableRef { path }))
			.collect()
	})
}

fn find_interpolations(text: &str) -> Vec<(Range<usize>, VarPath)> {
	let mut found = Vec::new();
	let mut from = 0;

	while let Some(offset) = text[from..].find("{$") {
		let start = from + offset;
		let path_start = start + 2;
		match parse_path(&text[path_start..]) {
			Some((path, used)) if text[path_start + used..].starts_with('}') => {
				let end = path_start + used + 1;
				found.push((start..end, path));
				from = end;
			}
			_ => from = start + 1,
		}
	}

	found
}

fn code_spans(patterns: &Patterns, text: &str) -> Vec<Range<usize>> {
	patterns
		.code_fragment
		.find_iter(text)
		.map(|found| found.range())
		.chain(find_tag_code(text).into_iter().map(|(range, _)| range))
		.collect()
}

pub(crate) fn compile_code_fragments(patterns: &Patterns, pieces: Vec<Piece>) -> Vec<Piece> {
	split_markup(pieces, |text| {
		patterns
			.code_fragment
			.captures_iter(text)
			.filter_map(|captures| {
				let whole = captures.get(0)?;
				let raw = captures.get(1)?.as_str();
				let mut static_regions = Vec::new();
				let code = patterns
					.static_region
					.replace_all(raw, |region: &regex::Captures<'_>| {
						static_regions.push(region[1].to_string());
						format!("##stat_{}##", static_regions.len())
					})
					.into_owned();

				Some((
					whole.range(),
					Directive::CodeFragment {
						code,
						static_regions,
					},
				))
			})
			.collect()
	})
}

pub(crate) fn compile_tag_code(pieces: Vec<Piece>) -> Vec<Piece> {
	split_markup(pieces, |text| {
		find_tag_code(text)
			.into_iter()
			.map(|(range, code)| (range, Directive::TagCode { code }))
			.collect()
	})
}

const TAG_CODE_OPEN: &str = "tmpltag=";

/// Find `tmpltag=<d>#code#<d>` directives. The delimiter is everything
/// between `=` and the first `#`.
fn find_tag_code(text: &str) -> Vec<(Range<usize>, String)> {
	let mut found = Vec::new();
	let mut from = 0;

	while let Some(offset) = text[from..].find(TAG_CODE_OPEN) {
		let start = from + offset;
		let after = start + TAG_CODE_OPEN.len();
		let Some(hash) = text[after..].find('#') else {
			break;
		};

		let delimiter = &text[after..after + hash];
		if delimiter.is_empty() || delimiter.contains(['\n', '<', '>']) {
			from = after;
			continue;
		}

		let code_start = after + hash + 1;
		let closing = format!("#{delimiter}");
		match text[code_start..].find(&closing) {
			Some(len) if len > 0 => {
				let end = code_start + len + closing.len();
				found.push((start..end, text[code_start..code_start + len].to_string()));
				from = end;
			}
			_ => from = after,
		}
	}

	found
}

/// Inside markup tags, a run of backslashes before `"` collapses to `"`.
pub(crate) fn normalize_escaped_quotes(patterns: &Patterns, pieces: Vec<Piece>) -> Vec<Piece> {
	pieces
		.into_iter()
		.map(|piece| {
			match piece {
				Piece::Markup(text) => {
					let text = patterns
						.markup_tag
						.replace_all(&text, |tag: &regex::Captures<'_>| {
							patterns.escaped_quote.replace_all(&tag[0], "\"").into_owned()
						})
						.into_owned();
					Piece::Markup(text)
				}
				directive => directive,
			}
		})
		.collect()
}

/// The interpolation references of a raw template, ignoring code directives.
pub(crate) fn variable_references(patterns: &Patterns, source: &str) -> Vec<VarPath> {
	let pieces = resolve_interpolations(patterns, vec![Piece::Markup(source.to_string())]);

	pieces
		.into_iter()
		.filter_map(|piece| {
			match piece {
				Piece::Directive(Directive::VariableRef { path }) => Some(path),
				_ => None,
			}
		})
		.collect()
}
