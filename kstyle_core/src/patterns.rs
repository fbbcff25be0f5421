use regex::Regex;

use crate::KstyleResult;

/// The directive patterns shared by the compile passes.
#[derive(Debug, Clone)]
pub(crate) struct Patterns {
	pub block_begin: Regex,
	pub block_end: Regex,
	pub include: Regex,
	pub code_fragment: Regex,
	pub static_region: Regex,
	pub markup_tag: Regex,
	pub escaped_quote: Regex,
}

impl Patterns {
	pub fn new() -> KstyleResult<Self> {
		Ok(Self {
			block_begin: Regex::new(r"<!--\s?tmplblock:\s*begin\s*-->")?,
			block_end: Regex::new(r"<!--\s?tmplblock:\s*end\s*-->")?,
			include: Regex::new(r"\{\s?tmplinclude:([^}]+)\}")?,
			code_fragment: Regex::new(r"(?s)<!--\s?tmplphp:(.*?)-->")?,
			static_region: Regex::new(r"(?s)##static_begin##(.*?)##static_end##")?,
			markup_tag: Regex::new(r"<[^<>]*>")?,
			escaped_quote: Regex::new(r#"\\+""#)?,
		})
	}
}
