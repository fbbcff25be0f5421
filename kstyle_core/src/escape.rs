//! Shields literal `.` characters from the asset patterns.
//!
//! The asset passes look for file extensions such as `.css` by matching the
//! dot marker followed by the extension instead of a bare `.`, so version
//! numbers or dotted text elsewhere in a tag cannot be mistaken for the
//! extension separator. The marker is built from private-use code points and
//! a template may never contain [`RESERVED`], which keeps restoring exact.

use crate::KstyleError;
use crate::KstyleResult;

/// The code point that opens the marker. Sources containing it are rejected.
pub const RESERVED: char = '\u{E000}';

/// The sequence substituted for every `.` while a pass runs.
pub const DOT_MARKER: &str = "\u{E000}K_STYLE\u{E001}";

/// Text with every `.` replaced by [`DOT_MARKER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
	pub text: String,
	pub token: &'static str,
}

/// Replace every literal `.` with the marker.
pub fn protect(text: &str) -> Protected {
	Protected {
		text: text.replace('.', DOT_MARKER),
		token: DOT_MARKER,
	}
}

/// Reverse [`protect`].
pub fn restore(text: &str, token: &str) -> String {
	text.replace(token, ".")
}

/// Run `pass` over the protected form of `text` and restore the result.
pub fn with_protected(text: &str, pass: impl FnOnce(&str, &'static str) -> String) -> String {
	let protected = protect(text);
	let output = pass(&protected.text, protected.token);
	restore(&output, protected.token)
}

/// Reject sources that already contain the reserved code point.
pub fn validate(template: &str, source: &str) -> KstyleResult<()> {
	if source.contains(RESERVED) {
		return Err(KstyleError::ReservedMarker {
			template: template.to_string(),
		});
	}

	Ok(())
}
