use logos::Logos;

use crate::Expr;
use crate::KstyleError;
use crate::KstyleResult;
use crate::VarPath;
use crate::tokens::Punct;
use crate::tokens::Token;
use crate::variable::parse_path;

/// Raw tokens produced by logos for a single code directive.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip(r"(?:[ \t\r\n\f]+|//[^\n]*|/\*(?:[^*]|\*+[^*/])*\*+/)", allow_greedy = true))]
enum RawToken {
	#[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*")]
	Variable,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	#[regex(r"[0-9]+")]
	Int,
	#[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+")]
	Float,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"##stat_[0-9]+##")]
	StaticPlaceholder,
	#[token("===")]
	Identical,
	#[token("!==")]
	NotIdentical,
	#[token("==")]
	Equal,
	#[token("!=")]
	#[token("<>")]
	NotEqual,
	#[token("<=")]
	LessEqual,
	#[token(">=")]
	GreaterEqual,
	#[token("=>")]
	Arrow,
	#[token("+=")]
	PlusAssign,
	#[token("-=")]
	MinusAssign,
	#[token("*=")]
	StarAssign,
	#[token("/=")]
	SlashAssign,
	#[token(".=")]
	DotAssign,
	#[token("%=")]
	PercentAssign,
	#[token("&&")]
	And,
	#[token("||")]
	Or,
	#[token("++")]
	Increment,
	#[token("--")]
	Decrement,
	#[token("=")]
	Assign,
	#[token("<")]
	Less,
	#[token(">")]
	Greater,
	#[token("+")]
	Plus,
	#[token("-")]
	Minus,
	#[token("*")]
	Star,
	#[token("/")]
	Slash,
	#[token("%")]
	Percent,
	#[token(".")]
	Dot,
	#[token("!")]
	Not,
	#[token("?")]
	Question,
	#[token(":")]
	Colon,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token("[")]
	BracketOpen,
	#[token("]")]
	BracketClose,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token(",")]
	Comma,
	#[token(";")]
	Semicolon,
}

impl RawToken {
	fn punct(self) -> Option<Punct> {
		let punct = match self {
			Self::Identical => Punct::Identical,
			Self::NotIdentical => Punct::NotIdentical,
			Self::Equal => Punct::Equal,
			Self::NotEqual => Punct::NotEqual,
			Self::LessEqual => Punct::LessEqual,
			Self::GreaterEqual => Punct::GreaterEqual,
			Self::Arrow => Punct::Arrow,
			Self::PlusAssign => Punct::PlusAssign,
			Self::MinusAssign => Punct::MinusAssign,
			Self::StarAssign => Punct::StarAssign,
			Self::SlashAssign => Punct::SlashAssign,
			Self::DotAssign => Punct::DotAssign,
			Self::PercentAssign => Punct::PercentAssign,
			Self::And => Punct::And,
			Self::Or => Punct::Or,
			Self::Increment => Punct::Increment,
			Self::Decrement => Punct::Decrement,
			Self::Assign => Punct::Assign,
			Self::Less => Punct::Less,
			Self::Greater => Punct::Greater,
			Self::Plus => Punct::Plus,
			Self::Minus => Punct::Minus,
			Self::Star => Punct::Star,
			Self::Slash => Punct::Slash,
			Self::Percent => Punct::Percent,
			Self::Dot => Punct::Dot,
			Self::Not => Punct::Not,
			Self::Question => Punct::Question,
			Self::Colon => Punct::Colon,
			Self::ParenOpen => Punct::ParenOpen,
			Self::ParenClose => Punct::ParenClose,
			Self::BracketOpen => Punct::BracketOpen,
			Self::BracketClose => Punct::BracketClose,
			Self::BraceOpen => Punct::BraceOpen,
			Self::BraceClose => Punct::BraceClose,
			Self::Comma => Punct::Comma,
			Self::Semicolon => Punct::Semicolon,
			Self::Variable
			| Self::Ident
			| Self::Int
			| Self::Float
			| Self::DoubleQuotedString
			| Self::SingleQuotedString
			| Self::StaticPlaceholder => return None,
		};

		Some(punct)
	}
}

/// Tokenizes the code of one directive.
pub(crate) struct CodeLexer<'a> {
	template: &'a str,
	static_regions: &'a [String],
}

impl<'a> CodeLexer<'a> {
	pub fn new(template: &'a str, static_regions: &'a [String]) -> Self {
		Self {
			template,
			static_regions,
		}
	}

	pub fn tokenize(&self, code: &str) -> KstyleResult<Vec<Token>> {
		let mut tokens = Vec::new();
		self.tokenize_into(code, false, &mut tokens)?;
		Ok(tokens)
	}

	fn tokenize_into(&self, code: &str, local: bool, tokens: &mut Vec<Token>) -> KstyleResult<()> {
		for (raw, span) in RawToken::lexer(code).spanned() {
			let slice = &code[span.clone()];
			let Ok(raw) = raw else {
				return Err(self.error(format!(
					"unexpected character `{}` at offset {}",
					slice.chars().next().unwrap_or(' '),
					span.start
				)));
			};

			if let Some(punct) = raw.punct() {
				tokens.push(Token::Punct(punct));
				continue;
			}

			let token = match raw {
				RawToken::Variable => {
					Token::Variable {
						name: slice[1..].to_string(),
						local,
					}
				}
				RawToken::Ident => Token::Ident(slice.to_string()),
				RawToken::Int => {
					match slice.parse::<i64>() {
						Ok(number) => Token::Int(number),
						Err(_) => Token::Float(slice.parse::<f64>().unwrap_or(f64::INFINITY)),
					}
				}
				RawToken::Float => {
					Token::Float(
						slice
							.parse::<f64>()
							.map_err(|error| self.error(format!("invalid number `{slice}`: {error}")))?,
					)
				}
				RawToken::SingleQuotedString => {
					Token::Str(unescape_single(&slice[1..slice.len() - 1]))
				}
				RawToken::DoubleQuotedString => {
					self.double_quoted(&slice[1..slice.len() - 1], local)
				}
				RawToken::StaticPlaceholder => {
					if local {
						return Err(self.error("static regions cannot be nested"));
					}
					let number = slice
						.trim_matches('#')
						.trim_start_matches("stat_")
						.parse::<usize>()
						.unwrap_or(0);
					let Some(region) = number.checked_sub(1).and_then(|i| self.static_regions.get(i))
					else {
						return Err(self.error(format!("unknown static region `{slice}`")));
					};
					self.tokenize_into(region, true, tokens)?;
					continue;
				}
				_ => continue,
			};

			tokens.push(token);
		}

		Ok(())
	}

	/// Split a double-quoted string into literal parts and embedded
	/// `$path` or `{$path}` references.
	fn double_quoted(&self, content: &str, local: bool) -> Token {
		let accessor = |path: VarPath| {
			if local {
				path.to_local_accessor()
			} else {
				path.to_accessor()
			}
		};

		let mut parts = Vec::new();
		let mut literal = String::new();
		let mut cursor = 0;

		while cursor < content.len() {
			let rest = &content[cursor..];

			if rest.starts_with("{$") {
				if let Some((path, used)) = parse_path(&rest[2..]) {
					if rest[2 + used..].starts_with('}') {
						flush(&mut literal, &mut parts);
						parts.push(accessor(path));
						cursor += used + 3;
						continue;
					}
				}
			} else if let Some(after) = rest.strip_prefix('$') {
				if let Some((path, used)) = parse_path(after) {
					flush(&mut literal, &mut parts);
					parts.push(accessor(path));
					cursor += used + 1;
					continue;
				}
			} else if rest.starts_with('\\') {
				let (text, used) = unescape_double(rest);
				literal.push_str(&text);
				cursor += used;
				continue;
			}

			let Some(ch) = rest.chars().next() else {
				break;
			};
			literal.push(ch);
			cursor += ch.len_utf8();
		}

		if parts.is_empty() {
			return Token::Str(literal);
		}

		flush(&mut literal, &mut parts);
		Token::Template(parts)
	}

	fn error(&self, message: impl Into<String>) -> KstyleError {
		KstyleError::CodeSyntax {
			template: self.template.to_string(),
			message: message.into(),
		}
	}
}

fn flush(literal: &mut String, parts: &mut Vec<Expr>) {
	if !literal.is_empty() {
		parts.push(Expr::literal(std::mem::take(literal)));
	}
}

/// Single quotes only understand `\'` and `\\`.
fn unescape_single(content: &str) -> String {
	let mut output = String::with_capacity(content.len());
	let mut chars = content.chars().peekable();

	while let Some(ch) = chars.next() {
		if ch == '\\' {
			if let Some(next) = chars.peek().copied().filter(|next| *next == '\'' || *next == '\\') {
				output.push(next);
				chars.next();
				continue;
			}
		}
		output.push(ch);
	}

	output
}

/// Decode the escape sequence at the start of `input`, which begins with a
/// backslash. Returns the decoded text and the bytes consumed. Unknown
/// sequences are kept as written.
fn unescape_double(input: &str) -> (String, usize) {
	let mut chars = input.char_indices().skip(1);
	let Some((_, ch)) = chars.next() else {
		return ("\\".to_string(), 1);
	};

	let simple = match ch {
		'n' => Some('\n'),
		't' => Some('\t'),
		'r' => Some('\r'),
		'v' => Some('\u{0B}'),
		'f' => Some('\u{0C}'),
		'e' => Some('\u{1B}'),
		'0' => Some('\0'),
		'$' => Some('$'),
		'"' => Some('"'),
		'\\' => Some('\\'),
		_ => None,
	};
	if let Some(decoded) = simple {
		return (decoded.to_string(), 2);
	}

	if ch == 'x' {
		let digits: String = input[2..]
			.chars()
			.take(2)
			.take_while(char::is_ascii_hexdigit)
			.collect();
		if let Some(decoded) = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
			return (decoded.to_string(), 2 + digits.len());
		}
	}

	if ch == 'u' && input[2..].starts_with('{') {
		if let Some(close) = input[3..].find('}') {
			let digits = &input[3..3 + close];
			if let Some(decoded) = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
				return (decoded.to_string(), 4 + close);
			}
		}
	}

	let mut kept = String::from('\\');
	kept.push(ch);
	(kept, 1 + ch.len_utf8())
}
