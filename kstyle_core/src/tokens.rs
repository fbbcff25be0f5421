use std::fmt::Display;

use float_cmp::approx_eq;

use crate::Expr;
use crate::Stmt;

/// Operators and punctuation of the code language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
	/// `=`
	Assign,
	/// `+=`
	PlusAssign,
	/// `-=`
	MinusAssign,
	/// `*=`
	StarAssign,
	/// `/=`
	SlashAssign,
	/// `.=`
	DotAssign,
	/// `%=`
	PercentAssign,
	/// `==`
	Equal,
	/// `===`
	Identical,
	/// `!=` | `<>`
	NotEqual,
	/// `!==`
	NotIdentical,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Dot,
	/// `&&`
	And,
	/// `||`
	Or,
	/// `!`
	Not,
	/// `++`
	Increment,
	/// `--`
	Decrement,
	Question,
	Colon,
	/// `=>`
	Arrow,
	ParenOpen,
	ParenClose,
	BracketOpen,
	BracketClose,
	BraceOpen,
	BraceClose,
	Comma,
	Semicolon,
}

impl Punct {
	pub fn symbol(self) -> &'static str {
		match self {
			Self::Assign => "=",
			Self::PlusAssign => "+=",
			Self::MinusAssign => "-=",
			Self::StarAssign => "*=",
			Self::SlashAssign => "/=",
			Self::DotAssign => ".=",
			Self::PercentAssign => "%=",
			Self::Equal => "==",
			Self::Identical => "===",
			Self::NotEqual => "!=",
			Self::NotIdentical => "!==",
			Self::Less => "<",
			Self::LessEqual => "<=",
			Self::Greater => ">",
			Self::GreaterEqual => ">=",
			Self::Plus => "+",
			Self::Minus => "-",
			Self::Star => "*",
			Self::Slash => "/",
			Self::Percent => "%",
			Self::Dot => ".",
			Self::And => "&&",
			Self::Or => "||",
			Self::Not => "!",
			Self::Increment => "++",
			Self::Decrement => "--",
			Self::Question => "?",
			Self::Colon => ":",
			Self::Arrow => "=>",
			Self::ParenOpen => "(",
			Self::ParenClose => ")",
			Self::BracketOpen => "[",
			Self::BracketClose => "]",
			Self::BraceOpen => "{",
			Self::BraceClose => "}",
			Self::Comma => ",",
			Self::Semicolon => ";",
		}
	}
}

/// A token of the code language, or a piece of template output spliced
/// between code directives.
#[derive(Debug, Clone)]
pub enum Token {
	/// `$name`. `local` is set inside static regions.
	Variable { name: String, local: bool },
	/// A keyword, function name or constant.
	Ident(String),
	Int(i64),
	Float(f64),
	/// A string without interpolation.
	Str(String),
	/// A double-quoted string with embedded variables.
	Template(Vec<Expr>),
	Punct(Punct),
	/// Output produced by the markup between two code directives.
	Emit(Stmt),
	/// The end of one code directive.
	Boundary,
}

impl Token {
	pub fn is_punct(&self, punct: Punct) -> bool {
		matches!(self, Self::Punct(other) if *other == punct)
	}

	/// Case-insensitive keyword check.
	pub fn is_keyword(&self, keyword: &str) -> bool {
		matches!(self, Self::Ident(ident) if ident.eq_ignore_ascii_case(keyword))
	}
}

impl PartialEq for Token {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(
				Token::Variable { name, local },
				Token::Variable {
					name: other_name,
					local: other_local,
				},
			) => name == other_name && local == other_local,
			(Token::Ident(value), Token::Ident(other_value))
			| (Token::Str(value), Token::Str(other_value)) => value == other_value,
			(Token::Int(value), Token::Int(other_value)) => value == other_value,
			(Token::Float(value), Token::Float(other_value)) => {
				approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(Token::Template(parts), Token::Template(other_parts)) => parts == other_parts,
			(Token::Punct(punct), Token::Punct(other_punct)) => punct == other_punct,
			(Token::Emit(stmt), Token::Emit(other_stmt)) => stmt == other_stmt,
			(Token::Boundary, Token::Boundary) => true,
			_ => false,
		}
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Variable { name, .. } => write!(f, "${name}"),
			Token::Ident(ident) => write!(f, "{ident}"),
			Token::Int(number) => write!(f, "{number}"),
			Token::Float(number) => write!(f, "{number}"),
			Token::Str(string) => write!(f, "'{string}'"),
			Token::Template(_) => write!(f, "string"),
			Token::Punct(punct) => write!(f, "{}", punct.symbol()),
			Token::Emit(_) => write!(f, "markup"),
			Token::Boundary => write!(f, "end of directive"),
		}
	}
}
