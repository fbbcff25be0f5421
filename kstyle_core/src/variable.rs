use crate::Expr;
use crate::Superglobal;
use crate::Variable;

/// A parsed variable reference such as `user['name']` or `list[$index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarPath {
	pub root: VarRoot,
	pub keys: Vec<PathKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarRoot {
	Store(String),
	Environment(Superglobal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
	/// A quoted or bare segment.
	Literal(String),
	/// A purely numeric segment.
	Index(i64),
	/// A `$path` segment whose value is used as the key.
	Nested(VarPath),
}

impl VarPath {
	/// The root name as written in the template.
	pub fn root_name(&self) -> &str {
		match &self.root {
			VarRoot::Store(name) => name,
			VarRoot::Environment(global) => global.name(),
		}
	}

	/// The expression reading this path from the store.
	pub fn to_accessor(&self) -> Expr {
		self.accessor(false)
	}

	/// The expression reading this path with the root bound as a local.
	pub fn to_local_accessor(&self) -> Expr {
		self.accessor(true)
	}

	fn accessor(&self, local: bool) -> Expr {
		let root = match &self.root {
			VarRoot::Environment(global) => Variable::Environment(*global),
			VarRoot::Store(name) if local => Variable::Local(name.clone()),
			VarRoot::Store(name) => Variable::Store(name.clone()),
		};

		self.keys
			.iter()
			.fold(Expr::Variable(root), |base, key| {
				let key = match key {
					PathKey::Literal(text) => Expr::literal(text.clone()),
					PathKey::Index(index) => Expr::literal(*index),
					PathKey::Nested(path) => path.accessor(local),
				};
				Expr::index(base, Some(key))
			})
	}
}

pub(crate) fn is_ident_start(ch: char) -> bool {
	ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || ch == '_'
}

/// Parse a variable path from the start of `input`, which begins right after
/// the `$`. Returns the path and the number of bytes consumed.
pub fn parse_path(input: &str) -> Option<(VarPath, usize)> {
	let name_len = input
		.char_indices()
		.find(|(index, ch)| {
			if *index == 0 {
				!is_ident_start(*ch)
			} else {
				!is_ident_continue(*ch)
			}
		})
		.map_or(input.len(), |(index, _)| index);

	if name_len == 0 {
		return None;
	}

	let name = &input[..name_len];
	let root = match Superglobal::from_name(name) {
		Some(global) => VarRoot::Environment(global),
		None => VarRoot::Store(name.to_string()),
	};

	let mut keys = Vec::new();
	let mut cursor = name_len;
	while input[cursor..].starts_with('[') {
		let Some((key, consumed)) = parse_segment(&input[cursor + 1..]) else {
			break;
		};
		keys.push(key);
		cursor += 1 + consumed;
	}

	Some((VarPath { root, keys }, cursor))
}

/// Parse one bracket segment starting after `[`, consuming the closing `]`.
fn parse_segment(input: &str) -> Option<(PathKey, usize)> {
	let leading = input.len() - input.trim_start().len();
	let rest = &input[leading..];

	let (key, used) = if let Some(quote) = rest.chars().next().filter(|ch| *ch == '\'' || *ch == '"') {
		let end = rest[1..].find(quote)?;
		(PathKey::Literal(rest[1..=end].to_string()), end + 2)
	} else if let Some(nested) = rest.strip_prefix('$') {
		let (path, used) = parse_path(nested)?;
		(PathKey::Nested(path), used + 1)
	} else {
		let end = rest.find(']')?;
		let text = rest[..end].trim();
		if text.is_empty() || text.contains(['[', '{', '}']) {
			return None;
		}
		let key = match text.parse::<i64>() {
			Ok(index) if text.bytes().all(|byte| byte.is_ascii_digit()) => PathKey::Index(index),
			_ => PathKey::Literal(text.to_string()),
		};
		(key, end)
	};

	let after = &rest[used..];
	let trailing = after.len() - after.trim_start().len();
	if !after[trailing..].starts_with(']') {
		return None;
	}

	Some((key, leading + used + trailing + 1))
}
