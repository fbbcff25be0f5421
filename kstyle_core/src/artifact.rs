//! The compiled form of a template.
//!
//! An [`Artifact`] is a tree of statements and expressions that the
//! [`Interpreter`](crate::Interpreter) runs directly. It is persisted as JSON
//! by the artifact cache.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::Superglobal;

/// Bumped whenever the shape of the IR changes. Cached artifacts carrying a
/// different version are recompiled.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
	pub schema_version: u32,
	/// The template name the artifact was compiled from.
	pub template: String,
	pub body: Vec<Stmt>,
	/// Functions declared anywhere in the template, by lowercase name.
	#[serde(default)]
	pub functions: BTreeMap<String, Function>,
}

impl Artifact {
	pub fn new(template: impl Into<String>) -> Self {
		Self {
			schema_version: ARTIFACT_SCHEMA_VERSION,
			template: template.into(),
			body: Vec::new(),
			functions: BTreeMap::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
	pub name: String,
	pub params: Vec<Param>,
	pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
	pub name: String,
	pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
	/// Markup written as is.
	Text(String),
	Echo(Vec<Expr>),
	/// Render another template in place.
	Include(String),
	Expr(Expr),
	If {
		branches: Vec<CondBranch>,
		otherwise: Option<Vec<Stmt>>,
	},
	While {
		condition: Expr,
		body: Vec<Stmt>,
	},
	For {
		init: Vec<Expr>,
		condition: Vec<Expr>,
		step: Vec<Expr>,
		body: Vec<Stmt>,
	},
	Foreach {
		subject: Expr,
		key: Option<Expr>,
		value: Expr,
		body: Vec<Stmt>,
	},
	Break,
	Continue,
	Return(Option<Expr>),
	Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBranch {
	pub condition: Expr,
	pub body: Vec<Stmt>,
}

/// Where a variable lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
	/// A root of the shared variable store.
	Store(String),
	/// A variable of the current function frame or static region.
	Local(String),
	Environment(Superglobal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
	Literal(Value),
	Variable(Variable),
	/// `base[key]`, or `base[]` when `key` is `None`.
	Index {
		base: Box<Expr>,
		key: Option<Box<Expr>>,
	},
	Array(Vec<ArrayItem>),
	/// The parts of a double-quoted string with embedded variables.
	Interpolated(Vec<Expr>),
	Unary {
		op: UnaryOp,
		operand: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	/// `condition ? then : otherwise`, with `then` absent for `?:`.
	Ternary {
		condition: Box<Expr>,
		then: Option<Box<Expr>>,
		otherwise: Box<Expr>,
	},
	/// `target = value` or a compound form such as `target .= value`.
	Assign {
		target: Box<Expr>,
		op: Option<BinaryOp>,
		value: Box<Expr>,
	},
	IncDec {
		target: Box<Expr>,
		increment: bool,
		prefix: bool,
	},
	Call {
		name: String,
		args: Vec<Expr>,
	},
}

impl Expr {
	pub fn literal(value: impl Into<Value>) -> Self {
		Self::Literal(value.into())
	}

	pub fn index(base: Self, key: Option<Self>) -> Self {
		Self::Index {
			base: Box::new(base),
			key: key.map(Box::new),
		}
	}

	pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
		Self::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	/// Whether the expression can be written to.
	pub fn is_place(&self) -> bool {
		match self {
			Self::Variable(_) => true,
			Self::Index { base, .. } => base.is_place(),
			_ => false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItem {
	pub key: Option<Expr>,
	pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
	Not,
	Negate,
	Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
	Concat,
	Equal,
	NotEqual,
	Identical,
	NotIdentical,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	And,
	Or,
}
