//! Loosely typed conversions and operators over [`Value`], as used by
//! embedded template code.

use std::cmp::Ordering;

use float_cmp::approx_eq;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::KstyleError;
use crate::KstyleResult;

/// A key used to step into a mapping or a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
	Index(i64),
	Name(String),
}

impl Key {
	/// Turn an evaluated key expression into a key. Integral strings become
	/// indexes.
	pub fn from_value(value: &Value) -> Self {
		match value {
			Value::Number(number) => {
				match number.as_i64() {
					Some(index) => Self::Index(index),
					None => Self::Index(number.as_f64().unwrap_or(0.0) as i64),
				}
			}
			Value::Bool(flag) => Self::Index(i64::from(*flag)),
			Value::Null => Self::Name(String::new()),
			Value::String(text) => {
				match text.parse::<i64>() {
					Ok(index) if index.to_string() == *text => Self::Index(index),
					_ => Self::Name(text.clone()),
				}
			}
			other => Self::Name(to_output(other)),
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Index(index) => Value::from(*index),
			Self::Name(name) => Value::String(name.clone()),
		}
	}

	pub(crate) fn as_name(&self) -> String {
		match self {
			Self::Index(index) => index.to_string(),
			Self::Name(name) => name.clone(),
		}
	}
}

/// Look up `key` inside `value`.
pub fn get<'a>(value: &'a Value, key: &Key) -> Option<&'a Value> {
	match (value, key) {
		(Value::Array(items), Key::Index(index)) => {
			usize::try_from(*index).ok().and_then(|index| items.get(index))
		}
		(Value::Object(map), key) => map.get(&key.as_name()),
		_ => None,
	}
}

/// Step into `value` at `key` for writing, creating containers on the way.
/// `None` appends a new element the way `$list[] = …` does.
pub fn entry<'a>(value: &'a mut Value, key: Option<&Key>) -> KstyleResult<&'a mut Value> {
	if value.is_null() {
		*value = match key {
			None | Some(Key::Index(0)) => Value::Array(Vec::new()),
			Some(_) => Value::Object(Map::new()),
		};
	}

	if let Value::Array(items) = value {
		let fits = match key {
			None => true,
			Some(Key::Index(index)) => usize::try_from(*index).is_ok_and(|i| i <= items.len()),
			Some(Key::Name(_)) => false,
		};
		if !fits {
			let map = items
				.drain(..)
				.enumerate()
				.map(|(index, item)| (index.to_string(), item))
				.collect();
			*value = Value::Object(map);
		}
	}

	match value {
		Value::Array(items) => {
			let index = match key {
				Some(Key::Index(index)) => usize::try_from(*index).unwrap_or(items.len()),
				_ => items.len(),
			};
			if index == items.len() {
				items.push(Value::Null);
			}
			Ok(&mut items[index])
		}
		Value::Object(map) => {
			let name = match key {
				Some(key) => key.as_name(),
				None => next_index(map).to_string(),
			};
			Ok(map.entry(name).or_insert(Value::Null))
		}
		other => {
			Err(KstyleError::runtime(format!(
				"cannot use a {} value as an array",
				type_name(other)
			)))
		}
	}
}

fn next_index(map: &Map<String, Value>) -> i64 {
	map.keys()
		.filter_map(|key| key.parse::<i64>().ok())
		.max()
		.map_or(0, |max| max.saturating_add(1))
}

pub fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(number) if number.is_f64() => "float",
		Value::Number(_) => "int",
		Value::String(_) => "string",
		Value::Array(_) | Value::Object(_) => "array",
	}
}

/// The text a value prints as.
pub fn to_output(value: &Value) -> String {
	match value {
		Value::Null | Value::Bool(false) => String::new(),
		Value::Bool(true) => "1".to_string(),
		Value::Number(number) => {
			match number.as_i64() {
				Some(int) => int.to_string(),
				None => {
					match number.as_u64() {
						Some(uint) => uint.to_string(),
						None => format_float(number.as_f64().unwrap_or(0.0)),
					}
				}
			}
		}
		Value::String(text) => text.clone(),
		Value::Array(_) | Value::Object(_) => "Array".to_string(),
	}
}

/// Format a float with at most 14 significant digits, dropping trailing
/// zeros.
pub fn format_float(float: f64) -> String {
	if float.is_nan() {
		return "NAN".to_string();
	}
	if float.is_infinite() {
		return if float > 0.0 { "INF" } else { "-INF" }.to_string();
	}
	if float == 0.0 {
		return "0".to_string();
	}
	if float.fract() == 0.0 && float.abs() < 1e15 {
		return format!("{float:.0}");
	}

	let magnitude = float.abs().log10().floor() as i32;
	let decimals = (13 - magnitude).clamp(0, 17) as usize;
	let text = format!("{float:.decimals$}");
	if text.contains('.') {
		text.trim_end_matches('0').trim_end_matches('.').to_string()
	} else {
		text
	}
}

pub fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
		Value::String(text) => !(text.is_empty() || text == "0"),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

/// A numeric view of a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
	Int(i64),
	Float(f64),
}

impl Num {
	pub fn as_f64(self) -> f64 {
		match self {
			Self::Int(int) => int as f64,
			Self::Float(float) => float,
		}
	}

	pub fn into_value(self) -> Value {
		match self {
			Self::Int(int) => Value::from(int),
			Self::Float(float) => Number::from_f64(float).map_or(Value::Null, Value::Number),
		}
	}
}

/// Parse a fully numeric string.
fn parse_numeric(text: &str) -> Option<Num> {
	let trimmed = text.trim();
	if trimmed.is_empty() {
		return None;
	}
	if let Ok(int) = trimmed.parse::<i64>() {
		return Some(Num::Int(int));
	}
	trimmed
		.parse::<f64>()
		.ok()
		.filter(|float| float.is_finite())
		.map(Num::Float)
}

/// Parse the leading numeric prefix of a string, `0` if there is none.
fn leading_number(text: &str) -> Num {
	let trimmed = text.trim_start();
	let mut end = 0;
	let mut seen_dot = false;
	for (index, ch) in trimmed.char_indices() {
		let accepted = ch.is_ascii_digit()
			|| (index == 0 && (ch == '-' || ch == '+'))
			|| (ch == '.' && !seen_dot);
		if !accepted {
			break;
		}
		seen_dot |= ch == '.';
		end = index + ch.len_utf8();
	}

	parse_numeric(&trimmed[..end]).unwrap_or(Num::Int(0))
}

pub fn to_number(value: &Value) -> Num {
	match value {
		Value::Null | Value::Bool(false) => Num::Int(0),
		Value::Bool(true) => Num::Int(1),
		Value::Number(number) => {
			match number.as_i64() {
				Some(int) => Num::Int(int),
				None => Num::Float(number.as_f64().unwrap_or(0.0)),
			}
		}
		Value::String(text) => leading_number(text),
		Value::Array(items) => Num::Int(i64::from(!items.is_empty())),
		Value::Object(map) => Num::Int(i64::from(!map.is_empty())),
	}
}

pub fn to_int(value: &Value) -> i64 {
	match to_number(value) {
		Num::Int(int) => int,
		Num::Float(float) => float as i64,
	}
}

fn numeric_view(value: &Value) -> Option<Num> {
	match value {
		Value::Number(_) => Some(to_number(value)),
		Value::String(text) => parse_numeric(text),
		_ => None,
	}
}

/// Arithmetic operators supported over values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
}

pub fn arithmetic(op: Arithmetic, left: &Value, right: &Value) -> KstyleResult<Value> {
	if op == Arithmetic::Add {
		if let (Value::Array(left_items), Value::Array(right_items)) = (left, right) {
			let mut items = left_items.clone();
			items.extend(right_items.iter().skip(left_items.len()).cloned());
			return Ok(Value::Array(items));
		}
	}

	let (lhs, rhs) = (to_number(left), to_number(right));
	let result = match op {
		Arithmetic::Add => int_or_float(lhs, rhs, i64::checked_add, |a, b| a + b),
		Arithmetic::Subtract => int_or_float(lhs, rhs, i64::checked_sub, |a, b| a - b),
		Arithmetic::Multiply => int_or_float(lhs, rhs, i64::checked_mul, |a, b| a * b),
		Arithmetic::Divide => {
			if rhs.as_f64() == 0.0 {
				return Err(KstyleError::runtime("Division by zero"));
			}
			match (lhs, rhs) {
				(Num::Int(a), Num::Int(b)) if a.checked_rem(b) == Some(0) => Num::Int(a / b),
				_ => Num::Float(lhs.as_f64() / rhs.as_f64()),
			}
		}
		Arithmetic::Modulo => {
			let (a, b) = (to_int(left), to_int(right));
			if b == 0 {
				return Err(KstyleError::runtime("Modulo by zero"));
			}
			Num::Int(a.wrapping_rem(b))
		}
	};

	Ok(result.into_value())
}

fn int_or_float(
	lhs: Num,
	rhs: Num,
	int_op: fn(i64, i64) -> Option<i64>,
	float_op: fn(f64, f64) -> f64,
) -> Num {
	if let (Num::Int(a), Num::Int(b)) = (lhs, rhs) {
		if let Some(int) = int_op(a, b) {
			return Num::Int(int);
		}
	}

	Num::Float(float_op(lhs.as_f64(), rhs.as_f64()))
}

/// `==` comparison.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Null, Value::Null) => true,
		(Value::Bool(flag), other) | (other, Value::Bool(flag)) => is_truthy(other) == *flag,
		(Value::Null, other) | (other, Value::Null) => !is_truthy(other) && !other.is_number(),
		(Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
			left == right
		}
		_ => {
			match (numeric_view(left), numeric_view(right)) {
				(Some(a), Some(b)) => numbers_equal(a, b),
				_ => to_output(left) == to_output(right),
			}
		}
	}
}

fn numbers_equal(a: Num, b: Num) -> bool {
	match (a, b) {
		(Num::Int(a), Num::Int(b)) => a == b,
		_ => approx_eq!(f64, a.as_f64(), b.as_f64(), ulps = 2),
	}
}

/// `===` comparison.
pub fn strict_eq(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Number(a), Value::Number(b)) => {
			a.is_f64() == b.is_f64() && numbers_equal(to_number(left), to_number(right))
		}
		_ => left == right,
	}
}

/// Ordering used by `<`, `<=`, `>` and `>=`.
pub fn compare(left: &Value, right: &Value) -> Ordering {
	match (numeric_view(left), numeric_view(right)) {
		(Some(a), Some(b)) => {
			a.as_f64()
				.partial_cmp(&b.as_f64())
				.unwrap_or(Ordering::Equal)
		}
		_ => {
			match (left, right) {
				(Value::String(a), Value::String(b)) => a.cmp(b),
				(Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
					is_truthy(left).cmp(&is_truthy(right))
				}
				_ => {
					to_number(left)
						.as_f64()
						.partial_cmp(&to_number(right).as_f64())
						.unwrap_or(Ordering::Equal)
				}
			}
		}
	}
}
