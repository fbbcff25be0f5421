//! Functions callable from embedded code.

use serde_json::Map;
use serde_json::Value;

use crate::KstyleError;
use crate::KstyleResult;
use crate::value;
use crate::value::Key;
use crate::value::Num;

/// Call the builtin `name` (lowercase). `None` when no such builtin exists.
pub fn call_builtin(name: &str, args: &[Value]) -> Option<KstyleResult<Value>> {
	let result = match name {
		"count" | "sizeof" => Ok(Value::from(count(arg(args, 0)))),
		"strlen" => Ok(Value::from(text(args, 0).len())),
		"strtoupper" => Ok(Value::String(text(args, 0).to_uppercase())),
		"strtolower" => Ok(Value::String(text(args, 0).to_lowercase())),
		"ucfirst" => Ok(Value::String(ucfirst(&text(args, 0)))),
		"trim" => Ok(Value::String(text(args, 0).trim().to_string())),
		"implode" | "join" => Ok(Value::String(implode(args))),
		"explode" => explode(args),
		"in_array" => Ok(Value::Bool(in_array(args))),
		"array_keys" => Ok(Value::Array(array_keys(arg(args, 0)))),
		"array_values" => Ok(Value::Array(array_values(arg(args, 0)))),
		"str_repeat" => {
			let times = usize::try_from(value::to_int(arg(args, 1))).unwrap_or(0);
			Ok(Value::String(text(args, 0).repeat(times)))
		}
		"str_replace" => Ok(str_replace(args)),
		"substr" => Ok(Value::String(substr(args))),
		"htmlspecialchars" => Ok(Value::String(htmlspecialchars(&text(args, 0)))),
		"nl2br" => Ok(Value::String(nl2br(&text(args, 0)))),
		"number_format" => Ok(Value::String(number_format(args))),
		"round" => Ok(round(args)),
		"floor" => Ok(float(value::to_number(arg(args, 0)).as_f64().floor())),
		"ceil" => Ok(float(value::to_number(arg(args, 0)).as_f64().ceil())),
		"abs" => {
			Ok(match value::to_number(arg(args, 0)) {
				Num::Int(int) => int.checked_abs().map_or_else(|| float((int as f64).abs()), Value::from),
				Num::Float(number) => float(number.abs()),
			})
		}
		"max" => extreme(name, args, std::cmp::Ordering::Greater),
		"min" => extreme(name, args, std::cmp::Ordering::Less),
		"intval" => Ok(Value::from(value::to_int(arg(args, 0)))),
		"floatval" => Ok(float(value::to_number(arg(args, 0)).as_f64())),
		"strval" => Ok(Value::String(text(args, 0))),
		"is_array" => Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_) | Value::Object(_)))),
		"range" => range(args),
		_ => return None,
	};

	Some(result)
}

static NULL: Value = Value::Null;

fn arg(args: &[Value], index: usize) -> &Value {
	args.get(index).unwrap_or(&NULL)
}

fn text(args: &[Value], index: usize) -> String {
	value::to_output(arg(args, index))
}

fn float(number: f64) -> Value {
	Num::Float(number).into_value()
}

fn count(value: &Value) -> usize {
	match value {
		Value::Array(items) => items.len(),
		Value::Object(map) => map.len(),
		Value::Null => 0,
		_ => 1,
	}
}

fn ucfirst(text: &str) -> String {
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

fn array_values(value: &Value) -> Vec<Value> {
	match value {
		Value::Array(items) => items.clone(),
		Value::Object(map) => map.values().cloned().collect(),
		_ => Vec::new(),
	}
}

fn array_keys(value: &Value) -> Vec<Value> {
	match value {
		Value::Array(items) => (0..items.len()).map(Value::from).collect(),
		Value::Object(map) => {
			map.keys()
				.map(|key| Key::from_value(&Value::String(key.clone())).to_value())
				.collect()
		}
		_ => Vec::new(),
	}
}

/// `implode(glue, pieces)`, also accepting the legacy `implode(pieces, glue)`.
fn implode(args: &[Value]) -> String {
	let (glue, pieces) = match (arg(args, 0), arg(args, 1)) {
		(pieces @ (Value::Array(_) | Value::Object(_)), glue) => (value::to_output(glue), pieces),
		(glue, pieces) => (value::to_output(glue), pieces),
	};

	array_values(pieces)
		.iter()
		.map(value::to_output)
		.collect::<Vec<_>>()
		.join(&glue)
}

fn explode(args: &[Value]) -> KstyleResult<Value> {
	let separator = text(args, 0);
	if separator.is_empty() {
		return Err(KstyleError::runtime("explode(): separator cannot be empty"));
	}

	let subject = text(args, 1);
	let limit = args.get(2).map(value::to_int);
	let parts: Vec<Value> = match limit {
		Some(limit) if limit > 0 => {
			subject
				.splitn(usize::try_from(limit).unwrap_or(usize::MAX), &separator)
				.map(|part| Value::String(part.to_string()))
				.collect()
		}
		Some(limit) if limit < 0 => {
			let all: Vec<&str> = subject.split(&separator).collect();
			let keep = all.len().saturating_sub(limit.unsigned_abs() as usize);
			all[..keep]
				.iter()
				.map(|part| Value::String((*part).to_string()))
				.collect()
		}
		_ => {
			subject
				.split(&separator)
				.map(|part| Value::String(part.to_string()))
				.collect()
		}
	};

	Ok(Value::Array(parts))
}

fn in_array(args: &[Value]) -> bool {
	let needle = arg(args, 0);
	let strict = value::is_truthy(arg(args, 2));

	array_values(arg(args, 1)).iter().any(|candidate| {
		if strict {
			value::strict_eq(needle, candidate)
		} else {
			value::loose_eq(needle, candidate)
		}
	})
}

fn str_replace(args: &[Value]) -> Value {
	let pairs: Vec<(String, String)> = match (arg(args, 0), arg(args, 1)) {
		(search @ (Value::Array(_) | Value::Object(_)), replace) => {
			let replacements = match replace {
				Value::Array(_) | Value::Object(_) => array_values(replace),
				other => vec![other.clone(); count(search)],
			};
			array_values(search)
				.iter()
				.enumerate()
				.map(|(index, search)| {
					(
						value::to_output(search),
						replacements.get(index).map(value::to_output).unwrap_or_default(),
					)
				})
				.collect()
		}
		(search, replace) => vec![(value::to_output(search), value::to_output(replace))],
	};

	let apply = |subject: &Value| {
		pairs
			.iter()
			.filter(|(search, _)| !search.is_empty())
			.fold(value::to_output(subject), |text, (search, replace)| {
				text.replace(search.as_str(), replace)
			})
	};

	match arg(args, 2) {
		Value::Array(items) => Value::Array(items.iter().map(|item| Value::String(apply(item))).collect()),
		Value::Object(map) => {
			Value::Object(
				map.iter()
					.map(|(key, item)| (key.clone(), Value::String(apply(item))))
					.collect::<Map<String, Value>>(),
			)
		}
		subject => Value::String(apply(subject)),
	}
}

/// Character based `substr` with negative offsets and lengths.
fn substr(args: &[Value]) -> String {
	let chars: Vec<char> = text(args, 0).chars().collect();
	let len = chars.len() as i64;

	let mut start = value::to_int(arg(args, 1));
	if start < 0 {
		start = (len + start).max(0);
	}
	if start >= len {
		return String::new();
	}

	let end = match args.get(2).filter(|length| !length.is_null()) {
		Some(length) => {
			let length = value::to_int(length);
			if length < 0 { len + length } else { start.saturating_add(length) }
		}
		None => len,
	}
	.min(len);

	if end <= start {
		return String::new();
	}

	chars[start as usize..end as usize].iter().collect()
}

fn htmlspecialchars(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => output.push_str("&amp;"),
			'<' => output.push_str("&lt;"),
			'>' => output.push_str("&gt;"),
			'"' => output.push_str("&quot;"),
			'\'' => output.push_str("&#039;"),
			other => output.push(other),
		}
	}
	output
}

fn nl2br(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	while let Some(ch) = chars.next() {
		match ch {
			'\r' if chars.peek() == Some(&'\n') => {
				chars.next();
				output.push_str("<br />\r\n");
			}
			'\n' | '\r' => {
				output.push_str("<br />");
				output.push(ch);
			}
			other => output.push(other),
		}
	}
	output
}

/// `number_format(number, decimals = 0, point = ".", thousands = ",")`.
fn number_format(args: &[Value]) -> String {
	let number = value::to_number(arg(args, 0)).as_f64();
	let decimals = usize::try_from(value::to_int(arg(args, 1))).unwrap_or(0);
	let point = args.get(2).map_or_else(|| ".".to_string(), value::to_output);
	let thousands = args.get(3).map_or_else(|| ",".to_string(), value::to_output);

	let rounded = format!("{:.decimals$}", round_half_away(number.abs(), decimals));
	let (whole, fraction) = match rounded.split_once('.') {
		Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
		None => (rounded, None),
	};

	let mut grouped = String::new();
	for (index, digit) in whole.chars().enumerate() {
		if index > 0 && (whole.len() - index) % 3 == 0 {
			grouped.push_str(&thousands);
		}
		grouped.push(digit);
	}

	let negative = number < 0.0 && rounded_nonzero(&grouped, fraction.as_deref());
	let mut output = String::new();
	if negative {
		output.push('-');
	}
	output.push_str(&grouped);
	if let Some(fraction) = fraction {
		output.push_str(&point);
		output.push_str(&fraction);
	}
	output
}

fn rounded_nonzero(whole: &str, fraction: Option<&str>) -> bool {
	whole.chars().chain(fraction.unwrap_or("").chars()).any(|ch| ch.is_ascii_digit() && ch != '0')
}

fn round_half_away(number: f64, decimals: usize) -> f64 {
	let factor = 10_f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
	let scaled = number * factor;
	if !scaled.is_finite() {
		return number;
	}
	scaled.round() / factor
}

fn round(args: &[Value]) -> Value {
	let number = value::to_number(arg(args, 0)).as_f64();
	let precision = value::to_int(arg(args, 1));
	let factor = 10_f64.powi(i32::try_from(precision).unwrap_or(0));
	let rounded = (number * factor).round() / factor;
	if rounded.is_finite() { float(rounded) } else { float(number) }
}

fn extreme(name: &str, args: &[Value], wanted: std::cmp::Ordering) -> KstyleResult<Value> {
	let candidates = match args {
		[single @ (Value::Array(_) | Value::Object(_))] => array_values(single),
		_ => args.to_vec(),
	};

	let mut candidates = candidates.into_iter();
	let Some(mut best) = candidates.next() else {
		return Err(KstyleError::runtime(format!(
			"{name}(): argument must contain at least one element"
		)));
	};
	for candidate in candidates {
		if value::compare(&candidate, &best) == wanted {
			best = candidate;
		}
	}

	Ok(best)
}

fn range(args: &[Value]) -> KstyleResult<Value> {
	let start = value::to_number(arg(args, 0));
	let end = value::to_number(arg(args, 1));
	let step = args.get(2).map_or(Num::Int(1), value::to_number);

	if step.as_f64() == 0.0 {
		return Err(KstyleError::runtime("range(): step cannot be 0"));
	}

	let mut items = Vec::new();
	match (start, end, step) {
		(Num::Int(start), Num::Int(end), Num::Int(step)) => {
			let step = step.unsigned_abs();
			let step = usize::try_from(step).unwrap_or(usize::MAX);
			if start <= end {
				items.extend((start..=end).step_by(step).map(Value::from));
			} else {
				items.extend((end..=start).rev().step_by(step).map(Value::from));
			}
		}
		_ => {
			let (start, end, step) = (start.as_f64(), end.as_f64(), step.as_f64().abs());
			let count = ((end - start).abs() / step).floor() as usize;
			let direction = if start <= end { 1.0 } else { -1.0 };
			items.extend((0..=count).map(|index| float(start + direction * step * index as f64)));
		}
	}

	Ok(Value::Array(items))
}
