use derive_more::Deref;
use derive_more::DerefMut;
use serde_json::Map;
use serde_json::Value;

use crate::KstyleError;
use crate::KstyleResult;

/// The named values a template renders against.
///
/// Entries are only ever added or overwritten. Embedded code writes into the
/// same store while a template renders, so later renders observe those
/// writes.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
pub struct VariableStore(Map<String, Value>);

impl VariableStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Assign every entry of `variables`.
	///
	/// With `merge` off each entry replaces the existing value. With `merge`
	/// on the incoming value is merged into the existing one, see
	/// [`merge_value`].
	pub fn assign<I, K>(&mut self, variables: I, merge: bool)
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		for (name, value) in variables {
			let name = name.into();
			match self.0.get_mut(&name) {
				Some(existing) if merge => merge_value(existing, value),
				_ => {
					self.0.insert(name, value);
				}
			}
		}
	}

	/// Assign the entries of a JSON object. Anything else is rejected.
	pub fn assign_json(&mut self, variables: Value, merge: bool) -> KstyleResult<()> {
		let Value::Object(map) = variables else {
			return Err(KstyleError::NotAMapping);
		};

		self.assign(map, merge);
		Ok(())
	}
}

impl From<Map<String, Value>> for VariableStore {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

/// Merge `incoming` into `existing`.
///
/// Two mappings merge key by key, recursively. Two sequences gain the
/// incoming elements they do not already hold. Any other combination is an
/// overwrite. Applying the same merge twice leaves the value unchanged.
pub fn merge_value(existing: &mut Value, incoming: Value) {
	match (existing, incoming) {
		(Value::Object(current), Value::Object(incoming)) => {
			for (key, value) in incoming {
				match current.get_mut(&key) {
					Some(slot) => merge_value(slot, value),
					None => {
						current.insert(key, value);
					}
				}
			}
		}
		(Value::Array(current), Value::Array(incoming)) => {
			for value in incoming {
				if !current.contains(&value) {
					current.push(value);
				}
			}
		}
		(slot, incoming) => *slot = incoming,
	}
}
