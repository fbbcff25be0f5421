use std::collections::HashMap;
use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Root names that never resolve against the variable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Superglobal {
	Session,
	Request,
	Post,
	Cookie,
	Get,
	Env,
	Server,
	Files,
}

impl Superglobal {
	pub const ALL: [Self; 8] = [
		Self::Session,
		Self::Request,
		Self::Post,
		Self::Cookie,
		Self::Get,
		Self::Env,
		Self::Server,
		Self::Files,
	];

	pub fn name(self) -> &'static str {
		match self {
			Self::Session => "_SESSION",
			Self::Request => "_REQUEST",
			Self::Post => "_POST",
			Self::Cookie => "_COOKIE",
			Self::Get => "_GET",
			Self::Env => "_ENV",
			Self::Server => "_SERVER",
			Self::Files => "_FILES",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|global| global.name() == name)
	}
}

impl Display for Superglobal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// The host capability superglobal references resolve against.
///
/// Nothing is read from the process unless asked for with
/// [`HostEnvironment::with_process_env`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostEnvironment {
	roots: HashMap<Superglobal, Value>,
}

impl HostEnvironment {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed `_ENV` from the variables of the current process.
	#[must_use]
	pub fn with_process_env(mut self) -> Self {
		let env: Map<String, Value> = std::env::vars()
			.map(|(key, value)| (key, Value::String(value)))
			.collect();
		self.roots.insert(Superglobal::Env, Value::Object(env));
		self
	}

	#[must_use]
	pub fn with(mut self, global: Superglobal, value: Value) -> Self {
		self.set(global, value);
		self
	}

	pub fn set(&mut self, global: Superglobal, value: Value) {
		self.roots.insert(global, value);
	}

	pub fn get(&self, global: Superglobal) -> Option<&Value> {
		self.roots.get(&global)
	}

	/// Mutable access to a root, created as an empty mapping when absent.
	pub fn get_mut(&mut self, global: Superglobal) -> &mut Value {
		self.roots
			.entry(global)
			.or_insert_with(|| Value::Object(Map::new()))
	}
}
