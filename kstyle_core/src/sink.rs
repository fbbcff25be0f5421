use indexmap::IndexMap;
use serde::Serialize;

use crate::KstyleError;

/// Error messages grouped by the operation that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
	entries: IndexMap<String, Vec<String>>,
	debug: bool,
}

/// The flattened log together with the configured log file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReport {
	pub entries: Vec<String>,
	pub log_file: String,
}

impl ErrorLog {
	pub fn new(debug: bool) -> Self {
		Self {
			entries: IndexMap::new(),
			debug,
		}
	}

	pub fn set_debug(&mut self, debug: bool) {
		self.debug = debug;
	}

	/// Record `message` under `operation`. In debug mode the returned error
	/// halts whatever is running.
	pub fn report(&mut self, operation: &str, message: impl Into<String>) -> Option<KstyleError> {
		let message = message.into();
		tracing::warn!(operation, message = message.as_str(), "template error");

		self.entries
			.entry(operation.to_string())
			.or_default()
			.push(message.clone());

		self.debug.then(|| {
			KstyleError::Halted {
				operation: operation.to_string(),
				message,
			}
		})
	}

	pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
		&self.entries
	}

	/// Every message as `"<operation>: <message>"`, in the order reported.
	pub fn flatten(&self) -> Vec<String> {
		self.entries
			.iter()
			.flat_map(|(operation, messages)| {
				messages
					.iter()
					.map(move |message| format!("{operation}: {message}"))
			})
			.collect()
	}

	pub fn report_with_file(&self, log_file: impl Into<String>) -> LogReport {
		LogReport {
			entries: self.flatten(),
			log_file: log_file.into(),
		}
	}
}
