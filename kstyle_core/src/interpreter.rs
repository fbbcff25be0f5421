//! Runs an [`Artifact`] against a [`RenderContext`].

use serde_json::Map;
use serde_json::Value;

use crate::Artifact;
use crate::ArrayItem;
use crate::BinaryOp;
use crate::Expr;
use crate::Function;
use crate::HostEnvironment;
use crate::KstyleError;
use crate::KstyleResult;
use crate::Stmt;
use crate::UnaryOp;
use crate::Variable;
use crate::VariableStore;
use crate::builtins::call_builtin;
use crate::value;
use crate::value::Arithmetic;
use crate::value::Key;

/// Nested user function calls allowed before a render fails.
pub const MAX_CALL_DEPTH: usize = 256;

/// What an artifact needs from its host while it runs.
pub trait RenderContext {
	fn store(&mut self) -> &mut VariableStore;
	fn environment(&mut self) -> Option<&mut HostEnvironment>;
	/// Render the template `name` into `out`.
	fn include(&mut self, name: &str, out: &mut String) -> KstyleResult<()>;
	/// A function declared by any template taking part in the render.
	fn function(&self, name: &str) -> Option<Function>;
}

enum Flow {
	Next,
	Break,
	Continue,
	Return(Value),
}

pub struct Interpreter<'a, C: RenderContext> {
	artifact: &'a Artifact,
	context: &'a mut C,
	locals: Map<String, Value>,
	depth: usize,
}

impl<'a, C: RenderContext> Interpreter<'a, C> {
	pub fn new(artifact: &'a Artifact, context: &'a mut C) -> Self {
		Self {
			artifact,
			context,
			locals: Map::new(),
			depth: 0,
		}
	}

	/// Execute the artifact body, appending the output to `out`. A top level
	/// `return` ends the render early.
	pub fn run(&mut self, out: &mut String) -> KstyleResult<()> {
		let artifact = self.artifact;
		match self.exec_block(&artifact.body, out)? {
			Flow::Next | Flow::Return(_) => Ok(()),
			Flow::Break => Err(KstyleError::runtime("`break` used outside of a loop")),
			Flow::Continue => Err(KstyleError::runtime("`continue` used outside of a loop")),
		}
	}

	fn exec_block(&mut self, body: &[Stmt], out: &mut String) -> KstyleResult<Flow> {
		for stmt in body {
			match self.exec(stmt, out)? {
				Flow::Next => {}
				flow => return Ok(flow),
			}
		}
		Ok(Flow::Next)
	}

	fn exec(&mut self, stmt: &Stmt, out: &mut String) -> KstyleResult<Flow> {
		match stmt {
			Stmt::Text(text) => out.push_str(text),
			Stmt::Echo(values) => {
				for expr in values {
					let value = self.eval(expr, out)?;
					out.push_str(&value::to_output(&value));
				}
			}
			Stmt::Include(name) => self.context.include(name, out)?,
			Stmt::Expr(expr) => {
				self.eval(expr, out)?;
			}
			Stmt::If {
				branches,
				otherwise,
			} => {
				for branch in branches {
					let condition = self.eval(&branch.condition, out)?;
					if value::is_truthy(&condition) {
						return self.exec_block(&branch.body, out);
					}
				}
				if let Some(body) = otherwise {
					return self.exec_block(body, out);
				}
			}
			Stmt::While { condition, body } => {
				loop {
					let test = self.eval(condition, out)?;
					if !value::is_truthy(&test) {
						break;
					}
					match self.exec_block(body, out)? {
						Flow::Break => break,
						Flow::Next | Flow::Continue => {}
						flow @ Flow::Return(_) => return Ok(flow),
					}
				}
			}
			Stmt::For {
				init,
				condition,
				step,
				body,
			} => {
				for expr in init {
					self.eval(expr, out)?;
				}
				loop {
					let mut test = Value::Bool(true);
					for expr in condition {
						test = self.eval(expr, out)?;
					}
					if !value::is_truthy(&test) {
						break;
					}
					match self.exec_block(body, out)? {
						Flow::Break => break,
						Flow::Next | Flow::Continue => {}
						flow @ Flow::Return(_) => return Ok(flow),
					}
					for expr in step {
						self.eval(expr, out)?;
					}
				}
			}
			Stmt::Foreach {
				subject,
				key,
				value: target,
				body,
			} => {
				let entries: Vec<(Value, Value)> = match self.eval(subject, out)? {
					Value::Array(items) => {
						items
							.into_iter()
							.enumerate()
							.map(|(index, item)| (Value::from(index), item))
							.collect()
					}
					Value::Object(map) => {
						map.into_iter()
							.map(|(name, item)| (Key::from_value(&Value::String(name)).to_value(), item))
							.collect()
					}
					other => {
						tracing::debug!(
							kind = value::type_name(&other),
							"foreach over a value that is not an array"
						);
						Vec::new()
					}
				};

				for (entry_key, entry_value) in entries {
					if let Some(key) = key {
						self.assign(key, entry_key, out)?;
					}
					self.assign(target, entry_value, out)?;
					match self.exec_block(body, out)? {
						Flow::Break => break,
						Flow::Next | Flow::Continue => {}
						flow @ Flow::Return(_) => return Ok(flow),
					}
				}
			}
			Stmt::Break => return Ok(Flow::Break),
			Stmt::Continue => return Ok(Flow::Continue),
			Stmt::Return(expr) => {
				let value = match expr {
					Some(expr) => self.eval(expr, out)?,
					None => Value::Null,
				};
				return Ok(Flow::Return(value));
			}
			Stmt::Block(body) => return self.exec_block(body, out),
		}

		Ok(Flow::Next)
	}

	/// Evaluate an expression. `out` receives output from functions that echo.
	fn eval(&mut self, expr: &Expr, out: &mut String) -> KstyleResult<Value> {
		match expr {
			Expr::Literal(value) => Ok(value.clone()),
			Expr::Variable(variable) => Ok(self.read(variable)),
			Expr::Index { base, key } => {
				let Some(key) = key else {
					return Err(KstyleError::runtime("cannot use `[]` for reading"));
				};
				let base = self.eval(base, out)?;
				let key = Key::from_value(&self.eval(key, out)?);
				Ok(index_value(&base, &key))
			}
			Expr::Array(items) => self.eval_array(items, out),
			Expr::Interpolated(parts) => {
				let mut text = String::new();
				for part in parts {
					let value = self.eval(part, out)?;
					text.push_str(&value::to_output(&value));
				}
				Ok(Value::String(text))
			}
			Expr::Unary { op, operand } => {
				let operand = self.eval(operand, out)?;
				match op {
					UnaryOp::Not => Ok(Value::Bool(!value::is_truthy(&operand))),
					UnaryOp::Negate => {
						value::arithmetic(Arithmetic::Multiply, &Value::from(-1), &operand)
					}
					UnaryOp::Plus => Ok(value::to_number(&operand).into_value()),
				}
			}
			Expr::Binary { op, left, right } => {
				match op {
					BinaryOp::And => {
						let left = self.eval(left, out)?;
						if !value::is_truthy(&left) {
							return Ok(Value::Bool(false));
						}
						let right = self.eval(right, out)?;
						Ok(Value::Bool(value::is_truthy(&right)))
					}
					BinaryOp::Or => {
						let left = self.eval(left, out)?;
						if value::is_truthy(&left) {
							return Ok(Value::Bool(true));
						}
						let right = self.eval(right, out)?;
						Ok(Value::Bool(value::is_truthy(&right)))
					}
					_ => {
						let left = self.eval(left, out)?;
						let right = self.eval(right, out)?;
						binary(*op, &left, &right)
					}
				}
			}
			Expr::Ternary {
				condition,
				then,
				otherwise,
			} => {
				let condition = self.eval(condition, out)?;
				if value::is_truthy(&condition) {
					match then {
						Some(then) => self.eval(then, out),
						None => Ok(condition),
					}
				} else {
					self.eval(otherwise, out)
				}
			}
			Expr::Assign { target, op, value } => {
				let mut value = self.eval(value, out)?;
				if let Some(op) = op {
					let current = self.eval(target, out)?;
					value = binary(*op, &current, &value)?;
				}
				self.assign(target, value.clone(), out)?;
				Ok(value)
			}
			Expr::IncDec {
				target,
				increment,
				prefix,
			} => {
				let current = self.eval(target, out)?;
				let updated = match (&current, increment) {
					(Value::Null, true) => Value::from(1),
					(Value::Null, false) => Value::Null,
					(_, true) => value::arithmetic(Arithmetic::Add, &current, &Value::from(1))?,
					(_, false) => {
						value::arithmetic(Arithmetic::Subtract, &current, &Value::from(1))?
					}
				};
				self.assign(target, updated.clone(), out)?;
				Ok(if *prefix { updated } else { current })
			}
			Expr::Call { name, args } => self.call(name, args, out),
		}
	}

	fn eval_array(&mut self, items: &[ArrayItem], out: &mut String) -> KstyleResult<Value> {
		let mut map = Map::new();
		let mut next_index: i64 = 0;

		for item in items {
			let value = self.eval(&item.value, out)?;
			let key = match &item.key {
				Some(key) => Key::from_value(&self.eval(key, out)?),
				None => Key::Index(next_index),
			};
			if let Key::Index(index) = key {
				next_index = next_index.max(index.saturating_add(1));
			}
			map.insert(key.as_name(), value);
		}

		let sequential = map
			.keys()
			.enumerate()
			.all(|(position, key)| key == &position.to_string());
		if sequential {
			return Ok(Value::Array(map.into_iter().map(|(_, value)| value).collect()));
		}

		Ok(Value::Object(map))
	}

	fn call(&mut self, name: &str, args: &[Expr], out: &mut String) -> KstyleResult<Value> {
		let artifact = self.artifact;
		if let Some(function) = artifact.functions.get(name) {
			return self.call_function(function, args, out);
		}
		if let Some(function) = self.context.function(name) {
			return self.call_function(&function, args, out);
		}

		let mut values = Vec::with_capacity(args.len());
		for arg in args {
			values.push(self.eval(arg, out)?);
		}

		match name {
			"isset" => Ok(Value::Bool(!values.is_empty() && values.iter().all(|value| !value.is_null()))),
			"empty" => Ok(Value::Bool(values.first().is_none_or(|value| !value::is_truthy(value)))),
			_ => {
				call_builtin(name, &values).unwrap_or_else(|| {
					Err(KstyleError::runtime(format!(
						"Call to undefined function {name}()"
					)))
				})
			}
		}
	}

	fn call_function(
		&mut self,
		function: &Function,
		args: &[Expr],
		out: &mut String,
	) -> KstyleResult<Value> {
		if self.depth >= MAX_CALL_DEPTH {
			return Err(KstyleError::runtime(format!(
				"maximum function nesting level of {MAX_CALL_DEPTH} reached in {}()",
				function.name
			)));
		}

		let mut frame = Map::new();
		for (index, param) in function.params.iter().enumerate() {
			let value = match (args.get(index), &param.default) {
				(Some(arg), _) => self.eval(arg, out)?,
				(None, Some(default)) => self.eval(default, out)?,
				(None, None) => {
					return Err(KstyleError::runtime(format!(
						"too few arguments to function {}()",
						function.name
					)));
				}
			};
			frame.insert(param.name.clone(), value);
		}

		let saved = std::mem::replace(&mut self.locals, frame);
		self.depth += 1;
		let result = self.exec_block(&function.body, out);
		self.depth -= 1;
		self.locals = saved;

		match result? {
			Flow::Return(value) => Ok(value),
			Flow::Next => Ok(Value::Null),
			Flow::Break | Flow::Continue => {
				Err(KstyleError::runtime(format!(
					"`break` or `continue` outside of a loop in {}()",
					function.name
				)))
			}
		}
	}

	fn read(&mut self, variable: &Variable) -> Value {
		match variable {
			Variable::Store(name) => self.context.store().get(name).cloned().unwrap_or(Value::Null),
			Variable::Local(name) => self.locals.get(name).cloned().unwrap_or(Value::Null),
			Variable::Environment(global) => {
				self.context
					.environment()
					.and_then(|environment| environment.get(*global).cloned())
					.unwrap_or(Value::Null)
			}
		}
	}

	/// Write `value` to the place `target` names, creating containers along
	/// the way. Keys are evaluated before the place is borrowed.
	fn assign(&mut self, target: &Expr, value: Value, out: &mut String) -> KstyleResult<()> {
		let mut keys = Vec::new();
		let root = self.resolve_place(target, &mut keys, out)?;

		let mut slot = self.root_mut(&root)?;
		for key in &keys {
			slot = value::entry(slot, key.as_ref())?;
		}
		*slot = value;
		Ok(())
	}

	fn resolve_place(
		&mut self,
		target: &Expr,
		keys: &mut Vec<Option<Key>>,
		out: &mut String,
	) -> KstyleResult<Variable> {
		match target {
			Expr::Variable(variable) => Ok(variable.clone()),
			Expr::Index { base, key } => {
				let root = self.resolve_place(base, keys, out)?;
				let key = match key {
					Some(key) => Some(Key::from_value(&self.eval(key, out)?)),
					None => None,
				};
				keys.push(key);
				Ok(root)
			}
			_ => Err(KstyleError::runtime("cannot assign to this expression")),
		}
	}

	fn root_mut(&mut self, root: &Variable) -> KstyleResult<&mut Value> {
		match root {
			Variable::Store(name) => {
				Ok(self
					.context
					.store()
					.entry(name.clone())
					.or_insert(Value::Null))
			}
			Variable::Local(name) => Ok(self.locals.entry(name.clone()).or_insert(Value::Null)),
			Variable::Environment(global) => {
				match self.context.environment() {
					Some(environment) => Ok(environment.get_mut(*global)),
					None => {
						Err(KstyleError::runtime(format!(
							"cannot write to {global} without a host environment"
						)))
					}
				}
			}
		}
	}
}

/// Read `key` from `base`. Strings index by character.
fn index_value(base: &Value, key: &Key) -> Value {
	if let (Value::String(text), Key::Index(index)) = (base, key) {
		return usize::try_from(*index)
			.ok()
			.and_then(|index| text.chars().nth(index))
			.map_or(Value::Null, |ch| Value::String(ch.to_string()));
	}

	value::get(base, key).cloned().unwrap_or(Value::Null)
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> KstyleResult<Value> {
	let arithmetic = match op {
		BinaryOp::Add => Arithmetic::Add,
		BinaryOp::Subtract => Arithmetic::Subtract,
		BinaryOp::Multiply => Arithmetic::Multiply,
		BinaryOp::Divide => Arithmetic::Divide,
		BinaryOp::Modulo => Arithmetic::Modulo,
		BinaryOp::Concat => {
			return Ok(Value::String(format!(
				"{}{}",
				value::to_output(left),
				value::to_output(right)
			)));
		}
		BinaryOp::Equal => return Ok(Value::Bool(value::loose_eq(left, right))),
		BinaryOp::NotEqual => return Ok(Value::Bool(!value::loose_eq(left, right))),
		BinaryOp::Identical => return Ok(Value::Bool(value::strict_eq(left, right))),
		BinaryOp::NotIdentical => return Ok(Value::Bool(!value::strict_eq(left, right))),
		BinaryOp::Less => return Ok(Value::Bool(value::compare(left, right).is_lt())),
		BinaryOp::LessEqual => return Ok(Value::Bool(value::compare(left, right).is_le())),
		BinaryOp::Greater => return Ok(Value::Bool(value::compare(left, right).is_gt())),
		BinaryOp::GreaterEqual => return Ok(Value::Bool(value::compare(left, right).is_ge())),
		BinaryOp::And => return Ok(Value::Bool(value::is_truthy(left) && value::is_truthy(right))),
		BinaryOp::Or => return Ok(Value::Bool(value::is_truthy(left) || value::is_truthy(right))),
	};

	value::arithmetic(arithmetic, left, right)
}
