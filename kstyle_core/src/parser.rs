use std::collections::BTreeMap;

use crate::Artifact;
use crate::ArrayItem;
use crate::BinaryOp;
use crate::CondBranch;
use crate::Directive;
use crate::Expr;
use crate::Function;
use crate::KstyleError;
use crate::KstyleResult;
use crate::Param;
use crate::Piece;
use crate::Stmt;
use crate::Superglobal;
use crate::UnaryOp;
use crate::Variable;
use crate::lexer::CodeLexer;
use crate::tokens::Punct;
use crate::tokens::Token;

/// Build the artifact for a template from its compiled pieces.
///
/// Markup, interpolations and includes become output statements spliced into
/// the token stream of the code directives, so a control structure opened in
/// one directive can wrap the markup that follows it.
pub fn build_artifact(template: &str, pieces: Vec<Piece>) -> KstyleResult<Artifact> {
	let tokens = pieces_to_tokens(template, pieces)?;
	let mut parser = Parser::new(template, tokens);
	let body = parser.parse_program()?;

	let mut artifact = Artifact::new(template);
	artifact.body = body;
	artifact.functions = parser.functions;
	Ok(artifact)
}

fn pieces_to_tokens(template: &str, pieces: Vec<Piece>) -> KstyleResult<Vec<Token>> {
	let mut tokens = Vec::new();

	for piece in pieces {
		match piece {
			Piece::Markup(text) => {
				if !text.is_empty() {
					tokens.push(Token::Emit(Stmt::Text(text)));
				}
			}
			Piece::Directive(Directive::Include { target }) => {
				tokens.push(Token::Emit(Stmt::Include(target)));
			}
			Piece::Directive(Directive::VariableRef { path }) => {
				tokens.push(Token::Emit(Stmt::Echo(vec![path.to_accessor()])));
			}
			Piece::Directive(Directive::CodeFragment {
				code,
				static_regions,
			}) => {
				tokens.extend(CodeLexer::new(template, &static_regions).tokenize(&code)?);
				tokens.push(Token::Boundary);
			}
			Piece::Directive(Directive::TagCode { code }) => {
				tokens.extend(CodeLexer::new(template, &[]).tokenize(&code)?);
				tokens.push(Token::Boundary);
			}
			Piece::Directive(Directive::Block { .. }) => {}
		}
	}

	Ok(tokens)
}

struct Parser<'a> {
	template: &'a str,
	tokens: Vec<Token>,
	cursor: usize,
	functions: BTreeMap<String, Function>,
	/// Greater than zero while parsing a function body.
	function_depth: usize,
}

impl<'a> Parser<'a> {
	fn new(template: &'a str, tokens: Vec<Token>) -> Self {
		Self {
			template,
			tokens,
			cursor: 0,
			functions: BTreeMap::new(),
			function_depth: 0,
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.cursor)
	}

	fn peek_at(&self, offset: usize) -> Option<&Token> {
		self.tokens.get(self.cursor + offset)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.cursor).cloned();
		if token.is_some() {
			self.cursor += 1;
		}
		token
	}

	fn at_punct(&self, punct: Punct) -> bool {
		self.peek().is_some_and(|token| token.is_punct(punct))
	}

	fn at_keyword(&self, keyword: &str) -> bool {
		self.peek().is_some_and(|token| token.is_keyword(keyword))
	}

	fn eat_punct(&mut self, punct: Punct) -> bool {
		if self.at_punct(punct) {
			self.cursor += 1;
			return true;
		}
		false
	}

	fn eat_keyword(&mut self, keyword: &str) -> bool {
		if self.at_keyword(keyword) {
			self.cursor += 1;
			return true;
		}
		false
	}

	fn expect_punct(&mut self, punct: Punct) -> KstyleResult<()> {
		if self.eat_punct(punct) {
			return Ok(());
		}
		Err(self.unexpected(&format!("`{}`", punct.symbol())))
	}

	fn unexpected(&self, expected: &str) -> KstyleError {
		let found = self
			.peek()
			.map_or_else(|| "end of template".to_string(), |token| format!("`{token}`"));
		self.error(format!("unexpected {found}, expected {expected}"))
	}

	fn error(&self, message: impl Into<String>) -> KstyleError {
		KstyleError::CodeSyntax {
			template: self.template.to_string(),
			message: message.into(),
		}
	}

	/// Skip directive boundaries and whitespace-only markup.
	fn skip_filler(&self) -> usize {
		let mut index = self.cursor;
		while let Some(token) = self.tokens.get(index) {
			match token {
				Token::Boundary => index += 1,
				Token::Emit(Stmt::Text(text)) if text.trim().is_empty() => index += 1,
				_ => break,
			}
		}
		index
	}

	/// Move past filler when it is followed by one of `keywords`.
	fn continues_with(&mut self, keywords: &[&str]) -> bool {
		let index = self.skip_filler();
		let found = self
			.tokens
			.get(index)
			.is_some_and(|token| keywords.iter().any(|keyword| token.is_keyword(keyword)));
		if found {
			self.cursor = index;
		}
		found
	}

	fn parse_program(&mut self) -> KstyleResult<Vec<Stmt>> {
		let mut body = Vec::new();
		while self.peek().is_some() {
			if self.at_punct(Punct::BraceClose) {
				return Err(self.error("unexpected `}` without a matching `{`"));
			}
			if let Some(stmt) = self.parse_statement()? {
				body.push(stmt);
			}
		}
		Ok(body)
	}

	/// Statements until a `}`, which is consumed.
	fn parse_braced(&mut self) -> KstyleResult<Vec<Stmt>> {
		let mut body = Vec::new();
		loop {
			match self.peek() {
				None => return Err(self.unexpected("`}`")),
				Some(token) if token.is_punct(Punct::BraceClose) => {
					self.cursor += 1;
					return Ok(body);
				}
				_ => {
					if let Some(stmt) = self.parse_statement()? {
						body.push(stmt);
					}
				}
			}
		}
	}

	/// Statements until one of `keywords`, which is left in place.
	fn parse_until_keyword(&mut self, keywords: &[&str]) -> KstyleResult<Vec<Stmt>> {
		let mut body = Vec::new();
		loop {
			match self.peek() {
				None => {
					return Err(self.unexpected(&format!("`{}`", keywords.join("` or `"))));
				}
				Some(token) if keywords.iter().any(|keyword| token.is_keyword(keyword)) => {
					return Ok(body);
				}
				_ => {
					if let Some(stmt) = self.parse_statement()? {
						body.push(stmt);
					}
				}
			}
		}
	}

	/// The body of a control structure: a braced block or one statement.
	fn parse_body(&mut self) -> KstyleResult<Vec<Stmt>> {
		let index = self.skip_filler();
		if self
			.tokens
			.get(index)
			.is_some_and(|token| token.is_punct(Punct::BraceOpen))
		{
			self.cursor = index + 1;
			return self.parse_braced();
		}

		loop {
			match self.peek() {
				None => return Err(self.unexpected("a statement")),
				_ => {
					if let Some(stmt) = self.parse_statement()? {
						return Ok(vec![stmt]);
					}
				}
			}
		}
	}

	/// A statement terminator. `;` may be left out before the end of a
	/// directive, before markup, before `}` and at the end of the template.
	fn expect_terminator(&mut self) -> KstyleResult<()> {
		if self.eat_punct(Punct::Semicolon) {
			return Ok(());
		}
		match self.peek() {
			None | Some(Token::Boundary | Token::Emit(_)) => Ok(()),
			Some(token) if token.is_punct(Punct::BraceClose) => Ok(()),
			_ => Err(self.unexpected("`;`")),
		}
	}

	fn parse_statement(&mut self) -> KstyleResult<Option<Stmt>> {
		let Some(token) = self.peek().cloned() else {
			return Ok(None);
		};

		match token {
			Token::Boundary => {
				self.cursor += 1;
				Ok(None)
			}
			Token::Emit(stmt) => {
				self.cursor += 1;
				Ok(Some(stmt))
			}
			Token::Punct(Punct::Semicolon) => {
				self.cursor += 1;
				Ok(None)
			}
			Token::Punct(Punct::BraceOpen) => {
				self.cursor += 1;
				Ok(Some(Stmt::Block(self.parse_braced()?)))
			}
			Token::Ident(ident) => {
				match ident.to_ascii_lowercase().as_str() {
					"if" => self.parse_if().map(Some),
					"while" => self.parse_while().map(Some),
					"for" => self.parse_for().map(Some),
					"foreach" => self.parse_foreach().map(Some),
					"echo" => {
						self.cursor += 1;
						let mut values = vec![self.parse_expression()?];
						while self.eat_punct(Punct::Comma) {
							values.push(self.parse_expression()?);
						}
						self.expect_terminator()?;
						Ok(Some(Stmt::Echo(values)))
					}
					"print" => {
						self.cursor += 1;
						let value = self.parse_expression()?;
						self.expect_terminator()?;
						Ok(Some(Stmt::Echo(vec![value])))
					}
					"break" | "continue" => {
						self.cursor += 1;
						if matches!(self.peek(), Some(Token::Int(_))) {
							self.cursor += 1;
						}
						self.expect_terminator()?;
						Ok(Some(if ident.eq_ignore_ascii_case("break") {
							Stmt::Break
						} else {
							Stmt::Continue
						}))
					}
					"return" => {
						self.cursor += 1;
						let value = if self.ends_statement() {
							None
						} else {
							Some(self.parse_expression()?)
						};
						self.expect_terminator()?;
						Ok(Some(Stmt::Return(value)))
					}
					"function" if matches!(self.peek_at(1), Some(Token::Ident(_))) => {
						self.parse_function()?;
						Ok(None)
					}
					"else" | "elseif" | "endif" | "endwhile" | "endfor" | "endforeach" => {
						Err(self.error(format!("unexpected `{ident}`")))
					}
					_ => self.parse_expression_statement().map(Some),
				}
			}
			_ => self.parse_expression_statement().map(Some),
		}
	}

	fn ends_statement(&self) -> bool {
		match self.peek() {
			None | Some(Token::Boundary | Token::Emit(_)) => true,
			Some(token) => token.is_punct(Punct::Semicolon) || token.is_punct(Punct::BraceClose),
		}
	}

	fn parse_expression_statement(&mut self) -> KstyleResult<Stmt> {
		let expr = self.parse_expression()?;
		self.expect_terminator()?;
		Ok(Stmt::Expr(expr))
	}

	fn parse_condition(&mut self) -> KstyleResult<Expr> {
		self.expect_punct(Punct::ParenOpen)?;
		let condition = self.parse_expression()?;
		self.expect_punct(Punct::ParenClose)?;
		Ok(condition)
	}

	/// Consume a `:` opening the alternative syntax, if present.
	fn eat_alt_colon(&mut self) -> bool {
		let index = self.skip_filler();
		if self
			.tokens
			.get(index)
			.is_some_and(|token| token.is_punct(Punct::Colon))
		{
			self.cursor = index + 1;
			return true;
		}
		false
	}

	fn parse_alt_end(&mut self, keyword: &str) -> KstyleResult<()> {
		if !self.eat_keyword(keyword) {
			return Err(self.unexpected(&format!("`{keyword}`")));
		}
		self.expect_terminator()
	}

	fn parse_if(&mut self) -> KstyleResult<Stmt> {
		self.cursor += 1;
		let condition = self.parse_condition()?;

		if self.eat_alt_colon() {
			return self.parse_alt_if(condition);
		}

		let mut branches = vec![CondBranch {
			condition,
			body: self.parse_body()?,
		}];
		let mut otherwise = None;

		while self.continues_with(&["elseif", "else"]) {
			if self.eat_keyword("elseif") {
				let condition = self.parse_condition()?;
				branches.push(CondBranch {
					condition,
					body: self.parse_body()?,
				});
				continue;
			}

			self.cursor += 1;
			if self.at_keyword("if") {
				otherwise = Some(vec![self.parse_if()?]);
			} else {
				otherwise = Some(self.parse_body()?);
			}
			break;
		}

		Ok(Stmt::If {
			branches,
			otherwise,
		})
	}

	fn parse_alt_if(&mut self, condition: Expr) -> KstyleResult<Stmt> {
		let stops = ["elseif", "else", "endif"];
		let mut branches = vec![CondBranch {
			condition,
			body: self.parse_until_keyword(&stops)?,
		}];
		let mut otherwise = None;

		loop {
			if self.eat_keyword("elseif") {
				let condition = self.parse_condition()?;
				self.expect_punct(Punct::Colon)?;
				branches.push(CondBranch {
					condition,
					body: self.parse_until_keyword(&stops)?,
				});
			} else if self.eat_keyword("else") {
				self.expect_punct(Punct::Colon)?;
				otherwise = Some(self.parse_until_keyword(&["endif"])?);
			} else {
				self.parse_alt_end("endif")?;
				break;
			}
		}

		Ok(Stmt::If {
			branches,
			otherwise,
		})
	}

	fn parse_loop_body(&mut self, end_keyword: &str) -> KstyleResult<Vec<Stmt>> {
		if self.eat_alt_colon() {
			let body = self.parse_until_keyword(&[end_keyword])?;
			self.parse_alt_end(end_keyword)?;
			return Ok(body);
		}
		self.parse_body()
	}

	fn parse_while(&mut self) -> KstyleResult<Stmt> {
		self.cursor += 1;
		let condition = self.parse_condition()?;
		let body = self.parse_loop_body("endwhile")?;
		Ok(Stmt::While { condition, body })
	}

	fn parse_expression_list(&mut self, end: Punct) -> KstyleResult<Vec<Expr>> {
		let mut list = Vec::new();
		if self.eat_punct(end) {
			return Ok(list);
		}
		loop {
			list.push(self.parse_expression()?);
			if self.eat_punct(end) {
				return Ok(list);
			}
			self.expect_punct(Punct::Comma)?;
		}
	}

	fn parse_for(&mut self) -> KstyleResult<Stmt> {
		self.cursor += 1;
		self.expect_punct(Punct::ParenOpen)?;
		let init = self.parse_expression_list(Punct::Semicolon)?;
		let condition = self.parse_expression_list(Punct::Semicolon)?;
		let step = self.parse_expression_list(Punct::ParenClose)?;
		let body = self.parse_loop_body("endfor")?;

		Ok(Stmt::For {
			init,
			condition,
			step,
			body,
		})
	}

	fn parse_foreach(&mut self) -> KstyleResult<Stmt> {
		self.cursor += 1;
		self.expect_punct(Punct::ParenOpen)?;
		let subject = self.parse_expression()?;
		if !self.eat_keyword("as") {
			return Err(self.unexpected("`as`"));
		}

		let first = self.parse_postfix()?;
		let (key, value) = if self.eat_punct(Punct::Arrow) {
			(Some(first), self.parse_postfix()?)
		} else {
			(None, first)
		};
		if !value.is_place() || key.as_ref().is_some_and(|key| !key.is_place()) {
			return Err(self.error("foreach can only assign to variables"));
		}
		self.expect_punct(Punct::ParenClose)?;
		let body = self.parse_loop_body("endforeach")?;

		Ok(Stmt::Foreach {
			subject,
			key,
			value,
			body,
		})
	}

	fn parse_function(&mut self) -> KstyleResult<()> {
		self.cursor += 1;
		let Some(Token::Ident(name)) = self.advance() else {
			return Err(self.unexpected("a function name"));
		};

		self.expect_punct(Punct::ParenOpen)?;
		let mut params = Vec::new();
		if !self.eat_punct(Punct::ParenClose) {
			loop {
				let Some(Token::Variable { name, .. }) = self.advance() else {
					return Err(self.error(format!("invalid parameter list for `{name}`")));
				};
				let default = if self.eat_punct(Punct::Assign) {
					Some(self.parse_expression()?)
				} else {
					None
				};
				params.push(Param { name, default });
				if self.eat_punct(Punct::ParenClose) {
					break;
				}
				self.expect_punct(Punct::Comma)?;
			}
		}

		self.expect_punct(Punct::BraceOpen)?;
		self.function_depth += 1;
		let body = self.parse_braced();
		self.function_depth -= 1;
		let body = body?;

		let key = name.to_ascii_lowercase();
		if self.functions.contains_key(&key) {
			return Err(self.error(format!("cannot redeclare function `{name}`")));
		}
		self.functions.insert(key, Function { name, params, body });
		Ok(())
	}

	/// The lowest precedence level: the `and` and `or` keywords.
	fn parse_expression(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_keyword_and()?;
		while self.eat_keyword("or") {
			let right = self.parse_keyword_and()?;
			left = Expr::binary(BinaryOp::Or, left, right);
		}
		Ok(left)
	}

	fn parse_keyword_and(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_assignment()?;
		while self.eat_keyword("and") {
			let right = self.parse_assignment()?;
			left = Expr::binary(BinaryOp::And, left, right);
		}
		Ok(left)
	}

	fn parse_assignment(&mut self) -> KstyleResult<Expr> {
		let target = self.parse_ternary()?;

		let op = match self.peek() {
			Some(Token::Punct(punct)) => {
				match punct {
					Punct::Assign => Some(None),
					Punct::PlusAssign => Some(Some(BinaryOp::Add)),
					Punct::MinusAssign => Some(Some(BinaryOp::Subtract)),
					Punct::StarAssign => Some(Some(BinaryOp::Multiply)),
					Punct::SlashAssign => Some(Some(BinaryOp::Divide)),
					Punct::DotAssign => Some(Some(BinaryOp::Concat)),
					Punct::PercentAssign => Some(Some(BinaryOp::Modulo)),
					_ => None,
				}
			}
			_ => None,
		};

		let Some(op) = op else {
			return Ok(target);
		};
		if !target.is_place() {
			return Err(self.error("cannot assign to this expression"));
		}

		self.cursor += 1;
		let value = self.parse_assignment()?;
		Ok(Expr::Assign {
			target: Box::new(target),
			op,
			value: Box::new(value),
		})
	}

	fn parse_ternary(&mut self) -> KstyleResult<Expr> {
		let condition = self.parse_or()?;
		if !self.eat_punct(Punct::Question) {
			return Ok(condition);
		}

		let then = if self.at_punct(Punct::Colon) {
			None
		} else {
			Some(Box::new(self.parse_assignment()?))
		};
		self.expect_punct(Punct::Colon)?;
		let otherwise = self.parse_assignment()?;

		Ok(Expr::Ternary {
			condition: Box::new(condition),
			then,
			otherwise: Box::new(otherwise),
		})
	}

	fn parse_or(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_and()?;
		while self.eat_punct(Punct::Or) {
			let right = self.parse_and()?;
			left = Expr::binary(BinaryOp::Or, left, right);
		}
		Ok(left)
	}

	fn parse_and(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_comparison()?;
		while self.eat_punct(Punct::And) {
			let right = self.parse_comparison()?;
			left = Expr::binary(BinaryOp::And, left, right);
		}
		Ok(left)
	}

	fn parse_comparison(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_additive()?;
		loop {
			let op = match self.peek() {
				Some(Token::Punct(Punct::Equal)) => BinaryOp::Equal,
				Some(Token::Punct(Punct::NotEqual)) => BinaryOp::NotEqual,
				Some(Token::Punct(Punct::Identical)) => BinaryOp::Identical,
				Some(Token::Punct(Punct::NotIdentical)) => BinaryOp::NotIdentical,
				Some(Token::Punct(Punct::Less)) => BinaryOp::Less,
				Some(Token::Punct(Punct::LessEqual)) => BinaryOp::LessEqual,
				Some(Token::Punct(Punct::Greater)) => BinaryOp::Greater,
				Some(Token::Punct(Punct::GreaterEqual)) => BinaryOp::GreaterEqual,
				_ => return Ok(left),
			};
			self.cursor += 1;
			let right = self.parse_additive()?;
			left = Expr::binary(op, left, right);
		}
	}

	fn parse_additive(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_multiplicative()?;
		loop {
			let op = match self.peek() {
				Some(Token::Punct(Punct::Plus)) => BinaryOp::Add,
				Some(Token::Punct(Punct::Minus)) => BinaryOp::Subtract,
				Some(Token::Punct(Punct::Dot)) => BinaryOp::Concat,
				_ => return Ok(left),
			};
			self.cursor += 1;
			let right = self.parse_multiplicative()?;
			left = Expr::binary(op, left, right);
		}
	}

	fn parse_multiplicative(&mut self) -> KstyleResult<Expr> {
		let mut left = self.parse_unary()?;
		loop {
			let op = match self.peek() {
				Some(Token::Punct(Punct::Star)) => BinaryOp::Multiply,
				Some(Token::Punct(Punct::Slash)) => BinaryOp::Divide,
				Some(Token::Punct(Punct::Percent)) => BinaryOp::Modulo,
				_ => return Ok(left),
			};
			self.cursor += 1;
			let right = self.parse_unary()?;
			left = Expr::binary(op, left, right);
		}
	}

	fn parse_unary(&mut self) -> KstyleResult<Expr> {
		let op = match self.peek() {
			Some(Token::Punct(Punct::Not)) => UnaryOp::Not,
			Some(Token::Punct(Punct::Minus)) => UnaryOp::Negate,
			Some(Token::Punct(Punct::Plus)) => UnaryOp::Plus,
			Some(Token::Punct(punct @ (Punct::Increment | Punct::Decrement))) => {
				let increment = *punct == Punct::Increment;
				self.cursor += 1;
				let target = self.parse_postfix()?;
				if !target.is_place() {
					return Err(self.error("cannot increment or decrement this expression"));
				}
				return Ok(Expr::IncDec {
					target: Box::new(target),
					increment,
					prefix: true,
				});
			}
			_ => return self.parse_postfix(),
		};

		self.cursor += 1;
		let operand = self.parse_unary()?;
		Ok(Expr::Unary {
			op,
			operand: Box::new(operand),
		})
	}

	fn parse_postfix(&mut self) -> KstyleResult<Expr> {
		let mut expr = self.parse_primary()?;

		loop {
			if self.eat_punct(Punct::BracketOpen) {
				if self.eat_punct(Punct::BracketClose) {
					expr = Expr::index(expr, None);
					continue;
				}

				let key = match (self.peek(), self.peek_at(1)) {
					(Some(Token::Ident(ident)), Some(next))
						if next.is_punct(Punct::BracketClose) && !is_constant(ident) =>
					{
						let key = Expr::literal(ident.clone());
						self.cursor += 1;
						key
					}
					_ => self.parse_expression()?,
				};
				self.expect_punct(Punct::BracketClose)?;
				expr = Expr::index(expr, Some(key));
				continue;
			}

			let increment = if self.at_punct(Punct::Increment) {
				true
			} else if self.at_punct(Punct::Decrement) {
				false
			} else {
				return Ok(expr);
			};
			if !expr.is_place() {
				return Ok(expr);
			}
			self.cursor += 1;
			expr = Expr::IncDec {
				target: Box::new(expr),
				increment,
				prefix: false,
			};
		}
	}

	fn parse_primary(&mut self) -> KstyleResult<Expr> {
		let Some(token) = self.advance() else {
			return Err(self.unexpected("an expression"));
		};

		match token {
			Token::Variable { name, local } => Ok(Expr::Variable(self.variable(name, local))),
			Token::Int(number) => Ok(Expr::literal(number)),
			Token::Float(number) => Ok(Expr::literal(number)),
			Token::Str(text) => Ok(Expr::literal(text)),
			Token::Template(parts) => {
				let parts = if self.function_depth > 0 {
					parts.into_iter().map(localize).collect()
				} else {
					parts
				};
				Ok(Expr::Interpolated(parts))
			}
			Token::Punct(Punct::ParenOpen) => {
				let expr = self.parse_expression()?;
				self.expect_punct(Punct::ParenClose)?;
				Ok(expr)
			}
			Token::Punct(Punct::BracketOpen) => self.parse_array_items(Punct::BracketClose),
			Token::Ident(ident) => {
				match ident.to_ascii_lowercase().as_str() {
					"true" => return Ok(Expr::literal(true)),
					"false" => return Ok(Expr::literal(false)),
					"null" => return Ok(Expr::Literal(serde_json::Value::Null)),
					_ => {}
				}

				if !self.eat_punct(Punct::ParenOpen) {
					return Err(self.error(format!("undefined constant `{ident}`")));
				}
				if ident.eq_ignore_ascii_case("array") {
					return self.parse_array_items(Punct::ParenClose);
				}
				let args = self.parse_expression_list(Punct::ParenClose)?;
				Ok(Expr::Call {
					name: ident.to_ascii_lowercase(),
					args,
				})
			}
			other => {
				self.cursor -= 1;
				Err(self.error(format!("unexpected `{other}`, expected an expression")))
			}
		}
	}

	fn parse_array_items(&mut self, end: Punct) -> KstyleResult<Expr> {
		let mut items = Vec::new();
		loop {
			if self.eat_punct(end) {
				return Ok(Expr::Array(items));
			}

			let first = self.parse_expression()?;
			let item = if self.eat_punct(Punct::Arrow) {
				ArrayItem {
					key: Some(first),
					value: self.parse_expression()?,
				}
			} else {
				ArrayItem {
					key: None,
					value: first,
				}
			};
			items.push(item);

			if !self.eat_punct(Punct::Comma) {
				self.expect_punct(end)?;
				return Ok(Expr::Array(items));
			}
		}
	}

	fn variable(&self, name: String, local: bool) -> Variable {
		if let Some(global) = Superglobal::from_name(&name) {
			return Variable::Environment(global);
		}
		if local || self.function_depth > 0 {
			Variable::Local(name)
		} else {
			Variable::Store(name)
		}
	}
}

fn is_constant(ident: &str) -> bool {
	["true", "false", "null"]
		.iter()
		.any(|constant| ident.eq_ignore_ascii_case(constant))
}

/// Rebind store variables of an interpolated string as locals.
fn localize(expr: Expr) -> Expr {
	match expr {
		Expr::Variable(Variable::Store(name)) => Expr::Variable(Variable::Local(name)),
		Expr::Index { base, key } => {
			Expr::Index {
				base: Box::new(localize(*base)),
				key: key.map(|key| Box::new(localize(*key))),
			}
		}
		other => other,
	}
}
