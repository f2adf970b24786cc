//! Recursive-descent parser producing the syntax tree.
//!
//! Operates over the token stream from the lexer; layout is driven by the
//! Newline/Indent/Dedent tokens. `parse_expression` is the entry point used
//! for interpolated-string fragments, where layout is not significant.

use crate::ast::*;
use crate::bigint::BigInt;
use crate::lexer::{tokenize, Token, TokenType};

#[cfg(test)]
mod tests;

/// Error type for parsing failures
#[derive(Debug)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Line number where the error occurred
    pub line: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Main entry point for parsing tokens into a syntax tree.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens);
    let statements = parser.parse_program()?;
    Ok(Program { statements })
}

/// Parses a standalone source string as a single expression fragment.
///
/// This is the interface the interpolated-string evaluator uses: the text
/// between `{` and `}` is handed here and the resulting subtree evaluated
/// in the surrounding environment. Layout tokens carry no meaning inside a
/// fragment and are discarded. A comma-separated fragment forms a tuple.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source).map_err(|e| ParseError {
        message: e.message,
        line: e.line,
    })?;
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| {
            !matches!(
                t.token_type,
                TokenType::Newline | TokenType::Indent | TokenType::Dedent
            )
        })
        .collect();

    let mut parser = Parser::new(&tokens);
    let expr = parser.testlist()?;
    if !parser.is_at_end() {
        return Err(ParseError {
            message: format!(
                "Unexpected {:?} after expression",
                parser.peek().token_type
            ),
            line: parser.peek().line,
        });
    }
    Ok(expr)
}

/// Main parser struct that coordinates the parsing process
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse_program(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.match_token(&TokenType::Newline) {
                continue;
            }
            statements.extend(self.statement()?);
        }

        Ok(statements)
    }

    /// Parses one line of statements: a compound statement or a
    /// semicolon-separated run of simple statements.
    fn statement(&mut self) -> Result<Vec<Statement>, ParseError> {
        if self.match_token(&TokenType::Def) {
            return Ok(vec![self.function_def()?]);
        }
        if self.match_token(&TokenType::If) {
            return Ok(vec![self.if_statement()?]);
        }
        if self.match_token(&TokenType::While) {
            return Ok(vec![self.while_statement()?]);
        }
        self.simple_line()
    }

    fn simple_line(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = vec![self.small_statement()?];

        while self.match_token(&TokenType::Semicolon) {
            if self.check(&TokenType::Newline) || self.is_at_end() {
                break;
            }
            statements.push(self.small_statement()?);
        }

        if !self.match_token(&TokenType::Newline) && !self.is_at_end() {
            return Err(ParseError {
                message: format!(
                    "Expected end of line, got {:?}",
                    self.peek().token_type
                ),
                line: self.peek().line,
            });
        }

        Ok(statements)
    }

    fn small_statement(&mut self) -> Result<Statement, ParseError> {
        if self.match_token(&TokenType::Break) {
            return Ok(Statement::Break);
        }
        if self.match_token(&TokenType::Continue) {
            return Ok(Statement::Continue);
        }
        if self.match_token(&TokenType::Return) {
            let value = if self.check(&TokenType::Newline)
                || self.check(&TokenType::Semicolon)
                || self.is_at_end()
            {
                None
            } else {
                Some(self.testlist()?)
            };
            return Ok(Statement::Return { value });
        }
        self.expression_statement()
    }

    fn expression_statement(&mut self) -> Result<Statement, ParseError> {
        let first = self.testlist()?;

        if let Some(op) = self.match_augmented_op() {
            let name = match first {
                Expr::Name(name) => name,
                _ => {
                    return Err(ParseError {
                        message: "Invalid augmented assignment target".to_string(),
                        line: self.previous().line,
                    });
                }
            };
            let value = self.testlist()?;
            return Ok(Statement::AugAssign { name, op, value });
        }

        if !self.check(&TokenType::Assign) {
            return Ok(Statement::Expression(first));
        }

        let mut testlists = vec![first];
        while self.match_token(&TokenType::Assign) {
            testlists.push(self.testlist()?);
        }

        let value = testlists.pop().unwrap_or(Expr::Literal(Literal::None));
        for target in &testlists {
            self.validate_target(target)?;
        }

        Ok(Statement::Assign {
            targets: testlists,
            value,
        })
    }

    fn validate_target(&self, target: &Expr) -> Result<(), ParseError> {
        let valid = match target {
            Expr::Name(_) => true,
            Expr::Tuple(elements) => elements.iter().all(|e| matches!(e, Expr::Name(_))),
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(ParseError {
                message: "Invalid assignment target".to_string(),
                line: self.previous().line,
            })
        }
    }

    fn match_augmented_op(&mut self) -> Option<BinaryOperator> {
        let op = match self.peek().token_type {
            TokenType::PlusAssign => BinaryOperator::Plus,
            TokenType::MinusAssign => BinaryOperator::Minus,
            TokenType::StarAssign => BinaryOperator::Star,
            TokenType::SlashAssign => BinaryOperator::Slash,
            TokenType::DoubleSlashAssign => BinaryOperator::DoubleSlash,
            TokenType::PercentAssign => BinaryOperator::Percent,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn function_def(&mut self) -> Result<Statement, ParseError> {
        let name = self.consume_identifier("Expected function name")?;
        self.consume(&TokenType::LeftParen, "Expected '(' after function name")?;

        let mut parameters = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param_name = self.consume_identifier("Expected parameter name")?;
                let default = if self.match_token(&TokenType::Assign) {
                    Some(self.test()?)
                } else {
                    // Defaults align to the trailing parameters only.
                    if parameters.iter().any(|p: &Parameter| p.default.is_some()) {
                        return Err(ParseError {
                            message: "Non-default parameter follows default parameter"
                                .to_string(),
                            line: self.previous().line,
                        });
                    }
                    None
                };
                parameters.push(Parameter {
                    name: param_name,
                    default,
                });

                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RightParen, "Expected ')' after parameters")?;
        self.consume(&TokenType::Colon, "Expected ':' after function signature")?;
        let body = self.suite()?;

        Ok(Statement::FunctionDef {
            name,
            parameters,
            body,
        })
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let mut branches = Vec::new();

        let condition = self.test()?;
        self.consume(&TokenType::Colon, "Expected ':' after if condition")?;
        branches.push(IfBranch {
            condition,
            body: self.suite()?,
        });

        while self.match_token(&TokenType::Elif) {
            let condition = self.test()?;
            self.consume(&TokenType::Colon, "Expected ':' after elif condition")?;
            branches.push(IfBranch {
                condition,
                body: self.suite()?,
            });
        }

        let else_body = if self.match_token(&TokenType::Else) {
            self.consume(&TokenType::Colon, "Expected ':' after 'else'")?;
            Some(self.suite()?)
        } else {
            None
        };

        Ok(Statement::If {
            branches,
            else_body,
        })
    }

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let condition = self.test()?;
        self.consume(&TokenType::Colon, "Expected ':' after while condition")?;
        let body = self.suite()?;

        Ok(Statement::While { condition, body })
    }

    /// A suite is either inline simple statements or an indented block.
    fn suite(&mut self) -> Result<Vec<Statement>, ParseError> {
        if !self.match_token(&TokenType::Newline) {
            return self.simple_line();
        }

        self.consume(&TokenType::Indent, "Expected an indented block")?;

        let mut statements = Vec::new();
        while !self.check(&TokenType::Dedent) && !self.is_at_end() {
            if self.match_token(&TokenType::Newline) {
                continue;
            }
            statements.extend(self.statement()?);
        }

        self.consume(&TokenType::Dedent, "Expected dedent after block")?;
        Ok(statements)
    }

    /// testlist: one test, or a comma-separated tuple of tests. A trailing
    /// comma makes a tuple, so `x,` is a singleton.
    fn testlist(&mut self) -> Result<Expr, ParseError> {
        let first = self.test()?;
        if !self.check(&TokenType::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&TokenType::Comma) {
            if !self.starts_test() {
                break;
            }
            elements.push(self.test()?);
        }
        Ok(Expr::Tuple(elements))
    }

    fn starts_test(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Identifier(_)
                | TokenType::Int(_)
                | TokenType::Float(_)
                | TokenType::Str { .. }
                | TokenType::True
                | TokenType::False
                | TokenType::None
                | TokenType::Not
                | TokenType::Minus
                | TokenType::Plus
                | TokenType::LeftParen
        )
    }

    fn test(&mut self) -> Result<Expr, ParseError> {
        self.or_test()
    }

    fn or_test(&mut self) -> Result<Expr, ParseError> {
        let first = self.and_test()?;
        if !self.check(&TokenType::Or) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.match_token(&TokenType::Or) {
            operands.push(self.and_test()?);
        }
        Ok(Expr::BoolChain {
            op: BoolOperator::Or,
            operands,
        })
    }

    fn and_test(&mut self) -> Result<Expr, ParseError> {
        let first = self.not_test()?;
        if !self.check(&TokenType::And) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.match_token(&TokenType::And) {
            operands.push(self.not_test()?);
        }
        Ok(Expr::BoolChain {
            op: BoolOperator::And,
            operands,
        })
    }

    fn not_test(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::Not) {
            let operand = self.not_test()?;
            return Ok(Expr::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.arith_expr()?;

        let mut comparisons = Vec::new();
        while let Some(op) = self.match_compare_op() {
            comparisons.push((op, self.arith_expr()?));
        }

        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            comparisons,
        })
    }

    fn match_compare_op(&mut self) -> Option<CompareOperator> {
        let op = match self.peek().token_type {
            TokenType::Less => CompareOperator::Less,
            TokenType::LessEqual => CompareOperator::LessEqual,
            TokenType::Greater => CompareOperator::Greater,
            TokenType::GreaterEqual => CompareOperator::GreaterEqual,
            TokenType::EqualEqual => CompareOperator::Equal,
            TokenType::NotEqual => CompareOperator::NotEqual,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn arith_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;

        loop {
            let op = if self.match_token(&TokenType::Plus) {
                BinaryOperator::Plus
            } else if self.match_token(&TokenType::Minus) {
                BinaryOperator::Minus
            } else {
                break;
            };
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;

        loop {
            let op = if self.match_token(&TokenType::Star) {
                BinaryOperator::Star
            } else if self.match_token(&TokenType::Slash) {
                BinaryOperator::Slash
            } else if self.match_token(&TokenType::DoubleSlash) {
                BinaryOperator::DoubleSlash
            } else if self.match_token(&TokenType::Percent) {
                BinaryOperator::Percent
            } else {
                break;
            };
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::Minus) {
            let operand = self.factor()?;
            return Ok(Expr::Unary {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }
        if self.match_token(&TokenType::Plus) {
            // Unary plus is the identity on every value it applies to.
            return self.factor();
        }
        self.atom_expr()
    }

    fn atom_expr(&mut self) -> Result<Expr, ParseError> {
        let atom = self.atom()?;

        if !self.match_token(&TokenType::LeftParen) {
            return Ok(atom);
        }

        // The only trailer in this subset is a call, and the callee must
        // be a plain name.
        let function = match atom {
            Expr::Name(name) => name,
            _ => {
                return Err(ParseError {
                    message: "Only named functions can be called".to_string(),
                    line: self.previous().line,
                });
            }
        };

        let mut args = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                args.push(self.argument()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenType::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::Call { function, args })
    }

    fn argument(&mut self) -> Result<Argument, ParseError> {
        let value = self.test()?;
        if !self.match_token(&TokenType::Assign) {
            return Ok(Argument { name: None, value });
        }

        let name = match value {
            Expr::Name(name) => name,
            _ => {
                return Err(ParseError {
                    message: "Keyword argument name must be an identifier".to_string(),
                    line: self.previous().line,
                });
            }
        };
        let value = self.test()?;
        Ok(Argument {
            name: Some(name),
            value,
        })
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::True) {
            return Ok(Expr::Literal(Literal::Boolean(true)));
        }
        if self.match_token(&TokenType::False) {
            return Ok(Expr::Literal(Literal::Boolean(false)));
        }
        if self.match_token(&TokenType::None) {
            return Ok(Expr::Literal(Literal::None));
        }

        if let TokenType::Identifier(name) = &self.peek().token_type {
            let name = name.clone();
            self.advance();
            return Ok(Expr::Name(name));
        }

        if let TokenType::Int(digits) = &self.peek().token_type {
            let value: BigInt = digits.parse().map_err(|_| ParseError {
                message: format!("Invalid integer literal '{}'", digits),
                line: self.peek().line,
            })?;
            self.advance();
            return Ok(Expr::Literal(Literal::Int(value)));
        }

        if let TokenType::Float(value) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(Literal::Float(value)));
        }

        if matches!(self.peek().token_type, TokenType::Str { .. }) {
            // Adjacent string literals concatenate into a single atom.
            let mut parts = Vec::new();
            loop {
                let part = match &self.peek().token_type {
                    TokenType::Str {
                        value,
                        interpolated,
                    } => StringPart {
                        text: value.clone(),
                        interpolated: *interpolated,
                    },
                    _ => break,
                };
                self.advance();
                parts.push(part);
            }
            return Ok(Expr::Str { parts });
        }

        if self.match_token(&TokenType::LeftParen) {
            let expr = self.testlist()?;
            self.consume(&TokenType::RightParen, "Expected ')' after expression")?;
            return Ok(expr);
        }

        Err(ParseError {
            message: format!("Expected expression, got {:?}", self.peek().token_type),
            line: self.peek().line,
        })
    }

    fn consume_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        if let TokenType::Identifier(name) = &self.peek().token_type {
            let name = name.clone();
            self.advance();
            return Ok(name);
        }
        Err(ParseError {
            message: message.to_string(),
            line: self.peek().line,
        })
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true;
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
            || matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token, ParseError> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        Err(ParseError {
            message: message.to_string(),
            line: self.peek().line,
        })
    }
}
