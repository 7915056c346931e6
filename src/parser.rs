/*!
Pratt parser for the Monkey language
====================================

Grammar (condensed EBNF)
------------------------

```text
program        → statement* EOF ;
statement      → letStmt | returnStmt | forStmt | "break" ";"? | "continue" ";"?
               | assignStmt | exprStmt ;
letStmt        → "let" IDENT "=" expression ";"? ;
assignStmt     → IDENT "=" expression ";"? ;
returnStmt     → "return" expression? ";"? ;
forStmt        → "for" "(" simple? ";" expression? ";" simple? ")" block ;
simple         → letStmt | assignStmt | exprStmt      (without the ";")
exprStmt       → expression ";"? ;
block          → "{" statement* "}" ;
expression     → prefix ( infix )* ;                  (precedence climbing)
prefix         → INT | STRING | "true" | "false" | IDENT
               | ( "!" | "-" ) expression
               | "(" expression ")"
               | "[" arguments? "]"
               | "if" "(" expression ")" block ( "else" ( ifExpr | block ) )?
               | "fn" "(" parameters? ")" block ;
infix          → binaryOp expression | "(" arguments? ")" | "[" expression "]" ;
```

Binding power, lowest to highest:

| level        | tokens                 |
|--------------|------------------------|
| `Or`         | `\|\|`                 |
| `And`        | `&&`                   |
| `Equals`     | `==` `!=`              |
| `LessGreater`| `<` `>` `<=` `>=`      |
| `Sum`        | `+` `-`                |
| `Product`    | `*` `/`                |
| `Prefix`     | `!x` `-x`              |
| `Call`       | `f(x)`                 |
| `Index`      | `a[i]`                 |

Syntax errors are collected rather than fatal: after an error the parser
discards tokens up to the next statement boundary and carries on, so a single
run reports every broken top-level statement.
*/

use std::rc::Rc;

use crate::ast::{Block, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::error::{MonkeyError, Result};
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Operator binding power used by the Pratt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    fn of(token_type: &TokenType) -> Self {
        match token_type {
            TokenType::OR => Precedence::Or,
            TokenType::AND => Precedence::And,
            TokenType::EQUAL_EQUAL | TokenType::BANG_EQUAL => Precedence::Equals,
            TokenType::LESS
            | TokenType::GREATER
            | TokenType::LESS_EQUAL
            | TokenType::GREATER_EQUAL => Precedence::LessGreater,
            TokenType::PLUS | TokenType::MINUS => Precedence::Sum,
            TokenType::STAR | TokenType::SLASH => Precedence::Product,
            TokenType::LEFT_PAREN => Precedence::Call,
            TokenType::LEFT_BRACKET => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_operator(token_type: &TokenType) -> Option<InfixOperator> {
    let op = match token_type {
        TokenType::PLUS => InfixOperator::Plus,
        TokenType::MINUS => InfixOperator::Minus,
        TokenType::STAR => InfixOperator::Multiply,
        TokenType::SLASH => InfixOperator::Divide,
        TokenType::LESS => InfixOperator::Less,
        TokenType::GREATER => InfixOperator::Greater,
        TokenType::LESS_EQUAL => InfixOperator::LessEqual,
        TokenType::GREATER_EQUAL => InfixOperator::GreaterEqual,
        TokenType::EQUAL_EQUAL => InfixOperator::Equal,
        TokenType::BANG_EQUAL => InfixOperator::NotEqual,
        TokenType::AND => InfixOperator::And,
        TokenType::OR => InfixOperator::Or,
        _ => return None,
    };

    Some(op)
}

/// Scan and parse `source` in one go.
///
/// Returns every lexical error if scanning failed, otherwise every syntax
/// error if parsing failed.
pub fn parse(source: &str) -> std::result::Result<Program, Vec<MonkeyError>> {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut errors: Vec<MonkeyError> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Parser::new(&tokens).parse()
}

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser. `tokens` must end with the scanner's `EOF`.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program, collecting every syntax error.
    pub fn parse(&mut self) -> std::result::Result<Program, Vec<MonkeyError>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Statement> = Vec::new();
        let mut errors: Vec<MonkeyError> = Vec::new();

        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    debug!("Parse debug: {}", e);
                    errors.push(e);
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            info!("Parsed {} statements", statements.len());
            Ok(Program { statements })
        } else {
            Err(errors)
        }
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Statement> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        let stmt = if self.matches(TokenType::RETURN) {
            self.return_statement()?
        } else if self.matches(TokenType::FOR) {
            self.for_statement()?
        } else if self.matches(TokenType::BREAK) {
            Statement::Break
        } else if self.matches(TokenType::CONTINUE) {
            Statement::Continue
        } else {
            self.simple_statement()?
        };

        self.matches(TokenType::SEMICOLON);

        Ok(stmt)
    }

    /// `let`, reassignment or bare expression, without the trailing `;`.
    fn simple_statement(&mut self) -> Result<Statement> {
        if self.matches(TokenType::LET) {
            let name: &Token<'_> = self.consume(TokenType::IDENT, "Expected variable name")?;

            self.consume(TokenType::EQUAL, "Expected '=' after variable name")?;

            let value: Expression = self.expression(Precedence::Lowest)?;

            return Ok(Statement::Let {
                name: name.lexeme.to_string(),
                value,
            });
        }

        if self.check(TokenType::IDENT) && self.check_next(TokenType::EQUAL) {
            let name: &Token<'_> = self.advance();
            self.advance(); // '='

            let value: Expression = self.expression(Precedence::Lowest)?;

            return Ok(Statement::Assign {
                name: name.lexeme.to_string(),
                value,
            });
        }

        Ok(Statement::Expression(self.expression(Precedence::Lowest)?))
    }

    fn return_statement(&mut self) -> Result<Statement> {
        if self.check(TokenType::SEMICOLON)
            || self.check(TokenType::RIGHT_BRACE)
            || self.is_at_end()
        {
            return Ok(Statement::Return(None));
        }

        Ok(Statement::Return(Some(self.expression(Precedence::Lowest)?)))
    }

    fn for_statement(&mut self) -> Result<Statement> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let init: Option<Box<Statement>> = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop initializer")?;

        let condition: Option<Expression> = if self.check(TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression(Precedence::Lowest)?)
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let update: Option<Box<Statement>> = if self.check(TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before loop body")?;
        let body: Block = self.block()?;

        Ok(Statement::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// Parse statements up to and including the closing `}`. The opening
    /// brace has already been consumed.
    fn block(&mut self) -> Result<Block> {
        let mut statements: Vec<Statement> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;

        Ok(Block { statements })
    }

    // ─────────────────────── expression rules (Pratt) ─────────────

    fn expression(&mut self, precedence: Precedence) -> Result<Expression> {
        let mut left: Expression = self.prefix()?;

        while !self.check(TokenType::SEMICOLON)
            && precedence < Precedence::of(&self.peek().token_type)
        {
            left = self.infix(left)?;
        }

        Ok(left)
    }

    fn prefix(&mut self) -> Result<Expression> {
        if self.is_at_end() {
            return Err(MonkeyError::parse(
                self.peek().line,
                "Expected expression, got end of input",
            ));
        }

        let token: &'a Token<'a> = self.advance();

        match &token.token_type {
            TokenType::INT(n) => Ok(Expression::Integer(*n)),

            TokenType::STRING(s) => Ok(Expression::Str(s.clone())),

            TokenType::TRUE => Ok(Expression::Boolean(true)),

            TokenType::FALSE => Ok(Expression::Boolean(false)),

            TokenType::IDENT => Ok(Expression::Identifier(token.lexeme.to_string())),

            TokenType::BANG | TokenType::MINUS => {
                let operator = if token.token_type == TokenType::BANG {
                    PrefixOperator::Bang
                } else {
                    PrefixOperator::Minus
                };
                let right: Expression = self.expression(Precedence::Prefix)?;

                Ok(Expression::Prefix {
                    operator,
                    right: Box::new(right),
                })
            }

            TokenType::LEFT_PAREN => {
                let expr: Expression = self.expression(Precedence::Lowest)?;

                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

                Ok(expr)
            }

            TokenType::LEFT_BRACKET => Ok(Expression::Array(
                self.expression_list(TokenType::RIGHT_BRACKET, "Expected ']' after elements")?,
            )),

            TokenType::IF => self.if_expression(),

            TokenType::FUNCTION => self.function_literal(),

            _ => Err(MonkeyError::parse(
                token.line,
                format!("Expected expression, got '{}'", token.lexeme),
            )),
        }
    }

    fn infix(&mut self, left: Expression) -> Result<Expression> {
        let token: &'a Token<'a> = self.advance();

        match &token.token_type {
            TokenType::LEFT_PAREN => {
                let arguments: Vec<Expression> =
                    self.expression_list(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

                Ok(Expression::Call {
                    function: Box::new(left),
                    arguments,
                })
            }

            TokenType::LEFT_BRACKET => {
                let index: Expression = self.expression(Precedence::Lowest)?;

                self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

                Ok(Expression::Index {
                    left: Box::new(left),
                    index: Box::new(index),
                })
            }

            other => {
                let operator: InfixOperator = infix_operator(other).ok_or_else(|| {
                    MonkeyError::parse(
                        token.line,
                        format!("Unexpected operator '{}'", token.lexeme),
                    )
                })?;
                let right: Expression = self.expression(Precedence::of(other))?;

                Ok(Expression::Infix {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                })
            }
        }
    }

    fn if_expression(&mut self) -> Result<Expression> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: Expression = self.expression(Precedence::Lowest)?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before if body")?;
        let consequence: Block = self.block()?;

        let alternative: Option<Block> = if self.matches(TokenType::ELSE) {
            if self.matches(TokenType::IF) {
                let nested: Expression = self.if_expression()?;

                Some(Block {
                    statements: vec![Statement::Expression(nested)],
                })
            } else {
                self.consume(TokenType::LEFT_BRACE, "Expected '{' after 'else'")?;

                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn function_literal(&mut self) -> Result<Expression> {
        let fn_token: &Token<'_> = self.previous();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'fn'")?;

        let mut parameters: Vec<String> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if parameters.len() >= 255 {
                    return Err(MonkeyError::parse(
                        fn_token.line,
                        "Cannot have more than 255 parameters",
                    ));
                }

                let param: &Token<'_> =
                    self.consume(TokenType::IDENT, "Expected parameter name")?;

                if parameters.iter().any(|p| p == param.lexeme) {
                    return Err(MonkeyError::parse(
                        param.line,
                        format!("Duplicate parameter name '{}'", param.lexeme),
                    ));
                }

                parameters.push(param.lexeme.to_string());

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body")?;
        let body: Block = self.block()?;

        Ok(Expression::Function {
            parameters,
            body: Rc::new(body),
        })
    }

    /// Comma separated expressions up to `end`, which is consumed.
    fn expression_list(&mut self, end: TokenType, message: &str) -> Result<Vec<Expression>> {
        let mut items: Vec<Expression> = Vec::new();

        if self.matches(end.clone()) {
            return Ok(items);
        }

        loop {
            if items.len() >= 255 && end == TokenType::RIGHT_PAREN {
                return Err(MonkeyError::parse(
                    self.peek().line,
                    "Cannot have more than 255 arguments",
                ));
            }

            items.push(self.expression(Precedence::Lowest)?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(end, message)?;

        Ok(items)
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(MonkeyError::parse(self.peek().line, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::LET | TokenType::FOR | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
