use super::error::LexerError;
use super::token::{Token, TokenType};

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    indents: Vec<usize>,
    paren_depth: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            indents: vec![0],
            paren_depth: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        self.handle_line_start()?;

        while !self.is_at_end() {
            self.skip_spaces();
            if self.is_at_end() {
                break;
            }

            self.start = self.current;
            match self.peek() {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    if self.paren_depth == 0 {
                        self.push_token(TokenType::Newline, "");
                        self.handle_line_start()?;
                    }
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => self.scan_token()?,
            }
        }

        if matches!(
            self.tokens.last(),
            Some(token) if !matches!(token.token_type, TokenType::Newline)
        ) {
            self.push_token(TokenType::Newline, "");
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_token(TokenType::Dedent, "");
        }
        self.push_token(TokenType::Eof, "");

        Ok(self.tokens.clone())
    }

    /// Measures the indentation of the next logical line, skipping blank
    /// and comment-only lines, and emits Indent/Dedent tokens as needed.
    fn handle_line_start(&mut self) -> Result<(), LexerError> {
        loop {
            let mut width = 0;
            loop {
                match self.peek() {
                    ' ' | '\t' => {
                        self.advance();
                        width += 1;
                    }
                    '\r' => {
                        self.advance();
                    }
                    _ => break,
                }
            }

            if self.is_at_end() {
                return Ok(());
            }

            match self.peek() {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    continue;
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                    continue;
                }
                _ => {}
            }

            let level = self.indents.last().copied().unwrap_or(0);
            if width > level {
                self.indents.push(width);
                self.push_token(TokenType::Indent, "");
            } else if width < level {
                while self.indents.last().copied().unwrap_or(0) > width {
                    self.indents.pop();
                    self.push_token(TokenType::Dedent, "");
                }
                if self.indents.last().copied().unwrap_or(0) != width {
                    return Err(LexerError {
                        message: "Unindent does not match any outer indentation level"
                            .to_string(),
                        line: self.line,
                    });
                }
            }
            return Ok(());
        }
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), ' ' | '\t' | '\r') && !self.is_at_end() {
            self.advance();
        }
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c = self.advance();
        match c {
            '(' => {
                self.paren_depth += 1;
                self.add_token(TokenType::LeftParen);
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.add_token(TokenType::RightParen);
            }
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            ';' => self.add_token(TokenType::Semicolon),
            '+' => {
                let token_type = if self.match_char('=') {
                    TokenType::PlusAssign
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '-' => {
                let token_type = if self.match_char('=') {
                    TokenType::MinusAssign
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '*' => {
                let token_type = if self.match_char('=') {
                    TokenType::StarAssign
                } else {
                    TokenType::Star
                };
                self.add_token(token_type);
            }
            '%' => {
                let token_type = if self.match_char('=') {
                    TokenType::PercentAssign
                } else {
                    TokenType::Percent
                };
                self.add_token(token_type);
            }
            '/' => {
                let token_type = if self.match_char('/') {
                    if self.match_char('=') {
                        TokenType::DoubleSlashAssign
                    } else {
                        TokenType::DoubleSlash
                    }
                } else if self.match_char('=') {
                    TokenType::SlashAssign
                } else {
                    TokenType::Slash
                };
                self.add_token(token_type);
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Assign
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::NotEqual);
                } else {
                    return Err(LexerError {
                        message: "Unexpected character '!'".to_string(),
                        line: self.line,
                    });
                }
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '"' | '\'' => self.string(c, false)?,
            'f' | 'F' if matches!(self.peek(), '"' | '\'') => {
                let quote = self.advance();
                self.string(quote, true)?;
            }
            '0'..='9' => self.number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            c => {
                return Err(LexerError {
                    message: format!("Unexpected character '{}'", c),
                    line: self.line,
                });
            }
        }
        Ok(())
    }

    // The body is taken verbatim between the quotes; there are no escape
    // sequences in this subset.
    fn string(&mut self, quote: char, interpolated: bool) -> Result<(), LexerError> {
        let value_start = self.current;
        while !self.is_at_end() && self.peek() != quote && self.peek() != '\n' {
            self.advance();
        }
        if self.is_at_end() || self.peek() == '\n' {
            return Err(LexerError {
                message: "Unterminated string literal".to_string(),
                line: self.line,
            });
        }
        let value: String = self.source[value_start..self.current].iter().collect();
        self.advance(); // closing quote
        self.add_token(TokenType::Str {
            value,
            interpolated,
        });
        Ok(())
    }

    fn number(&mut self) -> Result<(), LexerError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == '.' {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: String = self.source[self.start..self.current].iter().collect();
        if is_float {
            let value = lexeme.parse::<f64>().map_err(|_| LexerError {
                message: format!("Invalid float literal '{}'", lexeme),
                line: self.line,
            })?;
            self.add_token(TokenType::Float(value));
        } else {
            self.add_token(TokenType::Int(lexeme));
        }
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let lexeme: String = self.source[self.start..self.current].iter().collect();
        let token_type = match lexeme.as_str() {
            "def" => TokenType::Def,
            "if" => TokenType::If,
            "elif" => TokenType::Elif,
            "else" => TokenType::Else,
            "while" => TokenType::While,
            "return" => TokenType::Return,
            "break" => TokenType::Break,
            "continue" => TokenType::Continue,
            "and" => TokenType::And,
            "or" => TokenType::Or,
            "not" => TokenType::Not,
            "True" => TokenType::True,
            "False" => TokenType::False,
            "None" => TokenType::None,
            _ => TokenType::Identifier(lexeme.clone()),
        };
        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token {
            token_type,
            lexeme,
            line: self.line,
        });
    }

    fn push_token(&mut self, token_type: TokenType, lexeme: &str) {
        self.tokens.push(Token {
            token_type,
            lexeme: lexeme.to_string(),
            line: self.line,
        });
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.current += 1;
            return true;
        }
        false
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}
