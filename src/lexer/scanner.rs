//! Lexer/Scanner for Rockstar source code.

use crate::error::LexerError;
use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;

/// The lexer transforms source code into a stream of tokens.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
    start_pos: usize,
    start_line: usize,
    start_column: usize,
    /// Tokens emitted on the current line, not counting the newline.
    line_tokens: usize,
    line_has_comment: bool,
    last_word: Option<String>,
    /// Set after `says`/`said`: the rest of the line is a poetic string.
    poetic_pending: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            line_tokens: 0,
            line_has_comment: false,
            last_word: None,
            poetic_pending: false,
        }
    }

    /// Scan all tokens from the source.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Scan the next token.
    pub fn scan_token(&mut self) -> Result<Token, LexerError> {
        if self.poetic_pending {
            self.poetic_pending = false;
            return Ok(self.scan_poetic_string());
        }

        loop {
            self.skip_whitespace_and_comments()?;
            self.mark_start();

            let Some((_, c)) = self.advance() else {
                return Ok(Token::eof(self.current_pos, self.line, self.column));
            };

            return match c {
                '\n' => {
                    let comment_only = self.line_has_comment && self.line_tokens == 0;
                    let token = self.make_token(TokenKind::Newline);
                    self.line += 1;
                    self.column = 1;
                    self.line_tokens = 0;
                    self.line_has_comment = false;
                    self.last_word = None;
                    if comment_only {
                        continue;
                    }
                    Ok(token)
                }
                '"' => self.scan_string(),
                ',' => Ok(self.emit(TokenKind::Comma)),
                '&' => Ok(self.emit(TokenKind::Ampersand)),
                '.' => Ok(self.emit(TokenKind::Dot)),
                '-' if self.peek().is_some_and(|n| n.is_ascii_digit()) => self.scan_number(c),
                '+' | '-' | '*' | '/' => Ok(self.emit(TokenKind::Symbol(c))),
                c if c.is_ascii_digit() => self.scan_number(c),
                c if c.is_alphabetic() || c == '\'' => Ok(self.scan_word(c)),
                _ => Err(LexerError::unexpected_char(c, self.current_span())),
            };
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexerError> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '?' | '!' | ';' | ':') => {
                    self.advance();
                }
                Some('(') => {
                    self.mark_start();
                    self.advance();
                    self.line_has_comment = true;
                    loop {
                        match self.advance() {
                            None => {
                                return Err(LexerError::unterminated_comment(
                                    self.current_span(),
                                ))
                            }
                            Some((_, ')')) => break,
                            Some((_, '\n')) => {
                                self.line += 1;
                                self.column = 1;
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_string(&mut self) -> Result<Token, LexerError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(LexerError::unterminated_string(self.current_span())),
                Some((_, '"')) => break,
                Some((_, '\n')) => {
                    value.push('\n');
                    self.line += 1;
                    self.column = 1;
                }
                Some((_, c)) => value.push(c),
            }
        }
        Ok(self.emit(TokenKind::StringLiteral(value)))
    }

    /// Everything up to the end of the line, after a single separating space.
    fn scan_poetic_string(&mut self) -> Token {
        if self.peek() == Some(' ') {
            self.advance();
        }
        self.mark_start();
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            value.push(c);
            self.advance();
        }
        let value = value.trim_end_matches('\r').to_string();
        self.emit(TokenKind::PoeticString(value))
    }

    fn scan_number(&mut self, first: char) -> Result<Token, LexerError> {
        let mut value = String::from(first);
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else if c == '.' && !is_float && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                is_float = true;
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let n: f64 = value
            .parse()
            .map_err(|_| LexerError::invalid_number(value.clone(), self.current_span()))?;
        Ok(self.emit(TokenKind::Number(n)))
    }

    fn scan_word(&mut self, first: char) -> Token {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '\'' || c == '-' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let lower = value.to_lowercase();
        let first_on_line = self.line_tokens == 0;
        let after_else = self.last_word.as_deref() == Some("else");
        self.poetic_pending = match lower.as_str() {
            "says" | "said" => true,
            "say" => !first_on_line && !after_else,
            _ => false,
        };
        self.last_word = Some(lower);
        self.emit(TokenKind::Word(value))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            self.column += 1;
            Some((pos, c))
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn mark_start(&mut self) {
        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    fn current_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.current_span())
    }

    /// Make a token that counts as content on the current line.
    fn emit(&mut self, kind: TokenKind) -> Token {
        self.line_tokens += 1;
        self.make_token(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(source: &str) -> Vec<TokenKind> {
        Scanner::new(source)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn word(w: &str) -> TokenKind {
        TokenKind::Word(w.to_string())
    }

    #[test]
    fn test_words_and_literals() {
        assert_eq!(
            scan("Shout \"Hello\", 5 & -2.5."),
            vec![
                word("Shout"),
                TokenKind::StringLiteral("Hello".to_string()),
                TokenKind::Comma,
                TokenKind::Number(5.0),
                TokenKind::Ampersand,
                TokenKind::Number(-2.5),
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_apostrophes_stay_in_words() {
        assert_eq!(
            scan("Tommy ain't 'n'"),
            vec![word("Tommy"), word("ain't"), word("'n'"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_and_ignored_punctuation() {
        assert_eq!(
            scan("(a comment)\nSay it! (again)\n\nX"),
            vec![
                word("Say"),
                word("it"),
                TokenKind::Newline,
                TokenKind::Newline,
                word("X"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_poetic_string_after_says() {
        assert_eq!(
            scan("Bob says hello (not a comment), world\nSay Bob"),
            vec![
                word("Bob"),
                word("says"),
                TokenKind::PoeticString("hello (not a comment), world".to_string()),
                TokenKind::Newline,
                word("Say"),
                word("Bob"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_say_after_else_is_output() {
        let kinds = scan("Else say \"x\"");
        assert_eq!(kinds[1], word("say"));
        assert_eq!(kinds[2], TokenKind::StringLiteral("x".to_string()));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            scan("X + 2 - Y"),
            vec![
                word("X"),
                TokenKind::Symbol('+'),
                TokenKind::Number(2.0),
                TokenKind::Symbol('-'),
                word("Y"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let err = Scanner::new("Say \"oops").scan_tokens().unwrap_err();
        assert!(matches!(err, LexerError::UnterminatedString(_)));
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Scanner::new("X is 1\nSay X").scan_tokens().unwrap();
        let say = &tokens[4];
        assert_eq!(say.kind, word("Say"));
        assert_eq!((say.span.line, say.span.column), (2, 1));
    }
}
