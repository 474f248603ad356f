mod cursor;
mod token;

use cursor::Cursor;
pub use token::{is_keyword, Token, TokenKind, KEYWORDS, MAX_TOKEN_LEN};

/// A streaming tokenizer. Tokens are produced one at a time and never
/// retained; after the input is exhausted every further call returns
/// [`Token::eof`]. No byte sequence makes it fail: unrecognized bytes come
/// out as single-character operator tokens.
pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// The two-character operators formed by lookahead: `= < > !` followed by
/// `=`, and `+ - & |` doubled.
fn is_operator_pair(first: char, second: char) -> bool {
    matches!(
        (first, second),
        ('=', '=')
            | ('!', '=')
            | ('<', '=')
            | ('>', '=')
            | ('+', '+')
            | ('-', '-')
            | ('&', '&')
            | ('|', '|')
    )
}

fn push_bounded(lexeme: &mut String, c: char) {
    if lexeme.len() < MAX_TOKEN_LEN - 1 {
        lexeme.push(c);
    }
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        let cursor = Cursor::new(source);
        Self { cursor }
    }

    /// Returns the next token, or an EOF token once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let Some(first) = self.cursor.peek() else {
            return Token::eof();
        };

        match first {
            c if is_word_start(c) => self.lex_word(),
            '0'..='9' => self.lex_number(),
            '"' => self.lex_string(),
            '{' | '}' | '[' | ']' | '(' | ')' | ';' | ',' => {
                self.cursor.take();
                Token::new(TokenKind::Punctuator, first)
            }
            _ => self.lex_operator(),
        }
    }

    /// Skips whitespace, `// ...` line comments and `/* ... */` block
    /// comments. Block comments do not nest; an unterminated one runs to EOF.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.skip_whitespaces();
            match (self.cursor.peek(), self.cursor.peek_2nd()) {
                (Some('/'), Some('/')) => {
                    while self.cursor.skip_if(|c| c != '\n') {}
                }
                (Some('/'), Some('*')) => {
                    self.cursor.take();
                    self.cursor.take();
                    while let Some(c) = self.cursor.take() {
                        if c == '*' && self.cursor.peek() == Some('/') {
                            self.cursor.take();
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_word(&mut self) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.cursor.peek().filter(|c| is_word_continue(*c)) {
            self.cursor.take();
            push_bounded(&mut lexeme, c);
        }
        let kind = if is_keyword(&lexeme) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, lexeme)
    }

    fn lex_number(&mut self) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.cursor.peek().filter(char::is_ascii_digit) {
            self.cursor.take();
            push_bounded(&mut lexeme, c);
        }
        Token::new(TokenKind::Number, lexeme)
    }

    /// Reads up to and including the closing quote. Escape pairs are copied
    /// through literally, backslash included; an unterminated literal ends at
    /// EOF without its closing quote.
    fn lex_string(&mut self) -> Token {
        let mut lexeme = String::new();
        self.cursor.take();
        push_bounded(&mut lexeme, '"');

        while let Some(c) = self.cursor.take() {
            match c {
                '\\' => {
                    push_bounded(&mut lexeme, c);
                    if let Some(escaped) = self.cursor.take() {
                        push_bounded(&mut lexeme, escaped);
                    }
                }
                '"' => {
                    push_bounded(&mut lexeme, c);
                    break;
                }
                _ => push_bounded(&mut lexeme, c),
            }
        }

        Token::new(TokenKind::String, lexeme)
    }

    fn lex_operator(&mut self) -> Token {
        let first = self.cursor.take().expect("peeked before calling");
        let mut lexeme = String::from(first);
        if let Some(second) = self.cursor.peek() {
            if is_operator_pair(first, second) {
                self.cursor.take();
                lexeme.push(second);
            }
        }
        Token::new(TokenKind::Operator, lexeme)
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (!token.is_eof()).then_some(token)
    }
}
