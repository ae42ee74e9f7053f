use crate::error::LexError;
use crate::tpl::element::Operator;
use crate::tpl::token::{LexerMode, Token};

/// A cursor-based lexer over a template source.
///
/// The lexer never changes its own [`LexerMode`]; the parser switches it with
/// [`Lexer::set_mode`] whenever the grammar moves between document text, tag
/// names and tag bodies.
pub struct Lexer<'a> {
    /// The template source being tokenized.
    input: &'a str,
    /// Byte offset of the next unread character.
    pos: usize,
    mode: LexerMode,
    /// The most recently produced token, if any.
    token: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            mode: LexerMode::Text,
            token: None,
        }
    }

    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    /// Changes the tokenization rules, starting with the next call to [`Lexer::next_token`].
    pub fn set_mode(&mut self, mode: LexerMode) {
        self.mode = mode;
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Returns the last produced token without advancing.
    pub fn current_token(&self) -> Result<&Token, LexError> {
        self.token
            .as_ref()
            .ok_or_else(|| LexError::new("no token has been produced yet", self.pos))
    }

    /// Produces the next token according to the current mode.
    ///
    /// Once [`Token::Eof`] has been returned every further call fails.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if matches!(self.token, Some(Token::Eof)) {
            return Err(LexError::new("cannot get next token after EOF", self.pos));
        }

        let token = match self.mode {
            LexerMode::Text => self.lex_text()?,
            LexerMode::TagName => self.lex_tag_name()?,
            LexerMode::TagBody => self.lex_tag_body()?,
        };
        self.token = Some(token.clone());
        Ok(token)
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        let skipped = rest.len() - rest.trim_start().len();
        self.advance(skipped);
    }

    /// Greedy `letter (letter | digit | '_')*`; the caller has checked the first letter.
    fn take_identifier(&mut self) -> String {
        let rest = self.remaining();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.advance(len);
        rest[..len].to_string()
    }

    fn lex_text(&mut self) -> Result<Token, LexError> {
        let rest = self.remaining();
        if rest.is_empty() {
            return Ok(Token::Eof);
        }
        if rest.starts_with("{$") {
            self.advance(2);
            return Ok(Token::OpenTag);
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                let escape_at = self.pos;
                self.bump();
                match self.bump() {
                    Some(escaped @ ('{' | '\\')) => text.push(escaped),
                    Some(other) => {
                        return Err(LexError::new(
                            format!("invalid escape outside tag: \\{}", other),
                            escape_at,
                        ));
                    }
                    None => {
                        return Err(LexError::new(
                            "unterminated escape at end of input",
                            escape_at,
                        ));
                    }
                }
                continue;
            }
            if self.remaining().starts_with("{$") {
                break;
            }
            text.push(c);
            self.bump();
        }
        Ok(Token::PlainText(text))
    }

    fn lex_tag_name(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if c == '=' {
            self.bump();
            return Ok(Token::TagName("=".to_string()));
        }
        if !c.is_ascii_alphabetic() {
            return Err(LexError::new(
                format!("invalid tag name start: '{}'", c),
                self.pos,
            ));
        }

        let rest = self.remaining();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.advance(len);
        Ok(Token::TagName(rest[..len].to_string()))
    }

    fn lex_tag_body(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if self.remaining().starts_with("$}") {
            self.advance(2);
            return Ok(Token::CloseTag);
        }
        // `-` directly before a digit always starts a negative number
        let negative = c == '-' && self.peek_second().is_some_and(|d| d.is_ascii_digit());
        if c.is_ascii_digit() || negative {
            return self.lex_number();
        }
        if c.is_alphabetic() {
            return Ok(Token::Variable(self.take_identifier()));
        }
        if c == '@' {
            if !self.peek_second().is_some_and(char::is_alphabetic) {
                return Err(LexError::new("invalid function name after '@'", self.pos));
            }
            self.bump();
            return Ok(Token::Function(self.take_identifier()));
        }
        if c == '"' {
            return self.lex_string();
        }
        if let Some(op) = Operator::from_char(c) {
            self.bump();
            return Ok(Token::Operator(op));
        }

        Err(LexError::new(
            format!("unrecognized character: '{}'", c),
            self.pos,
        ))
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let rest = self.remaining();

        let mut len = usize::from(rest.starts_with('-'));
        len += count_digits(&rest[len..]);

        let mut is_double = false;
        if rest[len..].starts_with('.') {
            let fraction = count_digits(&rest[len + 1..]);
            if fraction == 0 {
                return Err(LexError::new(
                    "double value cannot end with a decimal point",
                    start + len,
                ));
            }
            len += 1 + fraction;
            is_double = true;
        }
        if rest[len..].starts_with('.') {
            return Err(LexError::new("invalid operator: .", start + len));
        }

        let literal = &rest[..len];
        self.advance(len);
        if is_double {
            let value = literal
                .parse::<f64>()
                .map_err(|e| LexError::new(format!("invalid double '{}': {}", literal, e), start))?;
            if !value.is_finite() {
                return Err(LexError::new(
                    format!("double literal out of range: {}", literal),
                    start,
                ));
            }
            Ok(Token::Double(value))
        } else {
            literal.parse::<i64>().map(Token::Integer).map_err(|_| {
                LexError::new(format!("integer literal out of range: {}", literal), start)
            })
        }
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.bump(); // opening quote

        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::new("unterminated string literal", start)),
                Some('"') => break,
                Some('\\') => {
                    let escape_at = self.pos - 1;
                    match self.bump() {
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some(other) => {
                            return Err(LexError::new(
                                format!("invalid escape in string: \\{}", other),
                                escape_at,
                            ));
                        }
                        None => return Err(LexError::new("unterminated string literal", start)),
                    }
                }
                Some(c) => value.push(c),
            }
        }
        Ok(Token::Str(value))
    }
}

fn count_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        lexer.set_mode(LexerMode::TagBody);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_plain_text_then_eof() {
        let mut lexer = Lexer::new("hello world");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::PlainText("hello world".into())
        );
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_empty_input_is_eof() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_next_after_eof_fails() {
        let mut lexer = Lexer::new("");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert!(err.reason.contains("after EOF"));
    }

    #[test]
    fn test_current_token_before_first_call_fails() {
        let mut lexer = Lexer::new("abc");
        assert!(lexer.current_token().is_err());
        lexer.next_token().unwrap();
        assert_eq!(
            lexer.current_token().unwrap(),
            &Token::PlainText("abc".into())
        );
        // does not advance
        assert_eq!(
            lexer.current_token().unwrap(),
            &Token::PlainText("abc".into())
        );
    }

    #[test]
    fn test_text_stops_at_open_tag() {
        let mut lexer = Lexer::new("ab{$");
        assert_eq!(lexer.next_token().unwrap(), Token::PlainText("ab".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::OpenTag);
    }

    #[test]
    fn test_text_escapes() {
        let mut lexer = Lexer::new(r"a \{$ b \\ c");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::PlainText(r"a {$ b \ c".into())
        );
    }

    #[test]
    fn test_lone_brace_is_text() {
        let mut lexer = Lexer::new("a { b $} c");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::PlainText("a { b $} c".into())
        );
    }

    #[test]
    fn test_invalid_text_escape() {
        let mut lexer = Lexer::new(r"Text \$ a");
        let err = lexer.next_token().unwrap_err();
        assert!(err.reason.contains("invalid escape outside tag"));
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_trailing_backslash() {
        let mut lexer = Lexer::new("abc\\");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_tag_names() {
        let mut lexer = Lexer::new("  FOR i");
        lexer.set_mode(LexerMode::TagName);
        assert_eq!(lexer.next_token().unwrap(), Token::TagName("FOR".into()));

        let mut lexer = Lexer::new("=i");
        lexer.set_mode(LexerMode::TagName);
        assert_eq!(lexer.next_token().unwrap(), Token::TagName("=".into()));

        let mut lexer = Lexer::new("END$}");
        lexer.set_mode(LexerMode::TagName);
        assert_eq!(lexer.next_token().unwrap(), Token::TagName("END".into()));
        lexer.set_mode(LexerMode::TagBody);
        assert_eq!(lexer.next_token().unwrap(), Token::CloseTag);
    }

    #[test]
    fn test_tag_name_at_eof() {
        let mut lexer = Lexer::new("   ");
        lexer.set_mode(LexerMode::TagName);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_invalid_tag_name_start() {
        let mut lexer = Lexer::new(" 1FOR");
        lexer.set_mode(LexerMode::TagName);
        let err = lexer.next_token().unwrap_err();
        assert!(err.reason.contains("invalid tag name start"));
    }

    #[test]
    fn test_body_echo_elements() {
        let tokens = body_tokens(r#"i i * @sin "0.000" @decfmt $}"#);
        assert_eq!(
            tokens,
            vec![
                Token::Variable("i".into()),
                Token::Variable("i".into()),
                Token::Operator(Operator::Mul),
                Token::Function("sin".into()),
                Token::Str("0.000".into()),
                Token::Function("decfmt".into()),
                Token::CloseTag,
            ]
        );
    }

    #[test]
    fn test_body_adjacent_tokens() {
        let tokens = body_tokens(r#"i-1.35bbb"1""#);
        assert_eq!(
            tokens,
            vec![
                Token::Variable("i".into()),
                Token::Double(-1.35),
                Token::Variable("bbb".into()),
                Token::Str("1".into()),
            ]
        );
    }

    #[test]
    fn test_minus_before_space_is_operator() {
        let tokens = body_tokens("a - 1");
        assert_eq!(
            tokens,
            vec![
                Token::Variable("a".into()),
                Token::Operator(Operator::Sub),
                Token::Integer(1),
            ]
        );
    }

    #[test]
    fn test_all_operators() {
        let tokens = body_tokens("+ - * / ^");
        let ops: Vec<Token> = [
            Operator::Add,
            Operator::Sub,
            Operator::Mul,
            Operator::Div,
            Operator::Pow,
        ]
        .into_iter()
        .map(Token::Operator)
        .collect();
        assert_eq!(tokens, ops);
    }

    #[test]
    fn test_double_without_fraction_fails() {
        let mut lexer = Lexer::new("3. $}");
        lexer.set_mode(LexerMode::TagBody);
        let err = lexer.next_token().unwrap_err();
        assert!(err.reason.contains("cannot end with a decimal point"));
    }

    #[test]
    fn test_second_decimal_point_fails() {
        let mut lexer = Lexer::new("1.2.3");
        lexer.set_mode(LexerMode::TagBody);
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.reason, "invalid operator: .");
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_integer_overflow_fails() {
        let mut lexer = Lexer::new("99999999999999999999");
        lexer.set_mode(LexerMode::TagBody);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_double_overflow_fails() {
        let input = format!("1{}.5", "0".repeat(400));
        let mut lexer = Lexer::new(&input);
        lexer.set_mode(LexerMode::TagBody);
        let err = lexer.next_token().unwrap_err();
        assert!(err.reason.contains("double literal out of range"));
        assert_eq!(err.offset, 0);

        // largest finite values still lex
        let max = format!("{}.0", -f64::MAX);
        let mut lexer = Lexer::new(&max);
        lexer.set_mode(LexerMode::TagBody);
        assert_eq!(lexer.next_token().unwrap(), Token::Double(-f64::MAX));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = body_tokens(r#""a\"b\\c\nd\te\rf""#);
        assert_eq!(tokens, vec![Token::Str("a\"b\\c\nd\te\rf".into())]);
    }

    #[test]
    fn test_invalid_string_escape() {
        let mut lexer = Lexer::new(r#""a\qb""#);
        lexer.set_mode(LexerMode::TagBody);
        assert!(lexer.next_token().unwrap_err().reason.contains("invalid escape"));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new(r#""abc"#);
        lexer.set_mode(LexerMode::TagBody);
        assert!(lexer.next_token().unwrap_err().reason.contains("unterminated"));
    }

    #[test]
    fn test_unrecognized_character() {
        let mut lexer = Lexer::new("#");
        lexer.set_mode(LexerMode::TagBody);
        assert!(lexer.next_token().unwrap_err().reason.contains("unrecognized"));

        let mut lexer = Lexer::new("$ }");
        lexer.set_mode(LexerMode::TagBody);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_bare_at_sign_fails() {
        let mut lexer = Lexer::new("@1");
        lexer.set_mode(LexerMode::TagBody);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_mode_switch_mid_stream() {
        let mut lexer = Lexer::new("x {$= a $} y");
        assert_eq!(lexer.next_token().unwrap(), Token::PlainText("x ".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::OpenTag);
        lexer.set_mode(LexerMode::TagName);
        assert_eq!(lexer.next_token().unwrap(), Token::TagName("=".into()));
        lexer.set_mode(LexerMode::TagBody);
        assert_eq!(lexer.next_token().unwrap(), Token::Variable("a".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::CloseTag);
        lexer.set_mode(LexerMode::Text);
        assert_eq!(lexer.next_token().unwrap(), Token::PlainText(" y".into()));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
        assert_eq!(lexer.mode(), LexerMode::Text);
    }
}
