//! Quote-aware tokenizer for the argument stream.
//!
//! Tokens are separated by unquoted, unescaped delimiter bytes. Single or
//! double quotes protect delimiters until the matching quote; a backslash
//! makes the next byte literal, both outside and inside quotes.

use std::fmt;
use std::io::{self, BufRead, Bytes, Read};

use thiserror::Error;

/// Bytes that end a token in the unquoted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    set: Vec<u8>,
}

impl Delimiters {
    /// ASCII whitespace as C `isspace` sees it.
    pub fn whitespace() -> Self {
        Self::from_set(b" \t\n\x0b\x0c\r")
    }

    /// Replace the default set entirely with `set`.
    pub fn from_set(set: &[u8]) -> Self {
        let mut set = set.to_vec();
        set.sort_unstable();
        set.dedup();
        Self { set }
    }

    pub fn contains(&self, byte: u8) -> bool {
        self.set.binary_search(&byte).is_ok()
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::whitespace()
    }
}

/// Fixed-ceiling token storage, reused across tokens.
#[derive(Debug)]
pub struct TokenBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl TokenBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drop the contents but keep the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    fn push(&mut self, byte: u8) -> Result<(), TokenizeError> {
        if self.bytes.len() >= self.limit {
            return Err(TokenizeError::Overflow { limit: self.limit });
        }
        self.bytes.push(byte);
        Ok(())
    }
}

/// Which quote character opened a quoted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
}

impl Quote {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'\'' => Some(Quote::Single),
            b'"' => Some(Quote::Double),
            _ => None,
        }
    }

    fn byte(self) -> u8 {
        match self {
            Quote::Single => b'\'',
            Quote::Double => b'"',
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quote::Single => f.write_str("single"),
            Quote::Double => f.write_str("double"),
        }
    }
}

/// Parser state for one token.
///
/// `Escaped` carries the quote it returns to, so a backslash inside quotes
/// does not end the quoted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Normal,
    Quoted(Quote),
    Escaped { resume: Option<Quote> },
}

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("input token exceeds buffer size ({limit} bytes)")]
    Overflow { limit: usize },
    #[error("missing closing {quote}-quote, aborting")]
    UnterminatedQuote { quote: Quote },
    #[error("read input")]
    Read(#[from] io::Error),
}

/// Lazy token producer over a byte stream.
pub struct Tokenizer<R> {
    input: Bytes<R>,
    delimiters: Delimiters,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R, delimiters: Delimiters) -> Self {
        Self {
            input: reader.bytes(),
            delimiters,
        }
    }

    /// Read the next token into `buf`.
    ///
    /// Returns `Ok(Some(len))` for a token (possibly zero-length when two
    /// delimiters are adjacent) and `Ok(None)` once the stream is exhausted.
    pub fn next_token(&mut self, buf: &mut TokenBuffer) -> Result<Option<usize>, TokenizeError> {
        buf.clear();
        let mut state = ParseState::Normal;

        for byte in self.input.by_ref() {
            let byte = byte?;
            match state {
                ParseState::Normal => {
                    if self.delimiters.contains(byte) {
                        return Ok(Some(buf.len()));
                    }
                    if byte == b'\\' {
                        state = ParseState::Escaped { resume: None };
                        continue;
                    }
                    if let Some(quote) = Quote::from_byte(byte) {
                        state = ParseState::Quoted(quote);
                        continue;
                    }
                }
                ParseState::Quoted(quote) => {
                    if byte == b'\\' {
                        state = ParseState::Escaped {
                            resume: Some(quote),
                        };
                        continue;
                    }
                    if byte == quote.byte() {
                        state = ParseState::Normal;
                        continue;
                    }
                }
                ParseState::Escaped { resume } => {
                    state = match resume {
                        Some(quote) => ParseState::Quoted(quote),
                        None => ParseState::Normal,
                    };
                }
            }
            buf.push(byte)?;
        }

        match state {
            ParseState::Quoted(quote)
            | ParseState::Escaped {
                resume: Some(quote),
            } => Err(TokenizeError::UnterminatedQuote { quote }),
            ParseState::Normal | ParseState::Escaped { resume: None } => {
                if buf.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(buf.len()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_with(input: &str, delimiters: Delimiters) -> Result<Vec<String>, TokenizeError> {
        let mut tokenizer = Tokenizer::new(input.as_bytes(), delimiters);
        let mut buf = TokenBuffer::new(1024);
        let mut out = Vec::new();
        while let Some(len) = tokenizer.next_token(&mut buf)? {
            assert_eq!(len, buf.len());
            out.push(String::from_utf8_lossy(buf.as_bytes()).into_owned());
        }
        Ok(out)
    }

    fn tokens(input: &str) -> Vec<String> {
        tokens_with(input, Delimiters::whitespace()).expect("tokenize")
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokens("a b c"), vec!["a", "b", "c"]);
        assert_eq!(tokens("a\tb\nc\n"), vec!["a", "b", "c"]);
    }

    #[test]
    fn quotes_preserve_delimiters() {
        assert_eq!(tokens("'a b' c"), vec!["a b", "c"]);
        assert_eq!(tokens("\"x  y\"z"), vec!["x  yz"]);
    }

    #[test]
    fn other_quote_is_literal_inside_quotes() {
        assert_eq!(tokens("\"it's\" 'say \"hi\"'"), vec!["it's", "say \"hi\""]);
    }

    #[test]
    fn backslash_escapes_delimiter() {
        assert_eq!(tokens("a\\ b c"), vec!["a b", "c"]);
    }

    #[test]
    fn backslash_escapes_quote_and_backslash() {
        assert_eq!(tokens("\\'a \\\\b"), vec!["'a", "\\b"]);
    }

    #[test]
    fn backslash_inside_quotes_stays_quoted() {
        assert_eq!(tokens("'a\\'b c' d"), vec!["a'b c", "d"]);
        assert_eq!(tokens("\"a\\\\\" e"), vec!["a\\", "e"]);
    }

    #[test]
    fn unterminated_quote_is_error() {
        let err = tokens_with("'unterminated", Delimiters::whitespace()).unwrap_err();
        assert!(matches!(
            err,
            TokenizeError::UnterminatedQuote {
                quote: Quote::Single
            }
        ));
        assert_eq!(err.to_string(), "missing closing single-quote, aborting");
    }

    #[test]
    fn escape_at_end_of_quoted_input_is_unterminated() {
        let err = tokens_with("ok \"abc\\", Delimiters::whitespace()).unwrap_err();
        assert!(matches!(
            err,
            TokenizeError::UnterminatedQuote {
                quote: Quote::Double
            }
        ));
    }

    #[test]
    fn trailing_backslash_is_dropped() {
        assert_eq!(tokens("a b\\"), vec!["a", "b"]);
    }

    #[test]
    fn adjacent_delimiters_yield_empty_token() {
        assert_eq!(tokens("a  b"), vec!["a", "", "b"]);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokens("").is_empty());
    }

    #[test]
    fn custom_delimiters_replace_whitespace() {
        let out = tokens_with("a b,c", Delimiters::from_set(b",")).expect("tokenize");
        assert_eq!(out, vec!["a b", "c"]);
    }

    #[test]
    fn empty_delimiter_set_reads_whole_stream() {
        let out = tokens_with("a b\nc", Delimiters::from_set(b"")).expect("tokenize");
        assert_eq!(out, vec!["a b\nc"]);
    }

    #[test]
    fn overflow_is_error() {
        let mut tokenizer = Tokenizer::new("abc defg".as_bytes(), Delimiters::whitespace());
        let mut buf = TokenBuffer::new(3);
        assert_eq!(tokenizer.next_token(&mut buf).expect("first"), Some(3));
        let err = tokenizer.next_token(&mut buf).unwrap_err();
        assert!(matches!(err, TokenizeError::Overflow { limit: 3 }));
    }

    #[test]
    fn buffer_keeps_allocation_between_tokens() {
        let mut tokenizer = Tokenizer::new("abcdef g".as_bytes(), Delimiters::whitespace());
        let mut buf = TokenBuffer::new(64);
        tokenizer.next_token(&mut buf).expect("first");
        let capacity = buf.bytes.capacity();
        tokenizer.next_token(&mut buf).expect("second");
        assert_eq!(buf.as_bytes(), b"g");
        assert_eq!(buf.bytes.capacity(), capacity);
    }
}
