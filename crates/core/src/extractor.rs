//! Incremental JSON extraction over a fragmented text stream.
//!
//! [`JsonExtractor`] accepts text in arbitrary pieces and yields every complete top-level JSON
//! object or array as soon as its brackets balance. It is not a parser: bracket balance is tracked
//! with a small lexer (string mode, escapes, nesting depth) and each balanced span is handed to
//! `serde_json` once.
//!
//! An extractor holds per-stream state and must not be shared between concurrent streams.

use serde_json::Value;

/// Lexical classification of one byte of JSON-ish text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lexeme {
    Open,
    Close,
    StringStart,
    StringEnd,
    /// Any byte inside a string literal, including escape sequences.
    StringByte,
    /// A byte made literal by a preceding backslash outside a string.
    Escaped,
    Other,
}

/// Tracks string mode, escapes and nesting depth one byte at a time.
///
/// Structural bytes are all ASCII, so stepping over UTF-8 input byte by byte is safe: continuation
/// bytes of multi-byte characters never match any of them.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Lexer {
    in_string: bool,
    escaped: bool,
    depth: i64,
}

impl Lexer {
    pub(crate) fn depth(&self) -> i64 {
        self.depth
    }

    pub(crate) fn in_string(&self) -> bool {
        self.in_string
    }

    pub(crate) fn step(&mut self, byte: u8) -> Lexeme {
        if self.escaped {
            self.escaped = false;
            return if self.in_string {
                Lexeme::StringByte
            } else {
                Lexeme::Escaped
            };
        }

        if byte == b'\\' {
            self.escaped = true;
            return if self.in_string {
                Lexeme::StringByte
            } else {
                Lexeme::Escaped
            };
        }

        if byte == b'"' {
            self.in_string = !self.in_string;
            return if self.in_string {
                Lexeme::StringStart
            } else {
                Lexeme::StringEnd
            };
        }

        if self.in_string {
            return Lexeme::StringByte;
        }

        match byte {
            b'{' | b'[' => {
                self.depth += 1;
                Lexeme::Open
            }
            b'}' | b']' => {
                self.depth -= 1;
                Lexeme::Close
            }
            _ => Lexeme::Other,
        }
    }
}

/// Restartable extractor of complete JSON values from a growing text buffer.
#[derive(Debug, Default)]
pub struct JsonExtractor {
    buffer: String,
    /// Bytes of `buffer` already scanned for the candidate currently being built.
    scanned: usize,
    lexer: Lexer,
    /// Drop balanced spans that fail to parse instead of retaining them.
    discard_unparseable: bool,
}

impl JsonExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An extractor that skips past a balanced span that fails to parse and carries on with the
    /// text after it.
    pub fn discarding() -> Self {
        Self {
            discard_unparseable: true,
            ..Self::default()
        }
    }

    /// Appends `chunk` and returns every value that became complete, in stream order.
    ///
    /// Text that does not start (after leading whitespace) with `{` or `[` blocks extraction until
    /// [`reset`](Self::reset) is called. If a balanced span fails to parse, extraction stops for
    /// this call and the span is retained, unless the extractor was built with
    /// [`discarding`](Self::discarding).
    pub fn feed(&mut self, chunk: &str) -> Vec<Value> {
        self.buffer.push_str(chunk);
        let mut values = Vec::new();

        loop {
            if self.scanned == 0 {
                let trimmed = self.buffer.len() - self.buffer.trim_start().len();
                if trimmed > 0 {
                    self.buffer.drain(..trimmed);
                }
            }

            match self.buffer.as_bytes().first() {
                Some(b'{') | Some(b'[') => {}
                _ => break,
            }

            let Some(end) = self.scan_to_balance() else {
                break;
            };

            match serde_json::from_str::<Value>(&self.buffer[..end]) {
                Ok(value) => {
                    values.push(value);
                    self.buffer.drain(..end);
                    self.restart_scan();
                }
                Err(e) => {
                    tracing::debug!("balanced span failed to parse: {}", e);
                    self.restart_scan();
                    if !self.discard_unparseable {
                        break;
                    }
                    self.buffer.drain(..end);
                }
            }
        }

        values
    }

    /// Unconsumed text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Drops all buffered text and scan state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.restart_scan();
    }

    fn restart_scan(&mut self) {
        self.scanned = 0;
        self.lexer = Lexer::default();
    }

    /// Continues scanning from where the previous call stopped. Returns the exclusive end of the
    /// first balanced span, if the buffer now contains one.
    fn scan_to_balance(&mut self) -> Option<usize> {
        let bytes = self.buffer.as_bytes();
        while self.scanned < bytes.len() {
            let byte = bytes[self.scanned];
            self.scanned += 1;
            if self.lexer.step(byte) == Lexeme::Close && self.lexer.depth() == 0 {
                return Some(self.scanned);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STREAM: &str = r#"  {"a":1,"s":"x}y"} [1,[2,{"b":"q\"}"}]]
{"title":"a{b}c","list":["[",""]}"#;

    #[test]
    fn test_single_feed_extracts_all_values() {
        let mut extractor = JsonExtractor::new();
        let values = extractor.feed(STREAM);
        assert_eq!(
            values,
            vec![
                json!({"a": 1, "s": "x}y"}),
                json!([1, [2, {"b": "q\"}"}]]),
                json!({"title": "a{b}c", "list": ["[", ""]}),
            ]
        );
        assert!(extractor.buffer().is_empty());
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_output() {
        let mut whole = JsonExtractor::new();
        let expected = whole.feed(STREAM);

        for size in [1usize, 2, 3, 7, 13] {
            let mut extractor = JsonExtractor::new();
            let mut values = Vec::new();
            let chars: Vec<char> = STREAM.chars().collect();
            for piece in chars.chunks(size) {
                let piece: String = piece.iter().collect();
                values.extend(extractor.feed(&piece));
            }
            assert_eq!(values, expected, "chunk size {}", size);
        }
    }

    #[test]
    fn test_no_emission_until_balanced() {
        let mut extractor = JsonExtractor::new();
        assert!(extractor.feed(r#"{"outer":{"inner":[1,2"#).is_empty());
        assert!(extractor.feed("]}").is_empty());
        let values = extractor.feed("}");
        assert_eq!(values, vec![json!({"outer": {"inner": [1, 2]}})]);
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let mut extractor = JsonExtractor::new();
        let values = extractor.feed(r#"{"title":"a{b}c"}"#);
        assert_eq!(values, vec![json!({"title": "a{b}c"})]);
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let mut extractor = JsonExtractor::new();
        assert!(extractor.feed(r#"{"q":"say \"}"#).is_empty());
        let values = extractor.feed(r#"hi\""}"#);
        assert_eq!(values, vec![json!({"q": "say \"}hi\""})]);
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut extractor = JsonExtractor::new();
        assert!(extractor.feed(r#"{"p":"a\"#).is_empty());
        assert!(extractor.feed(r#""}"#).is_empty());
        let values = extractor.feed(r#""}"#);
        assert_eq!(values, vec![json!({"p": "a\"}"})]);
    }

    #[test]
    fn test_non_json_prefix_blocks_until_reset() {
        let mut extractor = JsonExtractor::new();
        assert!(extractor.feed("```json\n{\"a\":1}").is_empty());
        assert!(extractor.buffer().starts_with("```"));

        extractor.reset();
        assert_eq!(extractor.feed("{\"a\":1}"), vec![json!({"a": 1})]);
    }

    #[test]
    fn test_unparseable_balanced_span_is_retained() {
        let mut extractor = JsonExtractor::new();
        assert!(extractor.feed("{nope}").is_empty());
        assert_eq!(extractor.buffer(), "{nope}");
        assert!(extractor.feed(" {\"a\":1}").is_empty());
    }

    #[test]
    fn test_discarding_extractor_skips_unparseable_span() {
        let mut extractor = JsonExtractor::discarding();
        assert_eq!(extractor.feed(r#"{"a":1}{"b":2,}"#), vec![json!({"a": 1})]);
        assert!(extractor.buffer().is_empty());

        let mut values = Vec::new();
        for ch in r#"{"c":3,,} {"d":4}"#.chars() {
            values.extend(extractor.feed(&ch.to_string()));
        }
        assert_eq!(values, vec![json!({"d": 4})]);
    }

    #[test]
    fn test_multibyte_text_survives_fragmentation() {
        let text = r#"{"title":"café ☕ {déjà}"}"#;
        let mut extractor = JsonExtractor::new();
        let mut values = Vec::new();
        for ch in text.chars() {
            values.extend(extractor.feed(&ch.to_string()));
        }
        assert_eq!(values, vec![json!({"title": "café ☕ {déjà}"})]);
    }
}
