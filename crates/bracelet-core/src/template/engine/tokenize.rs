//! Tokenization for template engine
//!
//! Provides O(n) tokenization of `{{...}}` and `{{{...}}}` tags using a state machine.

/// Token classification
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// {{expr}} (escaped output) or {{{expr}}} (raw output)
    Expression { source: String, raw: bool },

    /// {{! comment }} or {{!-- comment --}}
    Comment,

    /// {{#name args}}, {{^name}}, {{#> partial}}, {{#*inline "x"}}
    BlockStart { keyword: String, args: String },

    /// {{/name}}
    BlockEnd { keyword: String },

    /// {{> partial}}
    Partial { name: String },
}

/// A single tag with position and classification
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    /// Token classification
    pub kind: TokenKind,
    /// Absolute byte position of the opening `{{` in template
    pub start: usize,
    /// Total length in bytes including the braces
    pub length: usize,
    /// Number of backslashes before the opening `{{`
    /// Odd count = escaped (literal), even = real (processed)
    pub backslash_count: usize,
    /// Line number where the tag starts (for error messages)
    pub line: usize,
}

impl Token {
    /// Check if this token is escaped (odd backslash count)
    pub fn is_escaped(&self) -> bool {
        self.backslash_count % 2 == 1
    }
}

/// Tokenization state machine
///
/// # State Transitions
///
/// ```text
/// Normal ──{───> SeenLBrace ──{───> InToken ──}───> SeenRBrace ──}(×1 or ×2)──> [Yield Token] → Normal
///   │               │                  │                  │
///   │ (not {)       │ (not {)          │ (not })          │ (not })
///   └──────────────>└─────────────────>└─────────────────>└──────────> InToken
/// ```
///
/// A third `{` right after `{{` opens a raw tag that needs `}}}` to close.
/// A `{{!--` comment stays in `InToken` until its content ends with `--`.
/// An opening without its closing braces is recorded and reported through
/// [`TokenStream::unclosed_line`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScanState {
    /// Normal text scanning, counting consecutive backslashes
    Normal { backslash_count: usize },

    /// Seen first `{`, checking for second `{`
    SeenLBrace { pos: usize, backslash_count: usize },

    /// Inside a tag, scanning until the closing braces
    InToken {
        start: usize,
        content_start: usize,
        backslash_count: usize,
        raw: bool,
        line: usize,
    },

    /// Seen one or more `}` inside a tag
    SeenRBrace {
        start: usize,
        content_start: usize,
        rbrace_pos: usize,
        braces: usize,
        backslash_count: usize,
        raw: bool,
        line: usize,
    },
}

/// Iterator over tokens in a template string
///
/// # Performance
///
/// - **O(n) guarantee**: each byte is processed at most twice
/// - **Forward-only**: position never moves backward
pub(crate) struct TokenStream<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: ScanState,
    line: usize,
    step_count: usize,
    unclosed: Option<usize>,
}

impl<'a> TokenStream<'a> {
    /// Create a new TokenStream from template text
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            state: ScanState::Normal { backslash_count: 0 },
            line: 1,
            step_count: 0,
            unclosed: None,
        }
    }

    /// Line of a tag opened but never closed, once the stream is exhausted
    pub fn unclosed_line(&self) -> Option<usize> {
        self.unclosed
    }

    /// Classify tag content into TokenKind
    fn classify_content(content: &str, raw: bool) -> TokenKind {
        if raw {
            return TokenKind::Expression {
                source: content.trim().to_string(),
                raw: true,
            };
        }

        // Whitespace control markers do not change the tag's meaning
        let trimmed = content.trim().trim_matches('~').trim();

        if trimmed.starts_with('!') {
            TokenKind::Comment
        } else if let Some(rest) = trimmed.strip_prefix('#').or_else(|| {
            trimmed
                .strip_prefix('^')
                .filter(|rest| !rest.trim().is_empty())
        }) {
            let rest = rest.trim_start_matches(['>', '*']).trim();
            let (keyword, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            TokenKind::BlockStart {
                keyword: keyword.to_string(),
                args: args.trim().to_string(),
            }
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            TokenKind::BlockEnd {
                keyword: rest.trim().to_string(),
            }
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            TokenKind::Partial {
                name: rest.trim().to_string(),
            }
        } else {
            TokenKind::Expression {
                source: trimmed.to_string(),
                raw: false,
            }
        }
    }

    /// Content opened with `!--` that has not yet reached its closing `--`
    fn is_open_block_comment(content: &[u8]) -> bool {
        let content = content.strip_prefix(b"~").unwrap_or(content);
        match content.strip_prefix(b"!--") {
            Some(rest) => !rest.strip_suffix(b"~").unwrap_or(rest).ends_with(b"--"),
            None => false,
        }
    }

    /// Check if we should continue iteration (guards for step budget and EOF)
    #[inline]
    fn should_continue(&mut self, max_steps: usize) -> bool {
        self.step_count += 1;
        self.step_count <= max_steps && self.pos < self.bytes.len()
    }

    /// Record step for O(n) performance verification in tests
    #[cfg(test)]
    #[inline]
    fn record_test_step() {
        test_counter::inc();
    }

    /// Remember an unterminated tag (escaped or not) when input runs out
    fn finish(&mut self) {
        if self.pos < self.bytes.len() {
            return;
        }
        match self.state {
            ScanState::InToken { line, .. } | ScanState::SeenRBrace { line, .. } => {
                self.unclosed.get_or_insert(line);
            }
            _ => {}
        }
    }

    fn process_normal_state(&mut self, byte: u8, backslash_count: usize) {
        if byte == b'\\' {
            self.state = ScanState::Normal {
                backslash_count: backslash_count + 1,
            };
        } else if byte == b'{' {
            self.state = ScanState::SeenLBrace {
                pos: self.pos,
                backslash_count,
            };
        } else {
            if byte == b'\n' {
                self.line += 1;
            }
            self.state = ScanState::Normal { backslash_count: 0 };
        }
        self.pos += 1;
    }

    /// Returns true if position was advanced, false if byte should be reprocessed
    fn process_seen_lbrace(&mut self, byte: u8, lbrace_pos: usize, backslash_count: usize) -> bool {
        if byte == b'{' {
            let raw = self.bytes.get(self.pos + 1) == Some(&b'{');
            let skip = if raw { 2 } else { 1 };
            self.state = ScanState::InToken {
                start: lbrace_pos,
                content_start: self.pos + skip,
                backslash_count,
                raw,
                line: self.line,
            };
            self.pos += skip;
            true
        } else {
            // Just a single {, not a token
            self.state = ScanState::Normal { backslash_count: 0 };
            false
        }
    }

    fn process_in_token(&mut self, byte: u8) {
        if let ScanState::InToken {
            start,
            content_start,
            backslash_count,
            raw,
            line,
        } = self.state
        {
            if byte == b'}' {
                self.state = ScanState::SeenRBrace {
                    start,
                    content_start,
                    rbrace_pos: self.pos,
                    braces: 1,
                    backslash_count,
                    raw,
                    line,
                };
            } else if byte == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    /// Returns (Option<Token>, advanced)
    fn process_seen_rbrace(&mut self, byte: u8) -> (Option<Token>, bool) {
        let ScanState::SeenRBrace {
            start,
            content_start,
            rbrace_pos,
            braces,
            backslash_count,
            raw,
            line,
        } = self.state
        else {
            return (None, false);
        };

        if byte != b'}' {
            // A lone } inside content, keep scanning the tag
            self.state = ScanState::InToken {
                start,
                content_start,
                backslash_count,
                raw,
                line,
            };
            return (None, false);
        }

        let needed = if raw { 3 } else { 2 };
        if braces + 1 < needed {
            self.state = ScanState::SeenRBrace {
                start,
                content_start,
                rbrace_pos,
                braces: braces + 1,
                backslash_count,
                raw,
                line,
            };
            self.pos += 1;
            return (None, true);
        }

        if !raw && Self::is_open_block_comment(&self.bytes[content_start..rbrace_pos]) {
            // `{{!-- ... --}}` may contain `}}`; only `--}}` ends it
            self.state = ScanState::InToken {
                start,
                content_start,
                backslash_count,
                raw,
                line,
            };
            self.pos += 1;
            return (None, true);
        }

        let content = std::str::from_utf8(&self.bytes[content_start..rbrace_pos]).unwrap_or("");
        let token = Token {
            kind: Self::classify_content(content, raw),
            start,
            length: self.pos + 1 - start,
            backslash_count,
            line,
        };

        self.state = ScanState::Normal { backslash_count: 0 };
        self.pos += 1;
        (Some(token), true)
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        const MAX_STEPS_MULTIPLIER: usize = 3;
        let max_steps = self.bytes.len().saturating_mul(MAX_STEPS_MULTIPLIER);

        loop {
            if !self.should_continue(max_steps) {
                self.finish();
                return None;
            }

            let byte = self.bytes[self.pos];
            #[cfg(test)]
            Self::record_test_step();

            match self.state {
                ScanState::Normal { backslash_count } => {
                    self.process_normal_state(byte, backslash_count)
                }
                ScanState::SeenLBrace {
                    pos,
                    backslash_count,
                } => {
                    if !self.process_seen_lbrace(byte, pos, backslash_count) {
                        continue;
                    }
                }
                ScanState::InToken { .. } => self.process_in_token(byte),
                ScanState::SeenRBrace { .. } => {
                    let (token, advanced) = self.process_seen_rbrace(byte);
                    if let Some(token) = token {
                        return Some(token);
                    }
                    if !advanced {
                        continue;
                    }
                }
            }
        }
    }
}
