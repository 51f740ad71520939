//! Comment detection for Python source text.
//!
//! A single pass walks the text line by line and keeps a small lexer state so
//! that `#` inside string literals is never mistaken for a comment. Triple
//! quoted strings that stand alone as a statement are treated as comment
//! blocks (docstrings); any other triple quoted string is ordinary code.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `# ...` running to end of line.
    Hash,
    /// Bare `'''` / `"""` block.
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub line_number: usize,
    pub content: String,
    pub kind: CommentKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub records: Vec<CommentRecord>,
    pub comment_line_count: usize,
    pub total_line_count: usize,
    pub comment_char_count: usize,
    pub total_char_count: usize,
}

impl ScanResult {
    pub fn line_ratio(&self) -> u64 {
        safe_percentage(self.comment_line_count, self.total_line_count)
    }

    pub fn char_ratio(&self) -> u64 {
        safe_percentage(self.comment_char_count, self.total_char_count)
    }
}

/// Rounded integer percentage; an empty denominator yields 0.
pub fn safe_percentage(numerator: usize, denominator: usize) -> u64 {
    if denominator == 0 {
        0
    } else {
        ((numerator as f64 / denominator as f64) * 100.0).round() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    SingleTriple,
    DoubleTriple,
}

impl Delimiter {
    fn from_quote(quote: u8) -> Self {
        if quote == b'\'' {
            Delimiter::SingleTriple
        } else {
            Delimiter::DoubleTriple
        }
    }

    fn as_bytes(self) -> &'static [u8] {
        match self {
            Delimiter::SingleTriple => b"'''",
            Delimiter::DoubleTriple => b"\"\"\"",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    InSingleQuoteString,
    InDoubleQuoteString,
    InTripleBlock { delimiter: Delimiter, comment: bool },
}

/// Lexer state carried from one physical line to the next.
#[derive(Debug)]
struct ScanState {
    lex: LexState,
    bracket_depth: usize,
    prev_line_continued: bool,
    open_block: Option<usize>,
}

impl Default for ScanState {
    fn default() -> Self {
        ScanState {
            lex: LexState::Code,
            bracket_depth: 0,
            prev_line_continued: false,
            open_block: None,
        }
    }
}

#[derive(Debug)]
struct Block {
    content_start: usize,
    content_end: Option<usize>,
    /// Indentation of the line that opened the block.
    indent_start: usize,
    indent_end: usize,
}

/// Classification of one physical line.
#[derive(Debug, Default)]
struct LineInfo<'a> {
    body: &'a str,
    terminator: &'a str,
    /// First comment block touching this line.
    block: Option<usize>,
    /// Offset of a `#` found in code.
    hash: Option<usize>,
    /// Offset where code resumes after the last block closed on this line.
    resume: Option<usize>,
    ends_in_block: bool,
    ends_in_code: bool,
    shebang: bool,
}

struct Analysis<'a> {
    text: &'a str,
    lines: Vec<LineInfo<'a>>,
    blocks: Vec<Block>,
}

impl Analysis<'_> {
    fn block_content(&self, index: usize) -> &str {
        let block = &self.blocks[index];
        let end = block.content_end.unwrap_or(self.text.len());
        &self.text[block.content_start..end]
    }

    fn block_indent(&self, index: usize) -> &str {
        let block = &self.blocks[index];
        &self.text[block.indent_start..block.indent_end]
    }
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, &line[body.len()..])
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, &line[body.len()..])
    } else {
        (line, "")
    }
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c == '\u{feff}')
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Start offset of a string literal whose quote sits at `quote_at`, taking a
/// prefix such as `r`, `b`, `u` or `rb` into account.
fn string_prefix_start(bytes: &[u8], quote_at: usize) -> usize {
    let mut start = quote_at;
    while start > 0
        && quote_at - start < 2
        && matches!(bytes[start - 1].to_ascii_lowercase(), b'r' | b'u' | b'b' | b'f')
    {
        start -= 1;
    }
    if start > 0 && start < quote_at && is_identifier_byte(bytes[start - 1]) {
        // Part of a longer identifier such as `bar"..."`, not a prefix.
        return quote_at;
    }
    start
}

fn analyze(text: &str) -> Analysis<'_> {
    let mut state = ScanState::default();
    let mut lines = Vec::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut offset = 0;

    for (index, raw_line) in text.split_inclusive('\n').enumerate() {
        let (body, terminator) = split_terminator(raw_line);
        let line_start = offset;
        offset += raw_line.len();

        let mut info = LineInfo {
            body,
            terminator,
            ..LineInfo::default()
        };

        if index == 0 && body.trim_start_matches('\u{feff}').starts_with("#!") {
            info.shebang = true;
            info.ends_in_code = true;
            lines.push(info);
            continue;
        }

        if let LexState::InTripleBlock { comment: true, .. } = state.lex {
            info.block = state.open_block;
        }

        let mut statement_from = (state.lex == LexState::Code
            && state.bracket_depth == 0
            && !state.prev_line_continued)
            .then_some(0);
        let mut continued = false;
        let bytes = body.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            match state.lex {
                LexState::Code => match b {
                    b'#' => {
                        info.hash = Some(i);
                        break;
                    }
                    b'\'' | b'"' => {
                        if bytes[i..].starts_with(&[b, b, b]) {
                            let delimiter = Delimiter::from_quote(b);
                            let prefix_start = string_prefix_start(bytes, i);
                            let comment = state.bracket_depth == 0
                                && statement_from.is_some_and(|from| {
                                    from <= prefix_start && is_blank(&body[from..prefix_start])
                                });
                            state.lex = LexState::InTripleBlock { delimiter, comment };
                            if comment {
                                let indent_len = body.len() - body.trim_start().len();
                                blocks.push(Block {
                                    content_start: line_start + i + 3,
                                    content_end: None,
                                    indent_start: line_start,
                                    indent_end: line_start + indent_len,
                                });
                                let block = blocks.len() - 1;
                                state.open_block = Some(block);
                                info.block.get_or_insert(block);
                            }
                            i += 3;
                            continue;
                        }
                        state.lex = if b == b'\'' {
                            LexState::InSingleQuoteString
                        } else {
                            LexState::InDoubleQuoteString
                        };
                    }
                    b'(' | b'[' | b'{' => state.bracket_depth += 1,
                    b')' | b']' | b'}' => {
                        state.bracket_depth = state.bracket_depth.saturating_sub(1)
                    }
                    b'\\' if i + 1 == bytes.len() => continued = true,
                    _ => {}
                },
                LexState::InSingleQuoteString | LexState::InDoubleQuoteString => {
                    let quote = if state.lex == LexState::InSingleQuoteString {
                        b'\''
                    } else {
                        b'"'
                    };
                    if b == b'\\' {
                        continued = i + 1 == bytes.len();
                        i += 2;
                        continue;
                    }
                    if b == quote {
                        state.lex = LexState::Code;
                    }
                }
                LexState::InTripleBlock { delimiter, comment } => {
                    if b == b'\\' {
                        i += 2;
                        continue;
                    }
                    if bytes[i..].starts_with(delimiter.as_bytes()) {
                        state.lex = LexState::Code;
                        i += 3;
                        if comment {
                            if let Some(block) = state.open_block.take() {
                                blocks[block].content_end = Some(line_start + i - 3);
                            }
                            info.resume = Some(i);
                            statement_from = Some(i);
                        }
                        continue;
                    }
                }
            }
            i += 1;
        }

        // A one-line string left open without a continuation ends with the line.
        if matches!(
            state.lex,
            LexState::InSingleQuoteString | LexState::InDoubleQuoteString
        ) && !continued
        {
            state.lex = LexState::Code;
        }

        state.prev_line_continued = continued;
        info.ends_in_block = matches!(state.lex, LexState::InTripleBlock { comment: true, .. });
        info.ends_in_code = state.lex == LexState::Code;
        lines.push(info);
    }

    Analysis {
        text,
        lines,
        blocks,
    }
}

/// Find every comment line in `text` and aggregate line and character counts.
pub fn scan(text: &str) -> ScanResult {
    let analysis = analyze(text);
    let mut result = ScanResult::default();

    for (index, line) in analysis.lines.iter().enumerate() {
        result.total_line_count += 1;
        result.total_char_count += line.body.chars().count();

        let record = if let Some(block) = line.block {
            Some((analysis.block_content(block), CommentKind::Block))
        } else {
            line.hash
                .map(|at| (&line.body[at + 1..], CommentKind::Hash))
        };

        if let Some((content, kind)) = record {
            result.comment_line_count += 1;
            result.comment_char_count += content.chars().count();
            result.records.push(CommentRecord {
                line_number: index + 1,
                content: content.to_string(),
                kind,
            });
        }
    }

    result
}

/// Return `text` with every comment removed.
///
/// Comment-only lines and block lines disappear with their line ending; code
/// in front of a trailing `#` comment is kept. Everything else is copied
/// through unchanged.
pub fn strip(text: &str) -> String {
    let analysis = analyze(text);
    let mut output = String::with_capacity(text.len());

    for line in &analysis.lines {
        if line.shebang {
            output.push_str(line.body);
            output.push_str(line.terminator);
            continue;
        }

        if let Some(block) = line.block {
            if line.ends_in_block {
                continue;
            }
            let Some(resume) = line.resume else {
                continue;
            };
            let tail_end = line.hash.unwrap_or(line.body.len());
            let tail = line.body[resume..tail_end].trim_start();
            let tail = if line.ends_in_code {
                tail.trim_end()
            } else {
                tail
            };
            if tail.is_empty() {
                continue;
            }
            output.push_str(analysis.block_indent(block));
            output.push_str(tail);
            output.push_str(line.terminator);
            continue;
        }

        if let Some(at) = line.hash {
            let code = line.body[..at].trim_end();
            if is_blank(code) {
                continue;
            }
            output.push_str(code);
            output.push_str(line.terminator);
            continue;
        }

        output.push_str(line.body);
        output.push_str(line.terminator);
    }

    output
}
