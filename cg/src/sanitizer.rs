//! Response sanitizer
//!
//! Turns raw provider text into a Solidity source body. The work is a chain
//! of line transforms that never fail; only the closing structural check can
//! reject the result.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::GenerationError;

/// License line prepended when the response has none
pub const DEFAULT_LICENSE: &str = "// SPDX-License-Identifier: MIT";

/// Pragma inserted after the license line when the response has none
pub const DEFAULT_PRAGMA: &str = "pragma solidity ^0.8.20;";

static CONTRACT_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:abstract\s+)?(?:contract|interface|library)\s+[A-Za-z_$]").expect("valid declaration regex")
});

static TOP_LEVEL_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:abstract\s+contract|contract|interface|library|struct|enum|function|error|event|type|using|import)\b")
        .expect("valid top-level regex")
});

static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s").expect("valid numbered regex"));

static DECLARATION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:contract|interface|library)\b").expect("valid keyword regex"));

const NARRATIVE_PREFIXES: &[&str] = &[
    "here is",
    "here's",
    "here are",
    "below is",
    "this contract",
    "this smart contract",
    "this implementation",
    "this code",
    "the following",
    "the contract above",
    "note:",
    "notes:",
    "explanation",
    "key features",
    "features:",
    "usage:",
    "i have",
    "i've",
    "i cannot",
    "i can't",
    "let me",
    "sure,",
    "sure!",
    "certainly",
];

const MARKDOWN_MARKERS: &[&str] = &["#", ">", "**", "- ", "+ ", "* "];

const CODE_PUNCTUATION: &[char] = &[';', '{', '}', '(', ')', '=', '[', ']'];

/// Heuristics for telling narration apart from code
///
/// The defaults are a starting point; callers can add phrases and patterns.
#[derive(Debug, Clone)]
pub struct SanitizerRules {
    /// Lowercase phrases that mark a line as narration when it starts with one
    pub narrative_prefixes: Vec<String>,

    /// Characters whose presence marks a line as code
    pub code_punctuation: Vec<char>,

    /// Lines without code punctuation and at least this many words are prose
    pub prose_word_threshold: usize,

    /// Extra patterns; a matching top-level line is narration
    pub narrative_patterns: Vec<Regex>,
}

impl Default for SanitizerRules {
    fn default() -> Self {
        Self {
            narrative_prefixes: NARRATIVE_PREFIXES.iter().map(|p| p.to_string()).collect(),
            code_punctuation: CODE_PUNCTUATION.to_vec(),
            prose_word_threshold: 8,
            narrative_patterns: Vec::new(),
        }
    }
}

impl SanitizerRules {
    pub fn with_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.narrative_prefixes.push(prefix.as_ref().trim().to_lowercase());
        self
    }

    /// Add a narration regex
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.narrative_patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Whether a non-comment line is narration
    ///
    /// Headings and leading phrases count at any depth. Bullets, patterns and
    /// the word-count heuristic only apply outside braces, where a line such
    /// as `* rate / 100;` cannot be a continuation of code.
    fn is_narrative(&self, line: &str, nested: bool) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }

        if trimmed.starts_with('#') {
            return true;
        }

        let lower = trimmed.to_lowercase();
        if self.narrative_prefixes.iter().any(|p| lower.starts_with(p.as_str())) {
            return true;
        }

        if nested {
            return false;
        }

        if MARKDOWN_MARKERS.iter().any(|m| trimmed.starts_with(m)) || NUMBERED_ITEM.is_match(trimmed) {
            return true;
        }

        if self.narrative_patterns.iter().any(|re| re.is_match(trimmed)) {
            return true;
        }

        let has_code = trimmed.chars().any(|c| self.code_punctuation.contains(&c));
        !has_code && trimmed.split_whitespace().count() >= self.prose_word_threshold
    }
}

/// Line-level view of comments, strings and braces
#[derive(Debug, Default, Clone, Copy)]
struct Scanner {
    in_block_comment: bool,
    depth: i64,
}

impl Scanner {
    /// True when the line is a comment given the state before it
    fn is_comment(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.in_block_comment || trimmed.starts_with("//") || trimmed.starts_with("/*")
    }

    /// Feed one line and return its net brace change
    fn feed(&mut self, line: &str) -> i64 {
        let code = code_part(line, &mut self.in_block_comment);
        let delta = code.chars().fold(0i64, |acc, c| match c {
            '{' => acc + 1,
            '}' => acc - 1,
            _ => acc,
        });
        self.depth += delta;
        delta
    }
}

/// Code portion of a line, with comments and string literals removed
fn code_part(line: &str, in_block_comment: &mut bool) -> String {
    let mut code = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block_comment = false;
            }
            continue;
        }

        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block_comment = true;
            }
            _ => code.push(c),
        }
    }

    code
}

/// Cleans raw provider output into a Solidity source body
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    rules: SanitizerRules,
}

impl Sanitizer {
    pub fn new(rules: SanitizerRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SanitizerRules {
        &self.rules
    }

    /// Run every transform, then check that a declaration survived
    pub fn sanitize(&self, raw: &str) -> Result<String, GenerationError> {
        debug!(raw_len = raw.len(), "sanitize: called");
        let lines: Vec<String> = raw.lines().map(str::to_string).collect();

        let lines = strip_fences(lines);
        let lines = self.remove_narrative(lines);
        let lines = truncate_after_declaration(lines);
        let lines = ensure_license(lines);
        let lines = ensure_pragma(lines);
        let body = collapse_blank_lines(lines);

        if !DECLARATION_WORD.is_match(&body) {
            warn!("sanitize: no contract, interface or library in response");
            return Err(GenerationError::validation(
                "Generated output does not contain a contract, interface or library declaration",
            ));
        }

        debug!(body_len = body.len(), "sanitize: done");
        Ok(body)
    }

    /// Drop narration anywhere outside comments
    fn remove_narrative(&self, lines: Vec<String>) -> Vec<String> {
        debug!(count = lines.len(), "remove_narrative: called");
        let mut scanner = Scanner::default();
        let mut kept = Vec::with_capacity(lines.len());

        for line in lines {
            if !scanner.is_comment(&line) && self.rules.is_narrative(&line, scanner.depth > 0) {
                debug!(%line, "remove_narrative: dropping line");
                continue;
            }
            scanner.feed(&line);
            kept.push(line);
        }

        kept
    }
}

/// Sanitize with the default rules
pub fn sanitize(raw: &str) -> Result<String, GenerationError> {
    Sanitizer::default().sanitize(raw)
}

/// Remove markdown fence lines such as ```` ```solidity ````
fn strip_fences(lines: Vec<String>) -> Vec<String> {
    lines.into_iter().filter(|line| !line.trim_start().starts_with("```")).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    /// No contract declaration seen yet
    Preamble,
    /// Inside a declaration; `opened` once its first brace is seen
    Declaration { opened: bool },
    /// A declaration just closed at depth zero
    Closed,
}

/// Discard trailing text once the top-level declarations close
///
/// After a declaration balances back to depth zero, blank lines, comments
/// and further top-level declarations are kept; anything else ends the body.
fn truncate_after_declaration(lines: Vec<String>) -> Vec<String> {
    debug!(count = lines.len(), "truncate_after_declaration: called");
    let mut scanner = Scanner::default();
    let mut state = Tracking::Preamble;
    let mut kept = Vec::with_capacity(lines.len());

    for line in lines {
        match state {
            Tracking::Preamble => {
                let at_top = scanner.depth <= 0 && !scanner.is_comment(&line);
                if at_top && CONTRACT_DECLARATION.is_match(&line) {
                    // Stray closing braces in the preamble must not offset the declaration
                    scanner.depth = 0;
                    scanner.feed(&line);
                    state = after_declaration_line(&scanner, &line);
                } else {
                    scanner.feed(&line);
                }
            }
            Tracking::Declaration { opened } => {
                let delta = scanner.feed(&line);
                let opened = opened || delta > 0 || scanner.depth > 0;
                state = if opened && scanner.depth <= 0 {
                    scanner.depth = 0;
                    Tracking::Closed
                } else {
                    Tracking::Declaration { opened }
                };
            }
            Tracking::Closed => {
                if line.trim().is_empty() || scanner.is_comment(&line) {
                    scanner.feed(&line);
                } else if TOP_LEVEL_DECLARATION.is_match(&line) {
                    scanner.feed(&line);
                    state = after_declaration_line(&scanner, &line);
                } else {
                    debug!(%line, "truncate_after_declaration: discarding trailing text");
                    break;
                }
            }
        }
        kept.push(line);
    }

    kept
}

/// State after a declaration's first line has been fed to the scanner
fn after_declaration_line(scanner: &Scanner, line: &str) -> Tracking {
    if scanner.depth > 0 {
        return Tracking::Declaration { opened: true };
    }
    let mut in_comment = false;
    let code = code_part(line, &mut in_comment);
    let code = code.trim_end();
    if code.ends_with(';') || code.ends_with('}') {
        // One-line declaration such as `error Unauthorized();` or `interface I {}`
        Tracking::Closed
    } else {
        Tracking::Declaration { opened: false }
    }
}

fn ensure_license(mut lines: Vec<String>) -> Vec<String> {
    if !lines.iter().any(|l| l.contains("SPDX-License-Identifier")) {
        debug!("ensure_license: prepending default license");
        lines.insert(0, DEFAULT_LICENSE.to_string());
    }
    lines
}

fn ensure_pragma(mut lines: Vec<String>) -> Vec<String> {
    if lines.iter().any(|l| l.trim_start().starts_with("pragma solidity")) {
        return lines;
    }
    debug!("ensure_pragma: inserting default pragma");
    let at = lines
        .iter()
        .position(|l| l.contains("SPDX-License-Identifier"))
        .map(|license| license_comment_end(&lines, license) + 1)
        .unwrap_or(0);
    lines.insert(at, DEFAULT_PRAGMA.to_string());
    lines
}

/// Index of the last line of the comment holding the license
fn license_comment_end(lines: &[String], license: usize) -> usize {
    let mut scanner = Scanner::default();
    let mut end = license;
    for (i, line) in lines.iter().enumerate() {
        scanner.feed(line);
        end = i;
        if i >= license && !scanner.in_block_comment {
            break;
        }
    }
    end
}

/// Collapse runs of three or more blank lines to one and trim the result
fn collapse_blank_lines(lines: Vec<String>) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut run = 0usize;

    for line in &lines {
        if line.trim().is_empty() {
            run += 1;
            continue;
        }
        push_blanks(&mut out, run);
        run = 0;
        out.push(line.as_str());
    }
    push_blanks(&mut out, run);

    out.join("\n").trim().to_string()
}

fn push_blanks(out: &mut Vec<&str>, run: usize) {
    let n = if run >= 3 { 1 } else { run };
    out.extend(std::iter::repeat_n("", n));
}
