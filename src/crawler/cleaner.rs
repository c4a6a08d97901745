//! Text cleanup applied to every extracted page
//!
//! Three steps, in order:
//! 1. repair of mis-decoded UTF-8 and typographic look-alikes (always)
//! 2. a line filter for generated source listings, which drops the
//!    boilerplate header and the cross-reference footer and strips the
//!    synthetic line numbers (only for source-listing URLs)
//! 3. a minimum-length check (always)
//!
//! The line filter is built from named [`LineRule`]s so that each heuristic
//! can be tested on its own.

use crate::HarvestError;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Default minimum number of characters a cleaned page must keep
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 100;

/// Boilerplate line Doxygen puts above every source listing
pub const DOCUMENTATION_SENTINEL: &str = "Go to the documentation of this file.";

/// Mis-decoded sequences and their replacements, longest first
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("â€¢", "-"),
    ("Ã¤", "ä"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("Ã„", "Ä"),
    ("Ã–", "Ö"),
    ("Ãœ", "Ü"),
    ("ÃŸ", "ß"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã\u{a0}", "à"),
    ("Â°", "°"),
    ("Â©", "©"),
    ("Â®", "®"),
    ("Â\u{a0}", " "),
];

/// Single characters with a plain replacement
const LOOKALIKES: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2026}', "..."),
    ('\u{00a0}', " "),
    ('\u{200b}', ""),
    ('\u{200c}', ""),
    ('\u{200d}', ""),
    ('\u{2060}', ""),
    ('\u{feff}', ""),
];

/// The cleaned text was too short to be worth a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("content too short: {length} characters (minimum {minimum})")]
pub struct ContentTooShort {
    pub length: usize,
    pub minimum: usize,
}

/// A named line predicate
#[derive(Debug)]
pub struct LineRule {
    pub name: &'static str,
    pattern: Regex,
}

impl LineRule {
    fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Page text cleaner
#[derive(Debug)]
pub struct Cleaner {
    min_length: usize,
    source_listing: Regex,
    line_number: Regex,
    code_start: Vec<LineRule>,
    footer: Vec<LineRule>,
}

impl Cleaner {
    pub fn new(min_length: usize) -> Result<Self, HarvestError> {
        Ok(Self {
            min_length,
            source_listing: Regex::new(r"/doxygen/(?:.*/)?[^/]*_8[A-Za-z0-9]+_source\.html$")?,
            line_number: Regex::new(r"^\d+(?:\s+|$)")?,
            code_start: vec![
                LineRule::new(
                    "preprocessor",
                    r"^#\s*(?:ifndef|ifdef|if|define|include|pragma)\b",
                )?,
                LineRule::new(
                    "keyword",
                    r"^(?:typedef|struct|enum|union|static|extern|const|void|int|char|unsigned|signed|bool|namespace|class|template)\b",
                )?,
                LineRule::new(
                    "declaration",
                    r"^[A-Za-z_][A-Za-z0-9_]*(?:\s+\**[A-Za-z_][A-Za-z0-9_]*)+\s*[(;=\[{]",
                )?,
            ],
            footer: vec![
                LineRule::new("generator-note", r"^(?:Definition|Flags|Size)\b")?,
                LineRule::new("bare-identifier", r"^[A-Za-z_][A-Za-z0-9_]*$")?,
                LineRule::new(
                    "file-line-reference",
                    r"(?:^|\s)[\w./-]+\.[A-Za-z0-9]+:\d+$",
                )?,
            ],
        })
    }

    /// Runs all cleaning steps over `text` extracted from `source`
    pub fn clean(&self, text: &str, source: &Url) -> Result<String, ContentTooShort> {
        let mut cleaned = repair_encoding(text);

        if self.is_source_listing(source) {
            cleaned = self.filter_source_listing(&cleaned);
        }

        let cleaned = cleaned.trim().to_string();
        let length = cleaned.chars().count();
        if length < self.min_length {
            return Err(ContentTooShort {
                length,
                minimum: self.min_length,
            });
        }

        Ok(cleaned)
    }

    /// True for URLs of generated source-file listings
    pub fn is_source_listing(&self, url: &Url) -> bool {
        self.source_listing.is_match(url.path())
    }

    /// Removes the leading line-number token, if any
    ///
    /// Returns the remaining text and whether a number was found.
    pub fn strip_line_number<'a>(&self, line: &'a str) -> (&'a str, bool) {
        match self.line_number.find(line) {
            Some(m) => (&line[m.end()..], true),
            None => (line, false),
        }
    }

    /// Name of the code-start rule matching `line`
    pub fn code_start_rule(&self, line: &str) -> Option<&'static str> {
        self.code_start
            .iter()
            .find(|rule| rule.matches(line))
            .map(|rule| rule.name)
    }

    /// Name of the footer rule matching `line`
    pub fn footer_rule(&self, line: &str) -> Option<&'static str> {
        self.footer
            .iter()
            .find(|rule| rule.matches(line))
            .map(|rule| rule.name)
    }

    /// Two-phase filter for source listings
    pub fn filter_source_listing(&self, text: &str) -> String {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        let code_start = lines.iter().position(|line| {
            let (code, _) = self.strip_line_number(line);
            self.code_start_rule(code).is_some()
        });

        let body: Vec<&str> = match code_start {
            Some(index) => lines[index..].to_vec(),
            None => lines
                .into_iter()
                .filter(|line| *line != DOCUMENTATION_SENTINEL)
                .collect(),
        };

        let mut kept = Vec::with_capacity(body.len());
        for line in body {
            let (code, numbered) = self.strip_line_number(line);
            if !numbered {
                if let Some(rule) = self.footer_rule(line) {
                    tracing::trace!("Footer starts at '{}' ({})", line, rule);
                    break;
                }
            }

            let code = code.trim();
            if !code.is_empty() {
                kept.push(code);
            }
        }

        kept.join("\n").trim().to_string()
    }
}

/// Replaces mis-decoded sequences and typographic look-alikes
pub fn repair_encoding(text: &str) -> String {
    let mut repaired = text.to_string();
    for &(broken, fixed) in MOJIBAKE {
        if repaired.contains(broken) {
            repaired = repaired.replace(broken, fixed);
        }
    }

    let mut out = String::with_capacity(repaired.len());
    for c in repaired.chars() {
        match LOOKALIKES.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}
