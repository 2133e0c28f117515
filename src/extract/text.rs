//! Text helpers shared by the field strategies
use crate::config::compile_pattern;
use crate::ConfigError;
use regex::Regex;
use scraper::ElementRef;

/// Concatenates an element's text nodes with runs of whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(element.text())
}

/// Joins text fragments, collapsing every whitespace run to a single space
pub fn collapse_whitespace<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in fragments.into_iter().flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Parses a room count out of free text
///
/// Accepts, in order:
/// 1. a bare number (`"3"`),
/// 2. the first number directly before the keyword (`"3 Beds"`, `"2.5 baths"` -> 2),
/// 3. the first number anywhere, if the keyword appears (`"Bedrooms: 3"`).
#[derive(Debug, Clone)]
pub struct CountRule {
    before_keyword: Regex,
    keyword: Regex,
    any_number: Regex,
}

impl CountRule {
    /// Builds a rule from a keyword alternation such as `bed(?:room)?s?|bd`
    pub fn new(keywords: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            before_keyword: compile_pattern(&format!(
                r"(?i)([0-9]+)(?:[.,][0-9]+)?\s*(?:{})\b",
                keywords
            ))?,
            keyword: compile_pattern(&format!(r"(?i)\b(?:{})\b", keywords))?,
            any_number: compile_pattern(r"[0-9]+")?,
        })
    }

    /// Rule for bedroom counts
    pub fn bedrooms() -> Result<Self, ConfigError> {
        Self::new(r"bed(?:room)?s?|bd|br")
    }

    /// Rule for bathroom counts
    pub fn bathrooms() -> Result<Self, ConfigError> {
        Self::new(r"bath(?:room)?s?|ba")
    }

    /// Returns the count, or None if the text carries none
    pub fn parse(&self, raw: &str) -> Option<u32> {
        let raw = raw.trim();

        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            return raw.parse().ok();
        }

        if let Some(caps) = self.before_keyword.captures(raw) {
            return caps.get(1).and_then(|m| m.as_str().parse().ok());
        }

        if self.keyword.is_match(raw) {
            return self
                .any_number
                .find(raw)
                .and_then(|m| m.as_str().parse().ok());
        }

        None
    }
}
