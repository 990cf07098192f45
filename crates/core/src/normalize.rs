//! Text normalization for language-model slide content.
//!
//! Turns free-form model output into clean bullet lines: blank lines and
//! stray "Slide N:" headers are dropped, and leading list markers are
//! rewritten to a single `-` prefix.

use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a slide header the model emitted despite being told not to.
static SLIDE_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^slide .*:").unwrap());

/// Regex matching a leading list marker: `1.`, `-` or `•` plus trailing spaces.
static LIST_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.\s*|[-•]\s*)").unwrap());

/// Maximum number of characters of the topic kept in a deck file name.
pub const FILE_STEM_MAX_CHARS: usize = 20;

/// Check whether a trimmed line is a slide label such as `Slide 2: Overview`.
pub fn is_slide_label(line: &str) -> bool {
    SLIDE_LABEL_REGEX.is_match(line)
}

/// Title-case a topic.
///
/// The first letter of every run of letters is upper-cased and the rest of the
/// run is lower-cased, so `"rust's ownership"` becomes `"Rust'S Ownership"`.
pub fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                output.extend(c.to_lowercase());
            } else {
                output.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            output.push(c);
            prev_is_letter = false;
        }
    }

    output
}

/// Build the file-name stem for a deck from its topic.
///
/// Whitespace runs collapse to `_`, anything that is not ASCII alphanumeric,
/// `-` or `_` becomes `_`, and the result is cut to [`FILE_STEM_MAX_CHARS`].
/// A stem without any ASCII letter or digit falls back to `deck`.
pub fn file_stem(topic: &str) -> String {
    let stem: String = topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(FILE_STEM_MAX_CHARS)
        .collect();

    if !stem.chars().any(|c| c.is_ascii_alphanumeric()) {
        "deck".to_string()
    } else {
        stem
    }
}

/// Normalizer for bullet content produced by a language model.
#[derive(Debug, Clone, Default)]
pub struct BulletNormalizer;

impl BulletNormalizer {
    /// Create a new bullet normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single line.
    ///
    /// Returns `None` for lines that must not become bullets (blank lines and
    /// slide labels).
    pub fn normalize_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_slide_label(trimmed) {
            return None;
        }

        let bullet = LIST_MARKER_REGEX.replace(trimmed, "-");
        Some(bullet.trim().to_string())
    }

    /// Normalize raw model output into ordered bullet lines.
    ///
    /// Never fails; output is empty when the model produced nothing usable.
    pub fn normalize(&self, raw: &str) -> Vec<String> {
        let bullets: Vec<String> = raw
            .lines()
            .filter_map(|line| self.normalize_line(line))
            .collect();

        log::debug!("Normalized model output into {} bullets", bullets.len());
        bullets
    }
}
