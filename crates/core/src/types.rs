//! Domain types for a generated slide deck.

use crate::normalize::title_case;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Text shown on the closing slide of every deck.
pub const CLOSING_TEXT: &str = "Thank You";

/// A user-supplied topic, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    /// Validate and wrap a topic string.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyTopic);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The topic text as entered (trimmed).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The topic in title case, as shown on the title slide.
    pub fn title(&self) -> String {
        title_case(&self.0)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bullets shown together on one content slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideGroup {
    /// Normalized bullet lines, in model order.
    pub bullets: Vec<String>,
}

impl SlideGroup {
    /// Create a group from bullet lines.
    pub fn new(bullets: Vec<String>) -> Self {
        Self { bullets }
    }

    /// Number of bullets in the group.
    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    /// Whether the group has no bullets.
    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }
}

/// A single slide of a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slide {
    /// Opening slide carrying the title-cased topic.
    Title(String),
    /// Bulleted content slide.
    Content(SlideGroup),
    /// Closing slide with fixed text.
    Closing(String),
}

impl Slide {
    /// All text lines on this slide, in order.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Slide::Title(text) | Slide::Closing(text) => vec![text.as_str()],
            Slide::Content(group) => group.bullets.iter().map(String::as_str).collect(),
        }
    }
}

/// A complete deck: title slide, content slides, closing slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Build a deck for a topic from grouped bullets.
    ///
    /// Empty groups are skipped so every content slide carries at least one bullet.
    pub fn new(topic: &Topic, groups: Vec<SlideGroup>) -> Self {
        let mut slides = Vec::with_capacity(groups.len() + 2);
        slides.push(Slide::Title(topic.title()));
        slides.extend(
            groups
                .into_iter()
                .filter(|g| !g.is_empty())
                .map(Slide::Content),
        );
        slides.push(Slide::Closing(CLOSING_TEXT.to_string()));

        Self { slides }
    }

    /// Total number of slides, including title and closing slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Number of content slides.
    pub fn content_slide_count(&self) -> usize {
        self.slides
            .iter()
            .filter(|s| matches!(s, Slide::Content(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_rejects_blank() {
        assert!(matches!(Topic::parse(""), Err(Error::EmptyTopic)));
        assert!(matches!(Topic::parse("  \t\n"), Err(Error::EmptyTopic)));
    }

    #[test]
    fn test_topic_trims() {
        let topic = Topic::parse("  solar power ").unwrap();
        assert_eq!(topic.as_str(), "solar power");
        assert_eq!(topic.title(), "Solar Power");
    }

    #[test]
    fn test_deck_without_content() {
        let topic = Topic::parse("empty").unwrap();
        let deck = Deck::new(&topic, Vec::new());

        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.slides[0], Slide::Title("Empty".to_string()));
        assert_eq!(deck.slides[1], Slide::Closing(CLOSING_TEXT.to_string()));
    }

    #[test]
    fn test_deck_slide_count() {
        let topic = Topic::parse("volcanoes").unwrap();
        let groups = vec![
            SlideGroup::new(vec!["-A".into(), "-B".into(), "-C".into()]),
            SlideGroup::new(vec!["-D".into()]),
        ];
        let deck = Deck::new(&topic, groups);

        assert_eq!(deck.slide_count(), 4);
        assert_eq!(deck.content_slide_count(), 2);
        assert_eq!(deck.slides[2].lines(), vec!["-D"]);
    }

    #[test]
    fn test_deck_skips_empty_groups() {
        let topic = Topic::parse("gaps").unwrap();
        let deck = Deck::new(&topic, vec![SlideGroup::new(Vec::new())]);

        assert_eq!(deck.slide_count(), 2);
    }
}
