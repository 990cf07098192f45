//! Core domain types, bullet normalization, slide grouping and configuration
//! for topic-to-deck generation.

pub mod config;
pub mod error;
pub mod group;
pub mod normalize;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use group::{Grouping, SlideGrouper, GROUP_SIZE, MAX_GROUPS};
pub use normalize::{file_stem, is_slide_label, title_case, BulletNormalizer};
pub use types::{Deck, Slide, SlideGroup, Topic, CLOSING_TEXT};
