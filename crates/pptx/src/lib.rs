//! PPTX (Office Open XML) backend for generated slide decks.
//!
//! Writes decks as ZIP archives of XML parts and reads them back for
//! inspection.

mod parts;
pub mod reader;
pub mod writer;

pub use reader::{DeckReader, ReadSlide};
pub use writer::{deck_file_name, write_pptx, DeckRenderer, RenderedDeck, DECK_EXTENSION};
