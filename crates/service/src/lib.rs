//! Collaborators and orchestration for topic-to-deck generation.
//!
//! Looks up a reference summary, asks a language model for bullet content and
//! hands the result to the PPTX renderer.

pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod summary;

pub use llm::{LanguageModel, OpenRouterClient};
pub use pipeline::{deck_from_text, http_client, lookup_placeholder, DeckPipeline, GeneratedDeck};
pub use prompt::build_prompt;
pub use summary::{SummarySource, WikipediaSummary};
