//! Prompt construction for slide content.

use deckgen_core::Topic;

/// Build the prompt asking the model for bullet-only slide content.
pub fn build_prompt(topic: &Topic, context: &str) -> String {
    format!(
        "Using the context below, generate only bullet-point content to fill 4-5 PowerPoint slides on '{}'. \
         Each slide should have 2-3 bullet points. Do NOT include a title slide or thank-you slide. \
         Just bullet points only.\n\nContext:\n{}\n\nSlides:",
        topic, context
    )
}
