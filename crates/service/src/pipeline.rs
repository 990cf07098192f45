//! Topic-to-deck pipeline.
//!
//! Summary lookup, prompt, completion, then normalize, group and render.
//! Lookup failures degrade to an inline placeholder; LLM and render failures
//! end the request.

use crate::llm::{LanguageModel, OpenRouterClient};
use crate::prompt::build_prompt;
use crate::summary::{SummarySource, WikipediaSummary};
use deckgen_core::{BulletNormalizer, Config, Error, Result, SlideGrouper, Topic};
use deckgen_pptx::DeckRenderer;
use std::sync::Arc;

/// Outcome of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDeck {
    /// File name inside the renderer's output directory.
    pub file_name: String,

    /// Total slides, including title and closing slides.
    pub slide_count: usize,

    /// Bullets placed on content slides.
    pub bullets_used: usize,

    /// Bullets dropped by the slide cap.
    pub bullets_dropped: usize,
}

/// Placeholder context used when the summary lookup fails.
pub fn lookup_placeholder(err: &Error) -> String {
    let reason = match err {
        Error::LookupFailed(msg) => msg.clone(),
        other => other.to_string(),
    };
    format!("(Wikipedia retrieval failed: {})", reason)
}

/// Normalize, group and render raw model text for a topic.
///
/// Blocking: writes the deck file.
pub fn deck_from_text(renderer: &DeckRenderer, topic: &Topic, raw: &str) -> Result<GeneratedDeck> {
    let bullets = BulletNormalizer::new().normalize(raw);
    let grouping = SlideGrouper::new().group(&bullets);
    let bullets_used = grouping.bullet_count();
    let bullets_dropped = grouping.dropped;

    let rendered = renderer.render(topic, grouping.groups)?;

    Ok(GeneratedDeck {
        file_name: rendered.file_name,
        slide_count: rendered.slide_count,
        bullets_used,
        bullets_dropped,
    })
}

/// Build the shared HTTP client for outbound calls.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("deckgen/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.http_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Sequences summary lookup, completion and rendering for one topic.
#[derive(Clone)]
pub struct DeckPipeline {
    summaries: Arc<dyn SummarySource>,
    model: Arc<dyn LanguageModel>,
    renderer: DeckRenderer,
}

impl DeckPipeline {
    /// Create a pipeline from its collaborators.
    pub fn new(
        summaries: Arc<dyn SummarySource>,
        model: Arc<dyn LanguageModel>,
        renderer: DeckRenderer,
    ) -> Self {
        Self {
            summaries,
            model,
            renderer,
        }
    }

    /// Create the production pipeline: Wikipedia, OpenRouter, PPTX output.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client(config)?;
        Ok(Self::new(
            Arc::new(WikipediaSummary::from_config(client.clone(), config)),
            Arc::new(OpenRouterClient::from_config(client, config)),
            DeckRenderer::new(config.output_dir.clone()),
        ))
    }

    /// Renderer used for output; also resolves download names.
    pub fn renderer(&self) -> &DeckRenderer {
        &self.renderer
    }

    /// Generate a deck for a raw, user-entered topic.
    pub async fn generate(&self, raw_topic: &str) -> Result<GeneratedDeck> {
        let topic = Topic::parse(raw_topic)?;
        log::info!("Generating deck for '{}'", topic);

        let context = match self.summaries.summarize(&topic).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Summary lookup for '{}' failed: {}", topic, e);
                lookup_placeholder(&e)
            }
        };

        let prompt = build_prompt(&topic, &context);
        let raw = self.model.complete(&prompt).await.map_err(|e| {
            log::error!("LLM call for '{}' failed: {}", topic, e);
            e
        })?;

        let renderer = self.renderer.clone();
        let deck = tokio::task::spawn_blocking(move || deck_from_text(&renderer, &topic, &raw))
            .await
            .map_err(|e| Error::RenderFailed(format!("render task failed: {}", e)))??;

        if deck.bullets_dropped > 0 {
            log::warn!(
                "Deck '{}' omits {} bullets past the slide limit",
                deck.file_name,
                deck.bullets_dropped
            );
        }

        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deckgen_pptx::DeckReader;
    use std::fs::File;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedSummary(std::result::Result<String, String>);

    #[async_trait]
    impl SummarySource for FixedSummary {
        async fn summarize(&self, _topic: &Topic) -> Result<String> {
            self.0.clone().map_err(Error::LookupFailed)
        }
    }

    /// Records the prompt and replies with fixed text.
    struct ScriptedModel {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(Error::LlmFailed)
        }
    }

    struct CountingSummary(AtomicUsize);

    #[async_trait]
    impl SummarySource for CountingSummary {
        async fn summarize(&self, _topic: &Topic) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    fn read_slides(renderer: &DeckRenderer, file_name: &str) -> Vec<Vec<String>> {
        let file = File::open(renderer.resolve(file_name).unwrap()).unwrap();
        DeckReader::new()
            .read(file)
            .unwrap()
            .into_iter()
            .map(|s| s.paragraphs)
            .collect()
    }

    #[tokio::test]
    async fn test_generate_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replying(
            "1. Alpha\nSlide 1: Overview\n- Beta\n\n• Gamma",
        ));
        let pipeline = DeckPipeline::new(
            Arc::new(FixedSummary(Ok("Greek letters.".to_string()))),
            model.clone(),
            DeckRenderer::new(dir.path()),
        );

        let deck = pipeline.generate("greek alphabet").await.unwrap();
        assert_eq!(deck.slide_count, 3);
        assert_eq!(deck.bullets_used, 3);
        assert_eq!(deck.bullets_dropped, 0);

        let slides = read_slides(pipeline.renderer(), &deck.file_name);
        assert_eq!(slides[0], vec!["Greek Alphabet"]);
        assert_eq!(slides[1], vec!["-Alpha", "-Beta", "-Gamma"]);
        assert_eq!(slides[2], vec!["Thank You"]);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Context:\nGreek letters."));
    }

    #[tokio::test]
    async fn test_lookup_failure_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replying("- One"));
        let pipeline = DeckPipeline::new(
            Arc::new(FixedSummary(Err("timed out".to_string()))),
            model.clone(),
            DeckRenderer::new(dir.path()),
        );

        let deck = pipeline.generate("anything").await.unwrap();
        assert_eq!(deck.slide_count, 3);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("(Wikipedia retrieval failed: timed out)"));
    }

    #[tokio::test]
    async fn test_llm_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = DeckPipeline::new(
            Arc::new(FixedSummary(Ok(String::new()))),
            Arc::new(ScriptedModel::failing("503 Service Unavailable")),
            DeckRenderer::new(dir.path()),
        );

        let err = pipeline.generate("anything").await.unwrap_err();
        assert!(matches!(err, Error::LlmFailed(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_topic_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let summaries = Arc::new(CountingSummary(AtomicUsize::new(0)));
        let model = Arc::new(ScriptedModel::replying("- x"));
        let pipeline = DeckPipeline::new(
            summaries.clone(),
            model.clone(),
            DeckRenderer::new(dir.path()),
        );

        let err = pipeline.generate("   ").await.unwrap_err();
        assert!(matches!(err, Error::EmptyTopic));
        assert_eq!(summaries.0.load(Ordering::SeqCst), 0);
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_completion_gives_two_slides() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = DeckPipeline::new(
            Arc::new(FixedSummary(Ok(String::new()))),
            Arc::new(ScriptedModel::replying("")),
            DeckRenderer::new(dir.path()),
        );

        let deck = pipeline.generate("silence").await.unwrap();
        assert_eq!(deck.slide_count, 2);
        assert_eq!(deck.bullets_used, 0);
    }

    #[test]
    fn test_deck_from_text_caps_bullets() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = DeckRenderer::new(dir.path());
        let topic = Topic::parse("many points").unwrap();
        let raw: String = (1..=20).map(|i| format!("{}. Point {}\n", i, i)).collect();

        let deck = deck_from_text(&renderer, &topic, &raw).unwrap();
        assert_eq!(deck.slide_count, 7);
        assert_eq!(deck.bullets_used, 15);
        assert_eq!(deck.bullets_dropped, 5);

        let slides = read_slides(&renderer, &deck.file_name);
        assert_eq!(slides[5], vec!["-Point 13", "-Point 14", "-Point 15"]);
    }

    #[test]
    fn test_lookup_placeholder() {
        let err = Error::LookupFailed("no page matches 'x'".to_string());
        assert_eq!(
            lookup_placeholder(&err),
            "(Wikipedia retrieval failed: no page matches 'x')"
        );
    }
}
