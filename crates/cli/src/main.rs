//! Command-line front end for topic-to-deck generation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckgen_core::{Config, Topic};
use deckgen_pptx::{DeckReader, DeckRenderer};
use deckgen_service::{deck_from_text, DeckPipeline};
use std::fs::File;
use std::io::{BufReader, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Turn a topic into a short PowerPoint deck.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory generated decks are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server with the chat page
    Serve {
        /// Address to listen on (default: 127.0.0.1:5000)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Generate a deck for a topic and print its path
    Generate {
        /// Topic of the presentation
        #[arg(required = true)]
        topic: Vec<String>,

        /// Chat model identifier
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Build a deck from raw bullet text without any network call
    Render {
        /// Topic used for the title slide and file name
        #[arg(short, long)]
        topic: String,

        /// File with raw model text (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the slide texts of a deck
    Inspect {
        /// PowerPoint file(s) to read (.pptx)
        #[arg(required = true)]
        input: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    match args.command {
        Command::Serve { bind } => {
            if let Some(addr) = bind {
                config.bind = addr;
            }
            serve(&config).await
        }
        Command::Generate { topic, model } => {
            if let Some(model) = model {
                config.model = model;
            }
            generate(&config, &topic.join(" ")).await
        }
        Command::Render { topic, input } => render(&config, &topic, input.as_deref()),
        Command::Inspect { input } => {
            for path in &input {
                if let Err(e) = inspect(path) {
                    eprintln!("Error reading {}: {:#}", path.display(), e);
                }
            }
            Ok(())
        }
    }
}

async fn serve(config: &Config) -> Result<()> {
    if !config.has_api_key() {
        log::warn!("OPENROUTER_API_KEY is not set; every /ask request will fail");
    }

    let pipeline = DeckPipeline::from_config(config).context("Failed to set up pipeline")?;
    deckgen_server::serve(pipeline, config.bind)
        .await
        .with_context(|| format!("Server on {} stopped", config.bind))
}

async fn generate(config: &Config, topic: &str) -> Result<()> {
    let pipeline = DeckPipeline::from_config(config).context("Failed to set up pipeline")?;
    let deck = pipeline
        .generate(topic)
        .await
        .with_context(|| format!("Failed to generate deck for '{}'", topic))?;

    if deck.bullets_dropped > 0 {
        eprintln!("{} bullets did not fit and were left out", deck.bullets_dropped);
    }
    println!("{}", config.output_dir.join(&deck.file_name).display());
    Ok(())
}

fn render(config: &Config, topic: &str, input: Option<&Path>) -> Result<()> {
    let topic = Topic::parse(topic).context("Topic is required")?;
    let raw = read_input(input)?;

    let renderer = DeckRenderer::new(config.output_dir.clone());
    let deck = deck_from_text(&renderer, &topic, &raw).context("Failed to build deck")?;

    log::info!(
        "{} bullets on {} slides ({} dropped)",
        deck.bullets_used,
        deck.slide_count,
        deck.bullets_dropped
    );
    println!("{}", renderer.output_dir().join(&deck.file_name).display());
    Ok(())
}

/// Read raw text from a file, or stdin when no file is given.
fn read_input(input: Option<&Path>) -> Result<String> {
    let mut raw = String::new();
    match input {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?
                .read_to_string(&mut raw)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
        }
    }
    Ok(raw)
}

fn inspect(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let slides = DeckReader::new()
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read slides from {}", path.display()))?;

    println!("{} ({} slides)", path.display(), slides.len());
    for slide in &slides {
        println!("--- Slide {} ---", slide.number);
        for paragraph in &slide.paragraphs {
            println!("{}", paragraph);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_keeps_error_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pptx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = inspect(&path).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.starts_with("Failed to read slides from"));
        assert!(message.contains("ZIP error"));
        assert!(err.downcast_ref::<deckgen_core::Error>().is_some());
    }

    #[test]
    fn test_render_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bullets.txt");
        std::fs::write(&input, "1. Alpha\n2. Beta\n").unwrap();

        let config = Config {
            output_dir: dir.path().join("out"),
            ..Config::default()
        };
        render(&config, "greek letters", Some(&input)).unwrap();

        let decks: Vec<_> = std::fs::read_dir(dir.path().join("out")).unwrap().collect();
        assert_eq!(decks.len(), 1);
    }
}
