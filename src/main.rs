mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tramvia::config::TramviaConfig;
use tramvia::context::ContextBridge;
use tramvia::embedding::SharedEmbedder;
use tramvia::lang::{self, Lang};
use tramvia::pipeline::types::parse_intents;
use tramvia::pipeline::{KbRecord, KbSource, ResolutionOutcome, ResolveRequest, Resolver};
use tramvia::remote::{AnswerRequest, RemoteAssistantClient};

#[derive(Parser)]
#[command(
    name = "tramvia",
    version,
    about = "Intent resolution pipeline for a multilingual transit assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Detect the language of a text
    Detect { text: String },
    /// Resolve an utterance against an intent corpus (and optional KB file)
    Resolve {
        /// JSON file with the authored intent corpus
        #[arg(long)]
        intents: PathBuf,
        /// Optional JSON file with knowledge-base rows
        #[arg(long)]
        kb: Option<PathBuf>,
        /// Language override; detected from the text when omitted
        #[arg(long)]
        lang: Option<Lang>,
        text: String,
    },
    /// Ask the remote generative endpoint directly
    Ask {
        #[arg(long)]
        lang: Option<Lang>,
        #[arg(long)]
        max_tokens: Option<u32>,
        text: String,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.tramvia/models/
    Download,
}

/// KB rows loaded from a local JSON file.
struct FileKbSource {
    path: PathBuf,
}

#[async_trait]
impl KbSource for FileKbSource {
    async fn fetch_rows(&self) -> anyhow::Result<Vec<KbRecord>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read KB file: {}", self.path.display()))?;
        let rows: Vec<KbRecord> = serde_json::from_str(&contents).context("invalid KB JSON")?;
        Ok(rows)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = TramviaConfig::load()?;

    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::Detect { text } => {
            println!("{}", lang::detect(&text));
        }
        Command::Resolve {
            intents,
            kb,
            lang: lang_override,
            text,
        } => {
            let contents = std::fs::read_to_string(&intents)
                .with_context(|| format!("failed to read intents file: {}", intents.display()))?;
            let corpus = parse_intents(&contents).context("invalid intents JSON")?;
            let lang = lang_override.unwrap_or_else(|| lang::detect(&text));

            let embedder = SharedEmbedder::from_config(&config.embedding);
            let resolver = Resolver::new(embedder, config.matching.clone(), config.condenser.clone());
            let kb_source = kb.map(|path| FileKbSource { path });

            let outcome = resolver
                .resolve(ResolveRequest {
                    utterance: &text,
                    intents: &corpus,
                    lang,
                    kb: kb_source.as_ref().map(|s| s as &dyn KbSource),
                })
                .await?;

            match outcome {
                ResolutionOutcome::Intent(record) => {
                    let response = record
                        .responses
                        .get(lang.as_str())
                        .or_else(|| record.responses.get(Lang::default().as_str()));
                    println!("intent: {}", record.id);
                    if let Some(response) = response {
                        println!("response: {response}");
                    }
                }
                ResolutionOutcome::Kb(answer) => {
                    println!("kb: {answer}");
                }
                ResolutionOutcome::NoMatch => {
                    println!("no match: delegate to the generative fallback");
                }
            }
        }
        Command::Ask {
            lang: lang_override,
            max_tokens,
            text,
        } => {
            let lang = lang_override.unwrap_or_else(|| lang::detect(&text));
            let client = RemoteAssistantClient::new(&config.remote)?;
            let bridge = ContextBridge::new();

            let response = client
                .answer(
                    AnswerRequest {
                        text: &text,
                        lang,
                        context: None,
                        max_tokens,
                    },
                    &bridge,
                )
                .await?;

            match response.answer_text() {
                Some(answer) => println!("{answer}"),
                None => println!("(empty answer from {})", response.model.as_deref().unwrap_or("unknown model")),
            }
        }
    }

    Ok(())
}
