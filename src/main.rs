use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use mini_brain::client::is_stop_command;
use mini_brain::db::{self, ConversationRepo};
use mini_brain::{
    ApiServerBuilder, BrainClient, Config, DialoguePipeline, DialoguePipelineBuilder,
    LanguageChoice, Utterance,
};

/// MINI - dialogue brain for a bilingual voice assistant
#[derive(Parser)]
#[command(name = "mini", version, about)]
struct Cli {
    /// Config file (TOML, or legacy settings.json)
    #[arg(short, long, env = "MINI_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP brain (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Answer one utterance in-process and print the outcome as JSON
    Ask {
        /// Text to answer
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Language: auto, en, hi
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Chat with a running brain from the terminal
    Chat {
        /// Brain base URL
        #[arg(long, env = "MINI_BRAIN_URL", default_value = "http://localhost:8000")]
        url: String,
        /// Directory to save reply audio into
        #[arg(long)]
        audio_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,mini_brain=info",
        1 => "info,mini_brain=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(&config, host, port).await,
        Command::Ask { text, lang } => ask(&config, &text.join(" "), lang.as_deref()).await,
        Command::Chat { url, audio_dir } => chat(&url, audio_dir).await,
    }
}

/// Build the pipeline, attaching the conversation store when one is configured
///
/// A database that cannot be opened leaves persistence off; replies are
/// unaffected.
fn build_pipeline(config: &Config) -> (DialoguePipeline, Option<ConversationRepo>) {
    let mut builder = DialoguePipelineBuilder::from_config(config);

    let repo = config
        .persistence
        .database_path
        .as_ref()
        .and_then(|path| match db::init(path) {
            Ok(pool) => {
                tracing::info!(path = %path.display(), "conversation log enabled");
                Some(ConversationRepo::new(pool))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to open conversation database, continuing without it"
                );
                None
            }
        });

    if let Some(repo) = &repo {
        builder = builder.conversation_store(Arc::new(repo.clone()));
    }

    (builder.build(), repo)
}

async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let (pipeline, repo) = build_pipeline(config);

    let mut builder = ApiServerBuilder::new(pipeline).config(config);
    if let Some(repo) = repo {
        builder = builder.repo(repo);
    }
    if let Some(host) = host {
        builder = builder.host(host);
    }
    if let Some(port) = port {
        builder = builder.port(port);
    }

    tracing::info!(
        voice_profile = %config.voice_profile,
        default_language = config.default_language.as_str(),
        "starting MINI brain"
    );

    builder.build().run().await?;
    Ok(())
}

async fn ask(config: &Config, text: &str, lang: Option<&str>) -> anyhow::Result<()> {
    let (pipeline, _repo) = build_pipeline(config);
    let requested = lang.map_or(config.default_language, LanguageChoice::parse);

    let outcome = pipeline.handle(&Utterance::new(text, requested)).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    // The runtime shuts down on return
    pipeline.drain().await;

    Ok(())
}

async fn chat(url: &str, audio_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let client = BrainClient::new(url)?;
    println!("MINI: Hello Boss, MINI is online. Say \"goodbye\" to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("YOU: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = line.trim().to_lowercase();

        if command.is_empty() {
            continue;
        }
        if is_stop_command(&command) {
            println!("MINI: Going offline, Boss.");
            break;
        }

        match client.ask(&command).await {
            Ok(reply) => {
                println!("MINI: {} (mood: {})", reply.reply, reply.mood);

                if let (Some(audio_url), Some(dir)) = (&reply.audio_url, &audio_dir) {
                    let dest = dir.join("mini_reply.mp3");
                    match client.download_audio(audio_url, &dest).await {
                        Ok(path) => println!("      audio saved to {}", path.display()),
                        Err(e) => tracing::warn!(error = %e, "failed to download reply audio"),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "brain request failed");
                println!("MINI: Could not reach the brain, Boss. Try again.");
            }
        }
    }

    Ok(())
}
