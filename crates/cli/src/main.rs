use anyhow::{bail, Context};
use api_shared::{ErrorRes, GeneratePresentationReq};
use clap::{Parser, Subcommand};
use deck_types::{PresentationResponse, Slide};
use deckstream_core::{
    config::{gemini_model_from_env_value, stream_budget_from_env_value},
    palette::extract_brand_colors,
    prompt::build_presentation_prompt,
    speaker_notes::{script_segments, total_duration, ScriptSegment, SpeakingDuration},
    sse::{SseDecoder, SseFrame},
    templates::builtin_templates,
    CoreConfig, DeckAssembler, GeminiClient, GenerationRequest, Orchestrator, StreamEvent,
};
use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deckstream")]
#[command(about = "Streaming slide-deck generation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deck and print it as JSON
    Generate {
        /// Topic or brief for the deck
        prompt: String,
        /// Number of slides (1-20)
        #[arg(long, short = 'n', default_value_t = 5)]
        slides: i64,
        /// Base URL of a running deckstream server; generates in-process when omitted
        #[arg(long)]
        server: Option<String>,
        /// Write the deck JSON to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Extract a brand palette from a logo image
    Palette {
        /// Logo file (PNG, JPEG, GIF, WebP, ...)
        logo: PathBuf,
    },
    /// Print the generation prompt for a topic without calling the model
    Prompt {
        /// Topic or brief for the deck
        topic: String,
        /// Number of slides (1-20)
        #[arg(long, short = 'n', default_value_t = 5)]
        slides: i64,
    },
    /// List the built-in templates
    Templates,
    /// Print the speaker notes of a generated deck
    Notes {
        /// Deck JSON written by `generate`
        deck: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deckstream_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate {
            prompt,
            slides,
            server,
            output,
        }) => generate(&prompt, slides, server.as_deref(), output.as_deref()).await?,
        Some(Commands::Palette { logo }) => {
            let bytes = std::fs::read(&logo)
                .with_context(|| format!("failed to read {}", logo.display()))?;
            let colors = extract_brand_colors(&bytes)?;
            println!("{}", serde_json::to_string_pretty(&colors)?);
        }
        Some(Commands::Prompt { topic, slides }) => {
            let request = GenerationRequest::new(&topic, slides)?;
            println!(
                "{}",
                build_presentation_prompt(request.prompt(), request.num_slides())
            );
        }
        Some(Commands::Templates) => {
            for template in builtin_templates() {
                println!(
                    "{:<14}{:<14}{}",
                    template.id, template.name, template.description
                );
            }
        }
        Some(Commands::Notes { deck }) => {
            let raw = std::fs::read_to_string(&deck)
                .with_context(|| format!("failed to read {}", deck.display()))?;
            print!("{}", render_notes(&parse_deck(&raw)?));
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}

async fn generate(
    prompt: &str,
    slides: i64,
    server: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let request = GenerationRequest::new(prompt, slides)?;
    let assembler = match server {
        Some(base) => generate_remote(base, &request).await?,
        None => generate_local(request).await?,
    };

    if let Some(err) = assembler.error() {
        bail!("generation failed: {}: {}", err.code, err.message);
    }

    let json = match assembler.presentation() {
        Some(presentation) => serde_json::to_string_pretty(presentation)?,
        None => {
            eprintln!(
                "warning: the final deck did not validate; keeping the {} streamed slides",
                assembler.slides().len()
            );
            serde_json::to_string_pretty(assembler.final_slides())?
        }
    };
    eprintln!(
        "Estimated speaking time: {}",
        SpeakingDuration::from_seconds(total_duration(assembler.final_slides()))
    );

    match output {
        Some(path) => {
            write_output(path, &json)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    Ok(CoreConfig::new(
        std::env::var("GEMINI_API_KEY").ok(),
        gemini_model_from_env_value(std::env::var("GEMINI_MODEL").ok()),
        stream_budget_from_env_value(std::env::var("DECKSTREAM_STREAM_BUDGET_SECS").ok())?,
        None,
    )?)
}

async fn generate_local(request: GenerationRequest) -> anyhow::Result<DeckAssembler> {
    let cfg = config_from_env()?;
    let Some(key) = cfg.gemini_api_key() else {
        bail!("GEMINI_API_KEY is not set; pass --server to use a running deckstream server");
    };
    let provider = Arc::new(GeminiClient::new(key, Some(cfg.gemini_model().to_owned())));
    let orchestrator = Orchestrator::new(provider, cfg.stream_budget());

    let mut events = orchestrator.start(request);
    let mut assembler = DeckAssembler::new();
    while let Some(event) = events.recv().await {
        if let StreamEvent::Slide(slide) = &event {
            report(slide);
        }
        assembler.apply(event);
    }
    Ok(assembler)
}

async fn generate_remote(
    base: &str,
    request: &GenerationRequest,
) -> anyhow::Result<DeckAssembler> {
    let url = format!("{}/presentations/stream", base.trim_end_matches('/'));
    let body = GeneratePresentationReq {
        prompt: request.prompt().to_owned(),
        num_slides: i64::try_from(request.num_slides())?,
    };

    let resp = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorRes>(&text) {
            Ok(res) => bail!(
                "server returned {}: {}: {}",
                status,
                res.error.code,
                res.error.message
            ),
            Err(_) => bail!("server returned {}: {}", status, text),
        }
    }

    let mut decoder = SseDecoder::new();
    let mut assembler = DeckAssembler::new();
    let mut bytes = resp.bytes_stream();
    while let Some(chunk) = bytes.next().await {
        let chunk = chunk.context("event stream interrupted")?;
        apply_frames(&mut assembler, decoder.push(&chunk));
        if assembler.is_finished() {
            break;
        }
    }
    apply_frames(&mut assembler, decoder.finish());

    if !assembler.is_finished() {
        bail!("event stream ended without a complete or error event");
    }
    Ok(assembler)
}

fn apply_frames(assembler: &mut DeckAssembler, frames: impl IntoIterator<Item = SseFrame>) {
    for frame in frames {
        let seen = assembler.slides().len();
        if assembler.apply_frame(&frame) {
            assembler.slides()[seen..].iter().for_each(report);
        }
    }
}

fn report(slide: &Slide) {
    eprintln!("  {}: {}", slide.id, slide.title);
}

/// Writes through a temporary file in the destination directory so a failed write never leaves a
/// truncated deck behind.
fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Accepts either a full deck or a bare slide list.
fn parse_deck(raw: &str) -> anyhow::Result<Vec<Slide>> {
    if let Ok(presentation) = serde_json::from_str::<PresentationResponse>(raw) {
        return Ok(presentation.slides);
    }
    serde_json::from_str::<Vec<Slide>>(raw).context("file is neither a deck nor a list of slides")
}

fn render_notes(slides: &[Slide]) -> String {
    let mut out = String::new();
    for slide in slides {
        out.push_str(&format!(
            "## {} ({})\n",
            slide.title, slide.speaker_notes.duration
        ));
        for segment in script_segments(&slide.speaker_notes.script) {
            match segment {
                ScriptSegment::Text(text) => out.push_str(&text),
                ScriptSegment::Mark(mark) => {
                    out.push_str(&format!("({})", mark.as_str().to_lowercase()))
                }
            }
        }
        out.push('\n');
        for tip in &slide.speaker_notes.tips {
            out.push_str(&format!("  tip: {}\n", tip));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "Total: {}\n",
        SpeakingDuration::from_seconds(total_duration(slides))
    ));
    out
}
