use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use prose_pilot_client::HttpTransformService;
use prose_pilot_config::Config;
use prose_pilot_engine::{
    ArticleMeta, AssistOptions, Document, InlineAssist, Invocation, Outcome, PRESET_ACTIONS,
    SelectionUpdate, ViewRect,
};
use tracing::info;

/// Run one inline transformation against a post document and print the
/// updated document JSON to stdout.
#[derive(Parser, Debug)]
#[command(name = "prose-pilot", version, about)]
struct Args {
    /// Path to the post document (JSON block tree)
    post: PathBuf,

    /// Selection start, in characters
    #[arg(long)]
    from: usize,

    /// Selection end, in characters
    #[arg(long)]
    to: usize,

    /// Preset action id (improve, shorten, expand, fix)
    #[arg(long, conflicts_with = "prompt")]
    action: Option<String>,

    /// Free-form instruction instead of a preset
    #[arg(long)]
    prompt: Option<String>,

    /// Article title sent as context
    #[arg(long, default_value = "")]
    title: String,

    /// Article subtitle sent as context
    #[arg(long, default_value = "")]
    subtitle: String,

    /// Article category sent as context
    #[arg(long, default_value = "")]
    category: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let invocation = match (&args.action, &args.prompt) {
        (Some(action), None) => Invocation::Preset(action.clone()),
        (None, Some(prompt)) => Invocation::Custom(prompt.clone()),
        _ => {
            let ids: Vec<&str> = PRESET_ACTIONS.iter().map(|a| a.id).collect();
            bail!(
                "provide exactly one of --action ({}) or --prompt",
                ids.join(", ")
            );
        }
    };

    let config = Config::load()
        .with_context(|| format!("failed to load {}", Config::config_path().display()))?
        .unwrap_or_default();
    let service = HttpTransformService::from_config(&config).with_context(|| {
        format!(
            "transformation service not configured; set [service] endpoint and api_key in {}",
            Config::config_path().display()
        )
    })?;

    let content = std::fs::read_to_string(&args.post)
        .with_context(|| format!("failed to read {}", args.post.display()))?;
    let mut doc = Document::from_json(&content)
        .with_context(|| format!("failed to parse {}", args.post.display()))?;

    let mut assist = InlineAssist::with_options(
        ArticleMeta {
            title: args.title,
            subtitle: args.subtitle,
            category: args.category,
        },
        AssistOptions {
            min_selection_chars: config.editor.min_selection_chars,
            context_excerpt_chars: config.editor.context_excerpt_chars,
        },
    );

    // No real viewport here; the anchor geometry is irrelevant in batch mode.
    assist.on_selection_change(
        &doc,
        SelectionUpdate {
            from: args.from,
            to: args.to,
            start_rect: ViewRect::default(),
            end_rect: ViewRect::default(),
        },
    );

    let outcome = assist.transform(&mut doc, &service, invocation).await?;

    match outcome {
        Outcome::Applied(patch) => {
            info!(version = patch.version, "transformation applied");
            println!("{}", doc.to_json()?);
            eprintln!("applied");
        }
        Outcome::Empty => {
            println!("{}", doc.to_json()?);
            eprintln!("service returned nothing; document unchanged");
        }
        Outcome::Discarded => {
            eprintln!("transformation discarded");
            process::exit(1);
        }
        Outcome::Failed { message, .. } => {
            eprintln!("transformation failed: {message}");
            process::exit(1);
        }
    }

    Ok(())
}
