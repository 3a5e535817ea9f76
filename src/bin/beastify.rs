//! CLI for Beastify - AI thumbnail studio.

use anyhow::Context;
use beastify::inspiration::GALLERY;
use beastify::media::{save_jpeg, DEFAULT_DOWNLOAD_NAME};
use beastify::session::{Action, HistoryId, RequestStatus, SessionState, Studio};
use beastify::{
    EncodedImage, Expression, GeminiProvider, GeminiProviderBuilder, StudioConfig, SubjectPosition,
    TextStyle, ThumbnailModel, ThumbnailRequest,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "beastify")]
#[command(about = "Turn a photo into a viral-style YouTube thumbnail with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a thumbnail from a subject photo
    Generate(GenerateArgs),

    /// Edit an existing thumbnail, keeping the subject's face
    Modify(ModifyArgs),

    /// Interactive studio session with history
    Session,

    /// List text styles, expressions and subject positions
    Styles,

    /// Show reference thumbnail archetypes
    Inspiration,

    /// Check that the API key and model are valid
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// Subject photo (PNG, JPEG or WEBP)
    image: PathBuf,

    /// Short text written on the thumbnail (3-4 words)
    #[arg(short, long)]
    text: String,

    /// Video title, used as context only
    #[arg(long, default_value = "")]
    title: String,

    /// Text style
    #[arg(long, default_value = "MrBeast")]
    style: TextStyle,

    /// Expression to exaggerate
    #[arg(long, default_value = "Default")]
    expression: Expression,

    /// Where to place the subject
    #[arg(long, default_value = "Center")]
    position: SubjectPosition,

    /// Objects or places to add
    #[arg(long, default_value = "")]
    extra: String,

    /// New outfit for the subject
    #[arg(long, default_value = "")]
    clothing: String,

    /// Other people to add
    #[arg(long, default_value = "")]
    people: String,

    /// Elements to avoid
    #[arg(long, default_value = "")]
    avoid: String,

    /// Output file path (always written as JPEG)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ModifyArgs {
    /// What to change
    instruction: String,

    /// Original subject photo, used as the face reference
    #[arg(short, long)]
    subject: PathBuf,

    /// Thumbnail to edit
    #[arg(short, long)]
    thumbnail: PathBuf,

    /// Output file path (always written as JPEG)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StudioConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Generate(args) => generate(args, &config, cli.json).await?,
        Commands::Modify(args) => modify(args, &config, cli.json).await?,
        Commands::Session => run_session(&config).await?,
        Commands::Styles => list_styles(cli.json)?,
        Commands::Inspiration => list_inspiration(cli.json)?,
        Commands::Check => check(&config).await?,
    }

    Ok(())
}

fn build_provider(config: &StudioConfig) -> anyhow::Result<GeminiProvider> {
    Ok(GeminiProviderBuilder::from_config(config).build()?)
}

fn output_path(config: &StudioConfig, requested: Option<PathBuf>) -> PathBuf {
    requested.unwrap_or_else(|| config.output_dir.join(DEFAULT_DOWNLOAD_NAME))
}

async fn generate(args: GenerateArgs, config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let subject = EncodedImage::load(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    let studio = Studio::new(build_provider(config)?);

    for action in [
        Action::SelectSubject(Some(subject)),
        Action::SetThumbnailText(args.text),
        Action::SetVideoTitle(args.title),
        Action::SetTextStyle(args.style),
        Action::SetExpression(args.expression),
        Action::SetSubjectPosition(args.position),
        Action::SetExtraElements(args.extra),
        Action::SetClothingStyle(args.clothing),
        Action::SetOtherPeople(args.people),
        Action::SetNegativePrompt(args.avoid),
    ] {
        studio.dispatch(action);
    }

    let receipt = match studio.generate().await {
        Ok(receipt) => receipt,
        Err(e) => anyhow::bail!(e.user_message()),
    };
    let state = studio.snapshot();
    let image = state
        .result()
        .context("generation finished without a result")?;

    let output = output_path(config, args.output);
    save_jpeg(image, &output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "generation",
            "success": true,
            "id": receipt.id,
            "output": output.display().to_string(),
            "size_bytes": image.size(),
            "model": receipt.metadata.model,
            "duration_ms": receipt.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Thumbnail ready: {} ({} bytes)", output.display(), image.size());
        if let Some(duration) = receipt.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn modify(args: ModifyArgs, config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    if args.instruction.trim().is_empty() {
        anyhow::bail!("the modification instruction must not be empty");
    }
    let subject = EncodedImage::load(&args.subject)
        .with_context(|| format!("reading {}", args.subject.display()))?;
    let thumbnail = EncodedImage::load(&args.thumbnail)
        .with_context(|| format!("reading {}", args.thumbnail.display()))?;

    let provider = build_provider(config)?;
    let request = ThumbnailRequest::modification(&subject, &thumbnail, &args.instruction);
    let edited = match provider.generate(&request).await {
        Ok(edited) => edited,
        Err(e) => anyhow::bail!(e.user_message()),
    };

    let output = output_path(config, args.output);
    save_jpeg(&edited.image, &output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "modification",
            "success": true,
            "output": output.display().to_string(),
            "size_bytes": edited.image.size(),
            "model": edited.metadata.model,
            "duration_ms": edited.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited thumbnail: {} ({} bytes)",
            output.display(),
            edited.image.size()
        );
    }

    Ok(())
}

async fn check(config: &StudioConfig) -> anyhow::Result<()> {
    let provider = build_provider(config)?;
    provider.health_check().await?;
    println!("{} is reachable with model {}", provider.name(), provider.model());
    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let styles: Vec<_> = TextStyle::ALL
            .iter()
            .map(|s| serde_json::json!({ "name": s.as_str(), "tagline": s.tagline() }))
            .collect();
        let result = serde_json::json!({
            "text_styles": styles,
            "expressions": Expression::ALL.iter().map(|e| e.as_str()).collect::<Vec<_>>(),
            "positions": SubjectPosition::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("TEXT STYLES:");
    for style in TextStyle::ALL {
        println!("  {:<10} {}", style.as_str(), style.tagline());
    }
    println!("\nEXPRESSIONS:");
    for expression in Expression::ALL {
        println!("  {}", expression);
    }
    println!("\nSUBJECT POSITIONS:");
    for position in SubjectPosition::ALL {
        println!("  {}", position);
    }
    Ok(())
}

fn list_inspiration(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(GALLERY)?);
        return Ok(());
    }
    for entry in GALLERY {
        println!("{}", entry.title);
        println!("  {}", entry.description);
        println!("  {}\n", entry.image_url);
    }
    Ok(())
}

const SESSION_HELP: &str = "\
Form:
  subject <path>        title <text>        text <text>
  style <name>          expression <name>   position <name>
  extra <text>          clothing <text>     people <text>
  avoid <text>          show                reset
Requests:
  generate              modify <entry> <instruction>
History (entries by number or id):
  history               view <entry>        close
  edit <entry>          instruction <text>  apply     cancel
  delete <entry>        save <entry> [path]
Other:
  help                  quit";

async fn run_session(config: &StudioConfig) -> anyhow::Result<()> {
    let studio = Arc::new(Studio::new(build_provider(config)?));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Beastify studio. Type 'help' for commands.");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        if command == "quit" || command == "exit" {
            break;
        }
        if let Err(e) = session_command(&studio, config, command, rest).await {
            println!("error: {e:#}");
        }
    }
    Ok(())
}

async fn session_command<M>(
    studio: &Arc<Studio<M>>,
    config: &StudioConfig,
    command: &str,
    rest: &str,
) -> anyhow::Result<()>
where
    M: ThumbnailModel + 'static,
{
    let parse_err = |e: String| anyhow::anyhow!(e);
    let action = match command {
        "help" => {
            println!("{SESSION_HELP}");
            return Ok(());
        }
        "subject" => Action::SelectSubject(Some(EncodedImage::load(rest)?)),
        "title" => Action::SetVideoTitle(rest.to_string()),
        "text" => Action::SetThumbnailText(rest.to_string()),
        "style" => Action::SetTextStyle(rest.parse().map_err(parse_err)?),
        "expression" => Action::SetExpression(rest.parse().map_err(parse_err)?),
        "position" => Action::SetSubjectPosition(rest.parse().map_err(parse_err)?),
        "extra" => Action::SetExtraElements(rest.to_string()),
        "clothing" => Action::SetClothingStyle(rest.to_string()),
        "people" => Action::SetOtherPeople(rest.to_string()),
        "avoid" => Action::SetNegativePrompt(rest.to_string()),
        "reset" => Action::Reset,
        "close" => Action::CloseEnlarged,
        "cancel" => Action::CloseModification,
        "instruction" => Action::SetModificationInstruction(rest.to_string()),
        "show" => {
            print_state(&studio.snapshot());
            return Ok(());
        }
        "history" => {
            print_history(&studio.snapshot());
            return Ok(());
        }
        "view" => Action::Enlarge(resolve_entry(studio, rest)?),
        "edit" => Action::OpenModification(resolve_entry(studio, rest)?),
        "delete" => Action::DeleteEntry(resolve_entry(studio, rest)?),
        "save" => {
            let (entry, path) = match rest.split_once(char::is_whitespace) {
                Some((entry, path)) => (entry, Some(PathBuf::from(path.trim()))),
                None => (rest, None),
            };
            let id = resolve_entry(studio, entry)?;
            let state = studio.snapshot();
            let entry = state.history().get(&id).context("entry disappeared")?;
            let path = output_path(config, path);
            save_jpeg(entry.image(), &path)?;
            println!("saved {} to {}", id, path.display());
            return Ok(());
        }
        "generate" => {
            let studio = Arc::clone(studio);
            tokio::spawn(async move {
                match studio.generate().await {
                    Ok(receipt) => println!("\n[generate] new entry {}", receipt.id),
                    Err(e) => println!("\n[generate] {}", e.user_message()),
                }
            });
            println!("generating... (the session stays usable)");
            return Ok(());
        }
        "modify" | "apply" => {
            let target = if command == "modify" {
                let (entry, instruction) = rest
                    .split_once(char::is_whitespace)
                    .context("usage: modify <entry> <instruction>")?;
                Some((resolve_entry(studio, entry)?, instruction.trim().to_string()))
            } else {
                None
            };
            let studio = Arc::clone(studio);
            tokio::spawn(async move {
                let result = match &target {
                    Some((id, instruction)) => studio.modify(id, instruction).await,
                    None => studio.submit_modification().await,
                };
                match result {
                    Ok(receipt) => println!("\n[modify] entry {} updated", receipt.id),
                    Err(e) => println!("\n[modify] {}", e.user_message()),
                }
            });
            println!("modifying...");
            return Ok(());
        }
        other => anyhow::bail!("unknown command '{other}' (try 'help')"),
    };

    studio.dispatch(action);
    Ok(())
}

/// Accepts a 1-based position in the history listing or an id prefix.
fn resolve_entry<M: ThumbnailModel>(studio: &Studio<M>, token: &str) -> anyhow::Result<HistoryId> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("missing history entry");
    }
    let state = studio.snapshot();
    if let Ok(n) = token.parse::<usize>() {
        if let Some(entry) = n.checked_sub(1).and_then(|i| state.history().iter().nth(i)) {
            return Ok(entry.id().clone());
        }
    }
    let mut matches = state
        .history()
        .iter()
        .filter(|e| e.id().as_str().starts_with(token));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => Ok(entry.id().clone()),
        (Some(_), Some(_)) => anyhow::bail!("'{token}' matches several entries"),
        (None, _) => anyhow::bail!("no history entry '{token}'"),
    }
}

fn print_state(state: &SessionState) {
    let form = state.form();
    let params = &form.params;
    println!(
        "subject:    {}",
        form.subject
            .as_ref()
            .map(|s| format!("{} ({} bytes)", s.mime_type(), s.size()))
            .unwrap_or_else(|| "none".into())
    );
    println!("title:      {}", params.video_title);
    println!("text:       {}", params.thumbnail_text);
    println!("style:      {}", params.text_style);
    println!("expression: {}", params.expression);
    println!("position:   {}", params.subject_position);
    println!("extra:      {}", params.extra_elements);
    println!("clothing:   {}", params.clothing_style);
    println!("people:     {}", params.other_people);
    println!("avoid:      {}", params.negative_prompt);
    match state.output_status() {
        Some(RequestStatus::Pending) => println!("output:     generating..."),
        Some(RequestStatus::Failed(reason)) => println!("output:     error: {reason}"),
        Some(RequestStatus::Succeeded(image)) => {
            println!("output:     {} ({} bytes)", image.mime_type(), image.size())
        }
        None => println!("output:     nothing yet"),
    }
    if let Some(entry) = state.enlarged() {
        println!("viewing:    {} ({} bytes)", entry.id(), entry.image().size());
    }
    if let Some(draft) = state.modification() {
        println!("editing:    {} \"{}\"", draft.target, draft.instruction);
    }
}

fn print_history(state: &SessionState) {
    if state.history().is_empty() {
        println!("history is empty");
        return;
    }
    for (i, entry) in state.history().iter().enumerate() {
        let busy = if state.is_modifying(entry.id()) {
            " [modifying]"
        } else {
            ""
        };
        println!(
            "{:>3}. {} {} ({} bytes){}",
            i + 1,
            entry.id(),
            entry.image().mime_type(),
            entry.image().size(),
            busy
        );
    }
}
