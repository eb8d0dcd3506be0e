use clap::{Parser, Subcommand};
use hug_reel::config::{self, AppConfig};
use hug_reel::generation::{GeminiBackend, GenerationClient};
use hug_reel::imaging::{Compositor, decode_file};
use hug_reel::output;
use hug_reel::workflow::{SlotRole, WorkflowController, WorkflowState};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hug-reel")]
#[command(about = "Turn two portraits into a short hug video")]
#[command(long_about = "\
Turn two portraits into a short hug video

The first photo is the person who stays still; they end up on the left.
The second photo is the person who walks over and hugs them; they end up
on the right. Both are scaled to the same height and combined into one
frame, which is sent to a video model.

Generating a video needs an API key in the environment variable named by
generation.api_key_env (GEMINI_API_KEY by default). It usually takes a few
minutes. Press Ctrl-C to stop waiting; the remote job is not cancelled.

Set RUST_LOG=hug_reel=debug for per-poll logging.

Run 'hug-reel gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Path to a config.toml (stock defaults if omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the side-by-side frame only, without calling the video service
    Compose {
        /// Photo of the person who stays still (left)
        still: PathBuf,
        /// Photo of the person who moves in for the hug (right)
        hugger: PathBuf,
        /// Where to write the composite JPEG
        #[arg(long, default_value = "composite.jpg")]
        out: PathBuf,
    },
    /// Composite both photos and generate the hug video
    Generate {
        /// Photo of the person who stays still (left)
        still: PathBuf,
        /// Photo of the person who moves in for the hug (right)
        hugger: PathBuf,
        /// File or directory to save the video to (defaults to the configured filename)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Compose { still, hugger, out } => {
            let config = config::load_config(cli.config.as_deref())?;
            compose(&config, &still, &hugger, &out)?;
        }
        Command::Generate { still, hugger, out } => {
            let config = config::load_config(cli.config.as_deref())?;
            generate(&config, &still, &hugger, out.as_deref()).await?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays the CLI's own output. `RUST_LOG` overrides.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hug_reel=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compose(
    config: &AppConfig,
    still: &Path,
    hugger: &Path,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let left = decode_file(still)?;
    let right = decode_file(hugger)?;
    let compositor = Compositor::new(config.composite.to_composite_config());
    let frame = compositor.compose(&left, &right)?;
    frame.write_to(out)?;
    output::print_composite(&frame, Some(out));
    Ok(())
}

async fn generate(
    config: &AppConfig,
    still: &Path,
    hugger: &Path,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = config::resolve_api_key(&config.generation)?;
    let backend = GeminiBackend::with_base_url(
        api_key,
        config.generation.base_url.clone(),
        config.generation.model.clone(),
    );
    let client = GenerationClient::new(backend)
        .with_poll_interval(config.generation.poll_interval())
        .with_video_filename(config.output.video_filename.clone());
    let controller = WorkflowController::new(
        Compositor::new(config.composite.to_composite_config()),
        client,
    )
    .with_tick_period(config.progress.tick_period());

    // Fill both slots before bailing so each bad file gets its own line
    let uploads = [(SlotRole::Still, still), (SlotRole::Hugger, hugger)]
        .map(|(role, path)| controller.upload_file(role, path));
    output::print_inputs(&SlotRole::ALL.map(|role| (role, controller.slot(role))));
    for upload in uploads {
        upload?;
    }

    // Terminal states are printed from the submit result below
    let mut rx = controller.subscribe();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            if state.is_busy() {
                output::print_state(&state);
            }
        }
    });

    let outcome = tokio::select! {
        result = controller.submit() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    watcher.abort();

    let Some(result) = outcome else {
        println!("==> Stopped waiting; the remote job may still finish on its own");
        return Ok(());
    };
    let state = result?;
    output::print_state(&state);
    match state {
        WorkflowState::Ready(video) => {
            let dest = out.unwrap_or_else(|| Path::new("."));
            let saved = video.save_as(dest)?;
            println!("{}", output::format_saved(&saved));
            Ok(())
        }
        WorkflowState::Failed(message) => Err(message.into()),
        _ => Ok(()),
    }
}
