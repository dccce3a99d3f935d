//! `bell`: a looping meditation bell for the terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bubbletea_rs::Program;
use clap::Parser;
use tracing::info;

use meditation_bell::config::{Overrides, Settings, Variant};
use meditation_bell::{app, audio, logging, App, AudioStrategy};

#[derive(Debug, Parser)]
#[command(name = "bell", version, about = "A looping interval timer that rings a bell every cycle")]
struct Cli {
    /// Settings file (default: <config dir>/meditation-bell/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Start from a preset: countdown (editable, clip) or count-up (fixed, tone)
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Cycle length in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=999))]
    duration: Option<u32>,

    /// How the bell sounds
    #[arg(long, value_enum, conflicts_with = "mute")]
    audio: Option<AudioStrategy>,

    /// Bell clip to play the last seconds of
    #[arg(long, value_name = "PATH")]
    clip: Option<PathBuf>,

    /// Pitch of the synthesized bell in Hz
    #[arg(long, value_name = "HZ")]
    tone: Option<f32>,

    /// Where to write logs (default: <cache dir>/meditation-bell/bell.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// No sound; the cycle still restarts
    #[arg(long)]
    mute: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            variant: self.variant,
            duration: self.duration,
            strategy: self.audio,
            clip: self.clip.clone(),
            tone_hz: self.tone,
            log_file: self.log_file.clone(),
            mute: self.mute,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    settings
        .apply(cli.overrides())
        .context("invalid command line settings")?;

    let _log_guard = settings.log_path().and_then(|path| match logging::init(&path) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("bell: logging disabled ({}): {err}", path.display());
            None
        }
    });
    info!(?settings, "starting bell");

    let cue = audio::build(&settings.audio);
    app::launch(settings, cue);

    let program = Program::<App>::builder()
        .alt_screen(true)
        .build()
        .context("failed to set up the terminal")?;
    program.run().await.context("bell exited with an error")?;

    info!("bell stopped");
    Ok(())
}
