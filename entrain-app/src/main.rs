//! entrain - binaural beat focus sessions from the command line

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use entrain_audio::{CpalBackend, TRACKS};
use entrain_control::{BeatController, ControlEvent};

/// Play a binaural beat track for a focus session.
#[derive(Parser, Debug)]
#[command(name = "entrain", version, about)]
struct Args {
    /// Track to play (see --list)
    #[arg(default_value = "Alpha Waves")]
    track: String,

    /// Session length in minutes
    #[arg(short, long, default_value_t = 25)]
    minutes: u64,

    /// Start muted
    #[arg(long)]
    muted: bool,

    /// List available tracks and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list {
        for track in TRACKS {
            println!(
                "{:<12} {:>5.0} Hz | {:>5.0} Hz  ({:.0} Hz beat)",
                track.name,
                track.left_hz,
                track.right_hz,
                track.beat_hz()
            );
        }
        return Ok(());
    }

    // Accept any casing of a catalog name.
    let name = TRACKS
        .iter()
        .map(|track| track.name)
        .find(|candidate| candidate.eq_ignore_ascii_case(&args.track))
        .unwrap_or(args.track.as_str());

    let (controller, events) = BeatController::new(CpalBackend::new());
    controller.set_muted(args.muted);
    controller.play(name).await;

    match events.try_recv() {
        Ok(ControlEvent::Started { track }) => {
            println!("playing {track} for {} minutes (ctrl-c to stop)", args.minutes);
        }
        Ok(ControlEvent::Error(message)) => {
            controller.shutdown().await;
            anyhow::bail!(message);
        }
        other => tracing::debug!(?other, "unexpected control event after play"),
    }

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.minutes * 60)) => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
        }
    }

    controller.pause();
    controller.shutdown().await;
    Ok(())
}
