use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use tubeplayer::console::{status_line, ConsoleCommand, HELP};
use tubeplayer::fullscreen::SimulatedFullscreen;
use tubeplayer::player::{DismissReason, PlayerController, PlayerDialog, PlayerEvent};
use tubeplayer::sdk::{SimulatedMedia, SimulatedSdk};
use tubeplayer::utils::{parse_clock, Config};
use tubeplayer::catalog::LiveStatus;
use tubeplayer::video::{LiveBroadcastContent, Video};
use tubeplayer::{LiveStatusWatcher, VideoCatalog, VideoSource};

/// tubeplayer - drive an embedded player session from the console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video to open; defaults to the catalog's featured video
    #[arg(value_name = "VIDEO_ID")]
    video: Option<String>,

    /// Catalog JSON file (videos.list response or a video array)
    #[arg(short, long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Extra configuration file read after the user config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat a video id given on the command line as a live broadcast
    #[arg(long)]
    live: bool,

    /// Set initial volume (0-100)
    #[arg(short, long, value_name = "VOLUME")]
    volume: Option<u8>,

    /// Write the effective configuration to the user config file and exit
    #[arg(long)]
    write_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_with(args.config.as_deref()).context("loading configuration")?;

    let log_level = if args.debug {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting tubeplayer v{}", env!("CARGO_PKG_VERSION"));

    if args.write_config {
        config.save()?;
        info!("Configuration written");
        return Ok(());
    }

    let fallback = match args.catalog.as_ref().or(config.catalog.path.as_ref()) {
        Some(path) => VideoCatalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => VideoCatalog::default(),
    };
    let source = Arc::new(VideoSource::from_config(&config.catalog, fallback)?);
    let catalog = source.videos().await;
    let live = LiveStatusWatcher::spawn(Arc::clone(&source), config.catalog.live_refresh_interval());

    let initial = initial_video(&args, &catalog, &live.current());
    let mut sdk = simulated_sdk(&catalog);
    if let Some(video) = initial.as_ref().filter(|v| v.is_live) {
        sdk = sdk.with_media(&video.id, SimulatedMedia::live());
    }
    let controller = PlayerController::builder()
        .with_config(config.player.clone())
        .with_sdk(sdk)
        .with_fullscreen(SimulatedFullscreen::new())
        .build()?;

    let _event_sub = controller.subscribe(|event| match event {
        PlayerEvent::SessionOpened { video_id } => info!("Session opened: {}", video_id),
        PlayerEvent::PlayerReady { duration, qualities } => {
            info!("Player ready: {:.0}s, qualities {:?}", duration, qualities)
        }
        PlayerEvent::PlaybackStarted => info!("Playback started"),
        PlayerEvent::PlaybackPaused => info!("Playback paused"),
        PlayerEvent::PlaybackEnded => info!("End of media reached"),
        PlayerEvent::PositionChanged { seconds } => log::debug!("Position: {:.1}s", seconds),
        PlayerEvent::VolumeChanged { volume, muted } => {
            info!("Volume: {}%{}", volume, if *muted { " (muted)" } else { "" })
        }
        PlayerEvent::SpeedChanged { speed } => info!("Playback speed: {}", speed),
        PlayerEvent::QualityChanged { quality } => info!("Quality: {}", quality.label()),
        PlayerEvent::CaptionsChanged { enabled } => info!("Captions: {}", enabled),
        PlayerEvent::FullscreenChanged { active } => info!("Fullscreen: {}", active),
        PlayerEvent::SessionClosed { video_id } => info!("Session closed: {}", video_id),
        PlayerEvent::Error { message } => error!("Player error: {}", message),
    });

    let dismissed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dismissed);
    let mut dialog = PlayerDialog::new(controller, move || flag.store(true, Ordering::SeqCst));

    match initial.as_ref() {
        Some(video) => dialog.render(Some(video), true)?,
        None => info!("No video selected; use `open <id>` or `list`"),
    }
    if let Some(volume) = args.volume {
        // Applied once the instance exists
        tokio::time::sleep(dialog.controller().config().mount_delay() * 2).await;
        dialog.controller().set_volume(volume);
    }

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::TogglePlay => dialog.controller().toggle_play(),
            ConsoleCommand::Play => dialog.controller().play(),
            ConsoleCommand::Pause => dialog.controller().pause(),
            ConsoleCommand::Seek(seconds) => dialog.seek_to(seconds),
            ConsoleCommand::Volume(volume) => dialog.controller().set_volume(volume),
            ConsoleCommand::Mute => dialog.controller().toggle_mute(),
            ConsoleCommand::Speed(speed) => dialog.controller().set_speed(speed),
            ConsoleCommand::Quality(quality) => dialog.controller().set_quality(quality),
            ConsoleCommand::Captions => dialog.controller().toggle_captions(),
            ConsoleCommand::Fullscreen => dialog.controller().toggle_fullscreen(),
            ConsoleCommand::Key(key) => dialog.handle_key(key),
            ConsoleCommand::Status => println!("{}", status_line(&dialog.controller().snapshot())),
            ConsoleCommand::Open(id) => {
                let video = lookup(&catalog, &live.current(), &id)
                    .unwrap_or_else(|| Video::new(id.clone(), id.clone()));
                dialog.render(Some(&video), true)?;
            }
            ConsoleCommand::Search(query) => {
                for video in source.search(&query).await {
                    println!("{}  {}  {}", video.id, video.display_duration(), video.title);
                }
            }
            ConsoleCommand::List => {
                if let Some(video) = live.current().live_video {
                    println!("live now: {}  {}", video.id, video.title);
                }
                for video in catalog.videos() {
                    println!("{}  {}  {}", video.id, video.display_duration(), video.title);
                }
            }
            ConsoleCommand::Close => {
                dialog.dismiss(DismissReason::CloseButton);
            }
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => break,
        }

        // The screen honours every dismissal by closing the dialog
        if dismissed.swap(false, Ordering::SeqCst) {
            dialog.render(None, false)?;
        }
    }

    dialog.render(None, false)?;
    live.stop();
    info!("Shutting down");
    Ok(())
}

/// The video given on the command line, else the live broadcast, else the
/// catalog's featured one
fn initial_video(args: &Args, catalog: &VideoCatalog, live: &LiveStatus) -> Option<Video> {
    match args.video.as_deref() {
        Some(id) => {
            let video = lookup(catalog, live, id).unwrap_or_else(|| Video::new(id, id));
            if args.live {
                Some(video.with_broadcast(LiveBroadcastContent::Live))
            } else {
                Some(video)
            }
        }
        None => live
            .live_video
            .clone()
            .or_else(|| catalog.featured().cloned()),
    }
}

fn lookup(catalog: &VideoCatalog, live: &LiveStatus, id: &str) -> Option<Video> {
    catalog
        .get(id)
        .ok()
        .or(live.live_video.as_ref().filter(|v| v.id == id))
        .cloned()
}

/// Simulated platform serving every catalog entry
fn simulated_sdk(catalog: &VideoCatalog) -> SimulatedSdk {
    catalog.videos().iter().fold(SimulatedSdk::new(), |sdk, video| {
        let media = if video.is_live {
            SimulatedMedia::live()
        } else {
            match parse_clock(&video.duration) {
                Some(duration) if duration > 0.0 => SimulatedMedia::vod(duration),
                _ => SimulatedMedia::default(),
            }
        };
        sdk.with_media(&video.id, media)
    })
}
