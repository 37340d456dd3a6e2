//! Line-oriented command language of the console binary

use crate::player::{ControlKey, PlaybackSpeed, Quality, SessionState};
use crate::utils::error::{PlayerError, Result};
use std::str::FromStr;

/// One command typed at the console
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    TogglePlay,
    Play,
    Pause,
    /// Absolute seek target, in seconds
    Seek(f64),
    Volume(u8),
    Mute,
    Speed(PlaybackSpeed),
    Quality(Quality),
    Captions,
    Fullscreen,
    /// A raw control key, as the player surface would receive it
    Key(ControlKey),
    Status,
    Open(String),
    Search(String),
    List,
    Close,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | pause | toggle        playback
  seek <secs|m:ss>             jump to a position
  vol <0-100> | mute           volume
  speed <0.25..2|normal>       playback rate
  quality <auto|level>         requested quality
  cc | fs                      captions, fullscreen
  key <space|left|right|up|down|home|end|esc>
  open <id> | search <text> | list
  status | close | help | quit";

impl FromStr for ConsoleCommand {
    type Err = PlayerError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "toggle" | "p" => ConsoleCommand::TogglePlay,
            "play" => ConsoleCommand::Play,
            "pause" => ConsoleCommand::Pause,
            "seek" => ConsoleCommand::Seek(parse_position(rest)?),
            "vol" | "volume" => {
                let volume: u8 = rest
                    .parse()
                    .map_err(|_| PlayerError::invalid_input(format!("not a volume: {}", rest)))?;
                if volume > 100 {
                    return Err(PlayerError::invalid_input("volume must be 0-100"));
                }
                ConsoleCommand::Volume(volume)
            }
            "mute" => ConsoleCommand::Mute,
            "speed" => ConsoleCommand::Speed(rest.parse()?),
            "quality" => {
                if rest.is_empty() {
                    return Err(PlayerError::invalid_input("quality needs a level"));
                }
                ConsoleCommand::Quality(Quality::from(rest))
            }
            "cc" | "captions" => ConsoleCommand::Captions,
            "fs" | "fullscreen" => ConsoleCommand::Fullscreen,
            "key" => ConsoleCommand::Key(parse_key(rest)?),
            "status" | "s" => ConsoleCommand::Status,
            "open" => {
                if rest.is_empty() {
                    return Err(PlayerError::invalid_input("open needs a video id"));
                }
                ConsoleCommand::Open(rest.to_string())
            }
            "search" => ConsoleCommand::Search(rest.to_string()),
            "list" | "ls" => ConsoleCommand::List,
            "close" => ConsoleCommand::Close,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => {
                return Err(PlayerError::invalid_input(format!(
                    "unknown command: {}",
                    other
                )))
            }
        };
        Ok(command)
    }
}

fn parse_position(arg: &str) -> Result<f64> {
    if let Some(seconds) = crate::utils::parse_clock(arg) {
        return Ok(seconds);
    }
    arg.parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| PlayerError::invalid_input(format!("not a position: {}", arg)))
}

fn parse_key(name: &str) -> Result<ControlKey> {
    let key = match name.to_ascii_lowercase().as_str() {
        "space" => ControlKey::Space,
        "left" => ControlKey::Left,
        "right" => ControlKey::Right,
        "up" => ControlKey::Up,
        "down" => ControlKey::Down,
        "home" => ControlKey::Home,
        "end" => ControlKey::End,
        "esc" | "escape" => ControlKey::Escape,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => ControlKey::from_char(c)
                    .ok_or_else(|| PlayerError::invalid_input(format!("unknown key: {}", name)))?,
                _ => return Err(PlayerError::invalid_input(format!("unknown key: {}", name))),
            }
        }
    };
    Ok(key)
}

/// One-line rendering of the control bar
pub fn status_line(state: &SessionState) -> String {
    let Some(video) = state.video.as_ref() else {
        return "no video".to_string();
    };
    let mode = if state.is_playing() { ">" } else { "||" };
    let volume = if state.muted {
        "muted".to_string()
    } else {
        format!("vol {}", state.volume)
    };
    format!(
        "{} {} [{:?}] {} / {} | {} | {} | {} | cc {}{}",
        mode,
        video.title,
        state.playback_state,
        state.position_label(),
        state.duration_label(),
        volume,
        state.speed.label(),
        state.quality.label(),
        if state.captions_enabled { "on" } else { "off" },
        if state.fullscreen_active { " | fullscreen" } else { "" },
    )
}
