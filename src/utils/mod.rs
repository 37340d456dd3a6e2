//! Utility module for tubeplayer
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Clock formatting, parsing and clamping helpers

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{CatalogConfig, Config, GeneralConfig};
pub use error::{IntoPlayerError, PlayerError, Result};

/// Format a position in seconds for display
///
/// Returns "H:MM:SS" for an hour or more and "M:SS" otherwise. Negative and
/// non-finite inputs render as "0:00".
pub fn format_clock(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format_hms(total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60)
}

/// Format hour, minute and second components the way video durations are shown
pub fn format_hms(hours: u64, minutes: u64, seconds: u64) -> String {
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Parse a "M:SS" or "H:MM:SS" label back into seconds
pub fn parse_clock(label: &str) -> Option<f64> {
    let parts = label
        .trim()
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let seconds = match parts.as_slice() {
        [m, s] if *s < 60 => m * 60 + s,
        [h, m, s] if *m < 60 && *s < 60 => h * 3600 + m * 60 + s,
        _ => return None,
    };
    Some(seconds as f64)
}

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
