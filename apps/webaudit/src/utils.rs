//! Small shared helpers for user-facing CLI messages.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_DISABLED: AtomicBool = AtomicBool::new(false);

/// Turn colored output off for the rest of the process (`--no-color`).
pub fn disable_colors() {
    COLOR_DISABLED.store(true, Ordering::Relaxed);
}

/// Colors are on unless `--no-color` was passed or `NO_COLOR` is set.
pub fn use_colors() -> bool {
    !COLOR_DISABLED.load(Ordering::Relaxed) && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors() {
        "note:".yellow().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if use_colors() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}
