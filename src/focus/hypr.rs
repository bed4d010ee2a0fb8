use std::process::Command;

use serde::Deserialize;

use crate::error::FocusError;

#[derive(Debug, Deserialize)]
struct HyprlandWindow {
    title: String,
}

pub fn get_active_window_title() -> Result<String, FocusError> {
    let output = Command::new("hyprctl")
        .args(["activewindow", "-j"])
        .output()?;

    if !output.status.success() {
        return Ok(String::new());
    }

    parse_active_window(&String::from_utf8_lossy(&output.stdout))
}

fn parse_active_window(stdout: &str) -> Result<String, FocusError> {
    // hyprctl prints `Invalid` or `{}` when nothing has focus
    let trimmed = stdout.trim();
    if trimmed.is_empty() || !trimmed.starts_with('{') || trimmed == "{}" {
        return Ok(String::new());
    }

    let window: HyprlandWindow = serde_json::from_str(trimmed)?;
    Ok(window.title)
}

/// Focus the window whose title is exactly `title`, unless it already has focus.
pub fn focus_window_by_title(title: &str) -> Result<(), FocusError> {
    if get_active_window_title()? == title {
        return Ok(());
    }

    let status = Command::new("hyprctl")
        .args(["dispatch", "focuswindow", &title_selector(title)])
        .status()?;
    if !status.success() {
        return Err(FocusError::CommandFailed {
            program: "hyprctl",
            status,
        });
    }
    Ok(())
}

fn title_selector(title: &str) -> String {
    format!("title:^({})$", regex::escape(title))
}
