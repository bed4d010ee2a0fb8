//! Best-effort "bring the break view to the front".
//!
//! These shell out and block, so only call them from a surface's UI thread.

pub mod hypr;
pub mod macos;

use crate::error::FocusError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowManager {
    Hyprland,
    MacOs { process_name: String },
    Unsupported,
}

impl WindowManager {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            let term_program = std::env::var("TERM_PROGRAM").ok();
            return WindowManager::MacOs {
                process_name: macos::terminal_process_name(term_program.as_deref()),
            };
        }
        if std::env::var_os("HYPRLAND_INSTANCE_SIGNATURE").is_some() {
            return WindowManager::Hyprland;
        }
        WindowManager::Unsupported
    }

    /// Raise the window titled `title`.
    pub fn raise(&self, title: &str) -> Result<(), FocusError> {
        match self {
            WindowManager::Hyprland => hypr::focus_window_by_title(title),
            WindowManager::MacOs { process_name } => macos::bring_to_front(process_name),
            WindowManager::Unsupported => Err(FocusError::Unsupported),
        }
    }
}
