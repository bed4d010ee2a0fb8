//! The presentation protocol: what the controller asks a surface to show,
//! and what a surface reports back.

use serde::{Deserialize, Serialize};

pub const BREAK_TITLE: &str = "Move Break";
pub const BREAK_HEADLINE: &str = "🚶 Time to Move! 🚶";
pub const BREAK_MESSAGE: &str = "Stand up, stretch, and move around.\nTake a break from your computer!";
pub const COUNTDOWN_COMPLETE: &str = "Break Complete!";
pub const RETURN_LABEL: &str = "Return to Work";
pub const LOCKED_RETURN_LABEL: &str = "Return to Work (after the countdown)";
pub const CLOSE_BLOCKED_NOTICE: &str =
    "This window stays open until the break is over. Press 'S' to skip the break or 'Q' to quit.";
pub const CLOSE_LOCKED_NOTICE: &str =
    "This window cannot be closed. Press 'S' to skip, 'Enter' once the countdown ends, or 'Q' to quit.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewCommand {
    Open,
    Close,
    Countdown { text: String },
    AcknowledgeEnabled { enabled: bool },
    AcknowledgeLabel { label: String },
    Notice { text: String },
    RequestFocus,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    Skip,
    Acknowledge,
    CloseAttempt,
    Quit,
}

/// Everything needed to draw the break view from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub open: bool,
    pub countdown: String,
    pub acknowledge_enabled: bool,
    pub acknowledge_label: String,
    pub notice: Option<String>,
    pub focus_requests: u64,
    pub shutdown: bool,
}

impl ViewState {
    pub fn apply(&mut self, command: &ViewCommand) {
        match command {
            ViewCommand::Open => {
                *self = ViewState {
                    open: true,
                    acknowledge_label: RETURN_LABEL.to_string(),
                    focus_requests: self.focus_requests,
                    ..ViewState::default()
                };
            }
            ViewCommand::Close => {
                self.open = false;
                self.notice = None;
            }
            ViewCommand::Countdown { text } => self.countdown = text.clone(),
            ViewCommand::AcknowledgeEnabled { enabled } => self.acknowledge_enabled = *enabled,
            ViewCommand::AcknowledgeLabel { label } => self.acknowledge_label = label.clone(),
            ViewCommand::Notice { text } => self.notice = Some(text.clone()),
            ViewCommand::RequestFocus => self.focus_requests += 1,
            ViewCommand::Shutdown => {
                self.open = false;
                self.shutdown = true;
            }
        }
    }
}
