//! Presentation surfaces for the break view.
//!
//! The controller only speaks [`ViewCommand`]s. Each surface turns them into
//! something visible on its own thread or task, and reports user actions
//! back as [`ViewEvent`]s through the controller's event channel.

pub mod framing;
pub mod process;
pub mod terminal;
pub mod view;
pub mod websocket;

use crate::error::SurfaceError;
use view::ViewCommand;

pub trait PresentationSurface: Send {
    /// Hand a command to the surface. Must not block.
    fn send(&mut self, command: ViewCommand) -> Result<(), SurfaceError>;

    fn open_break_view(&mut self) -> Result<(), SurfaceError> {
        self.send(ViewCommand::Open)
    }

    fn close_break_view(&mut self) -> Result<(), SurfaceError> {
        self.send(ViewCommand::Close)
    }

    fn set_countdown_text(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.send(ViewCommand::Countdown {
            text: text.to_string(),
        })
    }

    fn set_acknowledge_enabled(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.send(ViewCommand::AcknowledgeEnabled { enabled })
    }

    fn set_acknowledge_label(&mut self, label: &str) -> Result<(), SurfaceError> {
        self.send(ViewCommand::AcknowledgeLabel {
            label: label.to_string(),
        })
    }

    /// Informational text, shown when a close attempt is refused.
    fn show_notice(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.send(ViewCommand::Notice {
            text: text.to_string(),
        })
    }

    fn request_focus(&mut self) -> Result<(), SurfaceError> {
        self.send(ViewCommand::RequestFocus)
    }

    fn shutdown(&mut self) -> Result<(), SurfaceError> {
        self.send(ViewCommand::Shutdown)
    }
}
