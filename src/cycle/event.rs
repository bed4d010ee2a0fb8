use tokio::sync::mpsc;

use crate::surface::view::ViewEvent;

/// Everything that can move the controller. Timer ticks carry the
/// generation they were scheduled under; user actions do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    WorkTick { generation: u64 },
    BreakTick { generation: u64 },
    FocusTick { generation: u64 },
    Skip,
    Acknowledge,
    CloseAttempt,
    Quit,
}

impl From<ViewEvent> for CycleEvent {
    fn from(event: ViewEvent) -> Self {
        match event {
            ViewEvent::Skip => CycleEvent::Skip,
            ViewEvent::Acknowledge => CycleEvent::Acknowledge,
            ViewEvent::CloseAttempt => CycleEvent::CloseAttempt,
            ViewEvent::Quit => CycleEvent::Quit,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<CycleEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<CycleEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
