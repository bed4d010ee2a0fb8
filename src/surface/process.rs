//! Break view rendered by a separate program.
//!
//! A fresh child process is launched for every break. Commands go to its
//! stdin and events come back on its stdout, both as length-prefixed JSON
//! frames. A child that exits on its own counts as a close attempt; if the
//! controller refuses to close, a later command relaunches the window and
//! replays the current view. Relaunches are rate limited, and a child that
//! dies right after launch is logged as a failed window, not a close attempt.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

use super::PresentationSurface;
use super::framing::{read_frame, write_frame};
use super::view::{ViewCommand, ViewEvent, ViewState};
use crate::cycle::event::{CycleEvent, EventSender};
use crate::error::{ConfigError, SurfaceError};

const CHILD_EXIT_GRACE: Duration = Duration::from_secs(2);
const EARLY_EXIT_GRACE: Duration = Duration::from_secs(1);
const RELAUNCH_BACKOFF: Duration = Duration::from_secs(1);

pub struct ProcessSurface {
    program: String,
    args: Vec<String>,
    events: EventSender,
    view: ViewState,
    window: Option<BreakWindow>,
    last_launch: Option<Instant>,
    launches: u64,
}

struct BreakWindow {
    commands: mpsc::UnboundedSender<ViewCommand>,
    closing: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
}

impl BreakWindow {
    fn is_alive(&self) -> bool {
        !self.exited.load(Ordering::SeqCst) && !self.commands.is_closed()
    }

    fn close(self, command: ViewCommand) {
        self.closing.store(true, Ordering::SeqCst);
        let _ = self.commands.send(command);
    }
}

impl ProcessSurface {
    /// `command` is the program followed by its arguments.
    pub fn new(command: Vec<String>, events: EventSender) -> Result<Self, ConfigError> {
        let mut parts = command.into_iter();
        let program = parts.next().ok_or(ConfigError::MissingBreakWindow)?;
        Ok(Self {
            program,
            args: parts.collect(),
            events,
            view: ViewState::default(),
            window: None,
            last_launch: None,
            launches: 0,
        })
    }

    fn launch(&mut self) -> Result<BreakWindow, SurfaceError> {
        let launched_at = Instant::now();
        self.last_launch = Some(launched_at);
        self.launches += 1;

        let program = self.program.clone();
        let spawn_error = |source| SurfaceError::Spawn { program, source };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;
        info!(program = %self.program, pid = ?child.id(), "Launched break window");

        let stdin = child.stdin.take().ok_or(SurfaceError::Disconnected)?;
        let stdout = child.stdout.take().ok_or(SurfaceError::Disconnected)?;

        let (commands, rx) = mpsc::unbounded_channel();
        let closing = Arc::new(AtomicBool::new(false));
        let exited = Arc::new(AtomicBool::new(false));

        tokio::spawn(write_commands(stdin, rx, child));
        tokio::spawn(read_events(
            stdout,
            self.events.clone(),
            Arc::clone(&closing),
            Arc::clone(&exited),
            launched_at,
        ));

        Ok(BreakWindow {
            commands,
            closing,
            exited,
        })
    }

    /// Launch a window and bring it up to date with `self.view`.
    fn relaunch(&mut self) -> Result<(), SurfaceError> {
        let window = self.launch()?;
        for command in replay(&self.view) {
            window
                .commands
                .send(command)
                .map_err(|_| SurfaceError::Disconnected)?;
        }
        self.window = Some(window);
        Ok(())
    }
}

impl PresentationSurface for ProcessSurface {
    fn send(&mut self, command: ViewCommand) -> Result<(), SurfaceError> {
        self.view.apply(&command);

        match command {
            ViewCommand::Open => {
                if let Some(old) = self.window.take() {
                    old.close(ViewCommand::Close);
                }
                self.relaunch()
            }
            ViewCommand::Close | ViewCommand::Shutdown => {
                if let Some(window) = self.window.take() {
                    window.close(command);
                }
                Ok(())
            }
            other => {
                if !self.view.open {
                    return Ok(());
                }
                if let Some(window) = self.window.as_ref().filter(|w| w.is_alive()) {
                    return window
                        .commands
                        .send(other)
                        .map_err(|_| SurfaceError::Disconnected);
                }
                if self
                    .last_launch
                    .is_some_and(|at| at.elapsed() < RELAUNCH_BACKOFF)
                {
                    debug!("break window is gone, waiting before reopening it");
                    return Ok(());
                }
                info!(launches = self.launches, "Break window is gone, reopening it");
                // the replay already carries `other`
                self.relaunch()
            }
        }
    }
}

/// Commands that rebuild `view` in a freshly launched window.
fn replay(view: &ViewState) -> Vec<ViewCommand> {
    let mut commands = vec![
        ViewCommand::Open,
        ViewCommand::AcknowledgeLabel {
            label: view.acknowledge_label.clone(),
        },
        ViewCommand::AcknowledgeEnabled {
            enabled: view.acknowledge_enabled,
        },
    ];
    if !view.countdown.is_empty() {
        commands.push(ViewCommand::Countdown {
            text: view.countdown.clone(),
        });
    }
    if let Some(text) = &view.notice {
        commands.push(ViewCommand::Notice { text: text.clone() });
    }
    commands
}

async fn write_commands(
    mut stdin: ChildStdin,
    mut commands: mpsc::UnboundedReceiver<ViewCommand>,
    mut child: Child,
) {
    while let Some(command) = commands.recv().await {
        let last = matches!(command, ViewCommand::Close | ViewCommand::Shutdown);
        if let Err(e) = write_frame(&mut stdin, &command).await {
            warn!(error = %e, "Failed to write to break window");
            break;
        }
        if last {
            break;
        }
    }
    drop(commands);
    drop(stdin);

    match timeout(CHILD_EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!(%status, "break window exited"),
        Ok(Err(e)) => warn!(error = %e, "Failed to wait for break window"),
        Err(_) => {
            warn!("Break window did not exit, killing it");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill break window");
            }
        }
    }
}

async fn read_events(
    mut stdout: ChildStdout,
    events: EventSender,
    closing: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
    launched_at: Instant,
) {
    loop {
        match read_frame::<_, ViewEvent>(&mut stdout).await {
            Ok(Some(event)) => {
                debug!(?event, "break window event");
                if events.send(event.into()).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Unreadable message from break window");
                break;
            }
        }
    }

    exited.store(true, Ordering::SeqCst);
    if closing.load(Ordering::SeqCst) {
        return;
    }
    if launched_at.elapsed() < EARLY_EXIT_GRACE {
        warn!("Break window exited right after launch");
        return;
    }
    // Closed from outside, e.g. through the window manager.
    let _ = events.send(CycleEvent::CloseAttempt);
}
