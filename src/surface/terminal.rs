//! Full-screen break view in the terminal.
//!
//! All terminal I/O happens on one dedicated thread; the controller only
//! pushes [`ViewCommand`]s into a channel. While the view is open the thread
//! also polls the keyboard and forwards actions as [`ViewEvent`]s.

use std::io::{self, Stdout, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{PrintStyledContent, StyledContent, Stylize},
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
        disable_raw_mode, enable_raw_mode,
    },
};
use tracing::{debug, warn};

use super::PresentationSurface;
use super::view::{
    BREAK_HEADLINE, BREAK_MESSAGE, BREAK_TITLE, COUNTDOWN_COMPLETE, ViewCommand, ViewEvent,
    ViewState,
};
use crate::cycle::event::EventSender;
use crate::error::{FocusError, SurfaceError};
use crate::focus::WindowManager;
use crate::logging::ConsoleGate;

const INPUT_POLL: Duration = Duration::from_millis(100);
const HINT: &str = "Press 'S' to skip • Esc to close • Q to quit";

pub struct TerminalSurface {
    commands: Sender<ViewCommand>,
    ui_thread: Option<thread::JoinHandle<()>>,
}

impl TerminalSurface {
    /// `console` is muted while the break view covers the terminal.
    pub fn spawn(
        events: EventSender,
        window_manager: WindowManager,
        console: ConsoleGate,
    ) -> Result<Self, SurfaceError> {
        let (commands, rx) = mpsc::channel();
        let ui_thread = thread::Builder::new()
            .name("break-view".to_string())
            .spawn(move || ui_loop(rx, events, window_manager, console))?;
        Ok(Self {
            commands,
            ui_thread: Some(ui_thread),
        })
    }
}

impl PresentationSurface for TerminalSurface {
    fn send(&mut self, command: ViewCommand) -> Result<(), SurfaceError> {
        self.commands
            .send(command)
            .map_err(|_| SurfaceError::Disconnected)
    }

    fn shutdown(&mut self) -> Result<(), SurfaceError> {
        let result = self.send(ViewCommand::Shutdown);
        // The terminal has to be restored before the process exits.
        if let Some(handle) = self.ui_thread.take() {
            if handle.join().is_err() {
                warn!("Break view thread panicked");
            }
        }
        result
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        if self.ui_thread.is_some() {
            let _ = self.shutdown();
        }
    }
}

/// Map a key press to a user action.
pub fn map_key(key: KeyEvent) -> Option<ViewEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ViewEvent::Quit)
        }
        KeyCode::Char('s') | KeyCode::Char('S') => Some(ViewEvent::Skip),
        KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => Some(ViewEvent::Acknowledge),
        KeyCode::Esc => Some(ViewEvent::CloseAttempt),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(ViewEvent::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Bold,
    Dim,
    Success,
    Warning,
}

type Line = Vec<(String, Tone)>;

/// What the break view shows, top to bottom.
fn layout(view: &ViewState) -> Vec<Line> {
    let mut lines: Vec<Line> = vec![vec![(BREAK_HEADLINE.to_string(), Tone::Bold)], vec![]];
    for text in BREAK_MESSAGE.lines() {
        lines.push(vec![(text.to_string(), Tone::Plain)]);
    }
    lines.push(vec![]);

    if view.countdown == COUNTDOWN_COMPLETE {
        lines.push(vec![(COUNTDOWN_COMPLETE.to_string(), Tone::Success)]);
    } else if !view.countdown.is_empty() {
        lines.push(vec![(
            format!("Time remaining: {}", view.countdown),
            Tone::Bold,
        )]);
    }
    lines.push(vec![]);

    let acknowledge_tone = if view.acknowledge_enabled {
        Tone::Success
    } else {
        Tone::Dim
    };
    lines.push(vec![
        ("[ Skip Break (S) ]".to_string(), Tone::Plain),
        ("   ".to_string(), Tone::Plain),
        (
            format!("[ {} (Enter) ]", view.acknowledge_label),
            acknowledge_tone,
        ),
    ]);
    lines.push(vec![]);

    if let Some(notice) = &view.notice {
        lines.push(vec![(notice.clone(), Tone::Warning)]);
        lines.push(vec![]);
    }
    lines.push(vec![(HINT.to_string(), Tone::Dim)]);
    lines
}

fn styled(text: &str, tone: Tone) -> StyledContent<&str> {
    match tone {
        Tone::Plain => text.stylize(),
        Tone::Bold => text.bold(),
        Tone::Dim => text.dim(),
        Tone::Success => text.green().bold(),
        Tone::Warning => text.yellow(),
    }
}

fn line_width(line: &Line) -> u16 {
    let width: usize = line.iter().map(|(text, _)| text.chars().count()).sum();
    u16::try_from(width).unwrap_or(u16::MAX)
}

struct Screen {
    stdout: Stdout,
    active: bool,
    console: ConsoleGate,
}

impl Screen {
    fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        enable_raw_mode()?;
        execute!(self.stdout, EnterAlternateScreen, Hide, SetTitle(BREAK_TITLE))?;
        self.active = true;
        self.console.mute();
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let restored = execute!(self.stdout, Show, LeaveAlternateScreen);
        let raw_off = disable_raw_mode();
        self.console.unmute();
        restored?;
        raw_off
    }

    fn draw(&mut self, view: &ViewState) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let lines = layout(view);
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let top = rows.saturating_sub(height) / 2;

        queue!(self.stdout, Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            let y = top.saturating_add(row as u16);
            let x = cols.saturating_sub(line_width(line)) / 2;
            queue!(self.stdout, MoveTo(x, y))?;
            for (text, tone) in line {
                queue!(self.stdout, PrintStyledContent(styled(text, *tone)))?;
            }
        }
        self.stdout.flush()
    }
}

enum Input {
    Action(ViewEvent),
    Redraw,
    Idle,
}

fn read_input(wait: Duration) -> io::Result<Input> {
    if !event::poll(wait)? {
        return Ok(Input::Idle);
    }
    Ok(match event::read()? {
        Event::Key(key) => map_key(key).map_or(Input::Idle, Input::Action),
        Event::Resize(_, _) => Input::Redraw,
        _ => Input::Idle,
    })
}

fn ui_loop(
    commands: Receiver<ViewCommand>,
    events: EventSender,
    window_manager: WindowManager,
    console: ConsoleGate,
) {
    let mut view = ViewState::default();
    let mut screen = Screen {
        stdout: io::stdout(),
        active: false,
        console,
    };
    let mut focus_warned = false;

    loop {
        // Closed: sleep until told otherwise. Open: keep the keyboard polled.
        let mut next = if view.open {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        let mut dirty = false;
        while let Some(command) = next {
            if command == ViewCommand::RequestFocus {
                raise(&window_manager, &mut focus_warned);
            }

            let was_open = view.open;
            view.apply(&command);
            if view.open != was_open {
                let switched = if view.open {
                    screen.enter()
                } else {
                    screen.leave()
                };
                if let Err(e) = switched {
                    warn!(error = %e, "Failed to switch terminal screen");
                }
            }
            if view.shutdown {
                if let Err(e) = screen.leave() {
                    warn!(error = %e, "Failed to restore terminal");
                }
                return;
            }
            dirty = true;
            next = commands.try_recv().ok();
        }

        if !view.open {
            continue;
        }
        if dirty {
            if let Err(e) = screen.draw(&view) {
                warn!(error = %e, "Failed to draw break view");
            }
        }
        match read_input(INPUT_POLL) {
            Ok(Input::Action(action)) => {
                debug!(?action, "key pressed");
                if events.send(action.into()).is_err() {
                    break;
                }
            }
            Ok(Input::Redraw) => {
                if let Err(e) = screen.draw(&view) {
                    warn!(error = %e, "Failed to draw break view");
                }
            }
            Ok(Input::Idle) => {}
            Err(e) => warn!(error = %e, "Failed to read keyboard input"),
        }
    }

    if let Err(e) = screen.leave() {
        warn!(error = %e, "Failed to restore terminal");
    }
}

fn raise(window_manager: &WindowManager, warned: &mut bool) {
    match window_manager.raise(BREAK_TITLE) {
        Ok(()) => {}
        Err(FocusError::Unsupported) if *warned => {}
        Err(e) if *warned => debug!(error = %e, "Failed to raise break view"),
        Err(e) => {
            warn!(error = %e, "Failed to raise break view");
            *warned = true;
        }
    }
}
