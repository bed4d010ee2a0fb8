//! The break cycle controller.
//!
//! One task owns the controller and feeds it [`CycleEvent`]s from a single
//! channel, so every state change is serialised. Periodic work (the work
//! reporter, the break countdown, focus retention) runs in small tasks that
//! only send events; they are aborted on every phase change and their ticks
//! carry the generation they were started under.

use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

use super::event::{CycleEvent, EventReceiver, EventSender};
use super::phase::{COUNTDOWN_TICK_SECS, Phase};
use super::state::{Cycle, format_clock};
use super::stats::{BreakExit, SessionStats};
use crate::config::{ClosePolicy, CompletionMode, Config, format_duration};
use crate::error::SurfaceError;
use crate::notify::{BREAK_NOTIFICATION_BODY, BREAK_NOTIFICATION_TITLE, Notifier};
use crate::surface::PresentationSurface;
use crate::surface::view::{
    CLOSE_BLOCKED_NOTICE, CLOSE_LOCKED_NOTICE, COUNTDOWN_COMPLETE, LOCKED_RETURN_LABEL,
    RETURN_LABEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Default)]
struct PhaseTasks {
    reporter: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    focus: Option<JoinHandle<()>>,
}

impl PhaseTasks {
    fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        for handle in [
            self.reporter.take(),
            self.countdown.take(),
            self.focus.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

impl Drop for PhaseTasks {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

pub struct Controller {
    config: Config,
    cycle: Cycle,
    surface: Box<dyn PresentationSurface>,
    notifier: Box<dyn Notifier>,
    events: EventSender,
    tasks: PhaseTasks,
    stats: SessionStats,
    finished: bool,
}

impl Controller {
    /// `events` must feed the receiver later passed to [`Controller::run`];
    /// the controller's own tasks send their ticks through it.
    pub fn new(
        config: Config,
        surface: Box<dyn PresentationSurface>,
        notifier: Box<dyn Notifier>,
        events: EventSender,
    ) -> Self {
        let cycle = Cycle::new(config.work_interval, config.break_duration, Instant::now());
        Self {
            config,
            cycle,
            surface,
            notifier,
            events,
            tasks: PhaseTasks::default(),
            stats: SessionStats::new(),
            finished: false,
        }
    }

    #[cfg(test)]
    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    #[cfg(test)]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Process events until quit, then hand back the session statistics.
    pub async fn run(mut self, mut events: EventReceiver) -> SessionStats {
        self.start();
        while let Some(event) = events.recv().await {
            if self.handle(event) == Flow::Quit {
                return self.stats;
            }
        }
        self.quit();
        self.stats
    }

    /// Enter the first work phase.
    pub fn start(&mut self) {
        info!(
            work_interval = %format_duration(self.config.work_interval),
            break_duration = %format_duration(self.config.break_duration),
            close_policy = self.config.close_policy.as_str(),
            completion = self.config.completion.as_str(),
            "Move reminder started"
        );
        self.cycle = Cycle::new(
            self.config.work_interval,
            self.config.break_duration,
            Instant::now(),
        );
        self.start_work();
    }

    pub fn handle(&mut self, event: CycleEvent) -> Flow {
        if self.finished {
            return Flow::Quit;
        }

        let now = Instant::now();
        match event {
            CycleEvent::WorkTick { generation } => self.on_work_tick(generation, now),
            CycleEvent::BreakTick { generation } => self.on_break_tick(generation, now),
            CycleEvent::FocusTick { generation } => self.on_focus_tick(generation),
            CycleEvent::Skip => self.on_skip(now),
            CycleEvent::Acknowledge => self.on_acknowledge(now),
            CycleEvent::CloseAttempt => return self.on_close_attempt(now),
            CycleEvent::Quit => {
                self.quit();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Terminal exit, reachable from either phase.
    pub fn quit(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!(phase = %self.cycle.phase(), "Quitting application");

        self.tasks.cancel_all();
        if self.cycle.phase() == Phase::Break && !self.cycle.break_dismissed() {
            let spent = self
                .cycle
                .break_started_at()
                .map(|start| Instant::now().saturating_duration_since(start))
                .unwrap_or_default();
            self.stats.record_interrupted(spent);
            log_failure("close the break view", self.surface.close_break_view());
        }
        log_failure("shut the surface down", self.surface.shutdown());
    }

    fn is_live(&self, generation: u64, phase: Phase) -> bool {
        self.cycle.is_current(generation) && self.cycle.phase() == phase
    }

    fn on_work_tick(&mut self, generation: u64, now: Instant) {
        if !self.is_live(generation, Phase::Work) {
            debug!(generation, "dropping stale work tick");
            return;
        }

        let remaining = self.cycle.remaining(now);
        if remaining.is_zero() {
            info!("Work interval completed - break time!");
            self.begin_break(now);
        } else {
            info!(time = %format_clock(remaining), "Work time remaining");
        }
    }

    fn on_break_tick(&mut self, generation: u64, now: Instant) {
        if !self.is_live(generation, Phase::Break) || self.cycle.countdown_complete() {
            debug!(generation, "dropping stale countdown tick");
            return;
        }

        let remaining = self.cycle.remaining(now);
        if remaining.is_zero() {
            self.complete_countdown(now);
        } else {
            log_failure(
                "update the countdown",
                self.surface.set_countdown_text(&format_clock(remaining)),
            );
        }
    }

    fn on_focus_tick(&mut self, generation: u64) {
        if !self.is_live(generation, Phase::Break) {
            return;
        }
        if let Err(e) = self.surface.request_focus() {
            debug!(error = %e, "focus request failed");
        }
    }

    fn on_skip(&mut self, now: Instant) {
        if self.cycle.phase() != Phase::Break {
            debug!("skip requested outside a break");
            return;
        }
        info!("Break skipped by user");
        self.finish_break(BreakExit::Skipped, now);
    }

    fn on_acknowledge(&mut self, now: Instant) {
        if self.cycle.phase() != Phase::Break {
            debug!("return to work requested outside a break");
            return;
        }
        if !self.cycle.countdown_complete() {
            if !self.cycle.remaining(now).is_zero() {
                debug!("Return to Work is locked until the countdown ends");
                return;
            }
            // The deadline passed but the tick has not landed yet.
            self.complete_countdown(now);
        }
        info!("User clicked return to work");
        self.finish_break(BreakExit::Acknowledged, now);
    }

    fn on_close_attempt(&mut self, now: Instant) -> Flow {
        if self.cycle.phase() != Phase::Break {
            debug!("close attempt outside a break");
            return Flow::Continue;
        }

        match self.config.close_policy {
            ClosePolicy::Quit => {
                info!("Break window closed - quitting");
                self.quit();
                return Flow::Quit;
            }
            ClosePolicy::Block => {
                info!("Close attempt blocked");
                log_failure("show a notice", self.surface.show_notice(CLOSE_LOCKED_NOTICE));
            }
            ClosePolicy::BlockUntilComplete => {
                let elapsed =
                    self.cycle.countdown_complete() || self.cycle.remaining(now).is_zero();
                if elapsed {
                    self.complete_countdown(now);
                    info!("Break window closed after the countdown");
                    self.finish_break(BreakExit::WindowClosed, now);
                } else {
                    info!("Close attempt blocked while the break is running");
                    log_failure(
                        "show a notice",
                        self.surface.show_notice(CLOSE_BLOCKED_NOTICE),
                    );
                }
            }
        }
        Flow::Continue
    }

    fn begin_break(&mut self, now: Instant) {
        self.tasks.cancel_all();
        if !self.cycle.begin_break(now) {
            return;
        }
        self.stats.record_start();
        info!(
            duration = %format_duration(self.config.break_duration),
            "{} Break started",
            Phase::Break.emoji()
        );

        if let Err(e) = self
            .notifier
            .notify(BREAK_NOTIFICATION_TITLE, BREAK_NOTIFICATION_BODY)
        {
            warn!(error = %e, "Failed to show notification");
        }

        log_failure("open the break view", self.surface.open_break_view());
        log_failure(
            "set the return label",
            self.surface.set_acknowledge_label(LOCKED_RETURN_LABEL),
        );
        log_failure(
            "lock Return to Work",
            self.surface.set_acknowledge_enabled(false),
        );
        log_failure(
            "update the countdown",
            self.surface
                .set_countdown_text(&format_clock(self.cycle.break_duration())),
        );

        let generation = self.cycle.generation();
        self.tasks.countdown = Some(spawn_ticker(
            self.events.clone(),
            Duration::from_secs(COUNTDOWN_TICK_SECS),
            CycleEvent::BreakTick { generation },
        ));
        if let Some(every) = self.config.focus_interval {
            if let Err(e) = self.surface.request_focus() {
                debug!(error = %e, "focus request failed");
            }
            self.tasks.focus = Some(spawn_ticker(
                self.events.clone(),
                every,
                CycleEvent::FocusTick { generation },
            ));
        }
    }

    /// Countdown hit zero: show it, unlock Return to Work.
    fn complete_countdown(&mut self, now: Instant) {
        if !self.cycle.complete_countdown() {
            return;
        }
        self.tasks.stop_countdown();
        info!("Break time complete");

        log_failure(
            "update the countdown",
            self.surface.set_countdown_text(COUNTDOWN_COMPLETE),
        );
        log_failure(
            "set the return label",
            self.surface.set_acknowledge_label(RETURN_LABEL),
        );
        log_failure(
            "unlock Return to Work",
            self.surface.set_acknowledge_enabled(true),
        );

        if self.config.completion == CompletionMode::AutoReturn {
            self.finish_break(BreakExit::AutoReturned, now);
        }
    }

    /// Every way out of a break ends up here. Runs once per break.
    fn finish_break(&mut self, exit: BreakExit, now: Instant) {
        let started = self.cycle.break_started_at();
        if !self.cycle.end_break(now) {
            debug!(exit = exit.as_str(), "break already dismissed");
            return;
        }

        self.tasks.cancel_all();
        log_failure("close the break view", self.surface.close_break_view());

        let spent = started
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        self.stats.record_exit(exit, spent);
        info!(exit = exit.as_str(), "Break completed, resuming work");

        self.start_work();
    }

    fn start_work(&mut self) {
        let work_interval = self.config.work_interval;
        info!(
            duration = %format_duration(work_interval),
            next_break = %next_break_clock(work_interval),
            "{} Starting work interval",
            Phase::Work.emoji()
        );
        self.tasks.reporter = Some(spawn_work_reporter(
            self.events.clone(),
            self.cycle.generation(),
            self.config.report_interval(),
            self.cycle.phase_ends_at(),
        ));
    }
}

fn log_failure(action: &str, result: Result<(), SurfaceError>) {
    if let Err(e) = result {
        warn!(error = %e, "Failed to {}", action);
    }
}

/// Wall-clock time of the next break, for the log line.
fn next_break_clock(work_interval: Duration) -> String {
    chrono::Duration::from_std(work_interval)
        .ok()
        .and_then(|delta| Local::now().checked_add_signed(delta))
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Report every `every` and once more exactly at `deadline`, then stop.
fn spawn_work_reporter(
    events: EventSender,
    generation: u64,
    every: Duration,
    deadline: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expiry = sleep_until(deadline);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                biased;
                _ = &mut expiry => {
                    let _ = events.send(CycleEvent::WorkTick { generation });
                    return;
                }
                _ = ticker.tick() => {
                    if events.send(CycleEvent::WorkTick { generation }).is_err() {
                        return;
                    }
                }
            }
        }
    })
}

fn spawn_ticker(events: EventSender, every: Duration, event: CycleEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if events.send(event).is_err() {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::timeout;

    use super::*;
    use crate::cycle::event::create_event_channel;
    use crate::error::NotifyError;
    use crate::surface::view::ViewCommand;

    #[derive(Clone, Default)]
    struct RecordingSurface {
        commands: Arc<Mutex<Vec<ViewCommand>>>,
    }

    impl RecordingSurface {
        fn commands(&self) -> Vec<ViewCommand> {
            self.commands.lock().unwrap().clone()
        }

        fn count(&self, command: &ViewCommand) -> usize {
            self.commands().iter().filter(|c| *c == command).count()
        }

        fn position(&self, command: &ViewCommand) -> Option<usize> {
            self.commands().iter().position(|c| c == command)
        }
    }

    impl PresentationSurface for RecordingSurface {
        fn send(&mut self, command: ViewCommand) -> Result<(), SurfaceError> {
            self.commands.lock().unwrap().push(command);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            if self.fail {
                return Err(NotifyError::Dispatch("no notification daemon".to_string()));
            }
            Ok(())
        }
    }

    struct Harness {
        controller: Controller,
        rx: EventReceiver,
        events: EventSender,
        surface: RecordingSurface,
        notifier: RecordingNotifier,
    }

    fn config(work_secs: u64, break_secs: u64) -> Config {
        Config {
            work_interval: Duration::from_secs(work_secs),
            break_duration: Duration::from_secs(break_secs),
            verbose: true,
            focus_interval: None,
            ..Config::default()
        }
    }

    fn harness(config: Config) -> Harness {
        harness_with(config, RecordingNotifier::default())
    }

    fn harness_with(config: Config, notifier: RecordingNotifier) -> Harness {
        let (events, rx) = create_event_channel();
        let surface = RecordingSurface::default();
        let controller = Controller::new(
            config,
            Box::new(surface.clone()),
            Box::new(notifier.clone()),
            events.clone(),
        );
        Harness {
            controller,
            rx,
            events,
            surface,
            notifier,
        }
    }

    impl Harness {
        /// Feed timer events to the controller until `done` holds.
        async fn pump_until(&mut self, done: impl Fn(&Controller) -> bool) {
            let Harness { controller, rx, .. } = self;
            timeout(Duration::from_secs(3600), async {
                while !done(controller) {
                    let event = rx.recv().await.expect("event channel closed");
                    controller.handle(event);
                }
            })
            .await
            .expect("condition never reached");
        }

        async fn start_break(&mut self) {
            self.controller.start();
            self.pump_until(|c| c.cycle().phase() == Phase::Break).await;
        }

        fn drain(&mut self) -> Vec<CycleEvent> {
            let mut drained = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                drained.push(event);
            }
            drained
        }
    }

    fn countdown(text: &str) -> ViewCommand {
        ViewCommand::Countdown {
            text: text.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_second_work_and_break_scenario() {
        let mut h = harness(config(2, 2));
        let t0 = Instant::now();

        h.start_break().await;
        assert_eq!(Instant::now() - t0, Duration::from_secs(2));
        assert_eq!(
            h.notifier.sent.lock().unwrap().as_slice(),
            &[(
                BREAK_NOTIFICATION_TITLE.to_string(),
                BREAK_NOTIFICATION_BODY.to_string()
            )]
        );
        assert_eq!(
            h.surface.commands(),
            vec![
                ViewCommand::Open,
                ViewCommand::AcknowledgeLabel {
                    label: LOCKED_RETURN_LABEL.to_string()
                },
                ViewCommand::AcknowledgeEnabled { enabled: false },
                countdown("00:02"),
            ]
        );

        h.pump_until(|c| c.cycle().countdown_complete()).await;
        assert_eq!(Instant::now() - t0, Duration::from_secs(4));
        assert_eq!(h.controller.cycle().phase(), Phase::Break, "waits for the user");

        let one = h.surface.position(&countdown("00:01")).unwrap();
        let done = h.surface.position(&countdown(COUNTDOWN_COMPLETE)).unwrap();
        let enabled = h
            .surface
            .position(&ViewCommand::AcknowledgeEnabled { enabled: true })
            .unwrap();
        assert!(one < done && done < enabled);
        assert_eq!(
            h.surface
                .count(&ViewCommand::AcknowledgeEnabled { enabled: true }),
            1
        );

        assert_eq!(h.controller.handle(CycleEvent::Acknowledge), Flow::Continue);
        let cycle = h.controller.cycle();
        assert_eq!(cycle.phase(), Phase::Work);
        assert!(cycle.break_dismissed());
        assert_eq!(cycle.phase_ends_at(), Instant::now() + Duration::from_secs(2));
        assert_eq!(h.surface.commands().last(), Some(&ViewCommand::Close));
        assert_eq!(h.controller.stats().acknowledged, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn the_break_starts_on_time_with_a_slow_reporter() {
        let mut h = harness(Config {
            verbose: false,
            ..config(15, 2)
        });
        let t0 = Instant::now();

        h.start_break().await;
        assert_eq!(Instant::now() - t0, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn return_to_work_is_inert_until_the_countdown_ends() {
        let mut h = harness(config(1, 3));
        h.start_break().await;

        h.controller.handle(CycleEvent::Acknowledge);
        assert_eq!(h.controller.cycle().phase(), Phase::Break);

        tokio::time::advance(Duration::from_millis(2999)).await;
        h.controller.handle(CycleEvent::Acknowledge);
        assert_eq!(h.controller.cycle().phase(), Phase::Break);
        assert_eq!(
            h.surface
                .count(&ViewCommand::AcknowledgeEnabled { enabled: true }),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledge_after_the_deadline_does_not_wait_for_the_tick() {
        let mut h = harness(config(1, 3));
        h.start_break().await;

        tokio::time::advance(Duration::from_secs(3)).await;
        h.controller.handle(CycleEvent::Acknowledge);

        assert_eq!(h.controller.cycle().phase(), Phase::Work);
        assert_eq!(
            h.surface
                .count(&ViewCommand::AcknowledgeEnabled { enabled: true }),
            1
        );
        assert_eq!(h.controller.stats().acknowledged, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_ends_the_break_immediately_and_only_once() {
        let mut h = harness(config(1, 300));
        h.start_break().await;
        let break_generation = h.controller.cycle().generation();

        h.controller.handle(CycleEvent::Skip);
        let cycle = h.controller.cycle().clone();
        assert_eq!(cycle.phase(), Phase::Work);
        assert_eq!(cycle.phase_ends_at(), Instant::now() + Duration::from_secs(1));

        let recorded = h.surface.commands().len();
        h.controller.handle(CycleEvent::Skip);
        h.controller.handle(CycleEvent::Acknowledge);
        h.controller.handle(CycleEvent::CloseAttempt);
        h.controller.handle(CycleEvent::BreakTick {
            generation: break_generation,
        });
        h.controller.handle(CycleEvent::FocusTick {
            generation: break_generation,
        });

        assert_eq!(h.surface.commands().len(), recorded);
        assert_eq!(h.surface.count(&ViewCommand::Close), 1);
        assert_eq!(h.controller.cycle().generation(), cycle.generation());
        assert_eq!(h.controller.stats().skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_and_countdown_zero_in_the_same_instant_exit_once() {
        let mut h = harness(Config {
            completion: CompletionMode::AutoReturn,
            ..config(60, 2)
        });
        h.start_break().await;
        let break_generation = h.controller.cycle().generation();

        tokio::time::advance(Duration::from_secs(2)).await;
        h.controller.handle(CycleEvent::Skip);
        h.controller.handle(CycleEvent::BreakTick {
            generation: break_generation,
        });

        assert_eq!(h.controller.cycle().phase(), Phase::Work);
        assert_eq!(h.surface.count(&ViewCommand::Close), 1);
        assert_eq!(h.controller.stats().skipped, 1);
        assert_eq!(h.controller.stats().auto_returned, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn break_tasks_stop_after_the_break() {
        let mut h = harness(Config {
            focus_interval: Some(Duration::from_millis(500)),
            ..config(60, 300)
        });
        h.start_break().await;

        let start = Instant::now();
        h.pump_until(|_| Instant::now() - start >= Duration::from_secs(2))
            .await;
        assert!(h.surface.count(&ViewCommand::RequestFocus) >= 4);
        assert!(h.surface.position(&countdown("04:59")).is_some());

        h.controller.handle(CycleEvent::Skip);
        h.drain();
        let focus_requests = h.surface.count(&ViewCommand::RequestFocus);

        tokio::time::sleep(Duration::from_secs(5)).await;
        for event in h.drain() {
            assert!(
                matches!(event, CycleEvent::WorkTick { .. }),
                "unexpected {event:?} after the break"
            );
            h.controller.handle(event);
        }
        assert_eq!(h.surface.count(&ViewCommand::RequestFocus), focus_requests);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_work_ticks_are_ignored() {
        let mut h = harness(config(2, 2));
        h.controller.start();
        let work_generation = h.controller.cycle().generation();

        h.pump_until(|c| c.cycle().phase() == Phase::Break).await;
        let recorded = h.surface.commands().len();

        h.controller.handle(CycleEvent::WorkTick {
            generation: work_generation,
        });
        assert_eq!(h.controller.cycle().phase(), Phase::Break);
        assert_eq!(h.surface.commands().len(), recorded);
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_is_blocked_while_time_remains() {
        let mut h = harness(config(1, 2));
        h.start_break().await;

        h.controller.handle(CycleEvent::CloseAttempt);
        assert_eq!(h.controller.cycle().phase(), Phase::Break);
        assert_eq!(
            h.surface.commands().last(),
            Some(&ViewCommand::Notice {
                text: CLOSE_BLOCKED_NOTICE.to_string()
            })
        );

        h.pump_until(|c| c.cycle().countdown_complete()).await;
        h.controller.handle(CycleEvent::CloseAttempt);
        assert_eq!(h.controller.cycle().phase(), Phase::Work);
        assert_eq!(h.controller.stats().window_closed, 1);
        assert_eq!(h.surface.commands().last(), Some(&ViewCommand::Close));
    }

    #[tokio::test(start_paused = true)]
    async fn block_policy_never_closes() {
        let mut h = harness(Config {
            close_policy: ClosePolicy::Block,
            ..config(1, 1)
        });
        h.start_break().await;
        h.pump_until(|c| c.cycle().countdown_complete()).await;

        h.controller.handle(CycleEvent::CloseAttempt);
        assert_eq!(h.controller.cycle().phase(), Phase::Break);
        assert_eq!(
            h.surface.count(&ViewCommand::Notice {
                text: CLOSE_LOCKED_NOTICE.to_string()
            }),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn quit_policy_escalates_close_to_quit() {
        let mut h = harness(Config {
            close_policy: ClosePolicy::Quit,
            ..config(1, 60)
        });
        h.start_break().await;

        assert_eq!(h.controller.handle(CycleEvent::CloseAttempt), Flow::Quit);
        assert!(h.controller.is_finished());
        assert_eq!(h.surface.commands().last(), Some(&ViewCommand::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_mid_break_stops_everything() {
        let mut h = harness(Config {
            focus_interval: Some(Duration::from_millis(500)),
            ..config(1, 60)
        });
        h.start_break().await;

        assert_eq!(h.controller.handle(CycleEvent::Quit), Flow::Quit);
        let commands = h.surface.commands();
        assert_eq!(
            &commands[commands.len() - 2..],
            &[ViewCommand::Close, ViewCommand::Shutdown]
        );

        h.drain();
        assert!(
            timeout(Duration::from_secs(10), h.rx.recv()).await.is_err(),
            "no task may fire after quit"
        );
        assert_eq!(h.controller.handle(CycleEvent::Skip), Flow::Quit);
        assert_eq!(h.surface.commands().len(), commands.len());
    }

    #[tokio::test(start_paused = true)]
    async fn quitting_mid_break_counts_the_time_already_spent() {
        let mut h = harness(config(1, 60));
        h.start_break().await;

        tokio::time::advance(Duration::from_millis(1500)).await;
        h.controller.handle(CycleEvent::Quit);

        let stats = h.controller.stats();
        assert_eq!(stats.breaks_started, 1);
        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.time_on_break, Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_while_working_does_not_touch_the_break_view() {
        let mut h = harness(config(60, 5));
        h.controller.start();

        assert_eq!(h.controller.handle(CycleEvent::Quit), Flow::Quit);
        assert_eq!(h.surface.commands(), vec![ViewCommand::Shutdown]);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_return_goes_back_to_work_at_zero() {
        let mut h = harness(Config {
            completion: CompletionMode::AutoReturn,
            ..config(1, 2)
        });
        h.start_break().await;
        let t_break = Instant::now();

        h.pump_until(|c| c.cycle().phase() == Phase::Work).await;
        assert_eq!(Instant::now() - t_break, Duration::from_secs(2));
        assert_eq!(h.controller.stats().auto_returned, 1);
        assert_eq!(h.surface.commands().last(), Some(&ViewCommand::Close));
    }

    #[tokio::test(start_paused = true)]
    async fn a_failing_notifier_does_not_block_the_break() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let mut h = harness_with(config(1, 1), notifier);

        h.start_break().await;
        assert_eq!(h.surface.position(&ViewCommand::Open), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_cycles_until_quit() {
        let h = harness(config(2, 2));
        let events = h.events.clone();
        let surface = h.surface.clone();
        let session = tokio::spawn(h.controller.run(h.rx));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(surface.position(&ViewCommand::Open).is_some());

        events.send(CycleEvent::Skip).unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(surface.count(&ViewCommand::Open), 2, "second break began");

        events.send(CycleEvent::Quit).unwrap();
        let stats = session.await.unwrap();
        assert_eq!(stats.breaks_started, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(surface.commands().last(), Some(&ViewCommand::Shutdown));
    }
}
