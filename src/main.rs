use clap::Parser;
use tracing::{info, warn};

mod cli;
mod config;
mod cycle;
mod error;
mod focus;
mod logging;
mod notify;
mod surface;

use cli::{Cli, SurfaceKind};
use config::{Config, PartialConfig, format_duration};
use cycle::controller::Controller;
use cycle::event::{CycleEvent, EventSender, create_event_channel};
use focus::WindowManager;
use logging::ConsoleGate;
use notify::DesktopNotifier;
use surface::PresentationSurface;
use surface::process::ProcessSurface;
use surface::terminal::TerminalSurface;
use surface::websocket::{DEFAULT_LISTEN_ADDR, WebSocketSurface};

const APP_NAME: &str = "move-break";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config: Config = PartialConfig::load(cli.config.as_deref())?
        .layer(cli.overrides())
        .try_into()?;

    let console = logging::init(cli.log.as_deref())?;

    info!("Move Break - stand up, stretch, walk around");
    info!(
        work_interval = %format_duration(config.work_interval),
        break_duration = %format_duration(config.break_duration),
        surface = ?cli.surface,
        "Break cycle settings"
    );
    if config.verbose {
        info!("Verbose mode: ON");
    }
    if let Some(path) = &cli.log {
        info!(path = %path.display(), "Logging to file");
    }

    let (events, rx) = create_event_channel();
    let surface = build_surface(&cli, events.clone(), console).await?;
    spawn_signal_handler(events.clone());

    let controller = Controller::new(
        config,
        surface,
        Box::new(DesktopNotifier::new(APP_NAME)),
        events,
    );
    let stats = controller.run(rx).await;

    stats.print_stats();
    Ok(())
}

async fn build_surface(
    cli: &Cli,
    events: EventSender,
    console: ConsoleGate,
) -> Result<Box<dyn PresentationSurface>, Box<dyn std::error::Error>> {
    let surface: Box<dyn PresentationSurface> = match cli.surface {
        SurfaceKind::Terminal => Box::new(TerminalSurface::spawn(
            events,
            WindowManager::detect(),
            console,
        )?),
        SurfaceKind::Process => Box::new(ProcessSurface::new(cli.break_window.clone(), events)?),
        SurfaceKind::Websocket => {
            let addr = match cli.listen {
                Some(addr) => addr,
                None => DEFAULT_LISTEN_ADDR.parse()?,
            };
            let surface = WebSocketSurface::bind(addr, events).await?;
            info!(url = %format!("ws://{}", surface.local_addr()), "Break view available");
            Box::new(surface)
        }
    };
    Ok(surface)
}

/// Ctrl+C (and SIGTERM on unix) quit the same way the break view's quit does.
fn spawn_signal_handler(events: EventSender) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut terminate = match signal(SignalKind::terminate()) {
                Ok(terminate) => terminate,
                Err(e) => {
                    warn!(error = %e, "Failed to listen for SIGTERM");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        let _ = events.send(CycleEvent::Quit);
                    }
                    return;
                }
            };
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Failed to listen for Ctrl+C");
                        terminate.recv().await;
                    }
                }
                _ = terminate.recv() => {}
            }
        }

        #[cfg(not(unix))]
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }

        info!("Shutdown signal received");
        let _ = events.send(CycleEvent::Quit);
    });
}
