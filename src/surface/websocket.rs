//! Break view served to WebSocket clients (a browser tab, a small GUI, ...).
//!
//! Every client receives the full [`ViewState`] on connect and again after
//! each change. Clients send [`ViewEvent`]s and get a [`WebSocketResponse`]
//! for each message.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use super::PresentationSurface;
use super::view::{ViewCommand, ViewEvent, ViewState};
use crate::cycle::event::EventSender;
use crate::error::SurfaceError;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8766";

#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

pub struct WebSocketSurface {
    state: watch::Sender<ViewState>,
    local_addr: SocketAddr,
}

impl WebSocketSurface {
    /// Bind the listener and start accepting clients in the background.
    pub async fn bind(addr: SocketAddr, events: EventSender) -> Result<Self, SurfaceError> {
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "WebSocket surface listening");

        let (state, _) = watch::channel(ViewState::default());
        tokio::spawn(accept_clients(listener, state.clone(), events));

        Ok(Self { state, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl PresentationSurface for WebSocketSurface {
    fn send(&mut self, command: ViewCommand) -> Result<(), SurfaceError> {
        self.state.send_modify(|state| state.apply(&command));
        Ok(())
    }
}

async fn accept_clients(
    listener: TcpListener,
    state: watch::Sender<ViewState>,
    events: EventSender,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!(%peer_addr, "New WebSocket connection");
                tokio::spawn(handle_connection(
                    stream,
                    peer_addr,
                    state.subscribe(),
                    events.clone(),
                ));
            }
            Err(e) => {
                warn!(error = %e, "Failed to accept WebSocket connection");
            }
        }
        if events.is_closed() {
            return;
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    mut state: watch::Receiver<ViewState>,
    events: EventSender,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer_addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    info!(%peer_addr, "Break view client connected");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Current state first, so late joiners draw the right thing.
    let snapshot = state.borrow_and_update().clone();
    if send_json(&mut ws_sender, &snapshot).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                if send_json(&mut ws_sender, &snapshot).await.is_err() {
                    break;
                }
            }
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = match serde_json::from_str::<ViewEvent>(&text) {
                            Ok(event) => {
                                debug!(%peer_addr, ?event, "break view event");
                                if events.send(event.into()).is_err() {
                                    break;
                                }
                                WebSocketResponse {
                                    success: true,
                                    message: None,
                                }
                            }
                            Err(e) => {
                                warn!(%peer_addr, error = %e, "Failed to parse message");
                                WebSocketResponse {
                                    success: false,
                                    message: Some(format!("Parse error: {}", e)),
                                }
                            }
                        };
                        if send_json(&mut ws_sender, &response).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%peer_addr, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    info!(%peer_addr, "Break view client disconnected");
}

async fn send_json<S, T>(sink: &mut S, value: &T) -> Result<(), ()>
where
    S: futures_util::Sink<Message> + Unpin,
    T: Serialize,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize WebSocket message");
            return Err(());
        }
    };
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
