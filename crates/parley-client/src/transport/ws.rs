//! Reconnecting WebSocket link.
//!
//! One task per logical connection:
//! - connect with `tokio_tungstenite::connect_async`
//! - report `Open`, every inbound text frame, `Error` and `Close` as [`LinkEvent`]s
//! - write outbound text queued by [`WsLink::send_text`]
//! - on loss, wait `initial * decay^n` (capped) and connect again
//!
//! The task stops when the link is closed or dropped, or when nobody is
//! listening for its events.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use parley_core::error::{ChatError, Result};

use crate::config::ReconnectSection;
use crate::connection::{ConnectionId, Connector, Link, LinkEvent, TransportEvent};
use crate::transport::codec::{decode, encode, Inbound};

pub struct WsConnector {
    events: mpsc::Sender<LinkEvent>,
    reconnect: ReconnectSection,
    outbound_buffer: usize,
}

impl WsConnector {
    pub fn new(events: mpsc::Sender<LinkEvent>, reconnect: ReconnectSection, outbound_buffer: usize) -> Self {
        Self {
            events,
            reconnect,
            outbound_buffer,
        }
    }
}

impl Connector for WsConnector {
    fn connect(&mut self, id: ConnectionId, endpoint: &str) -> Result<Box<dyn Link>> {
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::Internal(format!("no tokio runtime: {e}")))?;

        let (out_tx, out_rx) = mpsc::channel::<String>(self.outbound_buffer.max(1));
        rt.spawn(run_link(
            id,
            endpoint.to_string(),
            self.events.clone(),
            out_rx,
            self.reconnect.clone(),
        ));

        Ok(Box::new(WsLink { out_tx: Some(out_tx) }))
    }
}

/// Outbound half. Dropping it (or `close`) ends the link task.
pub struct WsLink {
    out_tx: Option<mpsc::Sender<String>>,
}

impl Link for WsLink {
    fn send_text(&mut self, text: String) -> Result<()> {
        let Some(tx) = &self.out_tx else {
            return Err(ChatError::NotConnected);
        };
        tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChatError::Transport("outbound queue full".into()),
            mpsc::error::TrySendError::Closed(_) => ChatError::NotConnected,
        })
    }

    fn close(&mut self) {
        self.out_tx = None;
    }
}

enum PumpExit {
    /// Socket lost; reconnect.
    Lost,
    /// Link closed by the owner; stop.
    Closed,
}

async fn emit(events: &mpsc::Sender<LinkEvent>, id: ConnectionId, event: TransportEvent) -> bool {
    events
        .send(LinkEvent {
            connection: id,
            event,
        })
        .await
        .is_ok()
}

async fn run_link(
    id: ConnectionId,
    endpoint: String,
    events: mpsc::Sender<LinkEvent>,
    mut out_rx: mpsc::Receiver<String>,
    reconnect: ReconnectSection,
) {
    let mut attempt: u32 = 0;

    loop {
        match connect_async(endpoint.as_str()).await {
            Ok((socket, _resp)) => {
                attempt = 0;
                tracing::debug!(conn = id.0, %endpoint, "websocket connected");
                if !emit(&events, id, TransportEvent::Open).await {
                    return;
                }

                let (mut ws_tx, mut ws_rx) = socket.split();
                let exit = loop {
                    tokio::select! {
                        // outbound writer
                        maybe_out = out_rx.recv() => {
                            let Some(text) = maybe_out else {
                                let _ = ws_tx.send(Message::Close(None)).await;
                                break PumpExit::Closed;
                            };
                            if let Err(e) = ws_tx.send(encode(text)).await {
                                if !emit(&events, id, TransportEvent::Error(e.to_string())).await {
                                    return;
                                }
                                break PumpExit::Lost;
                            }
                        }

                        // inbound reader
                        incoming = ws_rx.next() => {
                            match incoming {
                                Some(Ok(msg)) => match decode(msg) {
                                    Inbound::Text(text) => {
                                        if !emit(&events, id, TransportEvent::Message(text)).await {
                                            return;
                                        }
                                    }
                                    Inbound::Control => {}
                                    Inbound::Close => break PumpExit::Lost,
                                    Inbound::Invalid(reason) => {
                                        tracing::warn!(conn = id.0, %reason, "inbound frame skipped");
                                    }
                                },
                                Some(Err(e)) => {
                                    if !emit(&events, id, TransportEvent::Error(e.to_string())).await {
                                        return;
                                    }
                                    break PumpExit::Lost;
                                }
                                None => break PumpExit::Lost,
                            }
                        }
                    }
                };

                if !emit(&events, id, TransportEvent::Close).await {
                    return;
                }
                if let PumpExit::Closed = exit {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!(conn = id.0, %endpoint, error = %e, "websocket connect failed");
                if !emit(&events, id, TransportEvent::Error(e.to_string())).await {
                    return;
                }
            }
        }

        let delay = reconnect.delay_ms(attempt);
        attempt = attempt.saturating_add(1);
        tracing::debug!(conn = id.0, attempt, delay_ms = delay, "reconnect scheduled");

        let sleep = tokio::time::sleep(Duration::from_millis(delay));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                maybe_out = out_rx.recv() => match maybe_out {
                    Some(_) => tracing::debug!(conn = id.0, "outbound frame dropped while disconnected"),
                    None => return,
                },
            }
        }
    }
}
