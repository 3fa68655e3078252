//! Background WebSocket connection for one device.
//!
//! The network thread owns its own tokio runtime, reconnects with capped
//! exponential backoff and resends the identifying hello after every
//! reconnect; the replica's idempotent handlers make resynchronization after
//! a gap safe. Events drain through a plain std channel so the consumer can
//! poll from any loop it likes.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use tiltmaze_shared::protocol::{ClientMsg, DeviceRole, ServerMsg, PROTOCOL_VERSION};

#[derive(Debug, Clone)]
pub enum NetEvent {
    Connected,
    Disconnected,
    Message(ServerMsg),
    ProtocolMismatch { server: u32, client: u32 },
}

type CmdSender = tokio::sync::mpsc::UnboundedSender<ClientMsg>;

/// Owns the background WebSocket task for one device connection.
pub struct ServerConnection {
    event_rx: Mutex<Receiver<NetEvent>>,
    cmd_tx: CmdSender,
}

impl ServerConnection {
    /// Connect as the given player/role and keep reconnecting forever.
    pub fn new(url: String, player_id: String, role: DeviceRole) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let cmd_tx = spawn_network_thread(url, player_id, role, event_tx);

        Self {
            event_rx: Mutex::new(event_rx),
            cmd_tx,
        }
    }

    /// Drain everything the network thread produced since the last poll.
    pub fn poll_events(&self) -> Vec<NetEvent> {
        let mut out = Vec::new();
        if let Ok(rx) = self.event_rx.lock() {
            while let Ok(event) = rx.try_recv() {
                out.push(event);
            }
        }
        out
    }

    pub fn send(&self, msg: ClientMsg) {
        let _ = self.cmd_tx.send(msg);
    }
}

fn spawn_network_thread(
    url: String,
    player_id: String,
    role: DeviceRole,
    event_tx: Sender<NetEvent>,
) -> CmdSender {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel::<ClientMsg>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("failed to build network runtime: {}", e);
                return;
            }
        };

        rt.block_on(async move {
            let mut reconnect_delay = Duration::from_millis(1000);
            let max_delay = Duration::from_millis(30_000);

            loop {
                let connect = tokio_tungstenite::connect_async(url.as_str()).await;

                let (ws_stream, _) = match connect {
                    Ok(x) => x,
                    Err(_) => {
                        tokio::time::sleep(reconnect_delay).await;
                        reconnect_delay = (reconnect_delay.mul_f32(1.5)).min(max_delay);
                        continue;
                    }
                };

                reconnect_delay = Duration::from_millis(1000);

                let (mut write, mut read) = ws_stream.split();

                // Identify before anything else; the server ignores
                // everything until it has seen the hello.
                let hello = ClientMsg::Hello {
                    player_id: player_id.clone(),
                    role,
                };
                match serde_json::to_string(&hello) {
                    Ok(text) => {
                        if write.send(Message::Text(text.into())).await.is_err() {
                            continue;
                        }
                    }
                    Err(_) => return,
                }

                let _ = event_tx.send(NetEvent::Connected);

                loop {
                    tokio::select! {
                        biased;

                        Some(cmd) = cmd_rx.recv() => {
                            if let Ok(text) = serde_json::to_string(&cmd) {
                                if write.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                        }

                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    if let Ok(server_msg) = serde_json::from_str::<ServerMsg>(&text) {
                                        if let ServerMsg::Welcome(w) = &server_msg {
                                            if w.protocol_version != PROTOCOL_VERSION {
                                                let _ = event_tx.send(NetEvent::ProtocolMismatch {
                                                    server: w.protocol_version,
                                                    client: PROTOCOL_VERSION,
                                                });
                                                let _ = write.close().await;
                                                break;
                                            }
                                        }
                                        let _ = event_tx.send(NetEvent::Message(server_msg));
                                    }
                                }
                                Some(Ok(Message::Close(_))) => {
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(_)) => {
                                    break;
                                }
                                None => {
                                    break;
                                }
                            }
                        }
                    }
                }

                let _ = event_tx.send(NetEvent::Disconnected);
                tokio::time::sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay.mul_f32(1.5)).min(max_delay);
            }
        });
    });

    cmd_tx
}
