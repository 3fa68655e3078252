//! Headless display replica.
//!
//! Connects to a server as the display for one player, mirrors the broadcast
//! stream, and integrates that player's physics from relayed controller
//! tilt. A renderer would read [`ReplicaView`] each frame; this binary just
//! logs state changes, which is enough to drive and observe a full round.
//!
//! Usage: tiltmaze-replica [--url URL] [--player ID]

use std::time::Duration;

use tiltmaze_replica::connection::{NetEvent, ServerConnection};
use tiltmaze_replica::pilot::Pilot;
use tiltmaze_replica::view::{ConnectionState, ReplicaView};
use tiltmaze_shared::protocol::{DeviceRole, ServerMsg};

struct Options {
    url: String,
    player_id: String,
}

fn parse_args() -> Options {
    let mut options = Options {
        url: "ws://127.0.0.1:9001/ws".to_string(),
        player_id: format!("display-{}", std::process::id()),
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i + 1 < args.len() {
        match args[i].as_str() {
            "--url" => options.url = args[i + 1].clone(),
            "--player" => options.player_id = args[i + 1].clone(),
            other => panic!("Unknown option: {}", other),
        }
        i += 2;
    }
    options
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let options = parse_args();
    tracing::info!(
        "Starting display replica for {} against {}",
        options.player_id,
        options.url
    );

    let connection = ServerConnection::new(
        options.url,
        options.player_id.clone(),
        DeviceRole::Display,
    );
    let mut view = ReplicaView::new(options.player_id.clone());
    let mut pilot = Pilot::new(options.player_id.clone());

    let mut frame = tokio::time::interval(Duration::from_millis(33));
    let mut status = String::new();

    loop {
        frame.tick().await;

        for event in connection.poll_events() {
            match event {
                NetEvent::Connected => {
                    view.state = ConnectionState::Connected;
                    tracing::info!("Connected");
                }
                NetEvent::Disconnected => {
                    view.state = ConnectionState::Disconnected;
                    tracing::warn!("Disconnected, reconnecting");
                }
                NetEvent::ProtocolMismatch { server, client } => {
                    eprintln!(
                        "Protocol mismatch: server speaks v{}, this build speaks v{}",
                        server, client
                    );
                    return;
                }
                NetEvent::Message(msg) => {
                    if let ServerMsg::TiltUpdate(t) = &msg {
                        if t.player_id == view.self_id {
                            pilot.set_tilt(t.tilt_x, t.tilt_z);
                        }
                    }
                    if let ServerMsg::PhaseState(p) = &msg {
                        pilot.observe_phase(p.phase);
                    }
                    view.apply(&msg);
                }
            }
        }

        if let Some(update) = pilot.step(&mut view) {
            connection.send(update);
        }

        let line = format!(
            "{:?} {:>3}s | {} players | {} on board",
            view.phase,
            view.time_left,
            view.players.len(),
            view.leaderboard.len()
        );
        if line != status {
            tracing::info!("{}", line);
            status = line;
        }
    }
}
