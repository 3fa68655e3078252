//! Load test for the tiltmaze server.
//!
//! Spawns fake player pairs (one controller + one display connection each):
//! - The controller streams bot-generated tilt samples
//! - The display integrates real physics from the relayed tilt and sends
//!   position updates, exactly like a browser replica would
//! - Both count the broadcasts they receive
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --pairs N      Number of player pairs to spawn (default: 50)
//!   --duration S   Test duration in seconds (default: 30)
//!   --url URL      Server URL (default: ws://127.0.0.1:9001/ws)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use tiltmaze_server::bot::{BotPersonality, BotPilot};
use tiltmaze_shared::maze::Maze;
use tiltmaze_shared::physics;
use tiltmaze_shared::protocol::{round4, ClientMsg, DeviceRole, Phase, ServerMsg};
use tiltmaze_shared::vec3::Vec3;

// === Metrics ===

struct Metrics {
    connected: AtomicU64,
    welcomes: AtomicU64,
    tilts_sent: AtomicU64,
    tilt_updates_received: AtomicU64,
    position_updates_sent: AtomicU64,
    player_updates_received: AtomicU64,
    phase_states_received: AtomicU64,
    resets_received: AtomicU64,
    finishes: AtomicU64,
    errors: AtomicU64,
}

impl Metrics {
    fn new() -> Self {
        Self {
            connected: AtomicU64::new(0),
            welcomes: AtomicU64::new(0),
            tilts_sent: AtomicU64::new(0),
            tilt_updates_received: AtomicU64::new(0),
            position_updates_sent: AtomicU64::new(0),
            player_updates_received: AtomicU64::new(0),
            phase_states_received: AtomicU64::new(0),
            resets_received: AtomicU64::new(0),
            finishes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
}

// === Controller client ===

async fn run_controller(
    pair_id: u32,
    url: String,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let (ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if pair_id < 5 {
                eprintln!("Controller {} failed to connect: {}", pair_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    metrics.connected.fetch_add(1, Ordering::Relaxed);
    let (mut sink, mut stream) = ws.split();

    let hello = ClientMsg::Hello {
        player_id: format!("bot-{}", pair_id),
        role: DeviceRole::Controller,
    };
    if send_msg(&mut sink, &hello).await.is_err() {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(pair_id as u64);
    let mut bot = BotPilot::new(BotPersonality::random(&mut rng), &mut rng);

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut tilt_interval = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            _ = &mut deadline => break,

            _ = tilt_interval.tick() => {
                let (tilt_x, tilt_z) = bot.tick(0.05, &mut rng);
                let msg = ClientMsg::Tilt { tilt_x, tilt_z };
                if send_msg(&mut sink, &msg).await.is_err() {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
                metrics.tilts_sent.fetch_add(1, Ordering::Relaxed);
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(_)) => {} // controllers ignore broadcasts
                    _ => break,
                }
            }
        }
    }
}

// === Display client ===

async fn run_display(pair_id: u32, url: String, duration: Duration, metrics: Arc<Metrics>) {
    let (ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if pair_id < 5 {
                eprintln!("Display {} failed to connect: {}", pair_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    metrics.connected.fetch_add(1, Ordering::Relaxed);
    let (mut sink, mut stream) = ws.split();

    let player_id = format!("bot-{}", pair_id);
    let hello = ClientMsg::Hello {
        player_id: player_id.clone(),
        role: DeviceRole::Display,
    };
    if send_msg(&mut sink, &hello).await.is_err() {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        return;
    }

    // Wait for welcome before simulating anything
    let welcome = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = stream.next().await {
            if let Ok(Message::Text(text)) = msg {
                if let Ok(ServerMsg::Welcome(w)) = serde_json::from_str::<ServerMsg>(&text) {
                    return Some(w);
                }
            }
        }
        None
    })
    .await;

    let welcome = match welcome {
        Ok(Some(w)) => w,
        _ => {
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    metrics.welcomes.fetch_add(1, Ordering::Relaxed);

    let config = welcome.config.clone();
    let mut maze = Maze::from_catalog(welcome.maze, &config);
    let mut phase = welcome.phase;

    let mut pos = welcome
        .players
        .iter()
        .find(|p| p.id == player_id)
        .map(|p| Vec3::from_array(p.pos))
        .unwrap_or(maze.start_world);
    let mut vel = Vec3::ZERO;
    let mut tilt = (0.0f64, 0.0f64);
    let mut finish: Option<f64> = None;
    let mut race_start: Option<Instant> = None;

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut step_interval = tokio::time::interval(Duration::from_millis(33));

    loop {
        tokio::select! {
            _ = &mut deadline => break,

            _ = step_interval.tick() => {
                if phase == Phase::Playing && finish.is_none() {
                    let result = physics::step(&config, &maze, pos, vel, tilt.0, tilt.1);
                    pos = result.position;
                    vel = result.velocity;
                    if result.reached_goal {
                        finish = race_start.map(|s| s.elapsed().as_secs_f64());
                        if finish.is_some() {
                            metrics.finishes.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    let msg = ClientMsg::PositionUpdate {
                        pos: [round4(pos.x), round4(pos.y), round4(pos.z)],
                        vel: [round4(vel.x), round4(vel.y), round4(vel.z)],
                        finish_time: finish,
                    };
                    if send_msg(&mut sink, &msg).await.is_err() {
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    metrics.position_updates_sent.fetch_add(1, Ordering::Relaxed);
                }
            }

            msg = stream.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(_)) => continue,
                    _ => break,
                };
                let server_msg = match serde_json::from_str::<ServerMsg>(&text) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                match server_msg {
                    ServerMsg::TiltUpdate(t) => {
                        tilt = (t.tilt_x, t.tilt_z);
                        metrics.tilt_updates_received.fetch_add(1, Ordering::Relaxed);
                    }
                    ServerMsg::PhaseState(p) => {
                        metrics.phase_states_received.fetch_add(1, Ordering::Relaxed);
                        if p.phase == Phase::Playing && race_start.is_none() {
                            race_start = Some(Instant::now());
                        }
                        if p.phase == Phase::Joining {
                            race_start = None;
                            finish = None;
                        }
                        phase = p.phase;
                    }
                    ServerMsg::GameReset(r) => {
                        metrics.resets_received.fetch_add(1, Ordering::Relaxed);
                        maze = Maze::from_catalog(r.maze, &config);
                        pos = maze.start_world;
                        vel = Vec3::ZERO;
                        finish = None;
                        race_start = None;
                    }
                    ServerMsg::PlayerUpdate(_) => {
                        metrics.player_updates_received.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn send_msg<S>(sink: &mut S, msg: &ClientMsg) -> Result<(), ()>
where
    S: futures_util::Sink<Message> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

// === Main ===

struct Options {
    pairs: u32,
    duration: Duration,
    url: String,
}

fn parse_args() -> Options {
    let mut options = Options {
        pairs: 50,
        duration: Duration::from_secs(30),
        url: "ws://127.0.0.1:9001/ws".to_string(),
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i + 1 < args.len() {
        match args[i].as_str() {
            "--pairs" => options.pairs = args[i + 1].parse().expect("--pairs expects a number"),
            "--duration" => {
                options.duration =
                    Duration::from_secs(args[i + 1].parse().expect("--duration expects seconds"))
            }
            "--url" => options.url = args[i + 1].clone(),
            other => panic!("Unknown option: {}", other),
        }
        i += 2;
    }
    options
}

#[tokio::main]
async fn main() {
    let options = parse_args();
    let metrics = Arc::new(Metrics::new());

    println!(
        "Spawning {} player pairs against {} for {:?}",
        options.pairs, options.url, options.duration
    );

    let start = Instant::now();
    let mut tasks = Vec::new();
    for pair_id in 0..options.pairs {
        tasks.push(tokio::spawn(run_display(
            pair_id,
            options.url.clone(),
            options.duration,
            metrics.clone(),
        )));
        tasks.push(tokio::spawn(run_controller(
            pair_id,
            options.url.clone(),
            options.duration,
            metrics.clone(),
        )));
        // Stagger connections a little
        if pair_id % 10 == 9 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    for task in tasks {
        let _ = task.await;
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!("=== Load test finished in {:.1}s ===", elapsed);
    println!("connected:               {}", metrics.connected.load(Ordering::Relaxed));
    println!("welcomes:                {}", metrics.welcomes.load(Ordering::Relaxed));
    println!("tilts sent:              {}", metrics.tilts_sent.load(Ordering::Relaxed));
    println!("tilt updates received:   {}", metrics.tilt_updates_received.load(Ordering::Relaxed));
    println!("position updates sent:   {}", metrics.position_updates_sent.load(Ordering::Relaxed));
    println!("player updates received: {}", metrics.player_updates_received.load(Ordering::Relaxed));
    println!("phase states received:   {}", metrics.phase_states_received.load(Ordering::Relaxed));
    println!("resets received:         {}", metrics.resets_received.load(Ordering::Relaxed));
    println!("finishes:                {}", metrics.finishes.load(Ordering::Relaxed));
    println!("errors:                  {}", metrics.errors.load(Ordering::Relaxed));
}
