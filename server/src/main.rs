use axum::routing::get;
use axum::Router;
use tiltmaze_server::config::ServerConfig;
use tiltmaze_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
use tiltmaze_server::ws::{ws_handler, AppState};
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::default();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(64);

    // Spawn game loop
    let bc_tx = broadcast_tx.clone();
    tokio::spawn(async move {
        run_game_loop(game_rx, bc_tx, config).await;
    });

    // Axum app
    let app_state = AppState {
        game_tx,
        broadcast_tx,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("Starting tiltmaze server on {}", listen_addr);
    println!("Tiltmaze server listening on {}", listen_addr);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
