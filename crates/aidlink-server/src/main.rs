use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use aidlink_api::auth::{self, AppState, AppStateInner};
use aidlink_api::middleware::require_auth;
use aidlink_api::{boards, chats, dashboard, reconcile, requests};
use aidlink_db::Database;
use aidlink_gateway::connection;
use aidlink_gateway::dispatcher::Dispatcher;

#[derive(Clone)]
struct GatewayState {
    db: Arc<Database>,
    dispatcher: Dispatcher,
    jwt_secret: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aidlink=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("AIDLINK_JWT_SECRET").unwrap_or_else(|_| "aidlink-dev-secret".into());
    let db_path = std::env::var("AIDLINK_DB_PATH").unwrap_or_else(|_| "aidlink.db".into());
    let host = std::env::var("AIDLINK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("AIDLINK_PORT")
        .unwrap_or_else(|_| "4000".into())
        .parse()?;
    let reconcile_secs: u64 = std::env::var("AIDLINK_RECONCILE_SECS")
        .unwrap_or_else(|_| "60".into())
        .parse()?;

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let dispatcher = Dispatcher::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        jwt_secret: jwt_secret.clone(),
        dispatcher: dispatcher.clone(),
    });

    // Background auto-chat reconciliation
    tokio::spawn(reconcile::run_reconcile_loop(
        app_state.clone(),
        reconcile_secs,
    ));

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/requests", get(requests::list_requests))
        .route("/requests", post(requests::create_request))
        .route("/requests/mine", get(requests::my_requests))
        .route("/requests/{request_id}/status", patch(requests::set_status))
        .route("/requests/{request_id}/volunteer", post(requests::volunteer))
        .route("/chats", get(chats::list_chats))
        .route("/chats/{chat_id}/messages", get(chats::get_messages))
        .route("/chats/{chat_id}/messages", post(chats::send_message))
        .route("/boards", get(boards::list_boards))
        .route("/boards", post(boards::create_board))
        .route("/boards/{board_id}/join", post(boards::join_board))
        .route("/boards/{board_id}/messages", get(boards::get_messages))
        .route("/boards/{board_id}/messages", post(boards::send_message))
        .route("/dashboard/stats", get(dashboard::stats))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let gateway_state = GatewayState {
        db,
        dispatcher,
        jwt_secret,
    };
    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(gateway_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("AidLink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.db, state.dispatcher, state.jwt_secret)
    })
}
