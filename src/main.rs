// region:    --- Imports
use crate::database::DatabaseManager;
use crate::notifier::MailRelayNotifier;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod database;
mod handlers;
mod listing;
mod notifier;
mod permissions;
mod query;
mod scheduler;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 스키마 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 경매 마감 스케줄러 시작
    let notifier = Arc::new(MailRelayNotifier::from_env());
    let closer = scheduler::AuctionCloser::new(db_manager.get_pool(), notifier);
    closer.start().await;
    info!("{:<12} --> 경매 마감 스케줄러 시작", "Main");

    // 브라우저 프론트엔드를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/users", post(handlers::handle_register_user))
        .route(
            "/items",
            get(handlers::handle_get_items).post(handlers::handle_create_item),
        )
        .route(
            "/items/:id",
            get(handlers::handle_get_item)
                .put(handlers::handle_update_item)
                .delete(handlers::handle_close_item),
        )
        .route("/items/:id/bid", post(handlers::handle_bid))
        .route("/items/:id/bids", get(handlers::handle_get_item_bids))
        .route(
            "/items/:id/highest-bid",
            get(handlers::handle_get_highest_bid),
        )
        .route(
            "/items/:id/questions",
            get(handlers::handle_get_item_questions),
        )
        .route("/items/:id/question", post(handlers::handle_post_question))
        .route(
            "/questions/:id/reply",
            put(handlers::handle_reply_question),
        )
        .layer(cors)
        .with_state(db_manager);

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
