// src/main.rs
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use daycare_backend::api::handlers::compliance_handler::compliance_router;
use daycare_backend::api::handlers::deletion_request_handler::deletion_request_router;
use daycare_backend::api::handlers::gdpr_handler::gdpr_router;
use daycare_backend::api::AppState;
use daycare_backend::config::Config;
use daycare_backend::db::create_db_pool;
use daycare_backend::logging;
use daycare_backend::service::purge_service::PurgeService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // トレーシングの設定
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daycare_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting Daycare Backend server...");

    // 設定を読み込む
    let app_config = Config::from_env().expect("Failed to load configuration");

    // データベース接続を作成
    let db_pool = create_db_pool(&app_config)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created successfully.");

    let app_state = AppState::new(db_pool, &app_config);

    // 定期パージのスケジューラを起動
    PurgeService::spawn_scheduler(
        Arc::clone(&app_state.purge_service),
        app_config.purge_interval_hours,
    );

    // ルーターの設定
    let app_router = axum::Router::new()
        .merge(gdpr_router(app_state.clone()))
        .merge(deletion_request_router(app_state.clone()))
        .merge(compliance_router(app_state))
        .layer(axum::middleware::from_fn(logging::logging_middleware))
        .layer(axum::middleware::from_fn(logging::inject_request_context))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    // サーバーの起動
    tracing::info!(
        "Router configured. Server listening on {}",
        app_config.server_addr
    );

    let listener = TcpListener::bind(&app_config.server_addr).await?;
    axum::serve(listener, app_router.into_make_service()).await?;

    Ok(())
}
