mod config;
mod db;
mod inventory;
mod payment;
mod pricing;
mod rewards;
mod settlement;
mod wallet;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::SettlementConfig;
use inventory::InventoryRepository;
use payment::{HttpPaymentGateway, PaymentGateway};
use rewards::{RewardEngine, RewardRepository};
use settlement::{SettlementService, TransactionRepository};
use wallet::WalletRepository;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        settlement::handlers::create_settlement_handler,
        settlement::handlers::payment_callback_handler,
        settlement::handlers::get_transaction_handler,
        wallet::handlers::get_wallet_handler,
    ),
    components(
        schemas(
            settlement::CreateSettlementRequest,
            settlement::SettlementResponse,
            settlement::CallbackRequest,
            settlement::CallbackResponse,
            settlement::Transaction,
            settlement::TransactionStatus,
            wallet::WalletResponse,
            inventory::SellableUnit,
            inventory::UnitKind,
        )
    ),
    tags(
        (name = "settlements", description = "Reservation, payment and settlement endpoints"),
        (name = "wallets", description = "Read-only coin wallet endpoints")
    ),
    info(
        title = "Settlement API",
        version = "1.0.0",
        description = "Settlement core: inventory reservation, coin wallet ledger, payment verification and atomic commit"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    settlement: SettlementService,
    wallets: WalletRepository,
}

/// Creates and configures the application router
/// Wires repositories and services around the pool and the injected gateway
fn create_router(db: PgPool, config: SettlementConfig, gateway: Arc<dyn PaymentGateway>) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let inventory = InventoryRepository::new(db.clone());
    let wallets = WalletRepository::new(db.clone());
    let transactions = TransactionRepository::new(db.clone());
    let rewards = RewardEngine::new(RewardRepository::new(db.clone()), wallets.clone());

    let settlement_service = SettlementService::new(
        inventory,
        wallets.clone(),
        transactions,
        rewards,
        gateway,
        config,
    );

    let state = AppState {
        settlement: settlement_service,
        wallets,
    };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .route("/api/reserve", post(settlement::create_settlement_handler))
        .route(
            "/api/payment-callback",
            post(settlement::payment_callback_handler),
        )
        .route(
            "/api/transactions/:id",
            get(settlement::get_transaction_handler),
        )
        .route("/api/wallets/:user_id", get(wallet::get_wallet_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Settlement API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let config = SettlementConfig::from_env();

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Real provider client; tests inject a stub through the same seam
    let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(&config.gateway));

    // Create the application router
    let app = create_router(db_pool, config, gateway);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Settlement API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
