use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use configuration::settings::Settings;
use database::{
    ConnectOptions, CustomerRepository, CustomerStore, MemoryStore, PgStore,
    ReservationRepository, ReservationStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub customers: CustomerRepository,
    pub reservations: ReservationRepository,
}

impl AppState {
    pub fn new(
        customer_store: Arc<dyn CustomerStore>,
        reservation_store: Arc<dyn ReservationStore>,
    ) -> Self {
        let reservations = ReservationRepository::new(reservation_store);
        let customers = CustomerRepository::with_reservations(customer_store, reservations.clone());
        Self {
            customers,
            reservations,
        }
    }

    /// State backed by a fresh `MemoryStore`; nothing survives a restart.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store)
    }
}

/// Builds the JSON API on top of `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/api/customers/search", get(handlers::search_customers))
        .route("/api/customers/top-ten", get(handlers::top_customers))
        .route(
            "/api/customers/:id",
            get(handlers::get_customer).put(handlers::update_customer),
        )
        .route(
            "/api/customers/:id/reservations",
            get(handlers::customer_reservations).post(handlers::create_reservation),
        )
        .with_state(Arc::new(state))
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Opens the configured connection pool and applies migrations if asked to.
pub async fn connect_store(settings: &Settings) -> anyhow::Result<PgStore> {
    let options = ConnectOptions {
        database_url: settings.database.connection_url()?,
        max_connections: settings.database.max_connections,
        acquire_timeout: settings.database.acquire_timeout(),
    };
    let db_pool = database::connect(&options)
        .await
        .context("Failed to connect to the database")?;
    if settings.database.run_migrations {
        database::run_migrations(&db_pool).await?;
    }
    Ok(PgStore::new(db_pool))
}

/// Connects to PostgreSQL and serves the API until the process is stopped.
/// Tracing must already be initialised.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let store = Arc::new(connect_store(settings).await?);
    serve(AppState::new(store.clone(), store), settings.server.socket_addr()?).await
}

/// Serves the API for `state` on `addr` until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
