use std::net::SocketAddr;
use std::sync::Arc;

use binventory::config::Config;
use binventory::db::{create_pool, PoolSettings};
use binventory::middleware::AuthLayer;
use binventory::proto::auth::auth_service_server::AuthServiceServer;
use binventory::proto::auth::session_service_server::SessionServiceServer;
use binventory::proto::auth::two_factor_service_server::TwoFactorServiceServer;
use binventory::proto::bins::bin_service_server::BinServiceServer;
use binventory::proto::categories::category_service_server::CategoryServiceServer;
use binventory::proto::health::health_server::HealthServer;
use binventory::proto::items::item_service_server::ItemServiceServer;
use binventory::proto::organization::member_service_server::MemberServiceServer;
use binventory::proto::organization::organization_service_server::OrganizationServiceServer;
use binventory::proto::qr::qr_service_server::QrServiceServer;
use binventory::proto::qr::scanner_service_server::ScannerServiceServer;
use binventory::proto::search::search_service_server::SearchServiceServer;
use binventory::search::SearchEngine;
use binventory::services::{
    AuthServiceImpl, BinServiceImpl, CategoryServiceImpl, HealthServiceImpl, ItemServiceImpl,
    MemberServiceImpl, OrganizationServiceImpl, QrServiceImpl, ScannerServiceImpl,
    SearchServiceImpl, SessionServiceImpl, TwoFactorServiceImpl,
};
use binventory::storage::{S3Backend, StorageBackend};

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Include file descriptor for gRPC reflection
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("binventory_descriptor");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "binventory=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting binventory gRPC server...");
    tracing::info!("Connecting to database...");

    // Create database pool and apply pending migrations
    let pool_settings =
        PoolSettings::default().with_max_connections(config.database_max_connections);
    let pool = create_pool(&config.database_url, &pool_settings).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connection established");

    // Object storage for item images, optional
    let storage: Option<Arc<dyn StorageBackend>> = if let Some(bucket) = &config.s3_bucket {
        tracing::info!("Object storage enabled: bucket={}", bucket);
        match S3Backend::new(
            bucket.clone(),
            config.s3_region.clone(),
            config.s3_endpoint.clone(),
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
        ) {
            Ok(backend) => Some(Arc::new(backend)),
            Err(e) => {
                tracing::error!("Failed to create storage backend: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Object storage disabled, image uploads unavailable");
        None
    };

    // Search engine, optional; the database fallback answers queries when absent
    let search = if let Some(url) = &config.search_url {
        let engine = Arc::new(SearchEngine::new(
            url.clone(),
            config.search_api_key.clone(),
        ));
        match engine.ensure_indexes().await {
            Ok(()) => tracing::info!("Search engine configured: {}", url),
            Err(e) => tracing::warn!("Search index setup failed, continuing anyway: {}", e),
        }
        Some(engine)
    } else {
        tracing::info!("Search engine disabled, using database fallback");
        None
    };

    // Create services
    let auth_service = AuthServiceImpl::new(pool.clone(), config.jwt_secret.clone());
    let two_factor_service = TwoFactorServiceImpl::new(pool.clone());
    let session_service = SessionServiceImpl::new(pool.clone());
    let organization_service = OrganizationServiceImpl::new(pool.clone());
    let member_service = MemberServiceImpl::new(pool.clone(), config.jwt_secret.clone());
    let bin_service = BinServiceImpl::new(pool.clone(), search.clone(), config.qr_base_url.clone());
    let item_service = ItemServiceImpl::new(
        pool.clone(),
        search.clone(),
        storage,
        config.asset_base_url.clone(),
    );
    let category_service = CategoryServiceImpl::new(pool.clone());
    let qr_service = QrServiceImpl::new(pool.clone(), config.qr_base_url.clone());
    let scanner_service = ScannerServiceImpl::new(pool.clone());
    let search_service = SearchServiceImpl::new(pool.clone(), search);
    let health_service = HealthServiceImpl::new(pool.clone());

    // CORS layer for gRPC-Web
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any);

    // Build reflection service
    let reflection_service = ReflectionBuilder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    // Build and run server with gRPC-Web support
    Server::builder()
        .accept_http1(true) // Required for gRPC-Web
        .layer(cors)
        .layer(tonic_web::GrpcWebLayer::new()) // Enable gRPC-Web
        .layer(AuthLayer::new(pool.clone(), config.jwt_secret.clone()))
        .add_service(reflection_service)
        .add_service(AuthServiceServer::new(auth_service))
        .add_service(TwoFactorServiceServer::new(two_factor_service))
        .add_service(SessionServiceServer::new(session_service))
        .add_service(OrganizationServiceServer::new(organization_service))
        .add_service(MemberServiceServer::new(member_service))
        .add_service(BinServiceServer::new(bin_service))
        .add_service(ItemServiceServer::new(item_service))
        .add_service(CategoryServiceServer::new(category_service))
        .add_service(QrServiceServer::new(qr_service))
        .add_service(ScannerServiceServer::new(scanner_service))
        .add_service(SearchServiceServer::new(search_service))
        .add_service(HealthServer::new(health_service))
        .serve(addr)
        .await?;

    Ok(())
}
