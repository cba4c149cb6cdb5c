use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use listing_backend::app::{router, AppState};
use listing_backend::config::{AppConfig, RepositoryKind};
use listing_backend::db;
use listing_backend::repository::{InMemoryPropertyRepository, PgPropertyRepository, PropertyRepository};
use listing_backend::storage::S3UploadSigner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!(
        "Loaded config: repository={:?} bucket={} region={}",
        config.repository,
        config.s3.bucket,
        config.s3.region
    );

    let repository: Arc<dyn PropertyRepository> = match config.repository {
        RepositoryKind::Postgres => {
            let pool = db::establish_pool(&config.database_url, config.database_pool_size)?;
            let mut conn = pool.get()?;
            db::run_migrations(&mut conn).map_err(|e| e as Box<dyn std::error::Error>)?;
            Arc::new(PgPropertyRepository::new(pool))
        }
        RepositoryKind::Memory => {
            log::warn!("Using the in-memory repository; listings are lost on restart");
            Arc::new(InMemoryPropertyRepository::new())
        }
    };

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.s3.region.clone()))
        .load()
        .await;
    let uploads = S3UploadSigner::new(
        aws_sdk_s3::Client::new(&aws_config),
        config.s3.bucket.clone(),
        config.s3.region.clone(),
        Duration::from_secs(config.s3.presign_ttl_secs),
    );

    let state = AppState {
        repository,
        uploads: Arc::new(uploads),
        jwt_secret: config.jwt_secret.clone(),
        max_page_size: config.max_page_size,
    };

    let addr: SocketAddr = config.socket_addr().parse()?;
    log::info!("Starting server on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state).into_make_service()).await?;

    Ok(())
}
