use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn establish_pool(database_url: &str, max_size: u32) -> Result<DbPool, diesel::r2d2::PoolError> {
    if database_url.is_empty() {
        log::error!("DATABASE_URL is not set");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    match Pool::builder().max_size(max_size).build(manager) {
        Ok(pool) => {
            log::info!("Database pool established (max {} connections)", max_size);
            Ok(pool)
        }
        Err(e) => {
            log::error!("Failed to establish database pool: {}", e);
            Err(e)
        }
    }
}

/// Applies every embedded migration that has not run yet.
pub fn run_migrations(
    conn: &mut PgConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}
