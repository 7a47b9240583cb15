use anyhow::Result;
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, error, info, trace};

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    let db: DatabaseConnection = match Database::connect(database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    info!("Creating tables");
    if let Err(e) = model::schema::create_schema(&db).await {
        error!("Failed to create tables: {}", e);
        return Err(e.into());
    }

    info!("Database initialization completed successfully!");
    Ok(())
}
