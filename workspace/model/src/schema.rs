//! Table creation straight from the entity definitions.

use crate::entities::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, EntityName, EntityTrait, Schema};
use tracing::{debug, info};

/// Creates every table that does not exist yet.
///
/// Tables are created parents-first so that the foreign keys derived from the
/// entity relations always point at an existing table.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Project).await?;
    create_table(db, &schema, Requirement).await?;
    create_table(db, &schema, UseCase).await?;
    create_table(db, &schema, Scenario).await?;
    create_table(db, &schema, Actor).await?;
    create_table(db, &schema, RequirementUseCase).await?;

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    debug!("Ensuring table {}", entity.table_name());
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}
