use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

/// Partial unique index allowing at most one valid judging per submission.
pub const ONE_VALID_JUDGING_INDEX: &str = "idx_judging_one_valid_per_submission";

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(20)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or migrate every table registered under `server::entity`, then the
/// indexes the entity attributes cannot express.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("server::entity::*").sync(db).await?;

    // Same syntax on Postgres and SQLite.
    db.execute_unprepared(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {ONE_VALID_JUDGING_INDEX} \
         ON judging (submission_id) WHERE valid"
    ))
    .await?;

    Ok(())
}
