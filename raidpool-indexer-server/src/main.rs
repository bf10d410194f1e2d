use blockscout_service_launcher::{database, launcher::ConfigSettings};
use migration::Migrator;
use raidpool_indexer_server::Settings;

const SERVICE_NAME: &str = "raidpool_indexer";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let settings = Settings::build().expect("failed to read config");

    blockscout_service_launcher::tracing::init_logs(
        SERVICE_NAME,
        &settings.tracing,
        &settings.jaeger,
    )?;

    let db_connection = database::initialize_postgres::<Migrator>(&settings.database).await?;

    raidpool_indexer_server::run(settings, db_connection).await
}
