use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

use crate::config::DatabaseConfig;

pub async fn init_db(config: &DatabaseConfig) -> Result<(Client, Database), mongodb::error::Error> {
    let mut opts = ClientOptions::parse(&config.url).await?;

    // Set connection pool options
    opts.app_name = Some("vidhub".into());
    opts.max_pool_size = Some(100);
    opts.min_pool_size = Some(5);
    opts.connect_timeout = Some(Duration::from_secs(8));
    opts.server_selection_timeout = Some(Duration::from_secs(8));

    let client = Client::with_options(opts)?;
    let db = client.database(&config.name);
    db.run_command(doc! { "ping": 1 }).await?;
    info!("Connected to MongoDB database {}", config.name);

    Ok((client, db))
}
