use std::sync::Arc;

use common::AssetHost;
use mongodb::{Client, Database};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub assets: Arc<dyn AssetHost>,
}
