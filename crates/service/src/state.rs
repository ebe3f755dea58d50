use std::sync::Arc;

use url::Url;

use common::access::AccessGate;

use super::config::Config;
use super::database::{Database, DatabaseSetupError};

/// Main service state - owns the database handle and the access gate
#[derive(Clone)]
pub struct State {
    database: Database,
    gate: Arc<AccessGate<Database>>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // check that the path exists
                if !path.exists() {
                    return Err(StateSetupError::DatabasePathDoesNotExist);
                }
                // parse the path into a URL
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("database url: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup the access gate over it
        let gate = Arc::new(AccessGate::with_throttle(
            database.clone(),
            config.throttle(),
        ));

        Ok(Self { database, gate })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn gate(&self) -> &AccessGate<Database> {
        &self.gate
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        &self.database
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
}
