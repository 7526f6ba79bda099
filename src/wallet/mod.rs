//! Role wallets
//!
//! Each role gets its own type exposing only the operations that role may
//! perform. They share the engine components in [`crate::processor`].

mod keygen;
mod signature;
mod watch;

pub use keygen::KeygenWallet;
pub use signature::SignatureWallet;
pub use watch::WatchWallet;

use crate::config::AppConfig;
use crate::database::Database;
use crate::errors::AppResult;

/// Open the database named in `config`
pub fn open_database(config: &AppConfig) -> AppResult<Database> {
    Database::new(&config.database.path.to_string_lossy())
}
