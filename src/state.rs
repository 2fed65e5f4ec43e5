//! Shared handler state: the MySQL pool plus the loaded configuration.

use crate::{config::Config, db::Db};

/// Cloned into every route via `State<AppState>`. Cloning is cheap: the pool
/// is handle-like, and `Config` holds only the small strings and ports read
/// from the environment (database coordinates, SMTP, oracle URL).
#[derive(Clone)]
pub struct AppState {
    pub pool:   Db,
    pub config: Config,
}
