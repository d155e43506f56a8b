use std::path::PathBuf;

use clap::Parser;
use mysql_scoped::config::{ENV_DATABASE, ENV_HOST, ENV_PASSWORD, ENV_PORT, ENV_USER};
use mysql_scoped::{ConnectionParameters, MysqlScopedError};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Prepared select and insert through scoped MySQL handles",
    long_about = "Connection settings come from MYSQL_HOST, MYSQL_USER, MYSQL_PASSWORD, \
                  MYSQL_DATABASE and MYSQL_PORT; flags override them."
)]
pub(crate) struct Args {
    #[arg(long)]
    pub(crate) host: Option<String>,
    #[arg(long)]
    pub(crate) user: Option<String>,
    #[arg(long)]
    pub(crate) password: Option<String>,
    #[arg(long)]
    pub(crate) database: Option<String>,
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Id looked up by the prepared select
    #[arg(long, default_value_t = 1)]
    pub(crate) id: i64,
    /// Name written by the prepared insert
    #[arg(long, default_value = "some name")]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) skip_insert: bool,
    #[arg(long, default_value_t = Level::INFO)]
    pub(crate) log_level: Level,
    /// Also append log output to this file
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
}

impl Args {
    /// Flags first, then the environment.
    pub(crate) fn connection_parameters(&self) -> Result<ConnectionParameters, MysqlScopedError> {
        self.parameters_with(|key| std::env::var(key).ok())
    }

    pub(crate) fn parameters_with<F>(&self, env: F) -> Result<ConnectionParameters, MysqlScopedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        ConnectionParameters::from_lookup(|key| {
            let flag = match key {
                ENV_HOST => self.host.clone(),
                ENV_USER => self.user.clone(),
                ENV_PASSWORD => self.password.clone(),
                ENV_DATABASE => self.database.clone(),
                ENV_PORT => self.port.map(|p| p.to_string()),
                _ => None,
            };
            flag.or_else(|| env(key))
        })
    }
}
