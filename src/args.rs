use crate::config::{self, SERVER_ENV_VAR};
use clap::Parser;
use std::path::PathBuf;

/// Export the sender and subject of every message in INBOX to a CSV file.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Args {
    /// Specify location of config file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// IMAP server as host:port.
    #[clap(long, env = SERVER_ENV_VAR)]
    pub server: Option<String>,

    /// username for IMAP authentication
    #[clap(long)]
    pub username: Option<String>,

    /// password for IMAP authentication (or an app password).
    #[clap(long)]
    pub password: Option<String>,

    /// Where to write the CSV file. Defaults to emails.csv.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Anything given on the command line (or through the environment) wins
    /// over the config file.
    #[rustfmt::skip]
    pub fn overwrite_config(&self, settings: config::Settings) -> config::Settings {
        config::Settings {
            connection: config::ConnectionSettings {
                server   : self.server.clone().or(settings.connection.server),
                username : self.username.clone().or(settings.connection.username),
                password : self.password.clone().or(settings.connection.password),
            },
            output: self.output.clone().or(settings.output),
        }
    }
}
