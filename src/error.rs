use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no IMAP server configured (set OUTLOOK_IMAP_SERVER or pass --server)")]
    MissingServer,

    #[error("both --username and --password are required")]
    MissingCredentials,

    #[error("server address {0:?} is not of the form host:port")]
    InvalidServer(String),

    #[error("couldn't read config file {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unable to connect to {server}")]
    Connect {
        server: String,
        #[source]
        source: imap::Error,
    },

    #[error("login failed: {reason}")]
    Auth {
        reason: String,
        #[source]
        source: imap::Error,
    },

    #[error("{command} failed")]
    Protocol {
        command: &'static str,
        #[source]
        source: imap::Error,
    },

    #[error("couldn't start the fetch thread")]
    Spawn(#[source] io::Error),

    #[error("fetch thread exited without reporting a result")]
    ProducerLost,

    #[error("couldn't write {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn protocol(command: &'static str) -> impl FnOnce(imap::Error) -> Error {
        move |source| Error::Protocol { command, source }
    }
}
