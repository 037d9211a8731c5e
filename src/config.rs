use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "inbox_export.toml";
pub const DEFAULT_OUTPUT: &str = "emails.csv";
pub const SERVER_ENV_VAR: &str = "OUTLOOK_IMAP_SERVER";
pub const MAILBOX: &str = "INBOX";

/// Everything read from the config file. Every field is optional here,
/// since the command line and environment can fill in the gaps.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub connection: ConnectionSettings,
    pub output: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionSettings {
    /// `host:port`
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Validated configuration for a single export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub connection: Connection,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Connection {
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl TryFrom<Settings> for Config {
    type Error = Error;

    fn try_from(settings: Settings) -> Result<Config> {
        let ConnectionSettings {
            server,
            username,
            password,
        } = settings.connection;

        let server = server
            .filter(|s| !s.trim().is_empty())
            .ok_or(Error::MissingServer)?;
        let (hostname, port) = parse_server(&server)?;

        let username = username.filter(|u| !u.is_empty());
        let password = password.filter(|p| !p.is_empty());
        let (username, password) = match (username, password) {
            (Some(username), Some(password)) => (username, password),
            _ => return Err(Error::MissingCredentials),
        };

        Ok(Config {
            connection: Connection {
                hostname,
                port,
                username,
                password,
            },
            output: settings
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        })
    }
}

/// Split `host:port` into its parts. IPv6 literals may be bracketed, as in
/// `[::1]:993`.
pub fn parse_server(server: &str) -> Result<(String, u16)> {
    let invalid = || Error::InvalidServer(server.to_string());

    let (host, port) = server
        .trim()
        .rsplit_once(':')
        .ok_or_else(invalid)?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| invalid())?;

    Ok((host.to_string(), port))
}

/// Load the config file. An explicitly named file has to exist; the default
/// one is allowed to be missing.
pub fn get_config(file: Option<&Path>) -> Result<Settings> {
    let (path, required) = match file {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(Settings::default())
        }
        Err(source) => {
            return Err(Error::ConfigFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    toml::from_str(&s).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
