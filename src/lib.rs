use config::MAILBOX;
use email::Record;
use fetch::SequenceRange;
use log::{debug, info, warn};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub mod args;
pub mod config;
pub mod csv;
pub mod email;
pub mod error;
pub mod fetch;

pub use error::{Error, Result};

// Known server replies to a bad password. Outlook in particular answers
// this way when the account needs an app password.
const LOGIN_REJECTED: [&str; 2] = ["LOGIN failed", "authentication failed"];

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Messages that came back from the fetch.
    pub fetched: usize,
    /// Rows written, not counting the header. `None` if the mailbox was
    /// empty and no file was written.
    pub written: Option<usize>,
    pub output: PathBuf,
}

/// Connect, export, log out.
pub fn run(config: &config::Config) -> Result<Summary> {
    let session = login(&config.connection)?;
    export(session, &config.output, &mut io::stdout())
}

pub fn login(
    connection: &config::Connection,
) -> Result<imap::Session<impl Read + Write + Send + 'static>> {
    info!("Connecting to server...");
    let client = imap::ClientBuilder::new(connection.hostname.as_str(), connection.port)
        .native_tls()
        .map_err(|source| Error::Connect {
            server: connection.address(),
            source,
        })?;

    let session = authenticate(client, &connection.username, &connection.password)?;
    info!("Logged in");
    Ok(session)
}

pub fn authenticate<T: Read + Write>(
    client: imap::Client<T>,
    username: &str,
    password: &str,
) -> Result<imap::Session<T>> {
    client
        .login(username, password)
        .map_err(|(source, _client)| login_failure(source))
}

fn login_failure(source: imap::Error) -> Error {
    if !matches!(source, imap::Error::No(_)) {
        return Error::Protocol {
            command: "LOGIN",
            source,
        };
    }

    // The server's text isn't always part of the Display output.
    let text = format!("{:?}", source);
    let reason = if LOGIN_REJECTED
        .iter()
        .any(|known| text.contains(known))
    {
        "invalid username or password (check if app password is needed)".to_string()
    } else {
        "the server rejected the credentials".to_string()
    };

    Error::Auth { reason, source }
}

/// Read-only select INBOX, fetch every envelope, print each sender and
/// subject to `console` and write the non-empty ones to `output`.
///
/// The session is logged out before returning, whether or not there was
/// anything to export. An empty mailbox leaves `output` untouched.
pub fn export<T, W>(mut session: imap::Session<T>, output: &Path, console: &mut W) -> Result<Summary>
where
    T: Read + Write + Send + 'static,
    W: Write,
{
    let mailbox = session
        .examine(MAILBOX)
        .map_err(Error::protocol("EXAMINE"))?;
    debug!("{} holds {} messages", MAILBOX, mailbox.exists);

    let range = match SequenceRange::up_to(mailbox.exists) {
        Some(range) => range,
        None => {
            info!("No messages in {}", MAILBOX);
            logout(session);
            return Ok(Summary {
                fetched: 0,
                written: None,
                output: output.to_path_buf(),
            });
        }
    };

    let mut stream = fetch::stream_envelopes(session, range)?;
    let mut records = Vec::new();
    let mut fetched = 0;
    for envelope in &mut stream {
        fetched += 1;
        let record = Record::from_envelope(envelope.as_ref());
        writeln!(console, "{}\n", record)?;
        if !record.is_empty() {
            records.push(record);
        }
    }
    // Only now is the fetch result known.
    let session = stream.finish()?;

    csv::write_csv(&records, output)?;
    info!("Done. Output written to {}", output.display());

    logout(session);
    Ok(Summary {
        fetched,
        written: Some(records.len()),
        output: output.to_path_buf(),
    })
}

// A failed LOGOUT doesn't change the outcome of the run.
fn logout<T: Read + Write>(mut session: imap::Session<T>) {
    if let Err(e) = session.logout() {
        warn!("LOGOUT failed: {}", e);
    }
}
