use anyhow::{anyhow, Context, Result};
use std::io::{self, Cursor, Read, Write};
use std::process;
use std::sync::{Arc, Mutex};

/// A fake IMAP connection. Reads come from a canned server transcript,
/// writes are kept so tests can check which commands went out.
#[derive(Debug)]
pub struct ScriptedStream {
    replies: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedStream {
    pub fn new(replies: &[&str]) -> (ScriptedStream, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = ScriptedStream {
            replies: Cursor::new(replies.concat().into_bytes()),
            sent: sent.clone(),
        };
        (stream, sent)
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.replies.read(buf)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent
            .lock()
            .unwrap()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything the client has sent so far, as text.
pub fn sent_commands(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&sent.lock().unwrap()).into_owned()
}

pub const LOGIN_OK: &str = "a1 OK LOGIN completed\r\n";

pub fn examine_ok(exists: u32) -> String {
    format!(
        "* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
         * {} EXISTS\r\n\
         * 0 RECENT\r\n\
         a2 OK [READ-ONLY] EXAMINE completed\r\n",
        exists
    )
}

/// An untagged FETCH response carrying an envelope with a single From
/// address. `name` and `subject` are written as IMAP quoted strings.
pub fn envelope_response(seq: u32, name: &str, mailbox: &str, host: &str, subject: &str) -> String {
    let address = format!("((\"{}\" NIL \"{}\" \"{}\"))", name, mailbox, host);
    format!(
        "* {} FETCH (ENVELOPE (\"Mon, 7 Feb 1994 21:52:25 -0800\" \"{}\" {} {} {} \
         ((NIL NIL \"me\" \"example.com\")) NIL NIL NIL \"<{}@example.com>\"))\r\n",
        seq, subject, address, address, address, seq
    )
}

/// Turn a finished process into its stderr, failing if it succeeded.
pub fn expect_failure(output: process::Output) -> Result<String> {
    if output
        .status
        .success()
    {
        return Err(anyhow!("expected the export to fail"));
    }

    String::from_utf8(output.stderr).context("Couldn't stringify stderr")
}
