use crate::email::Envelope;
use crate::error::{Error, Result};
use imap::Session;
use log::debug;
use std::fmt;
use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

/// How many envelopes the fetch thread may get ahead of the consumer.
pub const CHANNEL_CAPACITY: usize = 10;

/// Message sequence numbers `first:last`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceRange {
    pub first: u32,
    pub last: u32,
}

impl SequenceRange {
    /// Every message in a mailbox holding `count` messages, or `None` if it's
    /// empty.
    pub fn up_to(count: u32) -> Option<SequenceRange> {
        if count == 0 {
            None
        } else {
            Some(SequenceRange {
                first: 1,
                last: count,
            })
        }
    }
}

impl fmt::Display for SequenceRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

/// Envelopes produced by a background thread, one at a time.
///
/// Iterate to receive them. Once the iterator runs dry the producer is
/// done, and [`EnvelopeStream::finish`] hands back whatever it returned. If
/// the consumer stops early, `finish` drains the rest first so the producer
/// never stays blocked on a full channel.
pub struct EnvelopeStream<S> {
    envelopes: Receiver<Option<Envelope>>,
    done: Receiver<Result<S>>,
}

impl<S: Send + 'static> EnvelopeStream<S> {
    pub fn spawn<F>(producer: F) -> Result<EnvelopeStream<S>>
    where
        F: FnOnce(&SyncSender<Option<Envelope>>) -> Result<S> + Send + 'static,
    {
        let (tx, envelopes) = mpsc::sync_channel(CHANNEL_CAPACITY);
        let (done_tx, done) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name("envelope fetch".to_string())
            .spawn(move || {
                let outcome = producer(&tx);
                // Close the envelope channel before reporting, so the
                // consumer sees the end of the stream first.
                drop(tx);
                // Nobody left to tell if the receiver is gone.
                let _ = done_tx.send(outcome);
            })
            .map_err(Error::Spawn)?;

        Ok(EnvelopeStream { envelopes, done })
    }
}

impl<S> EnvelopeStream<S> {
    /// Drain anything left on the channel, then read the producer's result.
    pub fn finish(self) -> Result<S> {
        let skipped = self.envelopes.iter().count();
        if skipped > 0 {
            debug!("discarded {} unread envelopes", skipped);
        }

        self.done
            .recv()
            .map_err(|_| Error::ProducerLost)?
    }
}

impl<S> Iterator for EnvelopeStream<S> {
    type Item = Option<Envelope>;

    fn next(&mut self) -> Option<Self::Item> {
        self.envelopes.recv().ok()
    }
}

/// Run `FETCH <range> ENVELOPE` on a background thread that owns the
/// session. The session comes back out of [`EnvelopeStream::finish`].
///
/// The `imap` crate reads the whole FETCH response into memory before any
/// envelope can be sent, so the channel only paces delivery to the consumer.
/// It does not bound memory use.
pub fn stream_envelopes<T>(
    mut session: Session<T>,
    range: SequenceRange,
) -> Result<EnvelopeStream<Session<T>>>
where
    T: Read + Write + Send + 'static,
{
    EnvelopeStream::spawn(move |tx| {
        fetch_envelopes(&mut session, range, tx)?;
        Ok(session)
    })
}

fn fetch_envelopes<T: Read + Write>(
    session: &mut Session<T>,
    range: SequenceRange,
    tx: &SyncSender<Option<Envelope>>,
) -> Result<()> {
    debug!("FETCH {} ENVELOPE", range);
    let fetches = session
        .fetch(range.to_string(), "ENVELOPE")
        .map_err(Error::protocol("FETCH"))?;

    for fetch in fetches.iter() {
        if tx.send(Envelope::from_fetch(fetch)).is_err() {
            break;
        }
    }

    Ok(())
}
