use std::fmt;

/// An owned copy of the parts of an IMAP envelope we care about. The
/// borrowed envelope from the fetch response can't leave the fetch thread,
/// this can.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub from: Vec<Address>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub name: Option<String>,
    pub mailbox: Option<String>,
    pub host: Option<String>,
}

impl Address {
    /// `mailbox@host`, with missing parts left empty.
    pub fn email(&self) -> String {
        format!(
            "{}@{}",
            self.mailbox.as_deref().unwrap_or(""),
            self.host.as_deref().unwrap_or("")
        )
    }
}

impl Envelope {
    /// Returns `None` if the server didn't send an envelope for this message.
    pub fn from_fetch(fetch: &imap::types::Fetch) -> Option<Envelope> {
        let envelope = fetch.envelope()?;

        let from = envelope
            .from
            .iter()
            .flatten()
            .map(|address| Address {
                name: address.name.as_deref().map(decode_header_value),
                mailbox: address.mailbox.as_deref().map(lossy),
                host: address.host.as_deref().map(lossy),
            })
            .collect();

        Some(Envelope {
            from,
            subject: envelope.subject.as_deref().map(decode_header_value),
        })
    }
}

/// One row of the export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub email: String,
    pub subject: String,
}

impl Record {
    /// Only the first sender counts. Anything missing comes out as an empty
    /// string rather than an error.
    pub fn from_envelope(envelope: Option<&Envelope>) -> Record {
        let envelope = match envelope {
            Some(envelope) => envelope,
            None => return Record::default(),
        };

        match envelope.from.first() {
            Some(sender) => Record {
                name: sender.name.clone().unwrap_or_default(),
                email: sender.email(),
                subject: envelope.subject.clone().unwrap_or_default(),
            },
            None => Record::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.subject.is_empty()
    }

    pub fn fields(&self) -> [&str; 3] {
        [&self.name, &self.email, &self.subject]
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "From: {} <{}>\nSubject: {}",
            self.name, self.email, self.subject
        )
    }
}

fn lossy(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Subjects and display names can contain RFC 2047 encoded words
/// (`=?UTF-8?B?...?=`). Only those tokens are decoded; the text around them
/// is taken as UTF-8, and whitespace between two adjacent encoded words is
/// dropped.
fn decode_header_value(raw: &[u8]) -> String {
    let mut decoded = String::new();
    let mut rest = raw;
    let mut after_word = false;

    while let Some(start) = rest.windows(2).position(|w| w == b"=?") {
        let (between, candidate) = rest.split_at(start);
        match encoded_word_len(candidate) {
            Some(len) => {
                if !(after_word && between.iter().all(u8::is_ascii_whitespace)) {
                    decoded.push_str(&lossy(between));
                }
                decoded.push_str(&decode_encoded_word(&candidate[..len]));
                rest = &candidate[len..];
                after_word = true;
            }
            None => {
                decoded.push_str(&lossy(&rest[..start + 2]));
                rest = &rest[start + 2..];
                after_word = false;
            }
        }
    }

    decoded.push_str(&lossy(rest));
    decoded
}

/// Length of the `=?charset?encoding?text?=` token at the start of `s`, if
/// there is one.
fn encoded_word_len(s: &[u8]) -> Option<usize> {
    let mut question_marks = 0;
    for (i, &b) in s.iter().enumerate().skip(2) {
        if b.is_ascii_whitespace() {
            return None;
        }
        if b == b'?' {
            question_marks += 1;
            if question_marks >= 3 && s.get(i + 1) == Some(&b'=') {
                return Some(i + 2);
            }
        }
    }
    None
}

// The token is plain ASCII, so mailparse's Latin-1 reading of undecoded
// bytes can't mangle anything here.
fn decode_encoded_word(token: &[u8]) -> String {
    let mut header = b"X: ".to_vec();
    header.extend_from_slice(token);
    match mailparse::parse_header(&header) {
        Ok((header, _)) => header.get_value(),
        Err(_) => lossy(token),
    }
}
