use crate::email::Record;
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const HEADER: [&str; 3] = ["Name", "Email", "Subject"];

/// Write the header and one row per record to `path`, replacing whatever
/// was there.
pub fn write_csv(records: &[Record], path: &Path) -> Result<()> {
    let to_error = |source: io::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, records).map_err(to_error)?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .and_then(|file| file.sync_all())
        .map_err(to_error)
}

pub fn write_records<W: Write>(writer: &mut W, records: &[Record]) -> io::Result<()> {
    write_row(writer, &HEADER)?;
    for record in records {
        write_row(writer, &record.fields())?;
    }
    writer.flush()
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(escape(field).as_bytes())?;
    }
    writer.write_all(b"\n")
}

// RFC 4180, plus quoting leading whitespace so it survives a round trip.
fn escape(field: &str) -> Cow<str> {
    let needs_quotes = field == r"\."
        || field.contains(|c: char| matches!(c, ',' | '"' | '\r' | '\n'))
        || field.starts_with(char::is_whitespace);

    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(name: &str, email: &str, subject: &str) -> Record {
        Record {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_write_csv() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test_emails.csv");
        let records = vec![
            record("Alice Smith", "alice@example.com", "Hello from Alice"),
            record("Bob Jones", "bob@example.com", "Meeting Update"),
        ];

        write_csv(&records, &path)?;

        let contents = fs::read_to_string(&path)?;
        assert_eq!(
            contents.lines().collect::<Vec<_>>(),
            vec![
                "Name,Email,Subject",
                "Alice Smith,alice@example.com,Hello from Alice",
                "Bob Jones,bob@example.com,Meeting Update",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_header_only() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.csv");

        write_csv(&[], &path)?;

        assert_eq!(fs::read_to_string(&path)?, "Name,Email,Subject\n");
        Ok(())
    }

    #[test]
    fn test_overwrites_existing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("emails.csv");
        fs::write(&path, "stale\nstale\nstale\nstale\n")?;

        write_csv(&[record("A", "a@b", "c")], &path)?;

        assert_eq!(fs::read_to_string(&path)?, "Name,Email,Subject\nA,a@b,c\n");
        Ok(())
    }

    #[test]
    fn test_unwritable_path() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("no-such-dir").join("emails.csv");

        let err = write_csv(&[], &path).unwrap_err();

        assert!(matches!(err, Error::Csv { .. }));
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_quoting() -> anyhow::Result<()> {
        let mut out = Vec::new();
        write_records(
            &mut out,
            &[
                record("Jones, Bob", "bob@example.com", "Re: \"Q3\" numbers"),
                record("", "@", " leading space"),
                record("Multi", "m@example.com", "line\nsubject"),
            ],
        )?;

        assert_eq!(
            String::from_utf8(out)?,
            "Name,Email,Subject\n\
             \"Jones, Bob\",bob@example.com,\"Re: \"\"Q3\"\" numbers\"\n\
             ,@,\" leading space\"\n\
             Multi,m@example.com,\"line\nsubject\"\n"
        );
        Ok(())
    }
}
