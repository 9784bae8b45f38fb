//! # A reader for ADIF log files
//!
//! <https://adif.org/315/ADIF_315.htm#ADI_File_Format>

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use chumsky::prelude::*;
use encoding_rs::Encoding;
use tracing::instrument;

use crate::error::{Error, Result};

/// A single QSO record, field names upper-cased
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_uppercase(), value.into());
    }

    pub fn call(&self) -> Option<&str> {
        self.get("CALL")
    }

    pub fn band(&self) -> Option<&str> {
        self.get("BAND")
    }

    /// Frequency in MHz
    pub fn freq(&self) -> Option<f64> {
        self.get("FREQ").and_then(|f| f.trim().parse().ok())
    }

    pub fn dxcc(&self) -> Option<&str> {
        self.get("DXCC")
    }

    pub fn country(&self) -> Option<&str> {
        self.get("COUNTRY")
    }

    pub fn country_intl(&self) -> Option<&str> {
        self.get("COUNTRY_INTL")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// `<NAME:LEN:TYPE>` with length and type optional
#[derive(Debug, PartialEq, Eq)]
struct FieldTag {
    name: String,
    len: Option<usize>,
}

fn tag_parser() -> impl Parser<char, FieldTag, Error = Simple<char>> {
    let name = filter(|c: &char| c.is_ascii_graphic() && *c != ':' && *c != '<' && *c != '>')
        .repeated()
        .at_least(1)
        .labelled("Field name")
        .collect::<String>();

    let len = text::digits(10)
        .labelled("Field length")
        .try_map(|s: String, span| {
            s.parse::<usize>()
                .map_err(|e| Simple::custom(span, format!("{e}")))
        });

    let data_type = filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .labelled("Data type");

    name.then(
        just(':')
            .ignore_then(len)
            .then_ignore(just(':').then(data_type).or_not())
            .or_not(),
    )
    .padded()
    .then_ignore(end())
    .map(|(name, len)| FieldTag { name, len })
}

/// Parse the text of an ADIF file into its records.
///
/// A header is present whenever the text does not start with `<`, it ends
/// with `<EOH>`. Field lengths count characters, not bytes. Application
/// defined `APP_` tags without a length, like LoTW's `<APP_LoTW_EOF>`, are
/// skipped.
#[instrument(skip(s))]
pub fn parse(s: &str) -> Result<Vec<Record>> {
    let ts = Instant::now();
    let tag = tag_parser();

    let mut records = Vec::new();
    let mut record = Record::default();
    let mut in_header = !s.trim_start().starts_with('<');
    let mut pos = 0;

    while let Some(open) = s[pos..].find('<').map(|i| pos + i) {
        let Some(close) = s[open..].find('>').map(|i| open + i) else {
            return Err(Error::Adif {
                offset: open,
                reason: "unterminated field tag".to_owned(),
            });
        };

        let tag_text = &s[open + 1..close];
        let field = tag.parse(tag_text).map_err(|errs| {
            tracing::error!("Bad field tag {tag_text:?}: {:?}", errs);
            Error::Adif {
                offset: open,
                reason: format!("malformed field tag <{tag_text}>"),
            }
        })?;
        pos = close + 1;

        match (field.name.to_ascii_uppercase().as_str(), field.len) {
            ("EOH", _) => {
                in_header = false;
                record = Record::default();
            }
            ("EOR", _) => {
                if !record.is_empty() {
                    records.push(std::mem::take(&mut record));
                }
            }
            (name, Some(len)) => {
                let end = s[pos..]
                    .char_indices()
                    .map(|(i, _)| pos + i)
                    .chain(std::iter::once(s.len()))
                    .nth(len)
                    .ok_or_else(|| Error::Adif {
                        offset: pos,
                        reason: format!("value of {name} runs past the end of the file"),
                    })?;
                if !in_header {
                    record.insert(name, &s[pos..end]);
                }
                pos = end;
            }
            (name, None) if name.starts_with("APP_") => {
                tracing::warn!("Ignoring application field {name} without a length.");
            }
            (name, None) => {
                return Err(Error::Adif {
                    offset: open,
                    reason: format!("field {name} has no length"),
                });
            }
        }
    }

    if !record.is_empty() {
        tracing::warn!("Ignoring {} fields after the last <EOR>.", record.len());
    }

    tracing::debug!(
        elapsed_ms = ts.elapsed().as_millis(),
        "Parsed {} ADIF records.",
        records.len()
    );
    Ok(records)
}

/// Read and parse an ADIF file in the given character encoding.
///
/// `encoding` is any WHATWG encoding label, e.g. `utf-8` or `latin1`.
#[instrument(fields(path = %path.as_ref().to_string_lossy()))]
pub fn read_path<P: AsRef<Path>>(path: P, encoding: &str) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let encoding = Encoding::for_label(encoding.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(encoding.to_owned()))?;
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, actual, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(
            "{} contains invalid {} sequences, replaced them.",
            path.display(),
            actual.name()
        );
    }
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "ADIF export from a logger
<ADIF_VER:5>3.1.4
<PROGRAMID:6>WSJT-X
<EOH>
<call:6>OE3RSU <gridsquare:4>JN88 <mode:3>FT8 <band:3>40m <freq:8>7.075813 <eor>
<CALL:5>DL1AB <BAND:3>20M <DXCC:3>230 <COUNTRY:20>Fed. Rep. of Germany <EOR>
<CALL:6>K1ABC/ <FREQ:6>14.074 <NAME:4:S>Jörg <EOR>
";

    #[test]
    fn test_tag_parser() {
        let tag = tag_parser();
        assert_eq!(
            tag.parse("CALL:6").unwrap(),
            FieldTag {
                name: "CALL".into(),
                len: Some(6)
            }
        );
        assert_eq!(tag.parse("name:4:S").unwrap().len, Some(4));
        assert_eq!(tag.parse("eor").unwrap().len, None);
        assert!(tag.parse("CALL:x").is_err());
        assert!(tag.parse("").is_err());
    }

    #[test]
    fn test_parse() {
        let records = parse(LOG).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.call(), Some("OE3RSU"));
        assert_eq!(first.band(), Some("40m"));
        assert_eq!(first.get("Mode"), Some("FT8"));
        assert_eq!(first.freq(), Some(7.075813));
        assert_eq!(first.get("PROGRAMID"), None);

        let second = &records[1];
        assert_eq!(second.dxcc(), Some("230"));
        assert_eq!(second.country(), Some("Fed. Rep. of Germany"));
        assert_eq!(second.country_intl(), None);

        let third = &records[2];
        assert_eq!(third.band(), None);
        assert_eq!(third.get("NAME"), Some("Jörg"));
    }

    #[test]
    fn no_header() {
        let records = parse("<CALL:4>W1AW<BAND:3>80m<EOR>").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].call(), Some("W1AW"));
    }

    #[test]
    fn value_past_end_is_an_error() {
        let err = parse("<CALL:10>W1AW").unwrap_err();
        assert!(matches!(err, Error::Adif { offset: 9, .. }), "{err}");
    }

    #[test]
    fn field_without_length_is_an_error() {
        let err = parse("<CALL>W1AW<EOR>").unwrap_err();
        assert!(matches!(err, Error::Adif { offset: 0, .. }), "{err}");
    }

    #[test]
    fn application_tag_without_length_is_skipped() {
        let records = parse("<CALL:4>W1AW<BAND:3>20m<EOR>\n<APP_LoTW_EOF>").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].call(), Some("W1AW"));

        let records = parse("<CALL:4>W1AW<app_x_flag><BAND:3>20m<EOR>").unwrap();
        assert_eq!(records[0].band(), Some("20m"));
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn read_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.adi");
        let mut bytes = b"<CALL:5>OE1AB<NAME:4>J".to_vec();
        bytes.push(0xf6); // ö
        bytes.extend_from_slice(b"rg<EOR>");
        std::fs::write(&path, bytes).unwrap();

        let records = read_path(&path, "latin1").unwrap();
        assert_eq!(records[0].get("NAME"), Some("Jörg"));

        assert!(matches!(
            read_path(&path, "no-such-charset"),
            Err(Error::UnknownEncoding(_))
        ));
    }
}
