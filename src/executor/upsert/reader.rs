//! Newline-delimited JSON record reader
//!
//! Yields one record per non-blank line. A line that is not valid UTF-8, not
//! valid JSON, or not a JSON object is reported as a per-record
//! [`ParseError::InvalidRecord`]; only I/O failures on the input end the read.

use std::path::Path;

use mongodb::bson::Document;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::{ParseError, Result};
use crate::formatter::ExtendedJsonConverter;

/// A parsed input line: its 1-based line number and the record or parse error
pub type RecordLine = (usize, Result<Document>);

pub struct RecordReader<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
    converter: ExtendedJsonConverter,
}

impl RecordReader<BufReader<File>> {
    /// Open a newline-delimited JSON file
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
            converter: ExtendedJsonConverter::new(),
        }
    }

    /// Read the next non-blank line
    ///
    /// # Returns
    /// * `Result<Option<RecordLine>>` - `None` at end of input; the outer
    ///   error is an I/O failure, the inner one a malformed line
    pub async fn next_record(&mut self) -> Result<Option<RecordLine>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_until(b'\n', &mut self.buf).await?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let parsed = match std::str::from_utf8(&self.buf) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => self.parse_line(text),
                Err(e) => Err(self.invalid(format!("invalid UTF-8: {e}"))),
            };

            return Ok(Some((self.line_no, parsed)));
        }
    }

    fn parse_line(&self, text: &str) -> Result<Document> {
        let value: serde_json::Value =
            serde_json::from_str(text.trim()).map_err(|e| self.invalid(e.to_string()))?;

        if !value.is_object() {
            return Err(self.invalid("expected a JSON object".to_string()));
        }

        self.converter
            .parse_document(value)
            .ok_or_else(|| self.invalid("invalid extended JSON value".to_string()))
    }

    fn invalid(&self, message: String) -> crate::error::DbUtilsError {
        ParseError::InvalidRecord {
            line: self.line_no,
            message,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};

    async fn collect(input: &[u8]) -> Vec<RecordLine> {
        let mut reader = RecordReader::new(input);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_record().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_reads_one_record_per_line() {
        let lines = collect(b"{\"_id\":1,\"v\":\"a\"}\n{\"_id\":2,\"v\":\"b\"}\n").await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 1);
        assert_eq!(*lines[0].1.as_ref().unwrap(), doc! { "_id": 1, "v": "a" });
        assert_eq!(*lines[1].1.as_ref().unwrap(), doc! { "_id": 2, "v": "b" });
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped_but_counted() {
        let lines = collect(b"\n  \n{\"a\":1}\r\n\n{\"a\":2}").await;
        let numbers: Vec<usize> = lines.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![3, 5]);
        assert!(lines.iter().all(|(_, r)| r.is_ok()));
    }

    #[tokio::test]
    async fn test_malformed_lines_are_per_record_errors() {
        let lines = collect(b"{\"a\":1}\n{not json\n[1,2]\n{\"a\":2}\n").await;
        assert_eq!(lines.len(), 4);
        assert!(lines[0].1.is_ok());
        assert!(lines[1].1.as_ref().unwrap_err().to_string().contains("line 2"));
        assert!(lines[2].1.as_ref().unwrap_err().to_string().contains("JSON object"));
        assert!(lines[3].1.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_per_record_error() {
        let lines = collect(b"\xff\xfe\n{\"a\":1}\n").await;
        assert!(lines[0].1.is_err());
        assert!(lines[1].1.is_ok());
    }

    #[tokio::test]
    async fn test_extended_json_types_are_decoded() {
        let lines = collect(b"{\"_id\":{\"$oid\":\"65a1b2c3d4e5f60718293a4b\"}}\n").await;
        let record = lines[0].1.as_ref().unwrap();
        assert_eq!(
            record.get_object_id("_id").unwrap(),
            ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap()
        );
    }
}
