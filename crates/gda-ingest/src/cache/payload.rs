//! Payload encodings stored in cache entries
//!
//! Two formats exist on disk, both gzip-compressed by the store:
//! - [`PayloadFormat::Tabular`]: a header line followed by tab-delimited rows
//! - [`PayloadFormat::Structured`]: pretty-printed JSON

use super::{CacheError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Tabular,
    Structured,
}

impl PayloadFormat {
    /// File extension, compression included
    pub fn extension(self) -> &'static str {
        match self {
            PayloadFormat::Tabular => "tsv.gz",
            PayloadFormat::Structured => "json.gz",
        }
    }

    /// Recognize a cache file name by its extension, returning the remainder
    pub(crate) fn split_file_name(name: &str) -> Option<(&str, Self)> {
        [PayloadFormat::Tabular, PayloadFormat::Structured]
            .into_iter()
            .find_map(|format| {
                name.strip_suffix(format.extension())
                    .and_then(|rest| rest.strip_suffix('.'))
                    .map(|rest| (rest, format))
            })
    }
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadFormat::Tabular => write!(f, "tabular"),
            PayloadFormat::Structured => write!(f, "structured"),
        }
    }
}

/// A value the memoizer knows how to persist
pub trait CachePayload: Sized {
    const FORMAT: PayloadFormat;

    /// Write the uncompressed representation
    fn encode<W: Write>(&self, writer: W) -> Result<()>;

    /// Read back what [`CachePayload::encode`] wrote
    fn decode<R: Read>(reader: R) -> Result<Self>;
}

/// Any serde value, cached as JSON
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize + DeserializeOwned> CachePayload for Json<T> {
    const FORMAT: PayloadFormat = PayloadFormat::Structured;

    fn encode<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.0)?;
        Ok(())
    }

    fn decode<R: Read>(reader: R) -> Result<Self> {
        Ok(Json(serde_json::from_reader(reader)?))
    }
}

/// Row-oriented string table with a fixed header
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the header
    pub fn push_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(CacheError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Write header and rows as tab-separated text
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }

        let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
        tsv.write_record(&self.columns)?;
        for row in &self.rows {
            tsv.write_record(row)?;
        }
        tsv.flush()?;
        Ok(())
    }

    /// Read a header line and rows from tab-separated text
    pub fn read_tsv<R: Read>(reader: R) -> Result<Self> {
        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = tsv.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in tsv.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self { columns, rows })
    }
}

impl CachePayload for Table {
    const FORMAT: PayloadFormat = PayloadFormat::Tabular;

    fn encode<W: Write>(&self, writer: W) -> Result<()> {
        self.write_tsv(writer)
    }

    fn decode<R: Read>(reader: R) -> Result<Self> {
        Self::read_tsv(reader)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn gene_table() -> Table {
        let mut table = Table::new(["gene_id", "gene_name", "notes"]);
        table.push_row(["HGNC:5", "A1BG", ""]).unwrap();
        table.push_row(["HGNC:37133", "A1BG-AS1", "has\ttab and \"quotes\""]).unwrap();
        table
    }

    #[test]
    fn test_table_tsv_round_trip() {
        let table = gene_table();
        let mut buf = Vec::new();
        table.encode(&mut buf).unwrap();

        let decoded = Table::decode(buf.as_slice()).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.get(1, "gene_name"), Some("A1BG-AS1"));
    }

    #[test]
    fn test_tsv_header_line() {
        let mut buf = Vec::new();
        gene_table().write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("gene_id\tgene_name\tnotes\n"));
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new(["a", "b"]);
        let err = table.push_row(["only-one"]).unwrap_err();
        assert!(matches!(err, CacheError::RowWidth { expected: 2, actual: 1, .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_table_round_trip() {
        let table = Table::default();
        let mut buf = Vec::new();
        table.encode(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(Table::decode(buf.as_slice()).unwrap(), table);
    }

    #[test]
    fn test_ragged_tsv_is_an_error() {
        let text = "a\tb\n1\t2\n3\n";
        assert!(Table::decode(text.as_bytes()).is_err());
    }

    #[test]
    fn test_json_payload_round_trip() {
        let mut value = BTreeMap::new();
        value.insert("MONDO:0000001".to_string(), vec!["OMIM:100100".to_string()]);
        let payload = Json(value.clone());

        let mut buf = Vec::new();
        payload.encode(&mut buf).unwrap();
        let decoded: Json<BTreeMap<String, Vec<String>>> = Json::decode(buf.as_slice()).unwrap();
        assert_eq!(decoded.into_inner(), value);
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(
            PayloadFormat::split_file_name("hgnc_table.0123456789.tsv.gz"),
            Some(("hgnc_table.0123456789", PayloadFormat::Tabular))
        );
        assert_eq!(
            PayloadFormat::split_file_name("x.abcdefabcd.json.gz"),
            Some(("x.abcdefabcd", PayloadFormat::Structured))
        );
        assert_eq!(PayloadFormat::split_file_name("notes.txt"), None);
    }
}
