//! Reading latency measurements from CSV.
//!
//! The CSV must have a header row naming at least the `src`, `dst`, `pull`, `push` and `sync`
//! columns, in any order. Rows shorter than the header are accepted so that a missing value is
//! reported as a [`MalformedRecord`](crate::error::Error::MalformedRecord) for the field.

use std::{fs::File, io::Read, path::Path};

use csv::{ErrorKind, ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::{
    error::{Error, Result},
    graph::Graph,
    topology::{LatencyRecord, TopologyBuilder},
};

/// A CSV row viewed through its header.
#[derive(Clone, Copy, Debug)]
pub struct CsvRecord<'a> {
    headers: &'a StringRecord,
    row: &'a StringRecord,
}

impl<'a> CsvRecord<'a> {
    pub fn new(headers: &'a StringRecord, row: &'a StringRecord) -> Self {
        Self { headers, row }
    }
}

impl LatencyRecord for CsvRecord<'_> {
    fn field(&self, name: &str) -> Option<&str> {
        let index = self.headers.iter().position(|header| header == name)?;

        self.row.get(index)
    }
}

/// Builds a topology from latency CSV read from `reader`.
///
/// # Examples
///
/// ```
/// let csv = "src,dst,pull,push,sync\nA,B,1.0,2.0,3.0\nB,C,0.5,0.5,1.5\n";
/// let graph = bandit::latency::from_reader(csv.as_bytes()).unwrap();
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge("B", "C").unwrap().sync, 1.5);
/// ```
pub fn from_reader<R: Read>(reader: R) -> Result<Graph> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut builder = TopologyBuilder::new();
    let mut row = StringRecord::new();

    while reader.read_record(&mut row)? {
        builder.insert(&CsvRecord::new(&headers, &row))?;
    }

    Ok(builder.finish())
}

/// Builds a topology from the latency CSV file at `path`.
pub fn from_path(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path.to_path_buf(), e))?;

    debug!(path = %path.display(), "reading latency");

    // Failures reading the file past opening it surface from the CSV reader.
    from_reader(file).map_err(|e| match e {
        Error::Csv(e) if e.is_io_error() => match e.into_kind() {
            ErrorKind::Io(source) => Error::io(path.to_path_buf(), source),
            _ => unreachable!("csv error checked to be an I/O error"),
        },
        e => e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_record() {
        let headers = StringRecord::from(vec!["dst", "src"]);
        let row = StringRecord::from(vec!["B"]);
        let record = CsvRecord::new(&headers, &row);

        assert_eq!(record.field("dst"), Some("B"));
        assert_eq!(record.field("src"), None);
        assert_eq!(record.field("sync"), None);
    }

    #[test]
    fn columns_in_any_order() {
        let csv = "sync,push,pull,dst,src,region\n3.0,2.0,1.0,B,A,us-east-1\n";
        let graph = from_reader(csv.as_bytes()).unwrap();

        let data = graph.edge("A", "B").unwrap();
        assert_eq!((data.pull, data.push, data.sync), (1.0, 2.0, 3.0));
    }

    #[test]
    fn header_only() {
        let graph = from_reader("src,dst,pull,push,sync\n".as_bytes()).unwrap();

        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn missing_column() {
        let csv = "src,dst,pull,push\nA,B,1.0,2.0\n";

        assert!(matches!(
            from_reader(csv.as_bytes()),
            Err(Error::MalformedRecord {
                record: 0,
                field: "sync"
            })
        ));
    }

    #[test]
    fn short_row() {
        let csv = "src,dst,pull,push,sync\nA,B,1.0,2.0,3.0\nB,C,1.0\n";

        assert!(matches!(
            from_reader(csv.as_bytes()),
            Err(Error::MalformedRecord {
                record: 1,
                field: "push"
            })
        ));
    }

    #[test]
    fn non_numeric_value() {
        let csv = "src,dst,pull,push,sync\nA,B,1.0,2.0,n/a\n";

        assert!(matches!(
            from_reader(csv.as_bytes()),
            Err(Error::NumericParse { field: "sync", .. })
        ));
    }

    #[test]
    fn missing_file() {
        let err = from_path("/nonexistent/latency.csv").unwrap_err();

        assert!(matches!(err, Error::Io { path: Some(_), .. }));
    }

    #[test]
    fn read_failure_carries_path() {
        // Opening a directory succeeds, reading from it doesn't.
        let dir = tempfile::TempDir::new().unwrap();

        match from_path(dir.path()) {
            Err(Error::Io { path, .. }) => assert_eq!(path.as_deref(), Some(dir.path())),
            other => panic!("expected I/O error, got {other:?}"),
        }
    }
}
