//! Serialization of graphs to and from interchange formats.
//!
//! Every call names its [`Format`] explicitly, the format is never inferred from a file's extension
//! or content. Each format is a [`Codec`] implementation and [`Format`] dispatches to it:
//!
//! ```rust
//! use bandit::codec::Format;
//! use bandit::edge::EdgeData;
//! use bandit::graph::Graph;
//!
//! let mut graph = Graph::new();
//! graph.insert_edge("A", "B", EdgeData::from_latency(1.0, 2.0, 3.0));
//!
//! let mut buf = Vec::new();
//! Format::GraphMl.encode(&graph, &mut buf).unwrap();
//!
//! assert_eq!(Format::GraphMl.decode(buf.as_slice()).unwrap(), graph);
//! ```

use std::{
    fmt,
    fs,
    io::{Read, Write},
    path::Path,
    str::FromStr,
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    graph::Graph,
};

pub mod graphml;
pub mod json;

pub use graphml::GraphMlCodec;
pub use json::JsonCodec;

/// A serialization format for graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Node-link JSON.
    Json,
    /// GraphML markup.
    GraphMl,
}

impl Format {
    /// All the supported formats.
    pub const ALL: [Format; 2] = [Format::Json, Format::GraphMl];

    /// Returns the name the format is selected by.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::GraphMl => "graphml",
        }
    }

    /// Writes the graph to `writer` in this format.
    pub fn encode<W: Write>(&self, graph: &Graph, writer: W) -> Result<()> {
        match self {
            Format::Json => JsonCodec.encode(graph, writer),
            Format::GraphMl => GraphMlCodec.encode(graph, writer),
        }
    }

    /// Reads a graph in this format from `reader`.
    pub fn decode<R: Read>(&self, reader: R) -> Result<Graph> {
        match self {
            Format::Json => JsonCodec.decode(reader),
            Format::GraphMl => GraphMlCodec.decode(reader),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Parses a format name.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::codec::Format;
    /// use bandit::error::Error;
    ///
    /// assert_eq!("graphml".parse::<Format>().unwrap(), Format::GraphMl);
    /// assert!(matches!("yaml".parse::<Format>(), Err(Error::UnsupportedFormat(_))));
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        Format::ALL
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| Error::UnsupportedFormat(s.to_owned()))
    }
}

/// Encoding and decoding of a graph in a single format.
pub trait Codec {
    /// The format this codec implements.
    const FORMAT: Format;

    /// Writes the whole graph to `writer`.
    fn encode<W: Write>(&self, graph: &Graph, writer: W) -> Result<()>;

    /// Reads a whole graph from `reader`, failing without a partial result if the content is
    /// invalid.
    fn decode<R: Read>(&self, reader: R) -> Result<Graph>;
}

/// Writes the graph to the file at `path`, creating or truncating it.
///
/// The graph is encoded in memory first: when encoding fails the file is left untouched.
pub fn write_graph(graph: &Graph, path: impl AsRef<Path>, format: Format) -> Result<()> {
    let path = path.as_ref();

    let mut buf = Vec::new();
    format.encode(graph, &mut buf)?;
    fs::write(path, &buf).map_err(|e| Error::io(path.to_path_buf(), e))?;

    debug!(
        %format,
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        bytes = buf.len(),
        "wrote graph"
    );

    Ok(())
}

/// Reads a graph from the file at `path`.
pub fn read_graph(path: impl AsRef<Path>, format: Format) -> Result<Graph> {
    let path = path.as_ref();

    let buf = fs::read(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
    let graph = format.decode(buf.as_slice())?;

    debug!(
        %format,
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "read graph"
    );

    Ok(graph)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads the reader to the end, mapping failures to stream I/O errors.
///
/// A leading UTF-8 byte order mark is dropped.
fn read_all<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|e| Error::io(None, e))?;

    if buf.starts_with(UTF8_BOM) {
        buf.drain(..UTF8_BOM.len());
    }

    Ok(buf)
}
