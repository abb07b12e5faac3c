//! A module for building latency topologies from measurement records.

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use tracing::{debug, trace};

use crate::{
    edge::EdgeData,
    error::{Error, Result},
    graph::Graph,
};

/// The name given to graphs produced by the builder.
pub const DEFAULT_NAME: &str = "Network Topology";

/// A single latency measurement between two replicas, keyed by field name.
///
/// The builder reads the `src`, `dst`, `pull`, `push` and `sync` fields, anything else is ignored.
pub trait LatencyRecord {
    /// Returns the value of a field, `None` if the record doesn't have it.
    fn field(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> LatencyRecord for HashMap<String, String, S> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: BuildHasher> LatencyRecord for HashMap<&str, &str, S> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).copied()
    }
}

impl LatencyRecord for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl LatencyRecord for BTreeMap<&str, &str> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).copied()
    }
}

impl<R: LatencyRecord + ?Sized> LatencyRecord for &R {
    fn field(&self, name: &str) -> Option<&str> {
        (**self).field(name)
    }
}

/// Builds a directed graph from latency records.
///
/// Each record adds an edge from `src` to `dst` weighted by its `sync` latency, creating the
/// endpoints as needed. A later record for the same pair replaces the earlier edge.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use bandit::topology::TopologyBuilder;
///
/// let record: HashMap<&str, &str> = [
///     ("src", "A"),
///     ("dst", "B"),
///     ("pull", "1.0"),
///     ("push", "2.0"),
///     ("sync", "3.0"),
/// ]
/// .into_iter()
/// .collect();
///
/// let graph = TopologyBuilder::build([record]).unwrap();
///
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge("A", "B").unwrap().weight, 3.0);
/// ```
#[derive(Debug)]
pub struct TopologyBuilder {
    graph: Graph,
    records: usize,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyBuilder {
    /// Creates a builder for a graph named [`DEFAULT_NAME`].
    pub fn new() -> Self {
        Self {
            graph: Graph::with_name(DEFAULT_NAME),
            records: 0,
        }
    }

    /// Replaces the name of the graph being built.
    pub fn name(mut self, name: Option<String>) -> Self {
        self.graph.set_name(name);
        self
    }

    /// Builds a graph from a sequence of records, stopping at the first malformed one.
    pub fn build<I>(records: I) -> Result<Graph>
    where
        I: IntoIterator,
        I::Item: LatencyRecord,
    {
        let mut builder = Self::new();
        for record in records {
            builder.insert(&record)?;
        }

        Ok(builder.finish())
    }

    /// Adds the edge described by a record.
    ///
    /// Records are numbered from zero in the order they are inserted, including rejected ones, and
    /// errors refer to that number.
    pub fn insert(&mut self, record: &impl LatencyRecord) -> Result<()> {
        let index = self.records;
        self.records += 1;

        let src = required(record, index, "src")?;
        let dst = required(record, index, "dst")?;
        let pull = latency(record, index, "pull")?;
        let push = latency(record, index, "push")?;
        let sync = latency(record, index, "sync")?;

        trace!(record = index, src, dst, pull, push, sync, "inserting latency");

        self.graph
            .insert_edge(src, dst, EdgeData::from_latency(pull, push, sync));

        Ok(())
    }

    /// Returns the graph built so far.
    pub fn finish(self) -> Graph {
        debug!(
            records = self.records,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "built topology"
        );

        self.graph
    }
}

fn required<'a>(
    record: &'a impl LatencyRecord,
    index: usize,
    field: &'static str,
) -> Result<&'a str> {
    record.field(field).ok_or(Error::MalformedRecord {
        record: index,
        field,
    })
}

fn latency(record: &impl LatencyRecord, index: usize, field: &'static str) -> Result<f64> {
    let value = required(record, index, field)?;
    let invalid = |source| Error::NumericParse {
        record: index,
        field,
        value: value.to_owned(),
        source,
    };

    // `f64::from_str` accepts "inf" and "NaN", neither of which is a latency.
    let latency: f64 = value.trim().parse().map_err(|e| invalid(Some(e)))?;
    if !latency.is_finite() {
        return Err(invalid(None));
    }

    Ok(latency)
}
