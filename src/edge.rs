//! A module for working with edges.

use crate::attribute::{Attributes, Value};

/// A pair of vertices representing a directed graph edge, from `source` to `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge<T> {
    source: T,
    target: T,
}

impl<T> Edge<T> {
    /// Creates a new edge from two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    /// assert_ne!(edge, Edge::new("b", "a"));
    /// ```
    pub fn new(source: T, target: T) -> Self {
        Self { source, target }
    }

    /// Returns the vertex the edge starts from.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    /// assert_eq!(edge.source(), &"a");
    /// ```
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Returns the vertex the edge points to.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::edge::Edge;
    ///
    /// let edge = Edge::new("a", "b");
    /// assert_eq!(edge.target(), &"b");
    /// ```
    pub fn target(&self) -> &T {
        &self.target
    }
}

/// The attributes carried by an edge of a latency topology.
///
/// `weight`, `pull`, `push` and `sync` are always present; anything else (drawing hints such as
/// `color` or `size`) lives in `attributes`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeData {
    pub weight: f64,
    pub pull: f64,
    pub push: f64,
    pub sync: f64,
    pub attributes: Attributes,
}

impl EdgeData {
    /// Names of the attributes stored as dedicated fields rather than in `attributes`.
    pub const REQUIRED: [&'static str; 4] = ["weight", "pull", "push", "sync"];

    /// Creates edge data from latency measurements, weighting the edge by its `sync` latency.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::edge::EdgeData;
    ///
    /// let data = EdgeData::from_latency(1.0, 2.0, 3.0);
    /// assert_eq!(data.weight, data.sync);
    /// ```
    pub fn from_latency(pull: f64, push: f64, sync: f64) -> Self {
        Self {
            weight: sync,
            pull,
            push,
            sync,
            attributes: Attributes::new(),
        }
    }

    /// Sets an extra attribute, returning the data for chaining.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the named attribute, including the required latency fields.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "weight" => Some(Value::Float(self.weight)),
            "pull" => Some(Value::Float(self.pull)),
            "push" => Some(Value::Float(self.push)),
            "sync" => Some(Value::Float(self.sync)),
            _ => self.attributes.get(key).cloned(),
        }
    }

    /// Returns the required latency fields as `(name, value)` pairs, in declaration order.
    pub fn required(&self) -> [(&'static str, f64); 4] {
        [
            ("weight", self.weight),
            ("pull", self.pull),
            ("push", self.push),
            ("sync", self.sync),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn new() {
        let (source, target) = ("a", "b");

        assert_eq!(Edge::new(source, target), Edge { source, target })
    }

    #[test]
    fn source() {
        let (a, b) = ("a", "b");
        let edge = Edge::new(a, b);

        assert_eq!(edge.source(), &a);
    }

    #[test]
    fn target() {
        let (a, b) = ("a", "b");
        let edge = Edge::new(a, b);

        assert_eq!(edge.target(), &b);
    }

    #[test]
    fn direction_matters() {
        let (a, b) = ("a", "b");

        assert_ne!(Edge::new(a, b), Edge::new(b, a));

        let set: HashSet<_> = [Edge::new(a, b), Edge::new(b, a), Edge::new(a, b)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn from_latency() {
        let data = EdgeData::from_latency(1.0, 2.0, 3.0);

        assert_eq!(data.pull, 1.0);
        assert_eq!(data.push, 2.0);
        assert_eq!(data.sync, 3.0);
        assert_eq!(data.weight, 3.0);
        assert!(data.attributes.is_empty());
    }

    #[test]
    fn get() {
        let data = EdgeData::from_latency(0.5, 0.5, 1.5).with_attribute("color", "k");

        assert_eq!(data.get("weight"), Some(Value::Float(1.5)));
        assert_eq!(data.get("color"), Some(Value::from("k")));
        assert_eq!(data.get("size"), None);
    }
}
