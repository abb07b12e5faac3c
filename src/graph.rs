//! A module for working with graphs.

use std::{collections::BTreeMap, fmt};

use crate::{
    attribute::{Attributes, Value},
    edge::{Edge, EdgeData},
};

/// A directed graph with attributed nodes and at most one edge per ordered pair of nodes.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    /// Optional label, carried through serialization but ignored by equality.
    name: Option<String>,
    /// The nodes in the graph and their attributes.
    nodes: BTreeMap<String, Attributes>,
    /// A mapping of source node to target node to the data of the edge between them.
    ///
    /// Every key (and nested key) is also present in `nodes`.
    adjacency: BTreeMap<String, BTreeMap<String, EdgeData>>,
}

impl Graph {
    /// Creates an empty, unnamed graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::graph::Graph;
    ///
    /// let graph = Graph::new();
    /// assert_eq!(graph.node_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with a name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Inserts a node without attributes if it isn't already present, returns whether it was
    /// inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    ///
    /// assert_eq!(graph.add_node("a"), true);
    /// assert_eq!(graph.add_node("a"), false);
    /// ```
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.nodes.contains_key(id) {
            return false;
        }

        self.nodes.insert(id.to_owned(), Attributes::new());
        true
    }

    /// Checks if the graph contains a node.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_attributes(&self, id: &str) -> Option<&Attributes> {
        self.nodes.get(id)
    }

    pub fn node_attributes_mut(&mut self, id: &str) -> Option<&mut Attributes> {
        self.nodes.get_mut(id)
    }

    /// Sets an attribute on a node, creating the node if it doesn't exist. Returns the previous
    /// value of the attribute, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::attribute::Value;
    /// use bandit::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.set_node_attribute("Virginia", "label", "VA");
    ///
    /// assert_eq!(
    ///     graph.node_attributes("Virginia").unwrap().get("label"),
    ///     Some(&Value::from("VA"))
    /// );
    /// ```
    pub fn set_node_attribute(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.add_node(id);

        self.nodes
            .get_mut(id)
            .and_then(|attributes| attributes.insert(key.into(), value.into()))
    }

    /// Inserts an edge into the graph, creating its endpoints if they are absent.
    ///
    /// An edge between the same ordered pair is replaced, in which case its previous data is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::edge::{Edge, EdgeData};
    /// use bandit::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    ///
    /// assert!(graph.insert_edge("a", "b", EdgeData::from_latency(1.0, 2.0, 3.0)).is_none());
    /// assert!(graph.insert_edge("a", "b", EdgeData::from_latency(1.0, 2.0, 4.0)).is_some());
    ///
    /// assert_eq!(graph.edge_count(), 1);
    /// assert_eq!(graph.node_count(), 2);
    /// assert_eq!(graph.edge("a", "b").unwrap().sync, 4.0);
    /// ```
    pub fn insert_edge(&mut self, source: &str, target: &str, data: EdgeData) -> Option<EdgeData> {
        self.add_node(source);
        self.add_node(target);

        self.adjacency
            .entry(source.to_owned())
            .or_default()
            .insert(target.to_owned(), data)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeData> {
        self.adjacency.get(source)?.get(target)
    }

    pub fn edge_mut(&mut self, source: &str, target: &str) -> Option<&mut EdgeData> {
        self.adjacency.get_mut(source)?.get_mut(target)
    }

    /// Checks if the graph contains an edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use bandit::edge::{Edge, EdgeData};
    /// use bandit::graph::Graph;
    ///
    /// let mut graph = Graph::new();
    /// graph.insert_edge("a", "b", EdgeData::default());
    ///
    /// assert_eq!(graph.contains_edge(&Edge::new("a", "b")), true);
    /// assert_eq!(graph.contains_edge(&Edge::new("b", "a")), false);
    /// ```
    pub fn contains_edge<T: AsRef<str>>(&self, edge: &Edge<T>) -> bool {
        self.edge(edge.source().as_ref(), edge.target().as_ref())
            .is_some()
    }

    /// Removes an edge and returns its data if it was present. The endpoints are kept.
    pub fn remove_edge<T: AsRef<str>>(&mut self, edge: &Edge<T>) -> Option<EdgeData> {
        let source = edge.source().as_ref();
        let targets = self.adjacency.get_mut(source)?;
        let removed = targets.remove(edge.target().as_ref());

        if targets.is_empty() {
            self.adjacency.remove(source);
        }

        removed
    }

    /// Returns the targets of the edges leaving a node, in sorted order.
    pub fn successors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.keys().map(String::as_str))
    }

    /// Returns the nodes and their attributes, sorted by id.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.nodes.iter().map(|(id, attributes)| (id.as_str(), attributes))
    }

    /// Returns the edges and their data, sorted by source then target.
    pub fn edges(&self) -> impl Iterator<Item = (Edge<&str>, &EdgeData)> {
        self.adjacency.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |(target, data)| (Edge::new(source.as_str(), target.as_str()), data))
        })
    }

    /// Returns the node count of the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the edge count of the graph.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum()
    }

    /// Returns the number of edges leaving a node.
    pub fn out_degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, BTreeMap::len)
    }

    /// Returns the number of edges pointing to a node.
    pub fn in_degree(&self, id: &str) -> usize {
        self.adjacency
            .values()
            .filter(|targets| targets.contains_key(id))
            .count()
    }
}

//
// Trait implementations
//

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.adjacency == other.adjacency
    }
}

/// Summarises the graph: its name, type, counts and average degrees.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nc = self.node_count();
        let ec = self.edge_count();

        writeln!(f, "Name: {}", self.name().unwrap_or_default())?;
        writeln!(f, "Type: DiGraph")?;
        writeln!(f, "Number of nodes: {nc}")?;
        write!(f, "Number of edges: {ec}")?;

        // Every edge adds one to an in-degree and one to an out-degree, so both averages are equal.
        if nc > 0 {
            let average = ec as f64 / nc as f64;
            writeln!(f)?;
            writeln!(f, "Average in degree: {average:>8.4}")?;
            write!(f, "Average out degree: {average:>7.4}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! graph {
          ($($path:expr),*) => {{
              let mut graph = Graph::new();

              $(
                  let mut iter = $path.into_iter().peekable();
                  while let (Some(a), Some(b)) = (iter.next(), iter.peek()) {
                      graph.insert_edge(a, b, EdgeData::from_latency(1.0, 1.0, 1.0));
                  }

              )*

              graph
          }}
      }

    #[test]
    fn new() {
        let graph = Graph::new();

        assert!(graph.name().is_none());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn with_name() {
        let mut graph = Graph::with_name("Network Topology");
        assert_eq!(graph.name(), Some("Network Topology"));

        graph.set_name(None);
        assert!(graph.name().is_none());
    }

    #[test]
    fn add_node() {
        let mut graph = Graph::new();

        assert!(graph.add_node("a"));
        assert!(!graph.add_node("a"));
        assert!(graph.contains_node("a"));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_node_keeps_attributes() {
        let mut graph = Graph::new();
        graph.set_node_attribute("a", "size", 900);
        graph.add_node("a");

        assert_eq!(
            graph.node_attributes("a").unwrap().get("size"),
            Some(&Value::Int(900))
        );
    }

    #[test]
    fn set_node_attribute() {
        let mut graph = Graph::new();

        assert_eq!(graph.set_node_attribute("a", "halo", true), None);
        assert_eq!(
            graph.set_node_attribute("a", "halo", false),
            Some(Value::Bool(true))
        );
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn insert_edge() {
        let mut graph = Graph::new();

        assert!(graph
            .insert_edge("a", "b", EdgeData::from_latency(1.0, 2.0, 3.0))
            .is_none());

        // Verify the endpoints were created implicitly.
        assert!(graph.contains_node("a"));
        assert!(graph.contains_node("b"));
        assert!(graph.node_attributes("a").unwrap().is_empty());

        let previous = graph.insert_edge("a", "b", EdgeData::from_latency(4.0, 5.0, 6.0));
        assert_eq!(previous.map(|data| data.sync), Some(3.0));
        assert_eq!(graph.edge("a", "b").unwrap().sync, 6.0);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn insert_edge_both_directions() {
        let graph = graph!(["a", "b", "a"]);

        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_edge(&Edge::new("a", "b")));
        assert!(graph.contains_edge(&Edge::new("b", "a")));
    }

    #[test]
    fn edge_mut() {
        let mut graph = graph!(["a", "b"]);
        graph
            .edge_mut("a", "b")
            .unwrap()
            .attributes
            .insert("color".to_owned(), Value::from("k"));

        assert_eq!(
            graph.edge("a", "b").unwrap().get("color"),
            Some(Value::from("k"))
        );
        assert!(graph.edge_mut("b", "a").is_none());
    }

    #[test]
    fn remove_edge() {
        let mut graph = graph!(["a", "b", "c"]);

        assert!(graph.remove_edge(&Edge::new("a", "b")).is_some());
        assert!(graph.remove_edge(&Edge::new("a", "b")).is_none());
        assert!(graph.remove_edge(&Edge::new("c", "b")).is_none());

        // Nodes outlive their edges.
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.out_degree("a"), 0);
    }

    #[test]
    fn successors() {
        let graph = graph!(["a", "c"], ["a", "b"], ["b", "a"]);

        assert_eq!(graph.successors("a").collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(graph.successors("c").count(), 0);
        assert_eq!(graph.successors("z").count(), 0);
    }

    #[test]
    fn nodes() {
        let graph = graph!(["c", "a", "b"]);

        let ids: Vec<&str> = graph.nodes().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn edges() {
        let graph = graph!(["b", "c"], ["a", "b"]);

        let edges: Vec<Edge<&str>> = graph.edges().map(|(edge, _)| edge).collect();
        assert_eq!(edges, vec![Edge::new("a", "b"), Edge::new("b", "c")]);
    }

    #[test]
    fn node_count() {
        let mut graph = Graph::new();
        assert_eq!(graph.node_count(), 0);

        // Verify two new nodes get added when they don't yet exist in the graph.
        graph.insert_edge("a", "b", EdgeData::default());
        assert_eq!(graph.node_count(), 2);

        // Verify only one new node is added when one of them already exists in the graph.
        graph.insert_edge("a", "c", EdgeData::default());
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn edge_count() {
        let graph = graph!(["a", "b", "c"], ["a", "c"]);

        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn degrees() {
        let graph = graph!(["a", "b", "c"], ["a", "c"]);

        assert_eq!(graph.out_degree("a"), 2);
        assert_eq!(graph.in_degree("a"), 0);
        assert_eq!(graph.out_degree("c"), 0);
        assert_eq!(graph.in_degree("c"), 2);
        assert_eq!(graph.in_degree("z"), 0);
    }

    //
    // Trait implementations
    //

    #[test]
    fn partial_eq_ignores_name() {
        let mut a = graph!(["a", "b"]);
        let b = graph!(["a", "b"]);
        a.set_name(Some("Network Topology".to_owned()));

        assert_eq!(a, b);
    }

    #[test]
    fn partial_eq_compares_attributes() {
        let a = graph!(["a", "b"]);
        let mut b = graph!(["a", "b"]);
        b.set_node_attribute("a", "label", "A");

        assert_ne!(a, b);
    }

    #[test]
    fn display() {
        let mut graph = graph!(["a", "b", "c"]);
        graph.set_name(Some("Network Topology".to_owned()));

        assert_eq!(
            graph.to_string(),
            "Name: Network Topology\n\
             Type: DiGraph\n\
             Number of nodes: 3\n\
             Number of edges: 2\n\
             Average in degree:   0.6667\n\
             Average out degree:  0.6667"
        );
    }

    #[test]
    fn display_empty() {
        assert_eq!(
            Graph::new().to_string(),
            "Name: \nType: DiGraph\nNumber of nodes: 0\nNumber of edges: 0"
        );
    }
}
