//! Bandit is a small toolkit for building replica network topologies from measured latencies and
//! saving them in interchange formats other tools can draw or analyse.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure, a directed graph whose
//! edges carry the `pull`, `push` and `sync` latencies between two replicas. Graphs are built from
//! latency records with a [`TopologyBuilder`](topology::TopologyBuilder) and written or read in a
//! chosen [`Format`](codec::Format).
//!
//! ```rust
//! use bandit::codec::{self, Format};
//! use bandit::latency;
//!
//! // Build the topology from latency measurements.
//! let csv = "src,dst,pull,push,sync\n\
//!            Virginia,Ohio,1.0,2.0,3.0\n\
//!            Ohio,Oregon,0.5,0.5,1.5\n";
//! let graph = latency::from_reader(csv.as_bytes()).unwrap();
//!
//! // Edges are weighted by their sync latency.
//! assert_eq!(graph.edge("Virginia", "Ohio").unwrap().weight, 3.0);
//!
//! // Persist it and read it back.
//! let dir = std::env::temp_dir();
//! let path = dir.join("bandit-doc-topology.graphml");
//! codec::write_graph(&graph, &path, Format::GraphMl).unwrap();
//!
//! assert_eq!(codec::read_graph(&path, Format::GraphMl).unwrap(), graph);
//! # std::fs::remove_file(path).unwrap();
//!
//! // Graphs print a short summary.
//! println!("{graph}");
//! // ...outputs:
//! // Name: Network Topology
//! // Type: DiGraph
//! // Number of nodes: 3
//! // Number of edges: 2
//! // Average in degree:   0.6667
//! // Average out degree:  0.6667
//! ```

pub mod attribute;
pub mod codec;
pub mod edge;
pub mod error;
pub mod graph;
pub mod latency;
pub mod topology;
