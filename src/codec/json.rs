//! Node-link JSON encoding.
//!
//! ```json
//! {
//!   "directed": true,
//!   "multigraph": false,
//!   "graph": { "name": "Network Topology" },
//!   "nodes": [ { "id": "A", ...attributes } ],
//!   "links": [ { "source": "A", "target": "B", "weight": 3.0, "pull": 1.0, "push": 2.0, "sync": 3.0, ...attributes } ]
//! }
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{read_all, Codec, Format};
use crate::{
    attribute::{Attributes, Value},
    edge::EdgeData,
    error::{Error, Result},
    graph::Graph,
};

/// The key holding a node's identifier.
const NODE_KEY: &str = "id";
/// The keys holding an edge's endpoints.
const LINK_KEYS: [&str; 2] = ["source", "target"];

/// Codec for the node-link JSON format.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

#[derive(Serialize, Deserialize)]
struct NodeLinkData<N, L> {
    #[serde(default = "directed")]
    directed: bool,
    #[serde(default)]
    multigraph: bool,
    #[serde(default)]
    graph: GraphData,
    nodes: Vec<N>,
    #[serde(alias = "edges")]
    links: Vec<L>,
}

fn directed() -> bool {
    true
}

#[derive(Default, Serialize, Deserialize)]
struct GraphData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize)]
struct NodeRef<'a> {
    id: &'a str,
    #[serde(flatten)]
    attributes: &'a Attributes,
}

#[derive(Serialize)]
struct LinkRef<'a> {
    source: &'a str,
    target: &'a str,
    weight: f64,
    pull: f64,
    push: f64,
    sync: f64,
    #[serde(flatten)]
    attributes: &'a Attributes,
}

#[derive(Deserialize)]
struct Node {
    id: String,
    #[serde(flatten)]
    attributes: Attributes,
}

#[derive(Deserialize)]
struct Link {
    source: String,
    target: String,
    weight: f64,
    pull: f64,
    push: f64,
    sync: f64,
    #[serde(flatten)]
    attributes: Attributes,
}

impl Codec for JsonCodec {
    const FORMAT: Format = Format::Json;

    fn encode<W: Write>(&self, graph: &Graph, writer: W) -> Result<()> {
        let mut nodes = Vec::with_capacity(graph.node_count());
        for (id, attributes) in graph.nodes() {
            check_attributes(attributes, &[NODE_KEY])?;
            nodes.push(NodeRef { id, attributes });
        }

        let mut links = Vec::with_capacity(graph.edge_count());
        for (edge, data) in graph.edges() {
            for (key, value) in data.required() {
                check_finite(key, value)?;
            }
            check_attributes(&data.attributes, &LINK_KEYS)?;
            check_attributes(&data.attributes, &EdgeData::REQUIRED)?;

            links.push(LinkRef {
                source: edge.source(),
                target: edge.target(),
                weight: data.weight,
                pull: data.pull,
                push: data.push,
                sync: data.sync,
                attributes: &data.attributes,
            });
        }

        let document = NodeLinkData {
            directed: true,
            multigraph: false,
            graph: GraphData {
                name: graph.name().map(str::to_owned),
            },
            nodes,
            links,
        };

        serde_json::to_writer_pretty(writer, &document).map_err(|e| {
            if e.is_io() {
                Error::io(None, e.into())
            } else {
                Error::encode(Self::FORMAT, e)
            }
        })
    }

    fn decode<R: Read>(&self, reader: R) -> Result<Graph> {
        let buf = read_all(reader)?;
        let document: NodeLinkData<Node, Link> =
            serde_json::from_slice(&buf).map_err(|e| Error::parse(Self::FORMAT, e))?;

        if !document.directed {
            return Err(Error::parse(Self::FORMAT, "undirected graphs are not supported"));
        }
        if document.multigraph {
            return Err(Error::parse(Self::FORMAT, "multigraphs are not supported"));
        }

        let mut graph = Graph::new();
        graph.set_name(document.graph.name);

        for node in document.nodes {
            if graph.contains_node(&node.id) {
                return Err(Error::parse(
                    Self::FORMAT,
                    format!("duplicate node '{}'", node.id),
                ));
            }

            graph.add_node(&node.id);
            if let Some(attributes) = graph.node_attributes_mut(&node.id) {
                *attributes = node.attributes;
            }
        }

        for link in document.links {
            for endpoint in [&link.source, &link.target] {
                if !graph.contains_node(endpoint) {
                    return Err(Error::parse(
                        Self::FORMAT,
                        format!("link references undeclared node '{endpoint}'"),
                    ));
                }
            }

            trace!(source = %link.source, target = %link.target, "decoded link");

            let data = EdgeData {
                weight: link.weight,
                pull: link.pull,
                push: link.push,
                sync: link.sync,
                attributes: link.attributes,
            };
            if graph.insert_edge(&link.source, &link.target, data).is_some() {
                return Err(Error::parse(
                    Self::FORMAT,
                    format!("duplicate link '{}' -> '{}'", link.source, link.target),
                ));
            }
        }

        Ok(graph)
    }
}

/// Rejects attributes that would collide with the reserved keys of the enclosing object or that
/// JSON can't carry faithfully.
fn check_attributes(attributes: &Attributes, reserved: &[&str]) -> Result<()> {
    for (key, value) in attributes {
        if reserved.contains(&key.as_str()) {
            return Err(Error::encode(
                Format::Json,
                format!("attribute '{key}' collides with a reserved key"),
            ));
        }

        if let Value::Float(f) = value {
            check_finite(key, *f)?;
        }
    }

    Ok(())
}

/// Non-finite floats would be silently written as `null`.
fn check_finite(key: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::encode(
            Format::Json,
            format!("attribute '{key}' is not a finite number ({value})"),
        ))
    }
}
