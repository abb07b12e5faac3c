//! GraphML encoding.
//!
//! Attribute keys are declared once per (domain, name, type) with generated ids (`d0`, `d1`, ..).
//! The edge latency keys are always declared as `double`, the graph name is a `graph` domain key.
//! Integers are written as `long` and floats as `double`; `int` and `float` are accepted on read.

use std::{
    collections::{BTreeMap, HashMap},
    io::{self, Read, Write},
    str,
};

use quick_xml::{
    escape::escape,
    events::{BytesStart, Event},
    Reader,
};
use tracing::trace;

use super::{read_all, Codec, Format};
use crate::{
    attribute::{Attributes, Value},
    edge::EdgeData,
    error::{Error, Result},
    graph::Graph,
};

const NAMESPACE: &str = "http://graphml.graphdrawing.org/xmlns";
const SCHEMA_LOCATION: &str =
    "http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd";

/// The graph domain key carrying the graph's name.
const NAME_KEY: &str = "name";

/// Codec for the GraphML format.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphMlCodec;

/// The kind of element a key applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Domain {
    Graph,
    Node,
    Edge,
    All,
}

impl Domain {
    fn name(&self) -> &'static str {
        match self {
            Domain::Graph => "graph",
            Domain::Node => "node",
            Domain::Edge => "edge",
            Domain::All => "all",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "graph" => Ok(Domain::Graph),
            "node" => Ok(Domain::Node),
            "edge" => Ok(Domain::Edge),
            "all" => Ok(Domain::All),
            _ => Err(parse_error(format!("unsupported key domain '{s}'"))),
        }
    }

    fn applies_to(&self, domain: Domain) -> bool {
        *self == Domain::All || *self == domain
    }
}

/// The declared type of a key's values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyType {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl KeyType {
    /// Returns the type a value is written with, `None` for values GraphML can't carry.
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(KeyType::Boolean),
            Value::Int(_) => Some(KeyType::Long),
            Value::Float(_) => Some(KeyType::Double),
            Value::String(_) => Some(KeyType::String),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            KeyType::Boolean => "boolean",
            KeyType::Int => "int",
            KeyType::Long => "long",
            KeyType::Float => "float",
            KeyType::Double => "double",
            KeyType::String => "string",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "boolean" => Ok(KeyType::Boolean),
            "int" => Ok(KeyType::Int),
            "long" => Ok(KeyType::Long),
            "float" => Ok(KeyType::Float),
            "double" => Ok(KeyType::Double),
            "string" => Ok(KeyType::String),
            _ => Err(parse_error(format!("unsupported key type '{s}'"))),
        }
    }

    /// Parses the text of a `<data>` or `<default>` element.
    fn value(&self, text: &str) -> Result<Value> {
        let invalid = || parse_error(format!("invalid {} value {text:?}", self.name()));

        match self {
            KeyType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            KeyType::Int | KeyType::Long => {
                text.trim().parse().map(Value::Int).map_err(|_| invalid())
            }
            KeyType::Float | KeyType::Double => {
                text.trim().parse().map(Value::Float).map_err(|_| invalid())
            }
            KeyType::String => Ok(Value::String(text.to_owned())),
        }
    }
}

fn parse_error(message: impl ToString) -> Error {
    Error::parse(Format::GraphMl, message)
}

impl Codec for GraphMlCodec {
    const FORMAT: Format = Format::GraphMl;

    fn encode<W: Write>(&self, graph: &Graph, writer: W) -> Result<()> {
        let keys = KeyTable::collect(graph)?;

        write_document(graph, &keys, writer).map_err(|e| Error::io(None, e))
    }

    fn decode<R: Read>(&self, reader: R) -> Result<Graph> {
        let buf = read_all(reader)?;
        let xml = str::from_utf8(&buf).map_err(parse_error)?;

        let mut reader = Reader::from_str(xml);
        let mut decoder = Decoder::default();

        loop {
            match reader.read_event().map_err(parse_error)? {
                Event::Start(e) => decoder.start(&e)?,
                Event::Empty(e) => {
                    decoder.start(&e)?;
                    decoder.end(e.local_name().as_ref())?;
                }
                Event::End(e) => decoder.end(e.local_name().as_ref())?,
                Event::Text(t) => decoder.text(&t.unescape().map_err(parse_error)?)?,
                Event::CData(c) => decoder.text(str::from_utf8(&c).map_err(parse_error)?)?,
                Event::Eof => break,
                _ => {}
            }
        }

        decoder.finish()
    }
}

//
// Encoding
//

/// The key declarations needed to write a graph, in order of first use.
struct KeyTable {
    keys: Vec<(Domain, String, KeyType)>,
    ids: BTreeMap<(Domain, String, KeyType), usize>,
}

impl KeyTable {
    fn collect(graph: &Graph) -> Result<Self> {
        let mut table = Self {
            keys: Vec::new(),
            ids: BTreeMap::new(),
        };

        if let Some(name) = graph.name() {
            check_text(name, || "graph name".to_owned())?;
            table.declare(Domain::Graph, NAME_KEY, KeyType::String);
        }

        // Edge endpoints are node ids, checking the nodes covers them.
        for (id, attributes) in graph.nodes() {
            let owner = || format!("node '{}'", id.escape_debug());

            check_text(id, || format!("id of {}", owner()))?;
            for (key, value) in attributes {
                table.declare_value(Domain::Node, key, value, owner)?;
            }
        }

        for key in EdgeData::REQUIRED {
            table.declare(Domain::Edge, key, KeyType::Double);
        }

        for (edge, data) in graph.edges() {
            let owner = || {
                format!(
                    "edge '{}' -> '{}'",
                    edge.source().escape_debug(),
                    edge.target().escape_debug()
                )
            };

            for (key, value) in &data.attributes {
                if EdgeData::REQUIRED.contains(&key.as_str()) {
                    return Err(Error::encode(
                        Format::GraphMl,
                        format!("attribute '{key}' of {} shadows a latency field", owner()),
                    ));
                }

                table.declare_value(Domain::Edge, key, value, owner)?;
            }
        }

        Ok(table)
    }

    fn declare(&mut self, domain: Domain, name: &str, ty: KeyType) {
        let entry = (domain, name.to_owned(), ty);

        if !self.ids.contains_key(&entry) {
            self.ids.insert(entry.clone(), self.keys.len());
            self.keys.push(entry);
        }
    }

    fn declare_value(
        &mut self,
        domain: Domain,
        name: &str,
        value: &Value,
        owner: impl Fn() -> String,
    ) -> Result<()> {
        let ty = KeyType::of(value).ok_or_else(|| {
            Error::encode(
                Format::GraphMl,
                format!("attribute '{name}' of {} is null", owner()),
            )
        })?;

        check_text(name, || format!("attribute name '{}' of {}", name.escape_debug(), owner()))?;
        if let Value::String(text) = value {
            check_text(text, || format!("attribute '{name}' of {}", owner()))?;
        }

        self.declare(domain, name, ty);
        Ok(())
    }

    /// Returns the id of the key declared for a value.
    fn id(&self, domain: Domain, name: &str, value: &Value) -> String {
        // Every value was declared while collecting, null values were rejected.
        let index = KeyType::of(value)
            .and_then(|ty| self.ids.get(&(domain, name.to_owned(), ty)))
            .copied()
            .unwrap_or_default();

        format!("d{index}")
    }
}

/// Fails if `text` holds a character XML 1.0 can't represent, even as a character reference.
fn check_text(text: &str, what: impl Fn() -> String) -> Result<()> {
    let is_xml_char = |c: char| {
        matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
            || c >= '\u{10000}'
    };

    match text.chars().find(|c| !is_xml_char(*c)) {
        None => Ok(()),
        Some(c) => Err(Error::encode(
            Format::GraphMl,
            format!("{} contains {:?}, which XML can't represent", what(), c),
        )),
    }
}

fn write_document<W: Write>(graph: &Graph, keys: &KeyTable, mut w: W) -> io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<graphml xmlns="{NAMESPACE}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="{SCHEMA_LOCATION}">"#
    )?;

    for (i, (domain, name, ty)) in keys.keys.iter().enumerate() {
        writeln!(
            w,
            r#"  <key id="d{i}" for="{}" attr.name="{}" attr.type="{}"/>"#,
            domain.name(),
            escape(name.as_str()),
            ty.name()
        )?;
    }

    writeln!(w, r#"  <graph edgedefault="directed">"#)?;

    if let Some(name) = graph.name() {
        let value = Value::from(name);
        write_data(&mut w, 4, &keys.id(Domain::Graph, NAME_KEY, &value), &value)?;
    }

    for (id, attributes) in graph.nodes() {
        if attributes.is_empty() {
            writeln!(w, r#"    <node id="{}"/>"#, escape(id))?;
            continue;
        }

        writeln!(w, r#"    <node id="{}">"#, escape(id))?;
        for (key, value) in attributes {
            write_data(&mut w, 6, &keys.id(Domain::Node, key, value), value)?;
        }
        writeln!(w, "    </node>")?;
    }

    for (edge, data) in graph.edges() {
        writeln!(
            w,
            r#"    <edge source="{}" target="{}">"#,
            escape(*edge.source()),
            escape(*edge.target())
        )?;

        for (key, value) in data.required() {
            let value = Value::Float(value);
            write_data(&mut w, 6, &keys.id(Domain::Edge, key, &value), &value)?;
        }
        for (key, value) in &data.attributes {
            write_data(&mut w, 6, &keys.id(Domain::Edge, key, value), value)?;
        }

        writeln!(w, "    </edge>")?;
    }

    writeln!(w, "  </graph>")?;
    writeln!(w, "</graphml>")?;

    w.flush()
}

fn write_data<W: Write>(w: &mut W, indent: usize, key: &str, value: &Value) -> io::Result<()> {
    let text = value.to_string();

    writeln!(
        w,
        r#"{:indent$}<data key="{key}">{}</data>"#,
        "",
        escape(text.as_str())
    )
}

//
// Decoding
//

/// A key declaration read from the document.
#[derive(Debug)]
struct Key {
    name: String,
    domain: Domain,
    ty: KeyType,
    default: Option<Value>,
}

/// The element `<data>` children currently attach to.
#[derive(Debug)]
enum Owner {
    Graph,
    Node(String),
    Edge(String, String),
}

impl Owner {
    fn domain(&self) -> Domain {
        match self {
            Owner::Graph => Domain::Graph,
            Owner::Node(_) => Domain::Node,
            Owner::Edge(..) => Domain::Edge,
        }
    }
}

/// Builds a graph from the stream of XML events.
#[derive(Debug, Default)]
struct Decoder {
    /// Element nesting depth, `<graphml>` is at depth 1.
    depth: usize,
    closed: bool,
    keys: HashMap<String, Key>,
    /// The key declaration being read, with the text of its `<default>` if inside one.
    key: Option<(String, Key)>,
    default: Option<String>,
    graphs: usize,
    owner: Option<Owner>,
    attributes: Attributes,
    /// The key and text of the `<data>` element being read.
    data: Option<(String, String)>,
    name: Option<String>,
    nodes: Vec<(String, Attributes)>,
    edges: Vec<(String, String, Attributes)>,
}

impl Decoder {
    fn start(&mut self, e: &BytesStart) -> Result<()> {
        let local = e.local_name();
        let element = str::from_utf8(local.as_ref()).map_err(parse_error)?;

        self.depth += 1;
        if self.closed {
            return Err(parse_error("content after the <graphml> root"));
        }
        if self.depth == 1 && element != "graphml" {
            return Err(parse_error(format!("expected <graphml> root, found <{element}>")));
        }

        match element {
            "key" => {
                let id = required_attribute(e, "id", element)?;
                let ty = attribute(e, "attr.type")?.unwrap_or_else(|| "string".to_owned());
                let domain = attribute(e, "for")?.unwrap_or_else(|| "all".to_owned());
                let key = Key {
                    name: attribute(e, "attr.name")?.unwrap_or_else(|| id.clone()),
                    domain: Domain::parse(&domain)?,
                    ty: KeyType::parse(&ty)?,
                    default: None,
                };

                self.key = Some((id, key));
            }
            "default" if self.key.is_some() => self.default = Some(String::new()),
            "graph" => {
                if self.graphs > 0 {
                    return Err(parse_error("multiple or nested graphs are not supported"));
                }
                if attribute(e, "edgedefault")?.as_deref() == Some("undirected") {
                    return Err(parse_error("undirected graphs are not supported"));
                }

                self.graphs += 1;
                self.owner = Some(Owner::Graph);
            }
            "node" => {
                self.expect_owner(Domain::Graph, element)?;
                let id = required_attribute(e, "id", element)?;

                self.owner = Some(Owner::Node(id));
            }
            "edge" => {
                self.expect_owner(Domain::Graph, element)?;
                if attribute(e, "directed")?.as_deref() == Some("false") {
                    return Err(parse_error("undirected edges are not supported"));
                }
                let source = required_attribute(e, "source", element)?;
                let target = required_attribute(e, "target", element)?;

                self.owner = Some(Owner::Edge(source, target));
            }
            "hyperedge" => return Err(parse_error("hyperedges are not supported")),
            "data" => {
                if self.owner.is_none() {
                    return Err(parse_error("<data> outside of a graph, node or edge"));
                }
                let key = required_attribute(e, "key", element)?;

                self.data = Some((key, String::new()));
            }
            _ => {}
        }

        Ok(())
    }

    fn end(&mut self, local: &[u8]) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);

        match local {
            b"graphml" if self.depth == 0 => self.closed = true,
            b"key" => {
                if let Some((id, key)) = self.key.take() {
                    if self.keys.contains_key(&id) {
                        return Err(parse_error(format!("duplicate key '{id}'")));
                    }
                    self.keys.insert(id, key);
                }
            }
            b"default" => {
                if let (Some(text), Some((_, key))) = (self.default.take(), self.key.as_mut()) {
                    key.default = Some(key.ty.value(&text)?);
                }
            }
            b"data" => {
                if let Some((key, text)) = self.data.take() {
                    self.set_data(&key, &text)?;
                }
            }
            b"node" => {
                if let Some(Owner::Node(id)) = self.owner.take() {
                    let attributes = std::mem::take(&mut self.attributes);
                    self.nodes.push((id, attributes));
                }
                self.owner = Some(Owner::Graph);
            }
            b"edge" => {
                if let Some(Owner::Edge(source, target)) = self.owner.take() {
                    let attributes = std::mem::take(&mut self.attributes);
                    self.edges.push((source, target, attributes));
                }
                self.owner = Some(Owner::Graph);
            }
            b"graph" => self.owner = None,
            _ => {}
        }

        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if let Some((_, buf)) = self.data.as_mut() {
            buf.push_str(text);
        } else if let Some(buf) = self.default.as_mut() {
            buf.push_str(text);
        } else if !text.trim().is_empty() && self.depth == 0 {
            return Err(parse_error("text outside of the <graphml> root"));
        }

        Ok(())
    }

    fn expect_owner(&self, domain: Domain, element: &str) -> Result<()> {
        match &self.owner {
            Some(owner) if owner.domain() == domain => Ok(()),
            _ => Err(parse_error(format!(
                "<{element}> must be a child of <{}>",
                domain.name()
            ))),
        }
    }

    /// Stores the typed value of a `<data>` element on its owner.
    fn set_data(&mut self, id: &str, text: &str) -> Result<()> {
        let key = self
            .keys
            .get(id)
            .ok_or_else(|| parse_error(format!("data references undeclared key '{id}'")))?;
        // Safety: `<data>` is only accepted with an owner.
        let domain = self.owner.as_ref().map_or(Domain::Graph, Owner::domain);

        if !key.domain.applies_to(domain) {
            return Err(parse_error(format!(
                "key '{id}' is declared for {} but used on {}",
                key.domain.name(),
                domain.name()
            )));
        }

        let value = key.ty.value(text)?;

        if domain == Domain::Graph {
            if key.name == NAME_KEY {
                self.name = Some(value.to_string());
            } else {
                trace!(key = %key.name, "ignoring graph attribute");
            }
        } else {
            self.attributes.insert(key.name.clone(), value);
        }

        Ok(())
    }

    /// Fills in key defaults and assembles the graph.
    fn finish(mut self) -> Result<Graph> {
        if !self.closed {
            return Err(parse_error("missing or unterminated <graphml> root"));
        }
        if self.graphs == 0 {
            return Err(parse_error("missing <graph> element"));
        }

        let mut graph = Graph::new();
        graph.set_name(self.name.take());

        for (id, mut attributes) in std::mem::take(&mut self.nodes) {
            if graph.contains_node(&id) {
                return Err(parse_error(format!("duplicate node '{id}'")));
            }

            self.apply_defaults(Domain::Node, &mut attributes);
            graph.add_node(&id);
            if let Some(slot) = graph.node_attributes_mut(&id) {
                *slot = attributes;
            }
        }

        for (source, target, mut attributes) in std::mem::take(&mut self.edges) {
            for endpoint in [&source, &target] {
                if !graph.contains_node(endpoint) {
                    return Err(parse_error(format!(
                        "edge references undeclared node '{endpoint}'"
                    )));
                }
            }

            self.apply_defaults(Domain::Edge, &mut attributes);
            let data = edge_data(&source, &target, attributes)?;

            if graph.insert_edge(&source, &target, data).is_some() {
                return Err(parse_error(format!(
                    "duplicate edge '{source}' -> '{target}'"
                )));
            }
        }

        Ok(graph)
    }

    fn apply_defaults(&self, domain: Domain, attributes: &mut Attributes) {
        for key in self.keys.values() {
            if let Some(default) = &key.default {
                if key.domain.applies_to(domain) && !attributes.contains_key(&key.name) {
                    attributes.insert(key.name.clone(), default.clone());
                }
            }
        }
    }
}

/// Splits the latency fields out of an edge's decoded attributes.
fn edge_data(source: &str, target: &str, mut attributes: Attributes) -> Result<EdgeData> {
    let mut latency = [0.0; 4];

    for (slot, key) in latency.iter_mut().zip(EdgeData::REQUIRED) {
        *slot = attributes
            .remove(key)
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                parse_error(format!(
                    "edge '{source}' -> '{target}' has no numeric '{key}'"
                ))
            })?;
    }

    let [weight, pull, push, sync] = latency;

    Ok(EdgeData {
        weight,
        pull,
        push,
        sync,
        attributes,
    })
}

/// Returns the unescaped value of an XML attribute.
fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(parse_error)?;

        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(parse_error)?;
            return Ok(Some(value.into_owned()));
        }
    }

    Ok(None)
}

fn required_attribute(e: &BytesStart, name: &str, element: &str) -> Result<String> {
    attribute(e, name)?
        .ok_or_else(|| parse_error(format!("<{element}> is missing the '{name}' attribute")))
}
