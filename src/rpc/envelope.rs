//! SOAP 1.1 envelope assembly and generic response parsing.
//!
//! Requests carry a single typed key/value item map in the body, the
//! section-5 "Map" encoding the service dispatches on. Responses come
//! back as arbitrarily nested structs and arrays; they are parsed into a
//! generic `serde_json::Value` here so the typed views in
//! `rpc::protocol` can take over. Scalars are typed through `xsi:type`,
//! item maps become objects, repeated elements become arrays, and a
//! response body holding a single field is bubbled up one level.

use std::fmt::Write as _;

use derive_more::{Display, Error, From};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::rpc::protocol::ArgMap;

#[derive(Debug, Display, From, Error)]
pub enum EnvelopeError {
    Xml(quick_xml::Error),
    /// The document was not a well-formed envelope.
    Malformed,
    /// The envelope carried no body element.
    MissingBody,
    /// The service answered with a SOAP fault.
    #[display(fmt = "SOAP fault [{}]: {}", code, message)]
    Fault { code: String, message: String },
}

type Result<T> = std::result::Result<T, EnvelopeError>;

/// Assemble the full request envelope for one call.
///
/// Argument order is whatever the map yields; the service treats the
/// item map as unordered.
pub fn build_envelope(method: &str, namespace: &str, args: &ArgMap) -> String {
    let mut items = String::new();
    for (key, value) in args {
        let _ = write!(
            items,
            "<item><key xsi:type=\"xsd:string\">{}</key><value xsi:type=\"xsd:{}\">{}</value></item>\n",
            escape(key.as_str()),
            value.type_name(),
            escape(value.to_string().as_str()),
        );
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <soap:Envelope xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"\n\
         \x20   xmlns:soapenc=\"http://schemas.xmlsoap.org/soap/encoding/\"\n\
         \x20   xmlns:apachens=\"http://xml.apache.org/xml-soap\"\n\
         \x20   xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"\n\
         \x20   soap:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\"\n\
         \x20   xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\n\
         <soap:Body><{method} xmlns=\"{namespace}\">\n\
         <c-gensym6 xsi:type=\"apachens:Map\">\n\
         {items}</c-gensym6></{method}></soap:Body></soap:Envelope>",
        method = method,
        namespace = namespace,
        items = items,
    )
}

/// Parse a response document into a generic value.
///
/// SOAP faults surface as [`EnvelopeError::Fault`]; a body whose payload
/// is a single field is unwrapped to that field's value.
pub fn parse_response(xml: &str) -> Result<Value> {
    let root = parse_tree(xml)?;
    let body = root.child("Body").ok_or(EnvelopeError::MissingBody)?;
    let reply = body.children.first().ok_or(EnvelopeError::MissingBody)?;

    if reply.name == "Fault" {
        let code = reply.child_text("faultcode");
        let message = reply.child_text("faultstring");
        return Err(EnvelopeError::Fault { code, message });
    }

    match node_to_value(reply) {
        Value::Object(map) => {
            if map.len() == 1 {
                return Ok(map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null));
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    type_hint: Option<String>,
    nil: bool,
    is_array: bool,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn named(name: String) -> XmlNode {
        XmlNode {
            name,
            ..XmlNode::default()
        }
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default()
    }
}

fn node_from_start(start: &quick_xml::events::BytesStart<'_>) -> XmlNode {
    let mut node = XmlNode::named(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
    for attr in start.attributes().flatten() {
        let key = attr.key.local_name();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match key.as_ref() {
            b"type" => {
                // keep only the local part of e.g. "xsd:int"
                let local = value.rsplit(':').next().unwrap_or("").to_string();
                if local.contains("Array") {
                    node.is_array = true;
                }
                node.type_hint = Some(local);
            }
            b"arrayType" => node.is_array = true,
            b"nil" => node.nil = value == "true" || value == "1",
            _ => {}
        }
    }
    node
}

fn append_text(node: &mut XmlNode, raw: &str) {
    match unescape(raw) {
        Ok(text) => node.text.push_str(&text),
        Err(_) => node.text.push_str(raw),
    }
}

fn parse_tree(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![XmlNode::named(String::new())];
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(node_from_start(&start)),
            Ok(Event::Empty(start)) => {
                let node = node_from_start(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Err(EnvelopeError::Malformed),
                }
            }
            Ok(Event::Text(text)) => {
                let raw = String::from_utf8_lossy(text.as_ref()).into_owned();
                if let Some(node) = stack.last_mut() {
                    append_text(node, &raw);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(data.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(EnvelopeError::Malformed);
                }
                let node = match stack.pop() {
                    Some(node) => node,
                    None => return Err(EnvelopeError::Malformed),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Err(EnvelopeError::Malformed),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(EnvelopeError::Xml(e)),
        }
    }
    if stack.len() != 1 {
        return Err(EnvelopeError::Malformed);
    }
    let root = match stack.pop() {
        Some(root) => root,
        None => return Err(EnvelopeError::Malformed),
    };
    root.children.into_iter().next().ok_or(EnvelopeError::Malformed)
}

fn node_to_value(node: &XmlNode) -> Value {
    if node.nil {
        return Value::Null;
    }

    // key/value item maps
    let is_item_map = !node.children.is_empty()
        && node.children.iter().all(|c| {
            c.name == "item" && c.child("key").is_some() && c.child("value").is_some()
        });
    if is_item_map {
        let mut map = Map::new();
        for item in &node.children {
            if let (Some(key), Some(value)) = (item.child("key"), item.child("value")) {
                map.insert(key.text.trim().to_string(), node_to_value(value));
            }
        }
        return Value::Object(map);
    }

    if node.children.is_empty() {
        return scalar_value(node);
    }

    let same_name = node.children.len() > 1
        && node
            .children
            .iter()
            .all(|c| c.name == node.children[0].name);
    let lone_item = node.children.len() == 1 && node.children[0].name == "item";
    if node.is_array || same_name || lone_item {
        return Value::Array(node.children.iter().map(node_to_value).collect());
    }

    let mut map = Map::new();
    for child in &node.children {
        map.insert(child.name.clone(), node_to_value(child));
    }
    Value::Object(map)
}

fn scalar_value(node: &XmlNode) -> Value {
    let text = node.text.trim();
    match node.type_hint.as_deref() {
        Some("int") | Some("integer") | Some("long") | Some("short") => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        Some("float") | Some("double") | Some("decimal") => text
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}
