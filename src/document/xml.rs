//! XML → loose JSON tree decoding.
//!
//! Provider documents arrive as XML. They are decoded into a
//! `serde_json::Value` tree where any element that can repeat shows up as
//! a single object when it occurs once and as an array when it occurs more
//! than once. The normalizer is written against exactly that shape.
//!
//! Rules:
//! - text-only elements become strings (trimmed, `""` when empty)
//! - attributes go under `"$"`, text next to attributes/children under `"_"`
//! - repeated child names collapse into an array in document order

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::types::RecapError;

/// Key under which element attributes are stored.
pub const ATTRS_KEY: &str = "$";
/// Key under which text content is stored when the element also has
/// attributes or children.
pub const TEXT_KEY: &str = "_";

struct Frame {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, RecapError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| RecapError::Xml(format!("bad attribute in <{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| RecapError::Xml(format!("bad attribute value in <{name}>: {e}")))?;
            attrs.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(text));
        }
        let mut obj = self.children;
        if !self.attrs.is_empty() {
            obj.insert(ATTRS_KEY.to_string(), Value::Object(self.attrs));
        }
        if !text.is_empty() {
            obj.insert(TEXT_KEY.to_string(), Value::String(text));
        }
        (self.name, Value::Object(obj))
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            None => {
                self.children.insert(name, value);
            }
            // Element values are only ever strings or objects, so an array
            // here always means an earlier repetition.
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
}

/// Decode an XML document into a loose tree rooted at `{root_name: ...}`.
pub fn parse(xml: &str) -> Result<Value, RecapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            RecapError::Xml(format!(
                "at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(RecapError::Xml("multiple root elements".to_string()));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.close();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| RecapError::Xml("unexpected closing tag".to_string()))?;
                let (name, value) = frame.close();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| RecapError::Xml(format!("bad text content: {e}")))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(RecapError::Xml(format!(
            "document ended inside <{}>",
            open.name
        )));
    }

    let (name, value) = root.ok_or_else(|| RecapError::Xml("empty document".to_string()))?;
    let mut top = Map::new();
    top.insert(name, value);
    Ok(Value::Object(top))
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) -> Result<(), RecapError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(name, value);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some((name, value));
            Ok(())
        }
        None => Err(RecapError::Xml("multiple root elements".to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
