//! Output projection and serialization.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use yuzu_common::xml::XmlWriter;
use yuzu_common::{Error, Result};

/// Root element of XML provider output.
pub const XML_ROOT: &str = "content";

/// Output field name -> rendered value.
pub type Projection = BTreeMap<String, String>;

/// Supported output serializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Xml,
}

impl OutputFormat {
    /// Parse an `output.type` value. Anything but `json`/`xml` is rejected.
    pub fn parse(kind: &str) -> Result<Self> {
        match kind {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(Error::UnsupportedOutput(other.to_string())),
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
        }
    }
}

/// Rendered provider output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: Vec<u8>,
    pub mime_type: &'static str,
}

impl Rendered {
    /// Body as UTF-8 text.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Serialize an already computed projection.
pub fn render_projection(format: OutputFormat, projection: &Projection) -> Result<Rendered> {
    let body = match format {
        OutputFormat::Json => serde_json::to_vec_pretty(projection)
            .map_err(|e| Error::Internal(format!("encoding output: {e}")))?,
        OutputFormat::Xml => {
            let map: Map<String, Value> = projection
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map_to_xml(&map, XML_ROOT)?.into_bytes()
        }
    };

    Ok(Rendered {
        body,
        mime_type: format.mime_type(),
    })
}

/// Serialize a JSON object as XML under `root`.
///
/// Each key becomes an element. Objects recurse, arrays repeat the element
/// once per item, null is omitted and every other scalar becomes text
/// content.
pub fn map_to_xml(map: &Map<String, Value>, root: &str) -> Result<String> {
    let mut w = XmlWriter::new();
    w.start(root)?;
    write_map(&mut w, map)?;
    w.end(root);
    Ok(w.finish())
}

fn write_map(w: &mut XmlWriter, map: &Map<String, Value>) -> Result<()> {
    for (name, value) in map {
        write_value(w, name, value)?;
    }
    Ok(())
}

fn write_value(w: &mut XmlWriter, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Object(inner) => {
            w.start(name)?;
            write_map(w, inner)?;
            w.end(name);
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                write_value(w, name, item)?;
            }
            Ok(())
        }
        Value::String(s) => w.text_element(name, s),
        Value::Bool(b) => w.text_element(name, &b.to_string()),
        Value::Number(n) => w.text_element(name, &n.to_string()),
    }
}
