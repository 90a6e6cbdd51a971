//! Minimal XML element writer.
//!
//! Only what the output renderers need: nested elements with escaped text
//! content, compact or indented. No attributes, no declaration.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Escape text for use as element content.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\''))
    {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Whether `name` can be used as an element name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
}

/// Streaming writer producing an XML document into a `String`.
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
    indent: Option<String>,
    /// One entry per open element: whether it has child elements yet.
    open: Vec<bool>,
}

impl XmlWriter {
    /// Writer emitting everything on one line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer placing each element on its own line, nested by `indent`.
    pub fn pretty(indent: &str) -> Self {
        Self {
            indent: Some(indent.to_string()),
            ..Self::default()
        }
    }

    /// Open an element.
    pub fn start(&mut self, name: &str) -> Result<()> {
        check_name(name)?;
        self.newline();
        self.mark_child();
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
        self.open.push(false);
        Ok(())
    }

    /// Close the most recently opened element.
    pub fn end(&mut self, name: &str) {
        if self.open.pop().unwrap_or(false) {
            self.newline();
        }
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    /// Write a complete element with escaped text content.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        check_name(name)?;
        self.newline();
        self.mark_child();
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
        self.buf.push_str(&escape(text));
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
        Ok(())
    }

    /// Consume the writer, returning the document.
    pub fn finish(self) -> String {
        self.buf
    }

    fn mark_child(&mut self) {
        if let Some(has_child) = self.open.last_mut() {
            *has_child = true;
        }
    }

    fn newline(&mut self) {
        let Some(indent) = &self.indent else {
            return;
        };
        if self.buf.is_empty() {
            return;
        }
        self.buf.push('\n');
        for _ in 0..self.open.len() {
            self.buf.push_str(indent);
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::ElementName(name.to_string()))
    }
}
