//! Forward-only XML event stream
//!
//! Everything downstream (path location, record detection, flattening) pulls
//! events through the [`EventSource`] trait, one at a time, never rewinding.
//! [`XmlReaderSource`] adapts a `quick-xml` reader; [`VecSource`] replays a
//! prepared event list.

pub mod reader;

pub use reader::XmlReaderSource;

use crate::error::{ImportError, Result};
use std::collections::VecDeque;

/// An attribute on a start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            prefix: None,
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    pub fn qualified_name(&self) -> String {
        compose_name(self.prefix.as_deref(), &self.local_name)
    }
}

/// A start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub local_name: String,
    pub prefix: Option<String>,
    pub attributes: Vec<XmlAttribute>,
}

impl StartElement {
    pub fn new(local_name: impl Into<String>) -> Self {
        StartElement {
            local_name: local_name.into(),
            prefix: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_attribute(mut self, attribute: XmlAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// `prefix:local` when the element carries a prefix, else the local name
    pub fn qualified_name(&self) -> String {
        compose_name(self.prefix.as_deref(), &self.local_name)
    }
}

/// One structural event of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    StartDocument,
    StartElement(StartElement),
    Characters(String),
    EndElement,
    EndDocument,
}

/// A pull-based, forward-only cursor over a document.
///
/// Once `EndDocument` has been returned every later call returns it again.
pub trait EventSource {
    fn next_event(&mut self) -> Result<XmlEvent>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<XmlEvent> {
        (**self).next_event()
    }
}

/// Replays a fixed list of events (or injected faults)
#[derive(Debug, Default)]
pub struct VecSource {
    events: VecDeque<Result<XmlEvent>>,
}

impl VecSource {
    pub fn new(events: impl IntoIterator<Item = XmlEvent>) -> Self {
        VecSource {
            events: events.into_iter().map(Ok).collect(),
        }
    }

    /// Queue a fault to be returned after the events queued so far
    pub fn push_error(&mut self, error: ImportError) {
        self.events.push_back(Err(error));
    }

    pub fn push(&mut self, event: XmlEvent) {
        self.events.push_back(Ok(event));
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self) -> Result<XmlEvent> {
        self.events.pop_front().unwrap_or(Ok(XmlEvent::EndDocument))
    }
}

/// Join an optional namespace prefix and a local name
pub fn compose_name(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}:{}", p, local_name),
        _ => local_name.to_string(),
    }
}

/// Consume events until the end of the element whose start was just read.
///
/// Nested elements are skipped recursively; a stream that ends early is
/// reported as `UnexpectedEof`.
pub fn skip_element<S: EventSource + ?Sized>(source: &mut S) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match source.next_event()? {
            XmlEvent::StartElement(_) => depth += 1,
            XmlEvent::EndElement => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            XmlEvent::EndDocument => {
                return Err(ImportError::UnexpectedEof(String::from("skipped element")));
            }
            XmlEvent::StartDocument | XmlEvent::Characters(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_name() {
        assert_eq!(compose_name(None, "item"), "item");
        assert_eq!(compose_name(Some(""), "item"), "item");
        assert_eq!(compose_name(Some("dc"), "title"), "dc:title");
    }

    #[test]
    fn test_vec_source_ends_with_end_document() {
        let mut source = VecSource::new(vec![XmlEvent::StartDocument]);
        assert_eq!(source.next_event().unwrap(), XmlEvent::StartDocument);
        assert_eq!(source.next_event().unwrap(), XmlEvent::EndDocument);
        assert_eq!(source.next_event().unwrap(), XmlEvent::EndDocument);
    }

    #[test]
    fn test_skip_element_consumes_subtree() {
        let mut source = VecSource::new(vec![
            XmlEvent::StartElement(StartElement::new("a")),
            XmlEvent::Characters("x".to_string()),
            XmlEvent::EndElement,
            XmlEvent::EndElement,
            XmlEvent::StartElement(StartElement::new("next")),
        ]);

        skip_element(&mut source).unwrap();

        match source.next_event().unwrap() {
            XmlEvent::StartElement(e) => assert_eq!(e.local_name, "next"),
            other => panic!("Expected <next>, got: {:?}", other),
        }
    }

    #[test]
    fn test_skip_element_truncated() {
        let mut source = VecSource::new(vec![XmlEvent::StartElement(StartElement::new("a"))]);
        assert!(matches!(
            skip_element(&mut source),
            Err(ImportError::UnexpectedEof(_))
        ));
    }
}
