//! Record element discovery
//!
//! Two ways to fix the record path before flattening: look up an element by
//! name ([`locate_path`]), or infer the most regularly repeating element
//! ([`detect_record_path`]). Both make a single forward pass and treat a
//! stream fault as the end of the document rather than an error.

pub mod candidate;

pub use candidate::{rank_candidates, Candidate, CandidateScan, Detection};

use crate::error::Result;
use crate::events::{EventSource, StartElement, XmlEvent};
use crate::types::DetectConfig;
use tracing::{debug, info, trace};

/// Wraps a source so that the first fault is logged and everything after it
/// reads as `EndDocument`
struct FusedSource<S> {
    inner: S,
    failed: bool,
}

impl<S: EventSource> FusedSource<S> {
    fn new(inner: S) -> Self {
        FusedSource {
            inner,
            failed: false,
        }
    }
}

impl<S: EventSource> EventSource for FusedSource<S> {
    fn next_event(&mut self) -> Result<XmlEvent> {
        if self.failed {
            return Ok(XmlEvent::EndDocument);
        }
        match self.inner.next_event() {
            Ok(event) => Ok(event),
            Err(e) => {
                debug!(error = %e, "stream fault during detection, treating as end of document");
                self.failed = true;
                Ok(XmlEvent::EndDocument)
            }
        }
    }
}

/// Find the first element named `target` and return the local names from the
/// outermost element down to it.
///
/// `target` may be a bare local name or `prefix:local`.
pub fn locate_path<S: EventSource>(source: S, target: &str) -> Option<Vec<String>> {
    let mut source = FusedSource::new(source);
    loop {
        match source.next_event() {
            Ok(XmlEvent::StartElement(element)) => {
                if let Some(mut path) = locate_in(&mut source, &element, target) {
                    path.reverse();
                    return Some(path);
                }
            }
            Ok(XmlEvent::EndDocument) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Search `element` and its subtree; the returned path is innermost first
fn locate_in<S: EventSource>(
    source: &mut S,
    element: &StartElement,
    target: &str,
) -> Option<Vec<String>> {
    if element.local_name == target || element.qualified_name() == target {
        return Some(vec![element.local_name.clone()]);
    }

    loop {
        match source.next_event() {
            Ok(XmlEvent::StartElement(child)) => {
                if let Some(mut path) = locate_in(source, &child, target) {
                    path.push(element.local_name.clone());
                    return Some(path);
                }
            }
            Ok(XmlEvent::EndElement) | Ok(XmlEvent::EndDocument) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Infer the path of the element most likely to be one record.
///
/// Returns `None` when nothing repeats often enough to be trusted.
pub fn detect_record_path<S: EventSource>(source: S, config: &DetectConfig) -> Option<Vec<String>> {
    let mut source = FusedSource::new(source);
    let mut candidates = Vec::new();

    loop {
        match source.next_event() {
            Ok(XmlEvent::StartElement(element)) => {
                let path = vec![element.local_name];
                if let Detection::Found(candidate) = scan(&mut source, &path, config) {
                    candidates.push(candidate);
                }
            }
            Ok(XmlEvent::EndDocument) | Err(_) => break,
            Ok(_) => {}
        }
    }

    if candidates.is_empty() {
        info!("no record element candidates found; at least 6 similar elements are required");
        return None;
    }

    rank_candidates(&mut candidates);
    let best = candidates.swap_remove(0);
    debug!(path = %best.path.join("/"), count = best.count, "detected record element");
    Some(best.path)
}

/// Scan the element at `path`, positioned just after its start tag, through
/// to its end tag
fn scan<S: EventSource>(source: &mut S, path: &[String], config: &DetectConfig) -> Detection {
    let mut tally = CandidateScan::new();

    loop {
        match source.next_event() {
            Ok(XmlEvent::StartElement(child)) => {
                tally.record_child(&child.local_name);

                let mut child_path = path.to_vec();
                child_path.push(child.local_name);
                if let Detection::Found(candidate) = scan(source, &child_path, config) {
                    tally.add_descendant(candidate);
                }
            }
            Ok(XmlEvent::Characters(text)) => tally.record_text(&text),
            Ok(XmlEvent::EndElement) | Ok(XmlEvent::EndDocument) | Err(_) => break,
            Ok(XmlEvent::StartDocument) => {}
        }
    }

    let detection = tally.judge(path, config);
    if let Detection::Found(candidate) = &detection {
        trace!(path = %candidate.path.join("/"), count = candidate.count, "record candidate");
    }
    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use crate::events::{VecSource, XmlReaderSource};
    use proptest::prelude::*;

    fn items_document(n: usize) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?>\n<items>\n");
        for i in 0..n {
            xml.push_str(&format!("  <item id=\"{}\"><name>n{}</name></item>\n", i, i));
        }
        xml.push_str("</items>\n");
        xml
    }

    fn detect(xml: &str) -> Option<Vec<String>> {
        detect_record_path(XmlReaderSource::from_str(xml), &DetectConfig::default())
    }

    #[test]
    fn test_locate_top_level() {
        let xml = "<library><book/></library>";
        assert_eq!(
            locate_path(XmlReaderSource::from_str(xml), "library"),
            Some(vec!["library".to_string()])
        );
    }

    #[test]
    fn test_locate_nested() {
        let xml = "<a><x/><b><c>1</c><c>2</c></b></a>";
        assert_eq!(
            locate_path(XmlReaderSource::from_str(xml), "c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_locate_qualified_name() {
        let xml = r#"<feed xmlns:media="urn:m"><entry><media:content url="u"/></entry></feed>"#;
        let expected = Some(vec![
            "feed".to_string(),
            "entry".to_string(),
            "content".to_string(),
        ]);
        assert_eq!(locate_path(XmlReaderSource::from_str(xml), "media:content"), expected);
        assert_eq!(locate_path(XmlReaderSource::from_str(xml), "content"), expected);
    }

    #[test]
    fn test_locate_missing() {
        let xml = "<a><b/></a>";
        assert_eq!(locate_path(XmlReaderSource::from_str(xml), "z"), None);
    }

    #[test]
    fn test_locate_is_repeatable() {
        let xml = items_document(3);
        let first = locate_path(XmlReaderSource::from_str(&xml), "name");
        let second = locate_path(XmlReaderSource::from_str(&xml), "name");
        assert_eq!(first, second);
        assert_eq!(
            first,
            Some(vec!["items".to_string(), "item".to_string(), "name".to_string()])
        );
    }

    #[test]
    fn test_locate_stops_on_fault() {
        let mut source = VecSource::new(vec![
            XmlEvent::StartDocument,
            XmlEvent::StartElement(StartElement::new("a")),
        ]);
        source.push_error(ImportError::UnexpectedEof("a".to_string()));
        source.push(XmlEvent::StartElement(StartElement::new("target")));

        assert_eq!(locate_path(source, "target"), None);
    }

    #[test]
    fn test_detect_items() {
        assert_eq!(
            detect(&items_document(6)),
            Some(vec!["items".to_string(), "item".to_string()])
        );
    }

    #[test]
    fn test_detect_needs_more_than_five() {
        assert_eq!(detect(&items_document(5)), None);
    }

    #[test]
    fn test_detect_nothing_repeats() {
        assert_eq!(detect("<a><b>1</b><c>2</c></a>"), None);
    }

    #[test]
    fn test_detect_nested_records() {
        let mut xml = String::from("<export><meta><title>t</title></meta><data>");
        for i in 0..20 {
            xml.push_str(&format!("<row><v>{}</v></row>", i));
        }
        xml.push_str("</data></export>");

        assert_eq!(
            detect(&xml),
            Some(vec!["export".to_string(), "data".to_string(), "row".to_string()])
        );
    }

    #[test]
    fn test_detect_ignores_mixed_content_parent() {
        let mut xml = String::from("<doc><p>Intro");
        for _ in 0..10 {
            xml.push_str("<b>bold</b>");
        }
        xml.push_str("</p></doc>");

        assert_eq!(detect(&xml), None);
    }

    #[test]
    fn test_detect_uses_partial_scan_on_fault() {
        let mut source = VecSource::new(vec![
            XmlEvent::StartDocument,
            XmlEvent::StartElement(StartElement::new("items")),
        ]);
        for _ in 0..8 {
            source.push(XmlEvent::StartElement(StartElement::new("item")));
            source.push(XmlEvent::EndElement);
        }
        source.push_error(ImportError::UnexpectedEof("items".to_string()));

        assert_eq!(
            detect_record_path(source, &DetectConfig::default()),
            Some(vec!["items".to_string(), "item".to_string()])
        );
    }

    proptest! {
        #[test]
        fn prop_detects_items_iff_more_than_five(n in 0usize..40) {
            let detected = detect(&items_document(n));
            if n >= 6 {
                prop_assert_eq!(detected, Some(vec!["items".to_string(), "item".to_string()]));
            } else {
                prop_assert_eq!(detected, None);
            }
        }
    }
}
