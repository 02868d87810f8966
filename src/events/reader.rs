//! `quick-xml` backed event source

use super::{EventSource, StartElement, XmlAttribute, XmlEvent};
use crate::error::{ImportError, Result};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// Streams [`XmlEvent`]s out of any buffered reader.
///
/// Self-closing tags come out as a start followed by an end. Comments,
/// processing instructions, declarations and doctypes are dropped; CDATA is
/// reported as character data.
pub struct XmlReaderSource<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    started: bool,
    finished: bool,
    pending_end: bool,
    open: Vec<String>,
}

impl<'a> XmlReaderSource<&'a [u8]> {
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> XmlReaderSource<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().expand_empty_elements = true;

        XmlReaderSource {
            reader,
            buf: Vec::new(),
            started: false,
            finished: false,
            pending_end: false,
            open: Vec::new(),
        }
    }

    /// Byte offset of the reader, for error reporting
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }
}

impl<R: BufRead> EventSource for XmlReaderSource<R> {
    fn next_event(&mut self) -> Result<XmlEvent> {
        if !self.started {
            self.started = true;
            return Ok(XmlEvent::StartDocument);
        }
        if self.pending_end {
            self.pending_end = false;
            self.open.pop();
            return Ok(XmlEvent::EndElement);
        }
        if self.finished {
            return Ok(XmlEvent::EndDocument);
        }

        let decoder = self.reader.decoder();
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(ImportError::Stream(e));
                }
            };

            match event {
                Event::Start(e) => {
                    let start = convert_start(&e, decoder)?;
                    self.open.push(start.qualified_name());
                    return Ok(XmlEvent::StartElement(start));
                }
                Event::Empty(e) => {
                    let start = convert_start(&e, decoder)?;
                    self.open.push(start.qualified_name());
                    self.pending_end = true;
                    return Ok(XmlEvent::StartElement(start));
                }
                Event::End(_) => {
                    self.open.pop();
                    return Ok(XmlEvent::EndElement);
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(quick_xml::Error::from)?;
                    return Ok(XmlEvent::Characters(text.into_owned()));
                }
                Event::CData(e) => {
                    return Ok(XmlEvent::Characters(decode(decoder, &e)?));
                }
                Event::Eof => {
                    self.finished = true;
                    if let Some(name) = self.open.pop() {
                        return Err(ImportError::UnexpectedEof(name));
                    }
                    return Ok(XmlEvent::EndDocument);
                }
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
            }
        }
    }
}

fn convert_start(e: &BytesStart<'_>, decoder: Decoder) -> Result<StartElement> {
    let name = e.name();
    let local_name = decode(decoder, name.local_name().as_ref())?;
    let prefix = match name.prefix() {
        Some(p) => Some(decode(decoder, p.as_ref())?),
        None => None,
    };

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key;
        if key.as_namespace_binding().is_some() {
            continue;
        }
        attributes.push(XmlAttribute {
            prefix: match key.prefix() {
                Some(p) => Some(decode(decoder, p.as_ref())?),
                None => None,
            },
            local_name: decode(decoder, key.local_name().as_ref())?,
            value: attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned(),
        });
    }

    Ok(StartElement {
        local_name,
        prefix,
        attributes,
    })
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String> {
    let text = decoder.decode(bytes).map_err(quick_xml::Error::from)?;
    Ok(text.into_owned())
}
