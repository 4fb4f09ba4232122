//! Entity-safe XML parsing for registration responses.
//!
//! The reader never interprets a DOCTYPE, so external and SYSTEM entities are
//! neither expanded from disk nor fetched over the network. Any entity
//! reference other than the five predefined ones resolves to an empty string,
//! e.g. `&xxe;` after `<!DOCTYPE r [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>`.

use std::borrow::Cow;
use std::collections::HashMap;

use error_stack::Report;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::StkError;

/// How to react to malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Any syntax error fails the parse.
    Strict,
    /// Keep whatever was read before the first error; open elements are
    /// closed at the error position.
    Recover,
}

/// A parsed element. `text` is the character data before the first child
/// element, mirroring the usual tree APIs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub tag: String,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Self {
        Self {
            tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            text: None,
            children: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        // Text after the first child belongs to that child's tail.
        if !self.children.is_empty() {
            return;
        }
        self.text.get_or_insert_with(String::new).push_str(text);
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

/// Parses `bytes` into an element tree.
///
/// # Errors
///
/// Returns [`StkError::XmlParse`] on malformed input in [`ParseMode::Strict`],
/// and in either mode when no root element could be read at all.
pub fn parse_document(bytes: &[u8], mode: ParseMode) -> Result<XmlElement, Report<StkError>> {
    let mut reader = Reader::from_reader(bytes);
    reader.check_end_names(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    let failure = loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                break Some(format!(
                    "{e} at byte {}",
                    reader.buffer_position()
                ))
            }
        };

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    break Some("content after the root element".to_string());
                }
                stack.push(XmlElement::from_start(&start));
            }
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => break Some("content after the root element".to_string()),
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                let Some(current) = stack.last_mut() else {
                    continue;
                };
                let unescaped = match text.unescape_with(|_| Some("")) {
                    Ok(s) => s,
                    Err(e) if mode == ParseMode::Recover => {
                        log::debug!("Keeping raw text after unescape failure: {e}");
                        Cow::Owned(String::from_utf8_lossy(&text).into_owned())
                    }
                    Err(e) => break Some(e.to_string()),
                };
                current.push_text(&unescaped);
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => {
                if stack.is_empty() {
                    break None;
                }
                break Some("unexpected end of document".to_string());
            }
            // Declarations, comments, processing instructions and DOCTYPE are
            // skipped; the DOCTYPE internal subset is never interpreted.
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    };

    if let Some(message) = failure {
        if mode == ParseMode::Strict {
            return Err(Report::new(StkError::XmlParse { message }));
        }
        log::warn!("Recovering partial XML document: {message}");
        while let Some(element) = stack.pop() {
            close_element(&mut stack, &mut root, element);
        }
    }

    root.ok_or_else(|| {
        Report::new(StkError::XmlParse {
            message: "document has no root element".into(),
        })
    })
}

fn close_element(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Maps each direct child of the root to its text, in document order; a
/// repeated tag keeps its last value. Elements without text map to `""`.
#[must_use]
pub fn root_child_texts(root: &XmlElement) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(root.children.len());
    for child in &root.children {
        fields.insert(child.tag.clone(), child.text.clone().unwrap_or_default());
    }
    fields
}
