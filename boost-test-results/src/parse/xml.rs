// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal element tree built from quick-xml events.
//!
//! Reports and logs are small, and both parsers need to look at an element's children more
//! than once, so the document is materialized before it is interpreted.

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    attributes: Vec<(String, String)>,
    pub(crate) children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) | Node::CData(_) => None,
        })
    }

    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |element| element.name == name)
    }

    /// The concatenated text and CDATA content of this element and its descendants.
    pub(crate) fn inner_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Element(element) => element.collect_text(out),
                Node::Text(text) | Node::CData(text) => out.push_str(text),
            }
        }
    }

    /// Finds the first element called `name`, searching depth-first from this element.
    pub(crate) fn find_descendant(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements()
            .find_map(|element| element.find_descendant(name))
    }
}

/// Reads `content` into a list of top-level nodes.
///
/// Several top-level elements are accepted, since Boost.Test may write stray elements next
/// to the document root. Elements still open at the end of input are closed implicitly: a
/// test executable that crashes leaves a truncated log behind.
pub(crate) fn read_document(content: &str) -> Result<Vec<Node>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut top_level = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        let node = match reader.read_event()? {
            Event::Start(start) => {
                stack.push(Element::from_start(&start)?);
                continue;
            }
            Event::End(_) => match stack.pop() {
                Some(element) => Node::Element(element),
                None => continue,
            },
            Event::Empty(start) => Node::Element(Element::from_start(&start)?),
            Event::Text(text) => Node::Text(text.unescape()?.into_owned()),
            Event::CData(cdata) => Node::CData(String::from_utf8_lossy(&cdata).into_owned()),
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => continue,
        };
        push_node(&mut stack, &mut top_level, node);
    }

    while let Some(element) = stack.pop() {
        push_node(&mut stack, &mut top_level, Node::Element(element));
    }

    Ok(top_level)
}

fn push_node(stack: &mut [Element], top_level: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top_level.push(node),
    }
}

/// Returns the first top-level element, if there is one.
pub(crate) fn first_element(nodes: &[Node]) -> Option<&Element> {
    nodes.iter().find_map(|node| match node {
        Node::Element(element) => Some(element),
        Node::Text(_) | Node::CData(_) => None,
    })
}
