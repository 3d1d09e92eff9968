//! In-memory document tree.
//!
//! Nodes live in one arena in document order: an element is followed by its
//! attributes, then by its content. Comparing [`NodeRef`]s therefore compares
//! document positions, which is what path evaluation sorts by.
//!
//! Whitespace-only text between elements is dropped; all other text is kept
//! verbatim (entities decoded, CDATA included). Comments, processing
//! instructions and the doctype are ignored.
//!
//! Parsed path queries are cached per document, so a query repeated for every
//! element of an expansion is parsed once.

use crate::{QueryEngine, QueryError, XmlError};
use dashmap::DashMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::sync::Arc;

use super::path::PathExpr;

bitflags::bitflags! {
    /// Node kinds, used as sets by path node tests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeKinds: u8 {
        const DOCUMENT  = 1 << 0;
        const ELEMENT   = 1 << 1;
        const ATTRIBUTE = 1 << 2;
        const TEXT      = 1 << 3;
    }
}

/// Handle of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element { name: String },
    Attribute { name: String, value: String },
    Text(String),
}

#[derive(Debug, Clone)]
struct XmlNode {
    data: NodeData,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    attributes: Vec<NodeRef>,
}

/// A parsed markup document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<XmlNode>,
    paths: DashMap<String, Arc<PathExpr>>,
}

impl Document {
    /// Parse `source` into a document tree.
    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let mut doc = Document {
            nodes: vec![XmlNode { data: NodeData::Document, parent: None, children: Vec::new(), attributes: Vec::new() }],
            paths: DashMap::new(),
        };
        let mut reader = Reader::from_str(source);
        // open elements, innermost last; top-level content belongs to the document node
        let mut open: Vec<NodeRef> = Vec::new();

        loop {
            let current = match open.last() {
                Some(&element) => element,
                None => doc.root(),
            };
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => return Err(malformed(&reader, err.to_string())),
            };

            match event {
                Event::Start(start) => {
                    let id = doc.open_element(current, &start).map_err(|msg| malformed(&reader, msg))?;
                    open.push(id);
                }
                Event::Empty(start) => {
                    doc.open_element(current, &start).map_err(|msg| malformed(&reader, msg))?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|err| malformed(&reader, err.to_string()))?;
                    if !text.trim().is_empty() {
                        doc.push_text(current, text.into_owned());
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    doc.push_text(current, text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&unclosed) = open.last() {
            return Err(XmlError::Unclosed { name: doc.name(unclosed).to_string() });
        }
        if doc.document_element().is_none() {
            return Err(XmlError::Empty);
        }

        log::debug!("parsed document with {} node(s)", doc.nodes.len());
        Ok(doc)
    }

    /// The document node (parent of the root element).
    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    /// The single top-level element.
    pub fn document_element(&self) -> Option<NodeRef> {
        self.children(self.root()).iter().copied().find(|&n| self.kind(n) == NodeKinds::ELEMENT)
    }

    pub fn kind(&self, node: NodeRef) -> NodeKinds {
        match self.nodes[node.0].data {
            NodeData::Document => NodeKinds::DOCUMENT,
            NodeData::Element { .. } => NodeKinds::ELEMENT,
            NodeData::Attribute { .. } => NodeKinds::ATTRIBUTE,
            NodeData::Text(_) => NodeKinds::TEXT,
        }
    }

    /// Qualified name of an element or attribute; empty for other nodes.
    pub fn name(&self, node: NodeRef) -> &str {
        match &self.nodes[node.0].data {
            NodeData::Element { name } | NodeData::Attribute { name, .. } => name,
            NodeData::Document | NodeData::Text(_) => "",
        }
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self, node: NodeRef) -> &str {
        let name = self.name(node);
        name.rsplit_once(':').map_or(name, |(_, local)| local)
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node.0].parent
    }

    /// Element and text children, in order.
    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node.0].children
    }

    pub fn attributes(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node.0].attributes
    }

    /// Value of the attribute called `name` (qualified name) on `node`.
    pub fn attribute(&self, node: NodeRef, name: &str) -> Option<&str> {
        self.attributes(node).iter().find_map(|&attr| match &self.nodes[attr.0].data {
            NodeData::Attribute { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// All element and text descendants in document order, `node` excluded.
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef> = self.children(node).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text content: an attribute's value, a text node's text, or the
    /// concatenated descendant text of an element or the document.
    pub fn text_content(&self, node: NodeRef) -> String {
        match &self.nodes[node.0].data {
            NodeData::Attribute { value, .. } => value.clone(),
            NodeData::Text(text) => text.clone(),
            NodeData::Document | NodeData::Element { .. } => self
                .descendants(node)
                .into_iter()
                .filter_map(|n| match &self.nodes[n.0].data {
                    NodeData::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Number of nodes, attributes and text included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_element().is_none()
    }

    /// Parsed form of `query`, parsed on first use and cached afterwards.
    /// Queries that fail to parse are not cached.
    pub(crate) fn compiled(&self, query: &str) -> Result<Arc<PathExpr>, QueryError> {
        if let Some(hit) = self.paths.get(query) {
            return Ok(Arc::clone(hit.value()));
        }
        let parsed = Arc::new(PathExpr::parse(query)?);
        self.paths.insert(query.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    fn push(&mut self, parent: NodeRef, data: NodeData) -> NodeRef {
        let id = NodeRef(self.nodes.len());
        self.nodes.push(XmlNode { data, parent: Some(parent), children: Vec::new(), attributes: Vec::new() });
        id
    }

    fn push_text(&mut self, parent: NodeRef, text: String) {
        let id = self.push(parent, NodeData::Text(text));
        self.nodes[parent.0].children.push(id);
    }

    fn open_element(&mut self, parent: NodeRef, start: &BytesStart<'_>) -> Result<NodeRef, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let id = self.push(parent, NodeData::Element { name });
        self.nodes[parent.0].children.push(id);

        for attr in start.attributes() {
            let attr = attr.map_err(|err| err.to_string())?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|err| err.to_string())?.into_owned();
            let attr_id = self.push(id, NodeData::Attribute { name, value });
            self.nodes[id.0].attributes.push(attr_id);
        }

        Ok(id)
    }
}

fn malformed(reader: &Reader<&[u8]>, message: String) -> XmlError {
    XmlError::Malformed { position: reader.buffer_position() as u64, message }
}

impl QueryEngine for Document {
    type Node = NodeRef;

    fn select(&self, context: &NodeRef, query: &str) -> Result<Vec<NodeRef>, QueryError> {
        Ok(self.compiled(query)?.evaluate(self, *context))
    }

    fn text(&self, node: &NodeRef) -> String {
        self.text_content(*node)
    }

    fn local_name(&self, node: &NodeRef) -> String {
        Document::local_name(self, *node).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<!-- header -->
<ns:catalog xmlns:ns="urn:test" version="2">
    <item id="a">Alpha &amp; Co</item>
    <item id="b"><![CDATA[<raw>]]></item>
    <note>one <b>two</b> three</note>
</ns:catalog>"#;

    #[test]
    fn builds_tree_in_document_order() {
        let doc = Document::parse(SAMPLE).unwrap();
        let catalog = doc.document_element().unwrap();
        assert_eq!(doc.name(catalog), "ns:catalog");
        assert_eq!(doc.local_name(catalog), "catalog");
        assert_eq!(doc.attribute(catalog, "version"), Some("2"));

        let items: Vec<NodeRef> = doc.children(catalog).to_vec();
        assert_eq!(items.len(), 3);
        assert!(items.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(doc.parent(items[0]), Some(catalog));
    }

    #[test]
    fn text_content_decodes_and_concatenates() {
        let doc = Document::parse(SAMPLE).unwrap();
        let catalog = doc.document_element().unwrap();
        let children = doc.children(catalog);
        assert_eq!(doc.text_content(children[0]), "Alpha & Co");
        assert_eq!(doc.text_content(children[1]), "<raw>");
        assert_eq!(doc.text_content(children[2]), "one two three");
        let id = doc.attributes(children[0])[0];
        assert_eq!(doc.text_content(id), "a");
        assert_eq!(doc.kind(id), NodeKinds::ATTRIBUTE);
    }

    #[test]
    fn whitespace_between_elements_is_dropped() {
        let doc = Document::parse("<r>\n  <a/>\n  <b/>\n</r>").unwrap();
        let r = doc.document_element().unwrap();
        assert_eq!(doc.children(r).len(), 2);
        assert_eq!(doc.descendants(doc.root()).len(), 3);
    }

    #[test]
    fn rejects_mismatched_tags() {
        match Document::parse("<a><b></a>").unwrap_err() {
            XmlError::Malformed { position, message } => {
                assert!(position > 0);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_documents_without_elements() {
        assert_eq!(Document::parse("").unwrap_err(), XmlError::Empty);
        assert_eq!(Document::parse("<!-- only a comment -->").unwrap_err(), XmlError::Empty);
    }

    #[test]
    fn rejects_unclosed_elements() {
        assert_eq!(Document::parse("<a><b>").unwrap_err(), XmlError::Unclosed { name: "b".into() });
        assert_eq!(Document::parse("<a><b/>").unwrap_err(), XmlError::Unclosed { name: "a".into() });
    }

    #[test]
    fn top_level_elements_hang_off_the_document_node() {
        let doc = Document::parse("<r><a/></r>").unwrap();
        let r = doc.document_element().unwrap();
        assert_eq!(doc.parent(r), Some(doc.root()));
        assert_eq!(doc.children(doc.root()), &[r]);
    }

    #[test]
    fn parsed_queries_are_cached() {
        let doc = Document::parse(SAMPLE).unwrap();
        let catalog = doc.document_element().unwrap();
        for item in doc.children(catalog) {
            assert!(doc.select(item, "@id").is_ok());
        }
        assert_eq!(doc.paths.len(), 1);
        assert!(Arc::ptr_eq(&doc.compiled("@id").unwrap(), &doc.compiled("@id").unwrap()));

        assert!(doc.select(&catalog, "item[").is_err());
        assert_eq!(doc.paths.len(), 1);
    }
}
