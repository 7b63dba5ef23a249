//! A small mutable XML tree for rewriting ALTO documents in place.
//!
//! `roxmltree` is the right tool for read-only lookups (see [`crate::mets`])
//! but it resolves namespaces away, and the whole point of the normalizer is
//! to rewrite `xmlns`/`xsi:schemaLocation` declarations as ordinary
//! attributes. So documents that get modified are parsed into this tree via
//! `quick-xml` events and serialized back by hand.
//!
//! Whitespace text nodes and comments are preserved so that the output keeps
//! the shape of the input; attribute order is preserved as well.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::AltoConvError;

/// One node in the tree: an element, a text run, or a comment.
#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

/// An element with ordered, string-keyed attributes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written in the source (`ns3:fileGrp`, `TextLine`...).
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A parsed XML document: prolog plus root element.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlDocument {
    /// Raw XML declaration, without the `<?`/`?>` markers.
    pub decl: Option<String>,
    pub root: XmlElement,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Local part of the element name (prefix stripped).
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Look up an attribute by its qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing one in place (order kept) or
    /// appending a new one.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First descendant element with the given local name, depth first.
    pub fn find_first(&self, local: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.find_first(local) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable variant of [`XmlElement::find_first`].
    pub fn find_first_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        for child in &mut self.children {
            if let XmlNode::Element(el) = child {
                if el.local_name() == local {
                    return Some(el);
                }
                if let Some(found) = el.find_first_mut(local) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Count elements with the given local name in this subtree, self included.
    pub fn count_named(&self, local: &str) -> usize {
        let own = usize::from(self.local_name() == local);
        own + self
            .child_elements()
            .map(|child| child.count_named(local))
            .sum::<usize>()
    }

    /// Visit every descendant element (self excluded), depth first.
    pub fn for_each_element_mut(&mut self, f: &mut impl FnMut(&mut XmlElement)) {
        for child in &mut self.children {
            if let XmlNode::Element(el) = child {
                f(el);
                el.for_each_element_mut(f);
            }
        }
    }

    /// Remove every descendant element with the given local name by splicing
    /// its children into its parent, in place and in order.
    pub fn unwrap_descendants(&mut self, local: &str) {
        for child in &mut self.children {
            if let XmlNode::Element(el) = child {
                el.unwrap_descendants(local);
            }
        }
        let mut spliced = Vec::with_capacity(self.children.len());
        for child in self.children.drain(..) {
            match child {
                XmlNode::Element(el) if el.local_name() == local => {
                    spliced.extend(el.children);
                }
                other => spliced.push(other),
            }
        }
        self.children = spliced;
    }

    /// Insert a node right after the first direct child element with the
    /// given local name. Returns false when no such child exists.
    pub fn insert_after_child(&mut self, local: &str, node: XmlNode) -> bool {
        let position = self.children.iter().position(|child| {
            matches!(child, XmlNode::Element(el) if el.local_name() == local)
        });
        match position {
            Some(index) => {
                self.children.insert(index + 1, node);
                true
            }
            None => false,
        }
    }

    fn serialize(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", key, escape_attr(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.serialize(out),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
                XmlNode::Comment(comment) => {
                    let _ = write!(out, "<!--{}-->", comment);
                }
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

impl XmlDocument {
    /// Parse a document from a UTF-8 string. `path` is only used for error
    /// context.
    pub fn parse(xml: &str, path: &Path) -> Result<Self, AltoConvError> {
        let mut reader = Reader::from_str(xml);
        let parse_err = |message: String| AltoConvError::XmlParse {
            path: path.to_path_buf(),
            message,
        };

        let mut decl = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.read_event().map_err(|e| parse_err(e.to_string()))?;
            match event {
                Event::Decl(e) => {
                    decl = Some(String::from_utf8_lossy(&e).into_owned());
                }
                Event::Start(e) => {
                    stack.push(element_from_start(&e).map_err(&parse_err)?);
                }
                Event::Empty(e) => {
                    let element = element_from_start(&e).map_err(&parse_err)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element), &parse_err)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| parse_err("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, XmlNode::Element(element), &parse_err)?;
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|e| parse_err(e.to_string()))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                    // text outside the root (leading/trailing whitespace) is dropped
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::Comment(e) => {
                    let comment = String::from_utf8_lossy(&e).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Comment(comment));
                    }
                }
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(parse_err("unclosed element at end of input".to_string()));
        }
        let root = root.ok_or_else(|| parse_err("document has no root element".to_string()))?;
        Ok(Self { decl, root })
    }

    /// Read and parse a document from a file.
    pub fn read(path: &Path) -> Result<Self, AltoConvError> {
        let xml = fs::read_to_string(path)?;
        Self::parse(&xml, path)
    }

    /// Serialize the document back to a string.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        match &self.decl {
            Some(decl) => {
                let _ = write!(out, "<?{}?>", decl);
            }
            None => out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"),
        }
        out.push('\n');
        self.root.serialize(&mut out);
        out.push('\n');
        out
    }

    /// Write the serialized document to a file.
    pub fn write(&self, path: &Path) -> Result<(), AltoConvError> {
        fs::write(path, self.to_xml()).map_err(AltoConvError::Io)
    }

    /// Count elements with the given local name anywhere in the document.
    pub fn count_named(&self, local: &str) -> usize {
        self.root.count_named(local)
    }
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement, String> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| err.to_string())?
        .to_string();
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| err.to_string())?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| err.to_string())?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
    parse_err: &impl Fn(String) -> AltoConvError,
) -> Result<(), AltoConvError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => match node {
            XmlNode::Element(el) => {
                if root.is_some() {
                    return Err(parse_err("multiple root elements".to_string()));
                }
                *root = Some(el);
                Ok(())
            }
            _ => Ok(()),
        },
    }
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> XmlDocument {
        XmlDocument::parse(xml, Path::new("test.xml")).expect("parse xml")
    }

    #[test]
    fn parse_preserves_attribute_order_and_text() {
        let doc = parse(r#"<alto xmlns="ns" b="2" a="1"><x>hello</x></alto>"#);
        assert_eq!(doc.root.name, "alto");
        assert_eq!(
            doc.root.attrs,
            vec![
                ("xmlns".to_string(), "ns".to_string()),
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
            ]
        );
        assert_eq!(doc.root.find_first("x").expect("find x").text(), "hello");
    }

    #[test]
    fn serialize_round_trips_escapes() {
        let doc = parse(r#"<a t="x &amp; y">1 &lt; 2</a>"#);
        let xml = doc.to_xml();
        assert!(xml.contains(r#"t="x &amp; y""#));
        assert!(xml.contains("1 &lt; 2"));
        let again = XmlDocument::parse(&xml, Path::new("again.xml")).expect("reparse");
        assert_eq!(again.root, doc.root);
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut doc = parse(r#"<a one="1" two="2"/>"#);
        doc.root.set_attr("one", "10");
        doc.root.set_attr("three", "3");
        assert_eq!(doc.root.attr("one"), Some("10"));
        assert_eq!(doc.root.attrs[0].0, "one");
        assert_eq!(doc.root.attrs[2].0, "three");
    }

    #[test]
    fn unwrap_descendants_splices_children_in_order() {
        let mut doc = parse(
            "<Page><ComposedBlock><TextBlock id=\"1\"/><TextBlock id=\"2\"/></ComposedBlock>\
             <TextBlock id=\"3\"/></Page>",
        );
        doc.root.unwrap_descendants("ComposedBlock");
        assert_eq!(doc.count_named("ComposedBlock"), 0);
        let ids: Vec<_> = doc
            .root
            .child_elements()
            .filter_map(|el| el.attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn unwrap_descendants_handles_nesting() {
        let mut doc = parse("<Page><CB><CB><TextBlock/></CB></CB></Page>");
        doc.root.unwrap_descendants("CB");
        assert_eq!(doc.count_named("CB"), 0);
        assert_eq!(doc.count_named("TextBlock"), 1);
    }

    #[test]
    fn insert_after_child_targets_first_match() {
        let mut doc = parse("<Description><MeasurementUnit>pixel</MeasurementUnit><OCRProcessingStep/></Description>");
        let inserted = doc
            .root
            .insert_after_child("MeasurementUnit", XmlNode::Element(XmlElement::new("sourceImageInformation")));
        assert!(inserted);
        let names: Vec<_> = doc.root.child_elements().map(|el| el.name.clone()).collect();
        assert_eq!(
            names,
            vec!["MeasurementUnit", "sourceImageInformation", "OCRProcessingStep"]
        );
    }

    #[test]
    fn insert_after_child_reports_missing_anchor() {
        let mut doc = parse("<Description/>");
        let inserted = doc
            .root
            .insert_after_child("MeasurementUnit", XmlNode::Text(String::new()));
        assert!(!inserted);
    }

    #[test]
    fn local_name_strips_prefix() {
        let doc = parse(r#"<ns3:fileGrp ID="IMG"/>"#);
        assert_eq!(doc.root.local_name(), "fileGrp");
        assert_eq!(doc.root.attr("ID"), Some("IMG"));
    }
}
