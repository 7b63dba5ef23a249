//! Structural flattening: composite blocks are unwrapped in place.

use crate::dom::XmlDocument;

/// Remove every `ComposedBlock` container in the document, promoting its
/// children to the parent level with order preserved. No-op when none exist.
pub fn remove_composed_blocks(doc: &mut XmlDocument) {
    doc.root.unwrap_descendants("ComposedBlock");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn composed_blocks_are_unwrapped_in_order() {
        let mut doc = XmlDocument::parse(
            "<alto><Layout><Page><PrintSpace>\
               <ComposedBlock ID=\"cb1\"><TextBlock ID=\"a\"/><TextBlock ID=\"b\"/></ComposedBlock>\
               <TextBlock ID=\"c\"/>\
             </PrintSpace></Page></Layout></alto>",
            Path::new("t.xml"),
        )
        .expect("parse");
        remove_composed_blocks(&mut doc);
        assert_eq!(doc.count_named("ComposedBlock"), 0);
        let print_space = doc.root.find_first("PrintSpace").expect("print space");
        let ids: Vec<_> = print_space
            .child_elements()
            .filter_map(|el| el.attr("ID"))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn documents_without_composed_blocks_are_unchanged() {
        let xml = "<alto><Layout><Page><TextBlock/></Page></Layout></alto>";
        let mut doc = XmlDocument::parse(xml, Path::new("t.xml")).expect("parse");
        let before = doc.clone();
        remove_composed_blocks(&mut doc);
        assert_eq!(doc, before);
    }
}
