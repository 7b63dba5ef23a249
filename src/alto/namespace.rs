//! Rewriting the root schema/namespace declarations to the v4 dialect.

use std::path::Path;

use crate::dom::XmlDocument;
use crate::error::AltoConvError;

use super::schema::{find_alto_root, ALTO_NS_V4, ALTO_XSD_BASELINES};

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Rewrite the root `alto` element's declarations to eScriptorium-flavoured
/// ALTO v4. Idempotent; touches no other element.
pub fn switch_to_v4(doc: &mut XmlDocument, path: &Path) -> Result<(), AltoConvError> {
    // find_alto_root validates the root; mutation goes through the tree.
    find_alto_root(doc, path)?;
    let root = if doc.root.local_name() == "alto" {
        &mut doc.root
    } else {
        match doc.root.find_first_mut("alto") {
            Some(root) => root,
            None => {
                return Err(AltoConvError::NotAlto {
                    path: path.to_path_buf(),
                })
            }
        }
    };

    // A PAGE namespace declaration is never needed downstream.
    root.remove_attr("xmlns:page");
    root.set_attr("xmlns:xsi", XSI_NS);
    root.set_attr("xmlns", ALTO_NS_V4);
    root.set_attr(
        "xsi:schemaLocation",
        format!("{} {}", ALTO_NS_V4, ALTO_XSD_BASELINES),
    );
    Ok(())
}
