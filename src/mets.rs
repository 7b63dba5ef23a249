//! METS manifest reading for Transkribus exports.
//!
//! Only one thing is extracted from `mets.xml`: the image file references in
//! `fileGrp[@ID="IMG"]//FLocat/@href`. Elements and the `href` attribute are
//! matched by local name so the `ns2`/`ns3` prefixes Transkribus emits don't
//! matter.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AltoConvError;
use crate::report::Reporter;

/// Extract the image references declared in a METS manifest.
///
/// A manifest without an `IMG` file group yields an empty list and a warning
/// (the "Export Image" option was probably unchecked); the caller decides
/// whether that is fatal for the batch.
pub fn image_references(
    mets_path: &Path,
    reporter: &mut Reporter,
) -> Result<Vec<PathBuf>, AltoConvError> {
    let xml = fs::read_to_string(mets_path)?;
    let document =
        roxmltree::Document::parse(&xml).map_err(|source| AltoConvError::XmlParse {
            path: mets_path.to_path_buf(),
            message: source.to_string(),
        })?;

    let image_groups: Vec<_> = document
        .descendants()
        .filter(|node| {
            node.is_element()
                && node.tag_name().name() == "fileGrp"
                && node.attribute("ID") == Some("IMG")
        })
        .collect();

    if image_groups.is_empty() {
        reporter.warn(
            "There is no reference to images in mets.xml! \
             Make sure to check the \"Export Image\" option in Transkribus",
        );
    }

    let mut references = Vec::new();
    for group in image_groups {
        for flocat in group
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "FLocat")
        {
            if let Some(href) = flocat
                .attributes()
                .find(|attr| attr.name() == "href")
                .map(|attr| attr.value())
            {
                references.push(PathBuf::from(href));
            }
        }
    }
    Ok(references)
}
