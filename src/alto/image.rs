//! Pairing ALTO documents with their source images.
//!
//! Each scenario has its own matching rule, but they all produce an
//! [`ImageBinding`]: the path of the image actually on disk (used to read
//! pixel dimensions) and the canonical file name that ends up in
//! `sourceImageInformation/fileName`. The two are kept separate on purpose;
//! only the canonical name is ever serialized.

use std::path::{Path, PathBuf};

use crate::dom::{XmlDocument, XmlElement, XmlNode};
use crate::error::AltoConvError;
use crate::report::Reporter;

/// Candidate image files collected for one run. Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct ImageCatalog {
    entries: Vec<PathBuf>,
}

impl ImageCatalog {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved pairing of one document to zero-or-one catalog entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageBinding {
    /// Path of the matched image on disk, if any. Opened for its pixel
    /// dimensions during ratio scaling, never written to the document.
    pub resolved: Option<PathBuf>,
    /// The file name written into `sourceImageInformation/fileName`.
    pub canonical: Option<String>,
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

fn xml_stem(path: &Path) -> &str {
    file_name(path).strip_suffix(".xml").unwrap_or(file_name(path))
}

/// Basename up to the first dot, as image names may carry double extensions.
fn stem_to_first_dot(path: &Path) -> &str {
    let name = file_name(path);
    name.split('.').next().unwrap_or(name)
}

/// Transkribus strategy: exact basename match against the METS image refs.
///
/// Zero matches is a warning and an empty binding; several matches warn and
/// deterministically keep the first candidate in catalog order.
pub fn resolve_transkribus(
    xml_path: &Path,
    catalog: &ImageCatalog,
    reporter: &mut Reporter,
) -> ImageBinding {
    let base = xml_stem(xml_path);
    let matches: Vec<&PathBuf> = catalog
        .entries()
        .iter()
        .filter(|entry| stem_to_first_dot(entry) == base)
        .collect();

    match matches.as_slice() {
        [] => {
            reporter.warn(format!(
                "I didn't find a matching image file name in 'mets.xml' for '{}'",
                base
            ));
            ImageBinding::default()
        }
        [single] => ImageBinding {
            resolved: Some((*single).clone()),
            canonical: Some(file_name(single).to_string()),
        },
        [first, ..] => {
            reporter.warn(format!(
                "I found too many matching image file names in 'mets.xml' for '{}'",
                base
            ));
            reporter.warn(format!("\tI'll use '{}'", file_name(first)));
            ImageBinding {
                resolved: Some((*first).clone()),
                canonical: Some(file_name(first).to_string()),
            }
        }
    }
}

/// LIMB strategy: the trailing underscore-delimited segment of the XML
/// basename is matched by containment against the trailing segment of each
/// candidate. Later catalog entries overwrite earlier matches.
pub fn resolve_limb(
    xml_path: &Path,
    catalog: &ImageCatalog,
    reporter: &mut Reporter,
) -> ImageBinding {
    let base = xml_stem(xml_path);
    let numbering = base.rsplit('_').next().unwrap_or(base);

    let mut resolved = None;
    for entry in catalog.entries() {
        let image_stem = stem_to_first_dot(entry);
        let trailing = image_stem.rsplit('_').next().unwrap_or(image_stem);
        if trailing.contains(numbering) {
            resolved = Some(entry.clone());
        }
    }

    match resolved {
        Some(path) => {
            let canonical = file_name(&path).to_string();
            ImageBinding {
                resolved: Some(path),
                canonical: Some(canonical),
            }
        }
        None => {
            reporter.warn(format!("Couldn't find an image matching {}", base));
            ImageBinding::default()
        }
    }
}

/// pdfalto strategy: the page image lives in a sibling `<file>_data/`
/// directory; the canonical name is the XML basename with a `.png` extension.
pub fn resolve_pdfalto(
    xml_path: &Path,
    catalog: &ImageCatalog,
    reporter: &mut Reporter,
) -> ImageBinding {
    let data_dir = PathBuf::from(format!("{}_data", xml_path.display()));
    let canonical = format!("{}.png", xml_stem(xml_path));

    let mut resolved = None;
    for entry in catalog.entries() {
        if entry.starts_with(&data_dir) {
            resolved = Some(entry.clone());
        }
    }

    if resolved.is_none() {
        reporter.warn(format!("No PNG in {}", file_name(&data_dir)));
    }
    ImageBinding {
        resolved,
        canonical: Some(canonical),
    }
}

fn file_name_element(canonical: Option<&str>) -> XmlElement {
    let mut file_name = XmlElement::new("fileName");
    if let Some(canonical) = canonical {
        file_name.set_text(canonical);
    }
    file_name
}

/// Build a `sourceImageInformation` block and insert it right after
/// `Description/MeasurementUnit` (Transkribus documents lack the element).
pub fn inject_source_image_information(
    doc: &mut XmlDocument,
    canonical: Option<&str>,
    path: &Path,
) -> Result<(), AltoConvError> {
    let mut info = XmlElement::new("sourceImageInformation");
    info.push_element(file_name_element(canonical));

    let description =
        doc.root
            .find_first_mut("Description")
            .ok_or_else(|| AltoConvError::MissingElement {
                path: path.to_path_buf(),
                element: "Description".to_string(),
            })?;
    if description.insert_after_child("MeasurementUnit", XmlNode::Element(info)) {
        Ok(())
    } else {
        Err(AltoConvError::MissingElement {
            path: path.to_path_buf(),
            element: "MeasurementUnit".to_string(),
        })
    }
}

/// Overwrite the text of an existing `sourceImageInformation/fileName`
/// element (LIMB and pdfalto documents already carry one).
pub fn set_file_name(
    doc: &mut XmlDocument,
    canonical: Option<&str>,
    path: &Path,
) -> Result<(), AltoConvError> {
    let element =
        doc.root
            .find_first_mut("fileName")
            .ok_or_else(|| AltoConvError::MissingElement {
                path: path.to_path_buf(),
                element: "fileName".to_string(),
            })?;
    element.set_text(canonical.unwrap_or_default());
    Ok(())
}
