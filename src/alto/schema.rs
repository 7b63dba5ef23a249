//! ALTO schema version detection.
//!
//! The schema declaration lives on the root `alto` element: Transkribus
//! exports carry it in `xsi:schemaLocation`, while the LIMB and pdfalto
//! dialects only declare a default namespace. Either way the attribute value
//! is split on whitespace into a set of tokens and matched against the known
//! version URIs.

use std::path::Path;

use crate::dom::{XmlDocument, XmlElement};
use crate::error::AltoConvError;

pub const ALTO_NS_V2: &str = "http://www.loc.gov/standards/alto/ns-v2#";
pub const ALTO_NS_V3: &str = "http://www.loc.gov/standards/alto/ns-v3#";
pub const ALTO_NS_V4: &str = "http://www.loc.gov/standards/alto/ns-v4#";

/// The eScriptorium ALTO 4.1 schema with baseline support.
pub const ALTO_XSD_BASELINES: &str =
    "https://gitlab.inria.fr/scripta/escriptorium/-/raw/develop/app/escriptorium/static/alto-4-1-baselines.xsd";

/// Recognized ALTO v4 schema URLs, including the baselines variant.
pub const ALTO_V4_SPECS: [&str; 4] = [
    "http://www.loc.gov/standards/alto/v4/alto.xsd",
    "http://www.loc.gov/standards/alto/v4/alto-4-0.xsd",
    "http://www.loc.gov/standards/alto/v4/alto-4-1.xsd",
    ALTO_XSD_BASELINES,
];

/// A classified ALTO schema version. [`AltoVersion::Unknown`] is terminal:
/// the file is skipped, never modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltoVersion {
    V2,
    V3,
    V4,
    Unknown,
}

impl AltoVersion {
    pub fn number(self) -> Option<u8> {
        match self {
            AltoVersion::V2 => Some(2),
            AltoVersion::V3 => Some(3),
            AltoVersion::V4 => Some(4),
            AltoVersion::Unknown => None,
        }
    }
}

/// Which root attribute carries the schema declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaSource {
    /// `xsi:schemaLocation` (Transkribus exports).
    SchemaLocation,
    /// The default `xmlns` declaration (LIMB, pdfalto).
    DefaultNamespace,
}

impl SchemaSource {
    fn attribute(self) -> &'static str {
        match self {
            SchemaSource::SchemaLocation => "xsi:schemaLocation",
            SchemaSource::DefaultNamespace => "xmlns",
        }
    }
}

/// Locate the single `alto` root element of a document.
///
/// Zero `alto` elements means this is not an ALTO file at all; more than one
/// means the document is malformed. Both are file-local errors.
pub fn find_alto_root<'a>(
    doc: &'a XmlDocument,
    path: &Path,
) -> Result<&'a XmlElement, AltoConvError> {
    let count = doc.count_named("alto");
    match count {
        0 => Err(AltoConvError::NotAlto {
            path: path.to_path_buf(),
        }),
        1 => {
            if doc.root.local_name() == "alto" {
                Ok(&doc.root)
            } else {
                doc.root
                    .find_first("alto")
                    .ok_or_else(|| AltoConvError::NotAlto {
                        path: path.to_path_buf(),
                    })
            }
        }
        n => Err(AltoConvError::MalformedDocument {
            path: path.to_path_buf(),
            count: n,
        }),
    }
}

/// Read the schema declaration tokens from the root `alto` element.
pub fn schema_spec(
    doc: &XmlDocument,
    source: SchemaSource,
    path: &Path,
) -> Result<Vec<String>, AltoConvError> {
    let root = find_alto_root(doc, path)?;
    let raw = root.attr(source.attribute()).unwrap_or_default();
    Ok(raw.split_whitespace().map(ToOwned::to_owned).collect())
}

/// Classify a schema spec, trying candidate versions in the given order.
/// The token sets are disjoint, so the order only decides which set is
/// inspected first; the first match wins.
pub fn classify(tokens: &[String], precedence: &[AltoVersion]) -> AltoVersion {
    for version in precedence {
        let matched = match version {
            AltoVersion::V2 => tokens.iter().any(|t| t == ALTO_NS_V2),
            AltoVersion::V3 => tokens.iter().any(|t| t == ALTO_NS_V3),
            AltoVersion::V4 => tokens.iter().any(|t| ALTO_V4_SPECS.contains(&t.as_str())),
            AltoVersion::Unknown => false,
        };
        if matched {
            return *version;
        }
    }
    AltoVersion::Unknown
}
