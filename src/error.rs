use std::path::PathBuf;
use thiserror::Error;

/// The main error type for altoconv operations.
#[derive(Debug, Error)]
pub enum AltoConvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse XML from {path}: {message}")]
    XmlParse { path: PathBuf, message: String },

    #[error("{path} is not an ALTO document (no <alto> element)")]
    NotAlto { path: PathBuf },

    #[error("Malformed ALTO document {path}: found {count} <alto> elements")]
    MalformedDocument { path: PathBuf, count: usize },

    #[error("Unrecognized ALTO schema in {path}: {tokens:?}")]
    UnknownSchema { path: PathBuf, tokens: Vec<String> },

    #[error("Missing <{element}> in {path}")]
    MissingElement { path: PathBuf, element: String },

    #[error("No image file paired with {path}")]
    MissingImagePair { path: PathBuf },

    #[error("Invalid {attribute} value '{value}' in {path}")]
    InvalidAttribute {
        path: PathBuf,
        attribute: String,
        value: String,
    },

    #[error("Failed to read image dimensions from {path}: {message}")]
    ImageSize { path: PathBuf, message: String },

    #[error("Archive error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("'{0}' does not have an allowed archive extension (zip)")]
    ArchiveExtension(PathBuf),

    #[error("{0} is not a valid Transkribus archive (no mets.xml member)")]
    ArchiveMissingManifest(PathBuf),

    #[error("No mets.xml found in {0}")]
    MissingManifest(PathBuf),

    #[error("No image references found in the METS manifest under {0}")]
    NoImageReferences(PathBuf),

    #[error("No eligible ALTO XML files found in {0}")]
    NoAltoFiles(PathBuf),

    #[error("No eligible image files found in {0}")]
    NoImageFiles(PathBuf),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}
