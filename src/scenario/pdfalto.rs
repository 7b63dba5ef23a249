//! pdfalto driver: an `out/` directory of ALTO XML files with per-document
//! `<file>_data/` directories holding the page images.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::alto::geometry;
use crate::alto::image::{self, ImageCatalog};
use crate::alto::namespace;
use crate::alto::schema::{self, AltoVersion, SchemaSource};
use crate::config::RunConfig;
use crate::dom::XmlDocument;
use crate::error::AltoConvError;
use crate::report::Reporter;

use super::transkribus::write_output;
use super::{precondition_failure, process_files, FileOutcome, RunOutcome};

/// pdfalto writes ALTO 3; v4 is still checked first.
const PRECEDENCE: [AltoVersion; 2] = [AltoVersion::V4, AltoVersion::V3];

/// Canvas-to-image ratio pdfalto output is expected to have.
pub const EXPECTED_RATIO: f64 = 16.67;

pub fn run(config: &RunConfig, reporter: &mut Reporter) -> RunOutcome {
    let (catalog, alto_files) = match discover(&config.source) {
        Ok(found) => found,
        Err(err) => return precondition_failure(err, reporter),
    };
    if alto_files.len() != catalog.len() {
        reporter.warn(format!(
            "Didn't find as many images ({}) as xml files ({}).",
            catalog.len(),
            alto_files.len()
        ));
        reporter.warn("It's not necessarily an issue.");
    }
    let destination = config.resolve_destination(&config.source, reporter);

    process_files(&alto_files, reporter, |file, reporter| {
        handle_file(file, &catalog, &destination, config, reporter)
    })
}

/// Collect the eligible XML files directly under `out/` and every `.png`
/// inside the `*_data` directories.
fn discover(source: &Path) -> Result<(ImageCatalog, Vec<PathBuf>), AltoConvError> {
    let out_dir = source.join("out");
    if !out_dir.is_dir() {
        return Err(AltoConvError::NoAltoFiles(source.to_path_buf()));
    }

    let mut alto_files = Vec::new();
    let mut image_files = Vec::new();
    for entry in WalkDir::new(&out_dir).min_depth(1).max_depth(2) {
        let entry = entry.map_err(|err| {
            AltoConvError::Io(err.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("failed to walk the out/ directory")
            }))
        })?;
        let path = entry.path();
        let name = entry.file_name().to_str().unwrap_or_default();
        if entry.depth() == 1
            && entry.file_type().is_file()
            && name.ends_with(".xml")
            && !name.ends_with("_metadata.xml")
        {
            alto_files.push(path.to_path_buf());
        } else if entry.file_type().is_file()
            && name.ends_with(".png")
            && path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("xml_data"))
        {
            image_files.push(path.to_path_buf());
        }
    }
    alto_files.sort();
    image_files.sort();

    if alto_files.is_empty() {
        return Err(AltoConvError::NoAltoFiles(out_dir));
    }
    if image_files.is_empty() {
        return Err(AltoConvError::NoImageFiles(out_dir));
    }
    Ok((ImageCatalog::new(image_files), alto_files))
}

fn handle_file(
    path: &Path,
    catalog: &ImageCatalog,
    destination: &Path,
    config: &RunConfig,
    reporter: &mut Reporter,
) -> Result<FileOutcome, AltoConvError> {
    let mut doc = XmlDocument::read(path)?;

    let tokens = schema::schema_spec(&doc, SchemaSource::DefaultNamespace, path)?;
    reporter.highlight(format!(
        "Found the following schema specs declaration(s): {:?}",
        tokens
    ));
    let version = schema::classify(&tokens, &PRECEDENCE);
    let Some(number) = version.number() else {
        reporter.error("I'm not supposed to get something else than ALTO 3... !");
        return Ok(FileOutcome::Skipped);
    };
    reporter.highlight(format!("Detected ALTO version: v{number}"));

    reporter.highlight("Buckle up, we're fixing the schema declaration!");
    namespace::switch_to_v4(&mut doc, path)?;

    reporter.highlight("Pairing the file with its page image");
    let binding = image::resolve_pdfalto(path, catalog, reporter);

    reporter.highlight("Fixing the ratio (coordinates)");
    let resolved = binding
        .resolved
        .as_deref()
        .ok_or_else(|| AltoConvError::MissingImagePair {
            path: path.to_path_buf(),
        })?;
    let declared = geometry::declared_illustration_size(&doc, path)?;
    let ratio = geometry::compute_ratio(resolved, declared, EXPECTED_RATIO, reporter)?;
    geometry::scale_print_space(&mut doc, ratio, path)?;

    if config.vpadding != 0 {
        reporter.highlight("Adjusting y-axis coords in string nodes");
        geometry::apply_vertical_padding(&mut doc, config.vpadding, path)?;
    }

    reporter.highlight("Wrapping up");
    image::set_file_name(&mut doc, binding.canonical.as_deref(), path)?;

    write_output(&doc, path, destination)?;
    Ok(FileOutcome::Converted)
}
