//! LIMB driver: a flat directory of paired ALTO XML and image files.

use std::path::{Path, PathBuf};

use crate::alto::geometry;
use crate::alto::image::{self, ImageCatalog};
use crate::alto::namespace;
use crate::alto::schema::{self, AltoVersion, SchemaSource};
use crate::config::RunConfig;
use crate::dom::XmlDocument;
use crate::error::AltoConvError;
use crate::report::Reporter;

use super::transkribus::write_output;
use super::{list_directory, precondition_failure, process_files, FileOutcome, RunOutcome};

/// LIMB documents declare their version through `xmlns`; v4 is checked
/// first, then the legacy versions.
const PRECEDENCE: [AltoVersion; 3] = [AltoVersion::V4, AltoVersion::V2, AltoVersion::V3];

/// Canvas-to-image ratio LIMB output is expected to have.
pub const EXPECTED_RATIO: f64 = 3.00;

pub fn run(config: &RunConfig, reporter: &mut Reporter) -> RunOutcome {
    let (catalog, alto_files) = match discover(&config.source, reporter) {
        Ok(found) => found,
        Err(err) => return precondition_failure(err, reporter),
    };
    let destination = config.resolve_destination(&config.source, reporter);

    process_files(&alto_files, reporter, |file, reporter| {
        handle_file(file, &catalog, &destination, config, reporter)
    })
}

/// Split the source directory into XML files and images; anything that is
/// not `.xml` is assumed to be an image.
fn discover(
    source: &Path,
    reporter: &mut Reporter,
) -> Result<(ImageCatalog, Vec<PathBuf>), AltoConvError> {
    let mut package = list_directory(source)?;
    // a single wrapping directory (fresh archive extraction) is descended into
    if package.len() == 1 && package[0].is_dir() {
        package = list_directory(&package[0])?;
    }

    let mut alto_files = Vec::new();
    let mut image_files = Vec::new();
    for entry in package {
        if !entry.is_file() {
            continue;
        }
        let is_xml = entry
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if is_xml {
            alto_files.push(entry);
        } else {
            image_files.push(entry);
        }
    }

    if alto_files.is_empty() {
        return Err(AltoConvError::NoAltoFiles(source.to_path_buf()));
    }
    if image_files.is_empty() {
        return Err(AltoConvError::NoImageFiles(source.to_path_buf()));
    }
    if image_files.len() != alto_files.len() {
        reporter.warn(format!(
            "Didn't find as many images ({}) as xml files ({}).",
            image_files.len(),
            alto_files.len()
        ));
        reporter.warn("It's not necessarily an issue.");
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
        reporter.error("I'm not supposed to get something else than ALTO 2, 3 or 4... !");
        return Ok(FileOutcome::Skipped);
    };
    reporter.highlight(format!("Detected ALTO version: v{number}"));

    reporter.highlight("Buckle up, we're fixing the schema declaration!");
    namespace::switch_to_v4(&mut doc, path)?;

    reporter.highlight("Pairing the file with its source image");
    let binding = image::resolve_limb(path, catalog, reporter);

    reporter.highlight("Fixing the ratio (coordinates)");
    let resolved = binding
        .resolved
        .as_deref()
        .ok_or_else(|| AltoConvError::MissingImagePair {
            path: path.to_path_buf(),
        })?;
    let declared = geometry::declared_page_size(&doc, path)?;
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
