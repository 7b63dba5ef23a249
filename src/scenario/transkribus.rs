//! Transkribus export driver: `mets.xml` + `alto/` directory, possibly
//! packaged as a zip archive.

use std::fs;
use std::path::{Path, PathBuf};

use crate::alto::image::{self, ImageCatalog};
use crate::alto::namespace;
use crate::alto::schema::{self, AltoVersion, SchemaSource};
use crate::alto::structure;
use crate::alto::geometry;
use crate::archive;
use crate::config::RunConfig;
use crate::dom::XmlDocument;
use crate::error::AltoConvError;
use crate::report::Reporter;

use super::{list_directory, precondition_failure, process_files, FileOutcome, RunOutcome};

/// Version precedence for Transkribus documents: v4 checked before v2.
const PRECEDENCE: [AltoVersion; 2] = [AltoVersion::V4, AltoVersion::V2];

pub fn run(config: &RunConfig, reporter: &mut Reporter) -> RunOutcome {
    let source = match prepare_source(config, reporter) {
        Ok(source) => source,
        Err(err) => return precondition_failure(err, reporter),
    };
    let was_archive = source != config.source;
    let destination = config.resolve_destination(&source, reporter);

    let (catalog, alto_files) = match discover(&source, reporter) {
        Ok(found) => found,
        Err(err) => return precondition_failure(err, reporter),
    };

    let outcome = process_files(&alto_files, reporter, |file, reporter| {
        handle_file(file, &catalog, &destination, reporter)
    });

    if was_archive && !outcome.has_failed() {
        archive::pack_destination(&destination, &source, reporter);
    }
    outcome
}

/// Unpack a zip source next to itself; a plain directory is used as-is.
fn prepare_source(config: &RunConfig, reporter: &mut Reporter) -> Result<PathBuf, AltoConvError> {
    if config.source.is_file() {
        reporter.highlight("Source is an archive, running unzipping scenario.");
        let unpacked = archive::unpack_scenario(&config.source, reporter)?;
        reporter.info(format!("Source is now: {}", unpacked.display()));
        Ok(unpacked)
    } else {
        reporter.highlight("Source is not an archive.");
        Ok(config.source.clone())
    }
}

/// Build the image catalog from `mets.xml` and collect the `alto/` files.
fn discover(
    source: &Path,
    reporter: &mut Reporter,
) -> Result<(ImageCatalog, Vec<PathBuf>), AltoConvError> {
    let package = list_directory(source)?;

    let mets = package
        .iter()
        .find(|entry| entry.file_name().and_then(|n| n.to_str()) == Some("mets.xml"))
        .ok_or_else(|| AltoConvError::MissingManifest(source.to_path_buf()))?;
    let references = crate::mets::image_references(mets, reporter)?;
    if references.is_empty() {
        return Err(AltoConvError::NoImageReferences(source.to_path_buf()));
    }

    let alto_dir = package
        .iter()
        .find(|entry| {
            entry.is_dir() && entry.file_name().and_then(|n| n.to_str()) == Some("alto")
        })
        .ok_or_else(|| AltoConvError::NoAltoFiles(source.to_path_buf()))?;
    let alto_files: Vec<PathBuf> = list_directory(alto_dir)?
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    if alto_files.is_empty() {
        return Err(AltoConvError::NoAltoFiles(alto_dir.clone()));
    }

    Ok((ImageCatalog::new(references), alto_files))
}

fn handle_file(
    path: &Path,
    catalog: &ImageCatalog,
    destination: &Path,
    reporter: &mut Reporter,
) -> Result<FileOutcome, AltoConvError> {
    let mut doc = XmlDocument::read(path)?;

    let tokens = schema::schema_spec(&doc, SchemaSource::SchemaLocation, path)?;
    reporter.highlight(format!("Schema Specs: {:?}", tokens));
    let version = schema::classify(&tokens, &PRECEDENCE);
    let Some(number) = version.number() else {
        reporter.error("I can't handle anything other than ALTO v2 or v4!");
        return Ok(FileOutcome::Skipped);
    };
    reporter.highlight(format!("Detected ALTO version: v{number}"));

    // even an ALTO 4 file still needs the eScriptorium schema declaration
    reporter.highlight("Buckle up, we're fixing the schema declaration!");
    namespace::switch_to_v4(&mut doc, path)?;

    reporter.highlight("Adding a <sourceImageInformation> element to point towards the image file");
    let binding = image::resolve_transkribus(path, catalog, reporter);
    if let Err(err) =
        image::inject_source_image_information(&mut doc, binding.canonical.as_deref(), path)
    {
        // reported but non-fatal: the rest of the pipeline still applies
        reporter.error(
            "Oops, something went wrong with injecting <sourceImageInformation> in the XML file",
        );
        reporter.error(err.to_string());
    }

    reporter.highlight("I'm now looking for <ComposedBlock> and removing them");
    structure::remove_composed_blocks(&mut doc);

    reporter.highlight("I'm looking at the baselines and fixing them");
    geometry::extrapolate_baselines(&mut doc, path)?;

    reporter.highlight("I'm cleaning the file");
    geometry::reformat_polygon_points(&mut doc);

    write_output(&doc, path, destination)?;
    Ok(FileOutcome::Converted)
}

pub(super) fn write_output(
    doc: &XmlDocument,
    source_path: &Path,
    destination: &Path,
) -> Result<(), AltoConvError> {
    fs::create_dir_all(destination)?;
    let file_name = source_path.file_name().unwrap_or(source_path.as_os_str());
    doc.write(&destination.join(file_name))
}
