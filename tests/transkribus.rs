//! End-to-end runs of the Transkribus scenario against on-disk fixtures.

mod common;

use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use altoconv::dom::XmlDocument;
use altoconv::{scenario, Reporter, RunConfig, RunStatus, Scenario};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use common::{mets_manifest, transkribus_alto_v2, write_file};

fn config(source: &Path) -> RunConfig {
    RunConfig {
        scenario: Scenario::Transkribus,
        source: source.to_path_buf(),
        destination: None,
        talkative: false,
        vpadding: 0,
    }
}

/// Lay out a Transkribus export: a manifest referencing three images, but
/// only two ALTO files.
fn build_export(root: &Path) {
    write_file(
        &root.join("mets.xml"),
        mets_manifest(&["page1.jpg", "page2.jpg", "page3.jpg"]),
    );
    write_file(&root.join("alto").join("page1.xml"), transkribus_alto_v2());
    write_file(&root.join("alto").join("page2.xml"), transkribus_alto_v2());
}

#[test]
fn directory_export_is_converted_in_place() {
    let temp = tempfile::tempdir().expect("temp dir");
    let export = temp.path().join("export");
    build_export(&export);

    let mut reporter = Reporter::new(false);
    let outcome = scenario::run(&config(&export), &mut reporter);

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.processed, 2);
    assert_eq!(outcome.failed, 0);

    let destination = export.join("alto_escriptorium");
    let converted = XmlDocument::read(&destination.join("page1.xml")).expect("read output");

    let root = &converted.root;
    assert_eq!(
        root.attr("xmlns"),
        Some("http://www.loc.gov/standards/alto/ns-v4#")
    );
    let schema_location = root.attr("xsi:schemaLocation").expect("schemaLocation");
    assert!(schema_location.starts_with("http://www.loc.gov/standards/alto/ns-v4# "));
    assert!(schema_location.ends_with("alto-4-1-baselines.xsd"));

    // ComposedBlock unwrapped, its children kept
    assert!(root.find_first("ComposedBlock").is_none());
    assert!(root.find_first("TextBlock").is_some());

    let file_name = root.find_first("fileName").expect("fileName");
    assert_eq!(file_name.text(), "page1.jpg");

    let line = root.find_first("TextLine").expect("TextLine");
    assert_eq!(line.attr("BASELINE"), Some("487 1097 2891 1097"));

    let polygon = root.find_first("Polygon").expect("Polygon");
    assert_eq!(polygon.attr("POINTS"), Some("1 2 3 4"));

    // the third manifest image matches no ALTO file and that is fine
    assert!(destination.join("page2.xml").is_file());
}

#[test]
fn archive_export_round_trips_to_a_new_archive() {
    let temp = tempfile::tempdir().expect("temp dir");
    let zip_path = temp.path().join("export.zip");

    let file = File::create(&zip_path).expect("create zip");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("mets.xml", mets_manifest(&["page1.jpg"])),
        ("alto/page1.xml", transkribus_alto_v2()),
    ] {
        writer.start_file(name, options).expect("start member");
        writer.write_all(content.as_bytes()).expect("write member");
    }
    writer.finish().expect("finish zip");

    let mut reporter = Reporter::new(false);
    let outcome = scenario::run(&config(&zip_path), &mut reporter);
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.processed, 1);

    let unpacked = temp.path().join("export_unpacking");
    assert!(unpacked.join("mets.xml").is_file());
    assert!(unpacked
        .join("alto_escriptorium")
        .join("page1.xml")
        .is_file());

    let archive_path = unpacked.join("altoconv_export.zip");
    let mut archive =
        ZipArchive::new(File::open(&archive_path).expect("open archive")).expect("read archive");
    let names: Vec<String> = archive.file_names().map(ToOwned::to_owned).collect();
    assert_eq!(names, vec!["alto4eScriptorium/page1.xml".to_string()]);
    assert!(archive.by_index(0).is_ok());
}

#[test]
fn missing_manifest_fails_before_any_conversion() {
    let temp = tempfile::tempdir().expect("temp dir");
    let export = temp.path().join("export");
    write_file(&export.join("alto").join("page1.xml"), transkribus_alto_v2());

    let mut reporter = Reporter::new(false);
    let outcome = scenario::run(&config(&export), &mut reporter);
    assert_eq!(outcome.status, RunStatus::Failed);
    assert!(outcome.message.contains("mets.xml"));
    assert!(!export.join("alto_escriptorium").exists());
}

#[test]
fn empty_image_group_fails_the_run() {
    let temp = tempfile::tempdir().expect("temp dir");
    let export = temp.path().join("export");
    write_file(&export.join("mets.xml"), mets_manifest(&[]));
    write_file(&export.join("alto").join("page1.xml"), transkribus_alto_v2());

    let mut reporter = Reporter::new(false);
    let outcome = scenario::run(&config(&export), &mut reporter);
    assert_eq!(outcome.status, RunStatus::Failed);
    assert!(outcome.message.contains("Export Image"));
}

#[test]
fn unsupported_versions_are_skipped_not_failed() {
    let temp = tempfile::tempdir().expect("temp dir");
    let export = temp.path().join("export");
    write_file(&export.join("mets.xml"), mets_manifest(&["page1.jpg"]));
    write_file(&export.join("alto").join("page1.xml"), transkribus_alto_v2());
    write_file(
        &export.join("alto").join("page2.xml"),
        r#"<?xml version="1.0"?>
<alto xmlns="http://www.loc.gov/standards/alto/ns-v3#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.loc.gov/standards/alto/ns-v3# http://www.loc.gov/standards/alto/v3/alto.xsd">
  <Description><MeasurementUnit>pixel</MeasurementUnit></Description>
</alto>
"#,
    );

    let mut reporter = Reporter::new(false);
    let outcome = scenario::run(&config(&export), &mut reporter);
    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(export
        .join("alto_escriptorium")
        .join("page1.xml")
        .is_file());
    assert!(!export
        .join("alto_escriptorium")
        .join("page2.xml")
        .exists());
}
