//! Zip handling for the Transkribus scenario: guarded extraction of a
//! source archive and re-packaging of the converted files.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::AltoConvError;
use crate::report::Reporter;

const ALLOWED_EXTENSIONS: [&str; 1] = ["zip"];

/// Directory name the converted files are stored under inside the output
/// archive.
const ARCHIVE_MEMBER_DIR: &str = "alto4eScriptorium";

/// Whether a file has an allowed archive extension.
pub fn allowed_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn zip_err(path: &Path) -> impl Fn(zip::result::ZipError) -> AltoConvError + '_ {
    move |source| AltoConvError::Zip {
        path: path.to_path_buf(),
        source,
    }
}

fn member_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn eligible_member(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if !lower.ends_with(".xml") {
        return false;
    }
    if member_file_name(name).starts_with('.') || name.starts_with('.') {
        return false;
    }
    if lower.starts_with("__macosx") {
        return false;
    }
    // 'my_suspicious_file.exe.xml' is ignored too
    if [".exe", ".php", ".asp", ".py"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return false;
    }
    true
}

/// Unpack a Transkribus source archive next to itself, keeping only the XML
/// members, and return the unpacked directory.
///
/// An archive without a `mets.xml` member is rejected before anything is
/// extracted.
pub fn unpack_scenario(source: &Path, reporter: &mut Reporter) -> Result<PathBuf, AltoConvError> {
    if !allowed_archive(source) {
        return Err(AltoConvError::ArchiveExtension(source.to_path_buf()));
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("archive");
    let unpack_dest = source
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_unpacking"));
    if let Err(err) = fs::create_dir(&unpack_dest) {
        if err.kind() == io::ErrorKind::AlreadyExists {
            reporter.warn("The unpacking directory already exists:");
            reporter.warn(format!("\t{}", unpack_dest.display()));
            reporter.warn(
                "This may cause the run to use data not up to date with the source archive",
            );
        } else {
            return Err(err.into());
        }
    }

    let file = File::open(source)?;
    let mut archive = ZipArchive::new(file).map_err(zip_err(source))?;

    let names: Vec<String> = archive.file_names().map(ToOwned::to_owned).collect();
    let kept: Vec<&String> = names.iter().filter(|name| eligible_member(name)).collect();

    if !kept
        .iter()
        .any(|name| member_file_name(name) == "mets.xml")
    {
        return Err(AltoConvError::ArchiveMissingManifest(source.to_path_buf()));
    }

    let mut extracted = 0usize;
    for name in &kept {
        let mut entry = archive.by_name(name).map_err(zip_err(source))?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = unpack_dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    reporter.warn(format!(
        "Ignored {} non-eligible file(s) while unpacking",
        names.len() - extracted
    ));
    reporter.info(format!(
        "Unpacked source archive here: '{}'",
        unpack_dest.display()
    ));
    Ok(unpack_dest)
}

/// Zip the converted `.xml` files in `destination` into
/// `altoconv_<source stem>.zip` next to the destination directory.
///
/// Failing to build the archive is only a warning; the converted files are
/// already on disk.
pub fn pack_destination(
    destination: &Path,
    source: &Path,
    reporter: &mut Reporter,
) -> Option<PathBuf> {
    let source_stem = source
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("export")
        .trim_end_matches("_unpacking");
    let archive_path = destination
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("altoconv_{source_stem}.zip"));

    match write_archive(destination, &archive_path) {
        Ok(()) => {
            reporter.info(format!(
                "Creating a new archive at: {}",
                archive_path.display()
            ));
            reporter.info("You can directly import it into eScriptorium! :)");
            Some(archive_path)
        }
        Err(err) => {
            reporter.warn(format!("Failed at creating a ZIP archive: {err}"));
            None
        }
    }
}

fn write_archive(destination: &Path, archive_path: &Path) -> Result<(), AltoConvError> {
    let mut xml_files: Vec<PathBuf> = fs::read_dir(destination)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    xml_files.sort();

    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for path in &xml_files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        writer
            .start_file(format!("{ARCHIVE_MEMBER_DIR}/{name}"), options)
            .map_err(zip_err(archive_path))?;
        let mut source_file = File::open(path)?;
        io::copy(&mut source_file, &mut writer)?;
    }
    writer.finish().map_err(zip_err(archive_path))?;
    Ok(())
}
