// Shared helpers for the zip-packaged Office Open XML formats

use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use super::DocumentFormat;
use crate::Result;

pub(super) fn open_package(path: &Path, format: DocumentFormat) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| format.failure(e))?;
    ZipArchive::new(file)
        .map_err(|e| format.failure(format!("not a valid {} package: {}", format.label(), e)))
}

pub(super) fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
    format: DocumentFormat,
) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| format.failure(format!("missing part {}: {}", name, e)))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format.failure(format!("unreadable part {}: {}", name, e)))?;

    Ok(xml)
}
