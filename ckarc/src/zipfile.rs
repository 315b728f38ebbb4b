use std::fs::{remove_file, File};
use std::io::copy;
use std::path::{Component, Path};

use ignore::WalkBuilder;
use log::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use ckcore::trailer::open_body;

use crate::compress::{CompressionLevel, Compressor, CreateOptions};
use crate::error::ArchiveError;

fn file_options(level: CompressionLevel) -> SimpleFileOptions {
    match level {
        CompressionLevel::Optimal => SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9)),
        CompressionLevel::Fastest => SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(1)),
        CompressionLevel::NoCompression => {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        }
    }
}

// Zip names are always '/' separated, relative to base
fn entry_name(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn write_zip(
    source_dir: &Path,
    file: File,
    dest: &Path,
    options: &CreateOptions,
) -> Result<(), ArchiveError> {
    // With the base dir, entries are named relative to the source's parent
    let base = if options.include_base_dir {
        source_dir.parent().unwrap_or(source_dir)
    } else {
        source_dir
    };

    let mut zip = ZipWriter::new(file);
    let dest = dest.canonicalize()?;

    let walker = WalkBuilder::new(source_dir)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry?;
        let path = entry.path();

        // Archive being written inside of the directory it archives
        if path == dest.as_path() {
            continue;
        }

        let name = match entry_name(base, path) {
            Some(name) => name,
            None => continue,
        };

        match entry.file_type() {
            Some(ft) if ft.is_dir() => {
                debug!("DIR: {}", name);
                zip.add_directory(name, file_options(options.level))?;
            }
            Some(ft) if ft.is_file() => {
                debug!("COMP: {}", name);
                zip.start_file(name, file_options(options.level))?;
                copy(&mut File::open(path)?, &mut zip)?;
            }
            _ => warn!("SKIP: {}", path.display()),
        }
    }

    zip.finish()?.sync_all()?;
    Ok(())
}

// A failed build leaves no partial archive behind
fn remove_on_error<T>(dest: &Path, result: Result<T, ArchiveError>) -> Result<T, ArchiveError> {
    if result.is_err() {
        if let Err(e) = remove_file(dest) {
            warn!("could not remove partial {}: {}", dest.display(), e);
        }
    }
    result
}

/// Default `Compressor`, a plain zip archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCompressor;

impl Compressor for ZipCompressor {
    fn create(
        &self,
        source_dir: &Path,
        dest: &Path,
        options: &CreateOptions,
    ) -> Result<(), ArchiveError> {
        let source_dir = source_dir.canonicalize()?;

        let file = File::create(dest)?;
        remove_on_error(dest, write_zip(&source_dir, file, dest, options))?;

        info!("created {} ({})", dest.display(), options.level);
        Ok(())
    }

    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), ArchiveError> {
        // The zip reader never sees the trailer
        let mut zip = ZipArchive::new(open_body(archive)?)?;

        info!(
            "extracting {} entries from {} to {}",
            zip.len(),
            archive.display(),
            dest_dir.display()
        );
        zip.extract(dest_dir)?;
        Ok(())
    }
}
