use crate::error::{AppError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Extract every entry of the zip at `archive_path` into `target_dir`.
/// Returns the extracted file paths.
pub fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
    let reader = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(reader)?;
    fs::create_dir_all(target_dir)?;

    let mut extracted = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        let Some(relative_path) = file.enclosed_name().as_deref().map(Path::to_path_buf) else {
            return Err(AppError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid file path in archive: {}", file.name()),
            )));
        };

        let out_path = target_dir.join(relative_path);
        if file.name().ends_with('/') {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!("Decompressing file: {}", file.name());
        let mut outfile = fs::File::create(&out_path)?;
        io::copy(&mut file, &mut outfile)?;
        extracted.push(out_path);
    }

    Ok(extracted)
}

/// Compress the regular files directly under `source_dir` into a new zip at
/// `archive_path`. An empty source directory is an error.
pub fn zip_dir(source_dir: &Path, archive_path: &Path) -> Result<usize> {
    let files = list_files(source_dir)?;
    if files.is_empty() {
        return Err(AppError::EmptyDirectory(source_dir.to_path_buf()));
    }

    let mut writer = zip::ZipWriter::new(fs::File::create(archive_path)?);
    let options = SimpleFileOptions::default();
    for path in &files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        writer.start_file(name, options)?;
        let mut input = fs::File::open(path)?;
        io::copy(&mut input, &mut writer)?;
    }
    writer.finish()?;

    Ok(files.len())
}

/// Regular files directly under `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
