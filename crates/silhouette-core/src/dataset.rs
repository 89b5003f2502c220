//! Labeled image datasets on disk.
//!
//! A dataset is a flat directory of images whose file names start with the
//! class label, e.g. `3_front_017.png` for class 3.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::image::{ImageBuffer, ImageView};

/// Extension selected by default when scanning a dataset directory.
pub const DEFAULT_EXTENSION: &str = "png";

/// One labeled image file.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetEntry {
    /// Path to the image.
    pub path: PathBuf,
    /// Class label parsed from the file name.
    pub label: f32,
}

/// Regular files in `dir` whose extension matches `extension`, ignoring case.
///
/// Results are sorted by file name.
pub fn scan_directory(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let io_err = |source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches && entry.file_type().map_err(io_err)?.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Class label encoded by the first character of `file_name`.
pub fn label_from_file_name(file_name: &str) -> Result<f32> {
    file_name
        .chars()
        .next()
        .and_then(|c| c.to_string().parse::<f32>().ok())
        .ok_or_else(|| PipelineError::InvalidLabel(file_name.to_owned()))
}

/// Files of a dataset directory, split by whether their name carries a label.
#[derive(Debug, Default)]
pub struct DatasetListing {
    /// Labeled files, sorted by name.
    pub entries: Vec<DatasetEntry>,
    /// Files whose name has no label, with the reason.
    pub unlabeled: Vec<(PathBuf, PipelineError)>,
}

/// Scan `dir` and pair every matching file with its label.
///
/// Only a directory that cannot be read fails; a file without a label is
/// listed in [`DatasetListing::unlabeled`].
pub fn load_entries(dir: &Path, extension: &str) -> Result<DatasetListing> {
    let mut listing = DatasetListing::default();
    for path in scan_directory(dir, extension)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match label_from_file_name(&name) {
            Ok(label) => listing.entries.push(DatasetEntry { path, label }),
            Err(err) => listing.unlabeled.push((path, err)),
        }
    }
    Ok(listing)
}

/// Decode an image file into an 8-bit grayscale buffer.
pub fn load_grayscale(path: &Path) -> Result<ImageBuffer> {
    let reader = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let gray = reader
        .decode()
        .map_err(|source| PipelineError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    ImageBuffer::from_raw(gray.into_raw(), width, height)
}

/// Encode `img` to `path`; the format follows the extension.
pub fn save_grayscale(img: &ImageView, path: &Path) -> Result<()> {
    let buffer = img.to_buffer();
    let (width, height) = (buffer.width() as u32, buffer.height() as u32);
    let gray = image::GrayImage::from_raw(width, height, buffer.into_raw()).ok_or_else(|| {
        PipelineError::InvalidBuffer(format!("cannot encode {width}x{height} image"))
    })?;
    gray.save(path).map_err(|source| PipelineError::Encode {
        path: path.to_path_buf(),
        source,
    })
}
