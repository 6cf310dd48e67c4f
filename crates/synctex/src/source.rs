//! Locating the synctex file of an output document and opening it.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::names::{last_path_component, quoted_last_component, strip_last_path_extension};
use crate::types::OpenError;

const EXTENSIONS: [&str; 2] = [".synctex", ".synctex.gz"];

/// A synctex file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTexFile {
    pub path: PathBuf,
    /// Whether the file is gzip compressed, judged by its extension.
    pub compressed: bool,
}

impl SyncTexFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let compressed = path.extension().is_some_and(|ext| ext == "gz");
        Self { path, compressed }
    }

    /// Open the file for reading, decompressing it if needed.
    pub fn open(&self) -> Result<Box<dyn Read>, OpenError> {
        let file = File::open(&self.path).map_err(|source| OpenError::Io {
            path: self.path.clone(),
            source,
        })?;
        if self.compressed {
            Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
        } else {
            Ok(Box::new(file))
        }
    }
}

/// Find the synctex file for `output`, e.g. `main.synctex.gz` for
/// `main.pdf`.
///
/// `build_directory` is searched when nothing is found next to the output.
/// A relative build directory is taken relative to the output's directory.
pub fn locate(output: &Path, build_directory: Option<&Path>) -> Result<SyncTexFile, OpenError> {
    let bad_name = || OpenError::BadOutputName(output.to_path_buf());
    let name = output.to_str().ok_or_else(bad_name)?;
    let core = strip_last_path_extension(name);
    if last_path_component(core).is_empty() {
        return Err(bad_name());
    }
    if let Some(found) = locate_core(core) {
        return Ok(found);
    }

    if let Some(build) = build_directory {
        let build = if build.is_absolute() {
            build.to_path_buf()
        } else {
            output.parent().unwrap_or(Path::new("")).join(build)
        };
        let moved = build.join(last_path_component(core));
        if let Some(found) = moved.to_str().and_then(locate_core) {
            return Ok(found);
        }
    }
    Err(OpenError::NotFound(output.to_path_buf()))
}

/// Try `<core>.synctex` then `<core>.synctex.gz`, quoted variants first.
///
/// A quoted file that is found gets renamed to its unquoted name.
fn locate_core(core: &str) -> Option<SyncTexFile> {
    let quoted = quoted_last_component(core);
    for ext in EXTENSIONS {
        let plain = PathBuf::from(format!("{core}{ext}"));
        if let Some(quoted) = &quoted {
            let quoted = PathBuf::from(format!("{quoted}{ext}"));
            if quoted.is_file() {
                return Some(match fs::rename(&quoted, &plain) {
                    Ok(()) => SyncTexFile::new(plain),
                    Err(err) => {
                        log::warn!("could not rename {}: {err}", quoted.display());
                        SyncTexFile::new(quoted)
                    }
                });
            }
        }
        if plain.is_file() {
            log::debug!("using {}", plain.display());
            return Some(SyncTexFile::new(plain));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assert_matches::assert_matches;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_prefers_plain_over_gz() {
        let dir = TempDir::new("synctex-source").unwrap();
        fs::write(dir.path().join("main.synctex"), "").unwrap();
        fs::write(dir.path().join("main.synctex.gz"), "").unwrap();
        let found = locate(&dir.path().join("main.pdf"), None).unwrap();
        assert_eq!(found.path, dir.path().join("main.synctex"));
        assert!(!found.compressed);
    }

    #[test]
    fn test_finds_gz() {
        let dir = TempDir::new("synctex-source").unwrap();
        fs::write(dir.path().join("main.synctex.gz"), "").unwrap();
        let found = locate(&dir.path().join("main.pdf"), None).unwrap();
        assert!(found.compressed);
    }

    #[test]
    fn test_renames_quoted_file() {
        let dir = TempDir::new("synctex-source").unwrap();
        fs::write(dir.path().join("\"my thesis\".synctex.gz"), "").unwrap();
        let found = locate(&dir.path().join("my thesis.pdf"), None).unwrap();
        assert_eq!(found.path, dir.path().join("my thesis.synctex.gz"));
        assert!(found.path.is_file());
        assert!(!dir.path().join("\"my thesis\".synctex.gz").exists());
    }

    #[test]
    fn test_build_directory() {
        let dir = TempDir::new("synctex-source").unwrap();
        fs::create_dir(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/main.synctex"), "").unwrap();
        let output = dir.path().join("main.pdf");
        assert_matches!(locate(&output, None), Err(OpenError::NotFound(_)));
        let found = locate(&output, Some(Path::new("build"))).unwrap();
        assert_eq!(found.path, dir.path().join("build").join("main.synctex"));
    }

    #[test]
    fn test_bad_output_name() {
        assert_matches!(locate(Path::new("/tmp/"), None), Err(OpenError::BadOutputName(_)));
    }
}
