//! Appending post scriptum overrides to an existing synctex file.
//!
//! Post processors that rescale or shift the output record the change in
//! the post scriptum so that later queries see the final geometry. Lines
//! are only honoured when the file already carries a `Post scriptum:`
//! marker, which engines write after the postamble.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::source::{self, SyncTexFile};
use crate::types::OpenError;

enum Sink {
    Plain(File),
    /// Appended data becomes a new gzip member.
    Gzip(GzEncoder<File>),
}

impl Sink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Sink::Plain(file) => file.write_all(data),
            Sink::Gzip(encoder) => encoder.write_all(data),
        }
    }

    fn close(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut file) => file.flush(),
            Sink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

/// Appends overrides to a synctex file, then a `!<length>` trailer when
/// it is finished or dropped.
pub struct Updater {
    sink: Option<Sink>,
    length: usize,
    path: PathBuf,
}

impl Updater {
    /// Open the synctex file of `output` for appending.
    pub fn new_with_output_file(output: impl AsRef<Path>, build_directory: Option<&Path>) -> Result<Self, OpenError> {
        Self::open(&source::locate(output.as_ref(), build_directory)?)
    }

    pub fn open(file: &SyncTexFile) -> Result<Self, OpenError> {
        let handle = OpenOptions::new()
            .append(true)
            .open(&file.path)
            .map_err(|source| OpenError::Io {
                path: file.path.clone(),
                source,
            })?;
        let sink = if file.compressed {
            Sink::Gzip(GzEncoder::new(handle, Compression::default()))
        } else {
            Sink::Plain(handle)
        };
        log::debug!("updating {}", file.path.display());
        Ok(Self {
            sink: Some(sink),
            length: 0,
            path: file.path.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended so far, the trailer excluded.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Append `Magnification:<value>`. Empty values are skipped.
    pub fn append_magnification(&mut self, value: &str) -> io::Result<()> {
        self.append("Magnification:", value)
    }

    /// Append `X Offset:<value>`, a dimension such as `1in`.
    pub fn append_x_offset(&mut self, value: &str) -> io::Result<()> {
        self.append("X Offset:", value)
    }

    pub fn append_y_offset(&mut self, value: &str) -> io::Result<()> {
        self.append("Y Offset:", value)
    }

    fn append(&mut self, key: &str, value: &str) -> io::Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::Other, "updater is closed"));
        };
        let line = format!("{key}{value}\n");
        sink.write_all(line.as_bytes())?;
        self.length += line.len();
        Ok(())
    }

    /// Write the trailer and close the file.
    pub fn finish(mut self) -> io::Result<()> {
        self.close()
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        if self.length > 0 {
            sink.write_all(format!("!{}\n", self.length).as_bytes())?;
        }
        sink.close()
    }
}

impl Drop for Updater {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("could not finish {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;

    use flate2::read::MultiGzDecoder;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_append_plain() {
        let dir = TempDir::new("synctex-updater").unwrap();
        let path = dir.path().join("main.synctex");
        fs::write(&path, "Post scriptum:\n").unwrap();

        let mut updater = Updater::new_with_output_file(dir.path().join("main.pdf"), None).unwrap();
        updater.append_magnification("2").unwrap();
        updater.append_x_offset("").unwrap();
        updater.append_y_offset("1in").unwrap();
        assert_eq!(updater.len(), "Magnification:2\nY Offset:1in\n".len());
        updater.finish().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Post scriptum:\nMagnification:2\nY Offset:1in\n!29\n"
        );
    }

    #[test]
    fn test_nothing_appended() {
        let dir = TempDir::new("synctex-updater").unwrap();
        let path = dir.path().join("main.synctex");
        fs::write(&path, "x").unwrap();
        drop(Updater::open(&SyncTexFile::new(&path)).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_append_gzip_member() {
        let dir = TempDir::new("synctex-updater").unwrap();
        let path = dir.path().join("main.synctex.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"Post scriptum:\n").unwrap();
        encoder.finish().unwrap();

        let mut updater = Updater::open(&SyncTexFile::new(&path)).unwrap();
        updater.append_x_offset("10pt").unwrap();
        drop(updater);

        let mut text = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "Post scriptum:\nX Offset:10pt\n!14\n");
    }
}
