use std::io::{self, Cursor, Write};

use foundation::SequenceId;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub const IMAGE_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error while writing archive: {0}")]
    Io(#[from] io::Error),
}

/// `{sequence}_{index:04}_{image}.jpg`, `index` being the 1-based position in
/// the download order.
pub fn entry_name(sequence_id: &SequenceId, index: usize, image_id: &str) -> String {
    format!("{sequence_id}_{index:04}_{image_id}.{IMAGE_EXTENSION}")
}

pub fn archive_file_name(sequence_id: &SequenceId) -> String {
    format!("mapillary_sequence_{sequence_id}.zip")
}

/// In-memory zip builder.
///
/// Entries are stored uncompressed (the payloads are already JPEG) with a
/// fixed timestamp, so the same inputs always produce the same bytes.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default());
        self.zip.start_file(name, options)?;
        self.zip.write_all(bytes)?;
        self.entries.push(name.to_string());
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}
