use std::io;
use std::path::{Path, PathBuf};

/// Destination for a finished archive ("save as" in the host).
pub trait ArchiveSink {
    /// Stores the archive and returns where it ended up.
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes archives into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ArchiveSink for DirectorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Keeps saved archives in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub saved: Vec<(String, Vec<u8>)>,
}

impl ArchiveSink for MemorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.saved.push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}
