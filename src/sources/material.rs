//! Blocking reads of certificate material.

use super::ReloadSource;
use crate::error::{ReloadError, Result};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Reads raw bytes from durable storage.
///
/// Implementations are blocking and are only ever called from tokio's
/// blocking pool, never from the thread driving the server.
pub trait MaterialReader: Send + Sync {
    /// Read the full content of `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file is missing or unreadable.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads material from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl MaterialReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Raw bytes read for one reload attempt.
///
/// Only the fields selected by the source are populated: PEM pairs win over
/// the keystore, the truststore is read whenever it is configured.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoadedMaterial {
    /// Certificate blobs, in source order
    pub certs: Vec<Vec<u8>>,
    /// Key blobs, in source order
    pub keys: Vec<Vec<u8>>,
    /// Keystore content
    pub key_store: Option<Vec<u8>>,
    /// Truststore content
    pub trust_store: Option<Vec<u8>>,
}

impl LoadedMaterial {
    /// Returns `true` if PEM pairs were loaded.
    pub fn has_pem(&self) -> bool {
        !self.certs.is_empty() && !self.keys.is_empty()
    }
}

impl fmt::Debug for LoadedMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedMaterial")
            .field("certs", &self.certs.len())
            .field("keys", &self.keys.len())
            .field("key_store", &self.key_store.as_ref().map(Vec::len))
            .field("trust_store", &self.trust_store.as_ref().map(Vec::len))
            .finish()
    }
}

/// Loads every file named by a [`ReloadSource`].
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_tls::sources::{MaterialLoader, ReloadSource};
///
/// # fn example() -> hotswap_tls::error::Result<()> {
/// let loader = MaterialLoader::new();
/// let material = loader.load(&ReloadSource::pem("cert.pem", "key.pem"))?;
/// assert_eq!(material.certs.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MaterialLoader {
    reader: Arc<dyn MaterialReader>,
}

impl MaterialLoader {
    /// Create a loader reading from the local filesystem.
    pub fn new() -> Self {
        Self::with_reader(FsReader)
    }

    /// Create a loader backed by a custom reader.
    pub fn with_reader<R: MaterialReader + 'static>(reader: R) -> Self {
        Self {
            reader: Arc::new(reader),
        }
    }

    /// Read all material the source selects.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Read`] for the first file that cannot be read.
    /// Nothing is returned unless every selected file was read.
    pub fn load(&self, source: &ReloadSource) -> Result<LoadedMaterial> {
        let mut material = LoadedMaterial::default();

        if source.is_pem() {
            material.certs = self.read_all(&source.files)?;
            material.keys = self.read_all(&source.key_files)?;
        } else if let Some(path) = &source.key_store_file {
            material.key_store = Some(self.read(path)?);
        }

        if let Some(path) = &source.trust_store_file {
            material.trust_store = Some(self.read(path)?);
        }

        Ok(material)
    }

    fn read_all<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<Vec<u8>>> {
        paths.iter().map(|p| self.read(p.as_ref())).collect()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.reader.read(path).map_err(|source| ReloadError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for MaterialLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MaterialLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialLoader").finish_non_exhaustive()
    }
}
