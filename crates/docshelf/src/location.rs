//! Storage location resolution.
//!
//! A database lives at `<base>/<name>/<name>.sqlite3`. The base directory is
//! the shared container when one is configured and resolvable, else the
//! configured directory, else the current working directory.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use docshelf_core::DatabaseConfiguration;

/// Environment variable naming the root under which shared containers live.
pub const SHARED_CONTAINER_ROOT_ENV: &str = "DOCSHELF_SHARED_CONTAINER_ROOT";

/// File extension of database files.
pub const DATABASE_EXTENSION: &str = "sqlite3";

/// Maps a shared container identifier to a directory on disk.
pub trait ContainerResolver {
    /// The container directory, or `None` if the identifier is unknown.
    fn resolve(&self, identifier: &str) -> Option<PathBuf>;
}

impl<F> ContainerResolver for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        self(identifier)
    }
}

/// Resolves containers as existing subdirectories of a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedContainerRoot {
    root: PathBuf,
}

impl SharedContainerRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root taken from [`SHARED_CONTAINER_ROOT_ENV`], if set and non-empty.
    pub fn from_env() -> Option<Self> {
        env::var_os(SHARED_CONTAINER_ROOT_ENV)
            .filter(|root| !root.is_empty())
            .map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContainerResolver for SharedContainerRoot {
    fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        let candidate = self.root.join(identifier);
        candidate.is_dir().then_some(candidate)
    }
}

/// Resolves nothing; used when no shared container root is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContainers;

impl ContainerResolver for NoContainers {
    fn resolve(&self, _identifier: &str) -> Option<PathBuf> {
        None
    }
}

/// Where a database's files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    /// `<base>/<name>`.
    pub directory: PathBuf,
    /// `<base>/<name>/<name>.sqlite3`.
    pub file: PathBuf,
}

/// The base directory for `configuration`.
pub fn base_directory(
    configuration: &DatabaseConfiguration,
    resolver: &dyn ContainerResolver,
) -> io::Result<PathBuf> {
    if let Some(identifier) = configuration.shared_container_id() {
        match resolver.resolve(identifier) {
            Some(container) => return Ok(container),
            None => tracing::warn!(
                container = identifier,
                "shared container not found; falling back to local storage"
            ),
        }
    }

    match configuration.directory() {
        Some(directory) => Ok(directory.to_path_buf()),
        None => env::current_dir(),
    }
}

/// The location of a database without touching the filesystem.
pub fn locate(base: &Path, database_name: &str) -> StorageLocation {
    let directory = base.join(database_name);
    let file = directory.join(format!("{}.{}", database_name, DATABASE_EXTENSION));
    StorageLocation { directory, file }
}

/// Resolve the location and create the database directory if missing.
///
/// Only the last level is created; a missing base directory is an error.
pub fn prepare(
    configuration: &DatabaseConfiguration,
    resolver: &dyn ContainerResolver,
) -> io::Result<StorageLocation> {
    let base = base_directory(configuration, resolver)?;
    let location = locate(&base, configuration.database_name());

    if !location.directory.is_dir() {
        match fs::create_dir(&location.directory) {
            Ok(()) => {
                tracing::debug!(directory = %location.directory.display(), "created database directory")
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }

    Ok(location)
}
