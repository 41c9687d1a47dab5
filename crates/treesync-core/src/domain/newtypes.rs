//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for storage paths and
//! identifiers. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// JobId
// ============================================================================

/// Identifier of a sync job, used to correlate log lines and outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new random JobId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("{s}: {e}")))
    }
}

// ============================================================================
// StoragePath
// ============================================================================

/// A directory path on the storage backend
///
/// Always absolute (`/`-rooted) and always normalized to end with `/`, so
/// `"/backup"` and `"/backup/"` denote the same directory. Entry names are
/// appended with [`StoragePath::join`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath(String);

impl StoragePath {
    /// Create a new StoragePath, appending the trailing separator if missing
    ///
    /// # Errors
    /// Returns error if the path is not absolute, contains empty components
    /// (`//`) or `.`/`..` components.
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let mut path = path.into();

        if !path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "Storage path must start with '/': {path}"
            )));
        }
        if !path.ends_with('/') {
            path.push('/');
        }
        if path.len() > 1 && path.contains("//") {
            return Err(DomainError::InvalidPath(format!(
                "Storage path contains empty components: {path}"
            )));
        }
        if path.split('/').any(|c| c == "." || c == "..") {
            return Err(DomainError::InvalidPath(format!(
                "Storage path contains relative components: {path}"
            )));
        }

        Ok(Self(path))
    }

    /// Get the inner string reference (always ends with `/`)
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when one path equals or contains the other
    #[must_use]
    pub fn overlaps(&self, other: &StoragePath) -> bool {
        self.0.starts_with(&other.0) || other.0.starts_with(&self.0)
    }

    /// Iterates the directory names from the root down
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Extend the path by one directory name
    ///
    /// # Errors
    /// Returns error if the name is empty, contains `/`, or is `.`/`..`
    pub fn join(&self, name: &str) -> Result<Self, DomainError> {
        validate_entry_name(name)?;
        Ok(Self(format!("{}{name}/", self.0)))
    }

    /// Extend the path by several directory names in order
    ///
    /// # Errors
    /// Returns error on the first invalid name
    pub fn join_all<I, S>(&self, names: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(self.clone(), |path, name| path.join(name.as_ref()))
    }

    /// Full path of an entry directly inside this directory (no trailing `/`)
    #[must_use]
    pub fn entry(&self, name: &str) -> String {
        format!("{}{name}", self.0)
    }
}

/// Checks that `name` is usable as a single entry name
///
/// # Errors
/// Returns [`DomainError::InvalidPath`] for empty names, names with `/`,
/// and the relative names `.`/`..`.
pub fn validate_entry_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(DomainError::InvalidPath(format!(
            "Invalid entry name: {name:?}"
        )));
    }
    Ok(())
}

impl Display for StoragePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoragePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.0
    }
}

/// Parses a colon-delimited destination list into ordered paths
///
/// Empty segments (`"/a::/b"`, trailing `:`) are skipped; each remaining
/// segment is normalized like [`StoragePath::new`].
///
/// # Errors
/// Returns error if a segment is not a valid path or nothing remains.
pub fn parse_destinations(raw: &str) -> Result<Vec<StoragePath>, DomainError> {
    let destinations = raw
        .split(':')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(StoragePath::new)
        .collect::<Result<Vec<_>, _>>()?;

    if destinations.is_empty() {
        return Err(DomainError::InvalidDestinations(format!(
            "no destination in {raw:?}"
        )));
    }
    Ok(destinations)
}

/// Checks that no destination equals, contains or lies inside `source`
///
/// # Errors
/// Returns [`DomainError::OverlappingPaths`] for the first offending destination.
pub fn ensure_disjoint(
    source: &StoragePath,
    destinations: &[StoragePath],
) -> Result<(), DomainError> {
    match destinations.iter().find(|dst| dst.overlaps(source)) {
        Some(dst) => Err(DomainError::OverlappingPaths {
            source_path: source.to_string(),
            destination: dst.to_string(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// TaskId
// ============================================================================

/// Identifier of an asynchronous copy task accepted by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Create a new TaskId
    ///
    /// # Errors
    /// Returns error if the identifier is empty or whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidTaskId(
                "task ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TaskId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}
