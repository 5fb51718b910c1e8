/// Directory listing types for the filesystem browse endpoint
use serde::{Deserialize, Serialize};

/// A subdirectory entry in a browse listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Directory name without any path component
    pub name: String,
}

/// A regular file entry in a browse listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name without any path component
    pub name: String,

    /// File size in bytes
    pub size: u64,
}

/// The non-hidden contents of one directory, split into subdirectories and
/// files, each sorted case-insensitively by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseListing {
    pub directories: Vec<DirectoryEntry>,
    pub files: Vec<FileEntry>,
}
