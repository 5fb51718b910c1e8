//! Filesystem browse endpoint for picking media to load.

use std::io;
use std::path::Path;

use log::warn;
use rocket::response::status::NotFound;
use rocket::serde::json::Json;

use crate::data::{BrowseListing, DirectoryEntry, FileEntry};

/// List the non-hidden entries of a directory, split into subdirectories
/// and regular files. Entries whose metadata cannot be read are skipped;
/// anything that is neither a file nor a directory is left out as well.
pub fn list_directory(dir: &Path) -> io::Result<BrowseListing> {
    let mut directories = Vec::new();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };

        if metadata.is_dir() {
            directories.push(DirectoryEntry { name });
        } else if metadata.is_file() {
            files.push(FileEntry {
                name,
                size: metadata.len(),
            });
        }
    }

    directories.sort_by_key(|d| d.name.to_lowercase());
    files.sort_by_key(|f| f.name.to_lowercase());

    Ok(BrowseListing { directories, files })
}

// Directory listing endpoint, e.g. GET /api/browse?path=/media
#[rocket::get("/browse?<path>")]
pub fn browse(path: &str) -> Result<Json<BrowseListing>, NotFound<String>> {
    match list_directory(Path::new(path)) {
        Ok(listing) => Ok(Json(listing)),
        Err(e) => {
            warn!("cannot browse {}: {}", path, e);
            Err(NotFound(format!("cannot read directory: {}", path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_listing_splits_and_sorts_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Videos")).unwrap();
        fs::create_dir(dir.path().join("audio")).unwrap();
        fs::write(dir.path().join("b.mkv"), b"xx").unwrap();
        fs::write(dir.path().join("A.avi"), b"x").unwrap();

        let listing = list_directory(dir.path()).unwrap();

        let dir_names: Vec<&str> = listing.directories.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(dir_names, vec!["audio", "Videos"]);

        let file_names: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(file_names, vec!["A.avi", "b.mkv"]);
        assert_eq!(listing.files[0].size, 1);
        assert_eq!(listing.files[1].size, 2);
    }

    #[test]
    fn test_hidden_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("visible.mkv"), b"x").unwrap();

        let listing = list_directory(dir.path()).unwrap();
        assert!(listing.directories.is_empty());
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "visible.mkv");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        assert!(list_directory(Path::new("/nonexistent/media")).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let listing = list_directory(dir.path()).unwrap();
        assert!(listing.directories.is_empty());
        assert!(listing.files.is_empty());
    }
}
