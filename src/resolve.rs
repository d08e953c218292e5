//! Locating input files by extension when no explicit path was given.

use crate::{Error, Result};
use globset::Glob;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds the single file in `directory` for the first extension of
/// `extensions` that matches anything.
///
/// Extensions are tried in order. An extension with exactly one match wins; an
/// extension with several matches is an error, since picking one would be a
/// guess. `Ok(None)` means no extension matched at all.
///
/// Only regular files are considered. Hidden files and Office lock files
/// (`~$deck.pptx`) are skipped.
///
/// # Errors
///
/// [`Error::AmbiguousInput`] when an extension matches more than one file, or
/// an I/O error when the directory cannot be read.
pub fn find_file(directory: &Path, extensions: &[&str]) -> Result<Option<PathBuf>> {
    for extension in extensions {
        let mut matches = matching_files(directory, extension)?;
        match matches.len() {
            0 => continue,
            1 => {
                let found = matches.remove(0);
                debug!(path = %found.display(), "resolved input file");
                return Ok(Some(found));
            }
            _ => {
                return Err(Error::AmbiguousInput {
                    extension: extension.to_string(),
                    candidates: matches
                        .iter()
                        .filter_map(|p| p.file_name())
                        .map(|name| name.to_string_lossy().into_owned())
                        .collect(),
                });
            }
        }
    }
    Ok(None)
}

fn matching_files(directory: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new(&format!("*{extension}"))?.compile_matcher();

    let mut matches = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else { continue };
        if name.starts_with('.') || name.starts_with("~$") {
            continue;
        }
        let path = entry.path();
        if matcher.is_match(name) && path.is_file() {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}
