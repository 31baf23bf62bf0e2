use anyhow::{Context, Result};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands the command line paths into the list of files to rename.
///
/// Files are taken as given. Directories contribute their files in sorted order, descending
/// into subdirectories only when `recursive` is set. The glob filters file names found inside
/// directories; explicitly named files are always kept.
pub fn collect_files(
    paths: &[PathBuf],
    pattern: Option<&str>,
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    let pattern = pattern
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid file pattern: {p}")))
        .transpose()?;

    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, pattern.as_ref(), recursive, &mut files)?;
        } else if path.exists() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Path does not exist: {:?}", path);
        }
    }

    debug!("Collected {} file(s)", files.len());
    Ok(files)
}

fn walk(
    dir: &Path,
    pattern: Option<&Pattern>,
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {:?}", dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            if recursive {
                walk(&entry, pattern, recursive, files)?;
            }
            continue;
        }
        let matches = match (pattern, entry.file_name().and_then(|n| n.to_str())) {
            (Some(pattern), Some(name)) => pattern.matches(name),
            (Some(_), None) => false,
            (None, _) => true,
        };
        if matches {
            files.push(entry);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directory_walk_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("c.md"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.txt"), "").unwrap();

        let flat = collect_files(&[dir.path().to_path_buf()], Some("*.txt"), false).unwrap();
        assert_eq!(flat, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);

        let deep = collect_files(&[dir.path().to_path_buf()], Some("*.txt"), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert_eq!(deep[2], dir.path().join("sub").join("d.txt"));
    }

    #[test]
    fn test_explicit_files_bypass_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "").unwrap();

        let files = collect_files(&[file.clone()], Some("*.txt"), false).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_files(&[dir.path().join("nope")], None, false).is_err());
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        assert!(collect_files(&[], Some("[unclosed"), false).is_err());
    }
}
