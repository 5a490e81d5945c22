//! Source discovery

use std::io;
use std::path::{Path, PathBuf};

/// Recursively collect regular files under `dir` whose name ends with
/// `.{extension}`, sorted by path
pub fn discover_sources(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().ends_with(&suffix))
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovers_nested_files() {
        let root = std::env::temp_dir().join(format!("sources-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("disc2")).unwrap();
        std::fs::write(root.join("b.wav"), b"x").unwrap();
        std::fs::write(root.join("a.wav"), b"x").unwrap();
        std::fs::write(root.join("notes.txt"), b"x").unwrap();
        std::fs::write(root.join("disc2").join("c.wav"), b"x").unwrap();
        std::fs::create_dir_all(root.join("folder.wav")).unwrap();

        let found = discover_sources(&root, "wav").unwrap();
        let _ = std::fs::remove_dir_all(&root);

        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.wav", "b.wav", "disc2/c.wav"]);
    }

    #[test]
    fn test_missing_directory() {
        let missing = std::env::temp_dir().join(format!("missing-{}", uuid::Uuid::new_v4()));
        assert!(discover_sources(&missing, "wav").is_err());
    }
}
