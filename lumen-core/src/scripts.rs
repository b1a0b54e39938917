use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CoreError;

/// File extension of Lumen scripts.
pub const SCRIPT_EXTENSION: &str = "lm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    /// Path relative to the directory that was walked.
    pub path: PathBuf,
    pub contents: String,
}

/// Collects every `.lm` file under `root`, sorted by path.
pub fn load_scripts(root: impl AsRef<Path>) -> Result<Vec<ScriptFile>, CoreError> {
    let root = root.as_ref();
    // WalkDir reports a missing root as an entry error, which would be
    // filtered out below.
    fs::metadata(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION) {
            let contents = fs::read_to_string(path)?;
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            files.push(ScriptFile {
                path: relative,
                contents,
            });
        }
    }
    log::debug!("loaded {} scripts from {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_nested_scripts_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).expect("create nested dir");
        fs::write(dir.path().join("b.lm"), "2;").expect("write b");
        fs::write(dir.path().join("a.lm"), "1;").expect("write a");
        fs::write(nested.join("c.lm"), "3;").expect("write c");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");

        let files = load_scripts(dir.path()).expect("load");
        let paths: Vec<_> = files.iter().map(|file| file.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.lm"),
                PathBuf::from("b.lm"),
                PathBuf::from("nested/c.lm"),
            ]
        );
        assert_eq!(files[0].contents, "1;");
    }

    #[test]
    fn reports_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_scripts(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CoreError::SourceIo(_)));
    }
}
