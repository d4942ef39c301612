//! Input document loading
//!
//! Experiment and optimizer documents are user-supplied mappings loaded from
//! YAML or JSON files. They are passed through to the service unmodified, so
//! both formats normalize to the same `serde_json::Value` representation.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Fixed message printed when an input file has an unsupported extension
pub const FILE_TYPE_MSG: &str = "Files provided must end with .yaml, .yml, or .json";

/// Errors from loading an input document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file extension is not one of .yaml, .yml, .json
    #[error("{FILE_TYPE_MSG}")]
    UnsupportedExtension { path: PathBuf },

    /// The file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be parsed as YAML
    #[error("failed to parse {} as YAML: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file contents could not be parsed as JSON
    #[error("failed to parse {} as JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads a YAML or JSON document as a JSON value
///
/// The declared format is taken from the file extension; any extension other
/// than `.yaml`, `.yml`, or `.json` is rejected.
pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Format::Yaml,
        Some("json") => Format::Json,
        _ => {
            return Err(DocumentError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }
    };

    let contents = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match format {
        Format::Yaml => serde_yaml::from_str(&contents).map_err(|source| DocumentError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        Format::Json => serde_json::from_str(&contents).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}

enum Format {
    Yaml,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_yaml_and_json_load_identically() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write_file(
            &dir,
            "experiment.yaml",
            "name: exp1\ncommand: run.sh\ntrials: 3\nparams:\n  - lr\n  - batch\n",
        );
        let json = write_file(
            &dir,
            "experiment.json",
            r#"{"name": "exp1", "command": "run.sh", "trials": 3, "params": ["lr", "batch"]}"#,
        );

        let from_yaml = load_document(&yaml).unwrap();
        let from_json = load_document(&json).unwrap();

        assert_eq!(from_yaml, from_json);
        assert_eq!(
            from_yaml,
            json!({"name": "exp1", "command": "run.sh", "trials": 3, "params": ["lr", "batch"]})
        );
    }

    #[test]
    fn test_yml_extension_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "optimizer.yml", "kind: grid\n");
        assert_eq!(load_document(&path).unwrap(), json!({"kind": "grid"}));
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "experiment.toml", "name = \"exp1\"\n");
        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedExtension { .. }));
        assert_eq!(err.to_string(), FILE_TYPE_MSG);
    }

    #[test]
    fn test_missing_extension_rejected() {
        let err = load_document(Path::new("/tmp/experiment")).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.json", "{not json");
        assert!(matches!(
            load_document(&path).unwrap_err(),
            DocumentError::Json { .. }
        ));
    }
}
