//! Read schema text into a [`Document`], with document-path context in errors.
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::Document;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("at JSON path {at} → {message}")]
    Json { at: String, message: String },

    #[error("at YAML path {at} → {message}")]
    Yaml { at: String, message: String },
}

/// Input syntax. `Auto` picks JSON for `.json` files and YAML otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Auto,
    Json,
    Yaml,
}

impl Format {
    pub fn for_path(self, path: &Path) -> Format {
        match self {
            Format::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some("json") => Format::Json,
                _ => Format::Yaml,
            },
            other => other,
        }
    }
}

pub fn from_json_str(src: &str) -> Result<Document, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, Document>(de).map_err(|err| LoadError::Json {
        at: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn from_yaml_str(src: &str) -> Result<Document, LoadError> {
    let de = serde_yaml::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, Document>(de).map_err(|err| LoadError::Yaml {
        at: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn from_str(src: &str, format: Format) -> Result<Document, LoadError> {
    match format {
        Format::Json => from_json_str(src),
        Format::Yaml | Format::Auto => from_yaml_str(src),
    }
}

pub fn load_file(path: &Path, format: Format) -> Result<Document, LoadError> {
    let src = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded schema source");
    from_str(&src, format.for_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yaml_keeps_key_order() {
        let doc = from_yaml_str("type: map\nmapping:\n  zeta: {type: str}\n  alpha: {type: int}\n").unwrap();
        let mapping = doc.as_map().unwrap()["mapping"].as_map().unwrap();
        let keys: Vec<&str> = mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn json_errors_carry_the_path() {
        let err = from_json_str(r#"{"mapping": {"a": {"type": }}}"#).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
        assert!(err.to_string().contains("mapping.a"), "{err}");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = from_json_str(r#"{"type": "str", "type": "int"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key `type`"));
    }

    #[test]
    fn auto_format_follows_the_extension() {
        assert_eq!(Format::Auto.for_path(Path::new("a/b.json")), Format::Json);
        assert_eq!(Format::Auto.for_path(Path::new("a/b.yaml")), Format::Yaml);
        assert_eq!(Format::Json.for_path(Path::new("a/b.yaml")), Format::Json);
    }

    #[test]
    fn load_file_reads_yaml_from_disk() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(f, "type: seq\nsequence:\n  - type: str").unwrap();
        let doc = load_file(f.path(), Format::Auto).unwrap();
        assert_eq!(doc.as_map().unwrap()["type"], Document::from("seq"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(Path::new("/definitely/not/here.yaml"), Format::Auto).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
