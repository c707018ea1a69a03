use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use vehicle_rollup_core::ingest;
use vehicle_rollup_core::rollup::record::ConfigurationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Yaml,
    Json,
}

fn kind_of(path: &Path) -> FileKind {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => FileKind::Csv,
        Some("yaml") | Some("yml") => FileKind::Yaml,
        _ => FileKind::Json,
    }
}

/// Read a JSON or YAML file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let value = read_json_value(path)?;
    let typed: T = serde_json::from_value(value)
        .map_err(|e| format!("Failed to parse '{}': {}", path, e))?;
    Ok(typed)
}

/// Read a JSON or YAML file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = match kind_of(&canonical) {
        FileKind::Yaml => serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?,
        _ => serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?,
    };
    Ok(value)
}

/// Load configuration records, choosing the parser by file extension.
///
/// `.csv` files need a header row; `.yaml`/`.yml` and everything else are
/// read as an array of row objects.
pub fn read_records(path: &str) -> Result<Vec<ConfigurationRecord>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let records = match kind_of(&canonical) {
        FileKind::Csv => {
            let file = fs::File::open(&canonical)
                .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
            ingest::read_csv(file)
                .map_err(|e| format!("Failed to load '{}': {}", canonical.display(), e))?
        }
        FileKind::Yaml | FileKind::Json => ingest::from_value(read_json_value(path)?)
            .map_err(|e| format!("Failed to load '{}': {}", canonical.display(), e))?,
    };
    Ok(records)
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_by_extension() {
        assert_eq!(kind_of(Path::new("sales.CSV")), FileKind::Csv);
        assert_eq!(kind_of(Path::new("sales.yml")), FileKind::Yaml);
        assert_eq!(kind_of(Path::new("sales.json")), FileKind::Json);
        assert_eq!(kind_of(Path::new("sales")), FileKind::Json);
    }

    #[test]
    fn test_missing_file_reported() {
        let err = read_records("/nonexistent/sales.csv").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
