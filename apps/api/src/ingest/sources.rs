//! The three CSV exports ingestion reads, and how they are found on disk.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use tracing::info;

use crate::ingest::IngestError;

pub const ATTRIBUTES_PREFIX: &str = "public_attributes_definition_export";
pub const MAPPERS_PREFIX: &str = "public_llm_mapper_export";
pub const PROMPT_CONFIGS_PREFIX: &str = "public_llm_prompt_configuration_export";

/// Row of the attribute definitions export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributeRow {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub attribute_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub attribute_name: Option<String>,
}

/// Row linking an LLM mapper to the attribute it extracts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapperRow {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub llm_mapper_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub attribute_id: Option<String>,
}

/// Row holding a mapper's prompt configuration. `arguments` is a JSON object
/// with `prompt` and `system_role`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptConfigRow {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub llm_mapper_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub arguments: Option<String>,
}

/// All three exports, loaded.
#[derive(Debug, Default)]
pub struct SourceTables {
    pub attributes: Vec<AttributeRow>,
    pub mappers: Vec<MapperRow>,
    pub prompt_configs: Vec<PromptConfigRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFiles {
    pub attributes: PathBuf,
    pub mappers: PathBuf,
    pub prompt_configs: PathBuf,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Finds the first file (by name) for each export prefix in `dir`.
/// Returns `None` unless all three are present.
pub fn discover(dir: &Path) -> Result<Option<SourceFiles>, IngestError> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map_err(|e| IngestError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let find = |prefix: &str| {
        names
            .iter()
            .find(|name| name.starts_with(prefix))
            .map(|name| dir.join(name))
    };

    Ok(match (
        find(ATTRIBUTES_PREFIX),
        find(MAPPERS_PREFIX),
        find(PROMPT_CONFIGS_PREFIX),
    ) {
        (Some(attributes), Some(mappers), Some(prompt_configs)) => Some(SourceFiles {
            attributes,
            mappers,
            prompt_configs,
        }),
        _ => None,
    })
}

pub fn load(files: &SourceFiles) -> Result<SourceTables, IngestError> {
    info!("Loading CSVs...");
    Ok(SourceTables {
        attributes: read_rows(&files.attributes)?,
        mappers: read_rows(&files.mappers)?,
        prompt_configs: read_rows(&files.prompt_configs)?,
    })
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, IngestError> {
    let csv_error = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_error)
}
