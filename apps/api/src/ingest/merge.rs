//! Joins the three exports into one record per attribute name.
//!
//! Join order: mappers ⋈ prompt configs (configs deduplicated by mapper id),
//! then ⋈ attributes (deduplicated by attribute id), then deduplicated by
//! attribute name. Every deduplication keeps the first occurrence in file
//! order, so the output depends on the order rows appear in the exports.
//! Rows missing a join key never match.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::Value;

use crate::ingest::sources::{AttributeRow, MapperRow, PromptConfigRow};
use crate::models::attribute::AttributeRecord;

/// One row of the three-way join, before its payload is read.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub attribute_id: String,
    pub attribute_name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingPayload,
    MalformedPayload(String),
    MissingPrompt,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingName => write!(f, "attribute name is empty"),
            SkipReason::MissingPayload => write!(f, "arguments payload is absent"),
            SkipReason::MalformedPayload(e) => write!(f, "arguments payload is malformed: {e}"),
            SkipReason::MissingPrompt => write!(f, "arguments payload has no prompt"),
        }
    }
}

/// A joined row left out of the index. Not an error: the batch continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSkip {
    pub attribute_id: String,
    pub reason: SkipReason,
}

pub fn join_sources(
    attributes: &[AttributeRow],
    mappers: &[MapperRow],
    prompt_configs: &[PromptConfigRow],
) -> Vec<JoinedRow> {
    let configs_by_mapper = first_by_key(prompt_configs, |c| c.llm_mapper_id.as_deref());
    let attributes_by_id = first_by_key(attributes, |a| a.attribute_id.as_deref());

    let mut seen_names: HashSet<Option<&str>> = HashSet::new();
    let mut joined = Vec::new();

    for mapper in mappers {
        let Some(config) = mapper
            .llm_mapper_id
            .as_deref()
            .and_then(|id| configs_by_mapper.get(id))
        else {
            continue;
        };
        let Some((attribute_id, attribute)) = mapper
            .attribute_id
            .as_deref()
            .and_then(|id| attributes_by_id.get(id).map(|a| (id, a)))
        else {
            continue;
        };

        if !seen_names.insert(attribute.attribute_name.as_deref()) {
            continue;
        }

        joined.push(JoinedRow {
            attribute_id: attribute_id.to_string(),
            attribute_name: attribute.attribute_name.clone(),
            arguments: config.arguments.clone(),
        });
    }

    joined
}

/// Reads each joined row's payload. Rows without a name or a usable prompt
/// are returned as skips instead of records.
pub fn build_records(rows: Vec<JoinedRow>) -> (Vec<AttributeRecord>, Vec<IngestionSkip>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for row in rows {
        match record_from_row(&row) {
            Ok(record) => records.push(record),
            Err(reason) => skipped.push(IngestionSkip {
                attribute_id: row.attribute_id,
                reason,
            }),
        }
    }

    (records, skipped)
}

fn record_from_row(row: &JoinedRow) -> Result<AttributeRecord, SkipReason> {
    let name = row
        .attribute_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(SkipReason::MissingName)?;

    let raw = row.arguments.as_deref().ok_or(SkipReason::MissingPayload)?;
    let payload: Value =
        serde_json::from_str(raw).map_err(|e| SkipReason::MalformedPayload(e.to_string()))?;
    let Value::Object(args) = payload else {
        return Err(SkipReason::MalformedPayload(
            "arguments is not a JSON object".to_string(),
        ));
    };

    let prompt = args
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .ok_or(SkipReason::MissingPrompt)?;
    let system_role = args
        .get("system_role")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(AttributeRecord {
        attribute_name: name.to_string(),
        prompt_text: prompt.to_string(),
        system_role: system_role.to_string(),
        source_id: row.attribute_id.clone(),
    })
}

fn first_by_key<'a, T>(
    rows: &'a [T],
    key: impl Fn(&'a T) -> Option<&'a str>,
) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            map.entry(k).or_insert(row);
        }
    }
    map
}
