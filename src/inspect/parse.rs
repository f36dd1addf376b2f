// ABOUTME: Transcribes a tbls JSON document into the schema model
// ABOUTME: Parses index and constraint definitions and canonicalizes types and defaults

use super::document::{DocConstraint, DocIndex, DocTable, Document};
use crate::error::{DriftError, DriftResult};
use crate::schema::normalize::{canonical_default, canonical_type};
use crate::schema::{Column, Constraint, Index, ReferentialAction, Schema, Table};
use regex::Regex;
use std::sync::LazyLock;

static INDEX_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^CREATE (?P<unique>UNIQUE )?INDEX (?:CONCURRENTLY )?(?:IF NOT EXISTS )?\S+ ON (?:ONLY )?\S+ USING (?P<method>\w+) \((?P<columns>.*?)\)(?: INCLUDE \(.*?\))?(?: WITH \(.*?\))?(?: TABLESPACE \S+)?(?: WHERE (?P<predicate>.+))?$",
    )
    .expect("valid regex")
});

static PRIMARY_KEY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^PRIMARY KEY \((?P<columns>[^)]+)\)").expect("valid regex")
});

static UNIQUE_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^UNIQUE (?:NULLS (?:NOT )?DISTINCT )?\((?P<columns>[^)]+)\)")
        .expect("valid regex")
});

static FOREIGN_KEY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^FOREIGN KEY \((?P<columns>[^)]+)\) REFERENCES (?P<table>[^\s(]+)\s*\((?P<referenced>[^)]+)\)(?P<extra>.*)$",
    )
    .expect("valid regex")
});

static REFERENTIAL_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ON (?P<event>DELETE|UPDATE) (?P<action>NO ACTION|RESTRICT|CASCADE|SET NULL|SET DEFAULT)")
        .expect("valid regex")
});

static CHECK_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CHECK \((?P<expression>.*)\)(?: NO INHERIT)?(?: NOT VALID)?$")
        .expect("valid regex")
});

/// Options controlling how document names are transcribed
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Schema whose `schema.` prefix is stripped from table names, so that
    /// `public.users` and `users` name the same table.
    pub default_schema: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_schema: Some("public".to_string()),
        }
    }
}

impl ParseOptions {
    fn table_name(&self, name: &str) -> String {
        let name = name.trim();
        if let Some(schema) = &self.default_schema {
            if let Some(rest) = name
                .strip_prefix(schema.as_str())
                .and_then(|r| r.strip_prefix('.'))
            {
                return rest.to_string();
            }
        }
        name.to_string()
    }
}

/// Parse raw `tbls out -t json` output into a schema
///
/// # Errors
///
/// Returns [`DriftError::InspectionFailed`] if the text is not a valid
/// document or a primary-key, unique, foreign-key, or check definition
/// cannot be parsed.
pub fn parse_document(text: &str, options: &ParseOptions) -> DriftResult<Schema> {
    let document: Document = serde_json::from_str(text)
        .map_err(|e| DriftError::inspection(format!("Malformed schema document: {}", e)))?;

    tracing::debug!(
        "Parsing schema document '{}' with {} tables",
        document.name.as_deref().unwrap_or(""),
        document.tables.len()
    );

    let tables = document
        .tables
        .iter()
        .map(|table| parse_table(table, options))
        .collect::<DriftResult<Vec<_>>>()?;

    Schema::builder()
        .tables(tables)
        .build()
        .map_err(|e| DriftError::inspection(format!("Inconsistent schema document: {}", e)))
}

fn parse_table(doc: &DocTable, options: &ParseOptions) -> DriftResult<Table> {
    let mut table = Table::new(options.table_name(&doc.name));
    if let Some(kind) = &doc.kind {
        table = table.kind(kind.clone());
    }
    if let Some(comment) = &doc.comment {
        table = table.comment(comment.clone());
    }

    for col in &doc.columns {
        let mut column =
            Column::new(col.name.clone(), canonical_type(&col.data_type)).nullable(col.nullable);
        if let Some(default) = canonical_default(col.default.as_deref()) {
            column = column.default_value(default);
        }
        if let Some(comment) = &col.comment {
            column = column.comment(comment.clone());
        }
        table = table.column(column);
    }

    for idx in &doc.indexes {
        table = table.index(parse_index(idx));
    }

    for con in &doc.constraints {
        match parse_constraint(con, options) {
            Ok(Some(constraint)) => table = table.constraint(constraint),
            Ok(None) => {
                tracing::debug!(
                    "Skipping {} constraint {} on {}",
                    con.kind,
                    con.name,
                    table.name
                );
            }
            Err(e) => {
                return Err(DriftError::inspection(format!(
                    "Cannot parse constraint {} on table {}: {}",
                    con.name, table.name, e
                )))
            }
        }
    }

    Ok(table)
}

/// Parse an index. Definitions that don't match the expected shape fall
/// back to the document's column list and a btree method.
fn parse_index(doc: &DocIndex) -> Index {
    let def = doc.def.trim();
    match INDEX_DEF.captures(def) {
        Some(caps) => {
            let mut index = Index::new(doc.name.clone(), split_columns(&caps["columns"]))
                .unique(caps.name("unique").is_some())
                .method(&caps["method"]);
            if let Some(predicate) = caps.name("predicate") {
                index = index.predicate(predicate.as_str().trim());
            }
            index
        }
        None => {
            tracing::debug!("Unrecognized definition for index {}: {}", doc.name, def);
            let unique = def.to_uppercase().starts_with("CREATE UNIQUE");
            Index::new(doc.name.clone(), doc.columns.clone()).unique(unique)
        }
    }
}

/// Parse a constraint. Returns `Ok(None)` for kinds the model does not
/// represent (triggers, exclusion constraints).
fn parse_constraint(
    doc: &DocConstraint,
    options: &ParseOptions,
) -> Result<Option<Constraint>, String> {
    let def = doc.def.trim();
    let constraint = match doc.kind.trim().to_uppercase().as_str() {
        "PRIMARY KEY" => {
            let caps = PRIMARY_KEY_DEF
                .captures(def)
                .ok_or_else(|| format!("unrecognized definition: {}", def))?;
            Constraint::primary_key(split_columns(&caps["columns"]))
        }
        "UNIQUE" => {
            let caps = UNIQUE_DEF
                .captures(def)
                .ok_or_else(|| format!("unrecognized definition: {}", def))?;
            Constraint::unique(split_columns(&caps["columns"]))
        }
        "FOREIGN KEY" => {
            let caps = FOREIGN_KEY_DEF
                .captures(def)
                .ok_or_else(|| format!("unrecognized definition: {}", def))?;
            let mut constraint = Constraint::foreign_key(
                split_columns(&caps["columns"]),
                options.table_name(&unquote(&caps["table"])),
                split_columns(&caps["referenced"]),
            );
            for action in REFERENTIAL_ACTION.captures_iter(&caps["extra"]) {
                let parsed = ReferentialAction::parse(&action["action"])
                    .ok_or_else(|| format!("unknown referential action: {}", &action["action"]))?;
                constraint = if action["event"].eq_ignore_ascii_case("DELETE") {
                    constraint.on_delete(parsed)
                } else {
                    constraint.on_update(parsed)
                };
            }
            constraint
        }
        "CHECK" => {
            let caps = CHECK_DEF
                .captures(def)
                .ok_or_else(|| format!("unrecognized definition: {}", def))?;
            let mut constraint = Constraint::check(caps["expression"].trim());
            constraint.columns = doc.columns.clone();
            constraint
        }
        _ => return Ok(None),
    };
    Ok(Some(constraint.named(doc.name.clone())))
}

/// Split a column list on top-level commas, leaving expressions intact.
fn split_columns(list: &str) -> Vec<String> {
    let mut columns = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;

    for c in list.chars() {
        match c {
            '\'' => {
                in_quote = !in_quote;
                current.push(c);
            }
            '(' if !in_quote => {
                depth += 1;
                current.push(c);
            }
            ')' if !in_quote => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if !in_quote && depth == 0 => {
                columns.push(unquote(current.trim()));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        columns.push(unquote(current.trim()));
    }
    columns
}

/// `"Order"` becomes `Order`; anything more complex is kept verbatim.
fn unquote(identifier: &str) -> String {
    identifier
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|s| !s.contains('"'))
        .unwrap_or(identifier)
        .to_string()
}
