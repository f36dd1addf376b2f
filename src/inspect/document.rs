// ABOUTME: Serde mirror of the tbls JSON schema document
// ABOUTME: Only the fields the inspector consumes; everything else is ignored

use serde::Deserialize;

/// Top level of `tbls out -t json`.
#[derive(Debug, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tables: Vec<DocTable>,
}

#[derive(Debug, Deserialize)]
pub struct DocTable {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub columns: Vec<DocColumn>,
    #[serde(default)]
    pub indexes: Vec<DocIndex>,
    #[serde(default)]
    pub constraints: Vec<DocConstraint>,
}

#[derive(Debug, Deserialize)]
pub struct DocColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct DocIndex {
    pub name: String,
    #[serde(default)]
    pub def: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocConstraint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub def: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub referenced_table: Option<String>,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let json = r#"{
            "name": "app",
            "desc": "",
            "tables": [{
                "name": "users",
                "type": "BASE TABLE",
                "comment": "",
                "columns": [{"name": "id", "type": "integer", "nullable": false, "default": null, "comment": "", "extra_def": ""}],
                "viewpoints": [],
                "def": "CREATE TABLE users (...)"
            }],
            "relations": [],
            "functions": [],
            "driver": {"name": "postgres", "database_version": "16.2"}
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.name.as_deref(), Some("app"));
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].kind.as_deref(), Some("BASE TABLE"));
        assert!(!doc.tables[0].columns[0].nullable);
        assert!(doc.tables[0].indexes.is_empty());
    }
}
