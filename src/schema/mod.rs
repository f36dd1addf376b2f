// ABOUTME: Engine-agnostic in-memory representation of a relational schema
// ABOUTME: Built once through SchemaBuilder, then read-only structural accessors

pub mod normalize;
pub mod table;

pub use normalize::Normalizer;
pub use table::{Column, Constraint, ConstraintKind, Index, ReferentialAction, Table};

use crate::error::{DriftError, DriftResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A complete schema: tables keyed by name, iterated in name order.
///
/// Only [`SchemaBuilder`] can produce one, so table names are unique and
/// column names are unique within each table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Names of all tables, sorted.
    pub fn tables(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.keys().map(String::as_str)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Get a table by name, if present.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table(&self, name: &str) -> DriftResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DriftError::table_not_found(name))
    }

    pub fn columns(&self, table: &str) -> DriftResult<&[Column]> {
        self.table(table).map(|t| t.columns.as_slice())
    }

    pub fn indexes(&self, table: &str) -> DriftResult<&[Index]> {
        self.table(table).map(|t| t.indexes.as_slice())
    }

    pub fn constraints(&self, table: &str) -> DriftResult<&[Constraint]> {
        self.table(table).map(|t| t.constraints.as_slice())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<Table>,
}

impl SchemaBuilder {
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn tables(mut self, tables: impl IntoIterator<Item = Table>) -> Self {
        self.tables.extend(tables);
        self
    }

    /// Freeze the schema.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::InvalidSchema`] if two tables share a name or a
    /// table has two columns with the same name.
    pub fn build(self) -> DriftResult<Schema> {
        let mut tables = BTreeMap::new();
        for table in self.tables {
            let mut seen = HashSet::new();
            if let Some(column) = table.columns.iter().find(|c| !seen.insert(c.name.as_str())) {
                return Err(DriftError::InvalidSchema(format!(
                    "duplicate column {}.{}",
                    table.name, column.name
                )));
            }

            if tables.contains_key(&table.name) {
                return Err(DriftError::InvalidSchema(format!(
                    "duplicate table {}",
                    table.name
                )));
            }
            tables.insert(table.name.clone(), table);
        }
        Ok(Schema { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", "integer").not_null())
            .column(Column::new("email", "text"))
            .index(Index::new("idx_email", ["email"]).unique(true))
            .constraint(Constraint::primary_key(["id"]).named("users_pkey"))
    }

    #[test]
    fn test_accessors() {
        let schema = Schema::builder()
            .table(users())
            .table(Table::new("accounts"))
            .build()
            .unwrap();

        assert_eq!(schema.tables().collect::<Vec<_>>(), vec!["accounts", "users"]);
        assert_eq!(schema.columns("users").unwrap().len(), 2);
        assert_eq!(schema.indexes("users").unwrap()[0].name, "idx_email");
        assert_eq!(schema.constraints("users").unwrap().len(), 1);
        assert!(schema.table("accounts").unwrap().columns.is_empty());
    }

    #[test]
    fn test_lookup_of_absent_table_is_not_found() {
        let schema = Schema::builder().table(users()).build().unwrap();

        let err = schema.table("orders").unwrap_err();
        assert!(err.is_not_found());
        assert!(schema.columns("orders").unwrap_err().is_not_found());
        assert!(schema.indexes("orders").unwrap_err().is_not_found());
        assert!(schema.constraints("orders").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let result = Schema::builder().table(users()).table(users()).build();
        assert!(matches!(result, Err(DriftError::InvalidSchema(_))));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let table = Table::new("t")
            .column(Column::new("a", "text"))
            .column(Column::new("a", "integer"));
        let result = Schema::builder().table(table).build();
        assert!(matches!(result, Err(DriftError::InvalidSchema(msg)) if msg.contains("t.a")));
    }
}
