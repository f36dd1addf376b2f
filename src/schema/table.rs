// ABOUTME: Table, column, index, and constraint value types
// ABOUTME: Built with chaining setters and frozen once handed to a schema builder

use serde::Serialize;
use std::fmt;

/// A single table and everything it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: String,
    /// Relation kind as reported by the engine, e.g. `BASE TABLE` or `VIEW`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Columns in declaration order. Order is for display only.
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<Constraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            comment: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the table comment. Empty comments count as no comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_empty(comment.into());
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get an index by name.
    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    /// A nullable column with no default and no comment.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            comment: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn not_null(self) -> Self {
        self.nullable(false)
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = non_empty(comment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub name: String,
    /// Covered columns (or expressions), order-sensitive.
    pub columns: Vec<String>,
    pub unique: bool,
    /// Access method, e.g. `btree` or `gin`.
    pub method: String,
    /// `WHERE` clause of a partial index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
}

impl Index {
    /// A non-unique btree index.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            method: "btree".to_string(),
            predicate: None,
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_lowercase();
        self
    }

    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unique = if self.unique { "UNIQUE " } else { "" };
        write!(
            f,
            "{}INDEX USING {} ({})",
            unique,
            self.method,
            self.columns.join(", ")
        )?;
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {}", predicate)?;
        }
        Ok(())
    }
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse the SQL spelling (`CASCADE`, `SET NULL`, ...), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "NO ACTION" => Some(Self::NoAction),
            "RESTRICT" => Some(Self::Restrict),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey {
        referenced_table: String,
        referenced_columns: Vec<String>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
    Unique,
    Check {
        expression: String,
    },
}

impl ConstraintKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::ForeignKey { .. } => "FOREIGN KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::Check { .. } => "CHECK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    /// `None` when the model declared the constraint without a name and left
    /// naming to the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

impl Constraint {
    fn with_kind<I, S>(columns: I, kind: ConstraintKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    pub fn primary_key<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(columns, ConstraintKind::PrimaryKey)
    }

    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(columns, ConstraintKind::Unique)
    }

    pub fn foreign_key<I, S, R, T>(
        columns: I,
        referenced_table: impl Into<String>,
        referenced: R,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::with_kind(
            columns,
            ConstraintKind::ForeignKey {
                referenced_table: referenced_table.into(),
                referenced_columns: referenced.into_iter().map(Into::into).collect(),
                on_delete: ReferentialAction::NoAction,
                on_update: ReferentialAction::NoAction,
            },
        )
    }

    /// A check constraint. Columns are left empty; the expression carries them.
    pub fn check(expression: impl Into<String>) -> Self {
        Self::with_kind(
            Vec::<String>::new(),
            ConstraintKind::Check {
                expression: expression.into(),
            },
        )
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set `ON DELETE`. No effect on non-foreign-key constraints.
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        if let ConstraintKind::ForeignKey { on_delete, .. } = &mut self.kind {
            *on_delete = action;
        }
        self
    }

    /// Set `ON UPDATE`. No effect on non-foreign-key constraints.
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        if let ConstraintKind::ForeignKey { on_update, .. } = &mut self.kind {
            *on_update = action;
        }
        self
    }

    /// The structural definition, without the name.
    pub fn definition(&self) -> String {
        match &self.kind {
            ConstraintKind::PrimaryKey | ConstraintKind::Unique => {
                format!("{} ({})", self.kind.keyword(), self.columns.join(", "))
            }
            ConstraintKind::ForeignKey {
                referenced_table,
                referenced_columns,
                on_delete,
                on_update,
            } => {
                let mut def = format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.columns.join(", "),
                    referenced_table,
                    referenced_columns.join(", ")
                );
                if *on_update != ReferentialAction::NoAction {
                    def.push_str(&format!(" ON UPDATE {}", on_update));
                }
                if *on_delete != ReferentialAction::NoAction {
                    def.push_str(&format!(" ON DELETE {}", on_delete));
                }
                def
            }
            ConstraintKind::Check { expression } => format!("CHECK ({})", expression),
        }
    }

    /// The name if one was declared, otherwise the structural signature
    /// (the definition minus referential actions).
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.kind {
            ConstraintKind::ForeignKey {
                referenced_table,
                referenced_columns,
                ..
            } => format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                self.columns.join(", "),
                referenced_table,
                referenced_columns.join(", ")
            ),
            _ => self.definition(),
        }
    }
}

pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
