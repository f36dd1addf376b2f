// ABOUTME: Difference records produced by the comparator
// ABOUTME: Category, location, and the expected/actual sides of one discrepancy

use serde::Serialize;
use std::fmt;

/// What kind of discrepancy a [`Difference`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    MissingTable,
    ExtraTable,
    TableTypeMismatch,
    MissingColumn,
    ExtraColumn,
    ColumnTypeMismatch,
    ColumnNullabilityMismatch,
    ColumnDefaultMismatch,
    CommentMismatch,
    MissingIndex,
    ExtraIndex,
    IndexDefinitionMismatch,
    MissingConstraint,
    ExtraConstraint,
    ConstraintDefinitionMismatch,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::MissingTable,
        Category::ExtraTable,
        Category::TableTypeMismatch,
        Category::MissingColumn,
        Category::ExtraColumn,
        Category::ColumnTypeMismatch,
        Category::ColumnNullabilityMismatch,
        Category::ColumnDefaultMismatch,
        Category::CommentMismatch,
        Category::MissingIndex,
        Category::ExtraIndex,
        Category::IndexDefinitionMismatch,
        Category::MissingConstraint,
        Category::ExtraConstraint,
        Category::ConstraintDefinitionMismatch,
    ];

    /// Whether this records presence/absence rather than a changed value
    pub fn is_presence(&self) -> bool {
        matches!(
            self,
            Category::MissingTable
                | Category::ExtraTable
                | Category::MissingColumn
                | Category::ExtraColumn
                | Category::MissingIndex
                | Category::ExtraIndex
                | Category::MissingConstraint
                | Category::ExtraConstraint
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where a difference was found: a table, and optionally a column, index,
/// or constraint inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl Location {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            object: None,
        }
    }

    pub fn object(table: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            object: Some(object.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Some(object) => write!(f, "{}.{}", self.table, object),
            None => f.write_str(&self.table),
        }
    }
}

/// One discrepancy between the expected and the actual schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub category: Category,
    pub location: Location,
    /// Description of the expected side; `None` for presence differences.
    pub expected: Option<String>,
    /// Description of the actual side; `None` for presence differences.
    pub actual: Option<String>,
}

impl Difference {
    pub(crate) fn presence(category: Category, location: Location) -> Self {
        Self {
            category,
            location,
            expected: None,
            actual: None,
        }
    }

    pub(crate) fn mismatch(
        category: Category,
        location: Location,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            category,
            location,
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.category, self.location)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, ": expected {}, found {}", expected, actual)?;
        }
        Ok(())
    }
}
