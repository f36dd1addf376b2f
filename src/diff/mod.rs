// ABOUTME: Schema comparator computing a structured diff of expected vs actual
// ABOUTME: Pure and deterministic; walks tables, columns, indexes, and constraints in name order

mod constraints;
pub mod difference;

pub use difference::{Category, Difference, Location};

use crate::schema::normalize::canonical_expression;
use crate::schema::{Column, Index, Normalizer, Schema, Table};
use std::collections::BTreeSet;

/// Knobs for a comparison run.
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub normalizer: Normalizer,
    /// Tables skipped on both sides, e.g. migration bookkeeping tables.
    pub ignore_tables: BTreeSet<String>,
    /// Skip table and column comments.
    pub ignore_comments: bool,
}

/// Compares an expected schema against an actual one.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    options: CompareOptions,
}

/// Compare with default options.
pub fn compare(expected: &Schema, actual: &Schema) -> Vec<Difference> {
    Comparator::default().compare(expected, actual)
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    /// Produce every difference between `expected` and `actual`.
    ///
    /// Tables are visited in name order. Inside a table the order is: kind,
    /// comment, columns, indexes, constraints, each sorted by name. An empty
    /// result means the schemas are equivalent. The inputs are not checked
    /// for internal consistency.
    pub fn compare(&self, expected: &Schema, actual: &Schema) -> Vec<Difference> {
        let names: BTreeSet<&str> = expected
            .tables()
            .chain(actual.tables())
            .filter(|name| !self.options.ignore_tables.contains(*name))
            .collect();

        let mut out = Vec::new();
        for name in names {
            match (expected.get_table(name), actual.get_table(name)) {
                (Some(exp), Some(act)) => self.compare_table(exp, act, &mut out),
                (Some(_), None) => {
                    out.push(Difference::presence(Category::MissingTable, Location::table(name)))
                }
                (None, Some(_)) => {
                    out.push(Difference::presence(Category::ExtraTable, Location::table(name)))
                }
                (None, None) => {}
            }
        }

        tracing::debug!("Comparison produced {} differences", out.len());
        out
    }

    fn compare_table(&self, expected: &Table, actual: &Table, out: &mut Vec<Difference>) {
        let table = expected.name.as_str();

        // A model that doesn't declare a kind accepts any
        if let Some(exp_kind) = &expected.kind {
            let act_kind = actual.kind.as_deref().unwrap_or("(none)");
            if !exp_kind.eq_ignore_ascii_case(act_kind) {
                out.push(Difference::mismatch(
                    Category::TableTypeMismatch,
                    Location::table(table),
                    exp_kind.as_str(),
                    act_kind,
                ));
            }
        }

        if !self.options.ignore_comments && expected.comment != actual.comment {
            out.push(Difference::mismatch(
                Category::CommentMismatch,
                Location::table(table),
                describe(expected.comment.as_deref()),
                describe(actual.comment.as_deref()),
            ));
        }

        self.compare_columns(expected, actual, out);
        self.compare_indexes(expected, actual, out);
        self.compare_constraints(expected, actual, out);
    }

    fn compare_columns(&self, expected: &Table, actual: &Table, out: &mut Vec<Difference>) {
        let names: BTreeSet<&str> = expected
            .columns
            .iter()
            .chain(&actual.columns)
            .map(|c| c.name.as_str())
            .collect();

        for name in names {
            let location = Location::object(&expected.name, name);
            match (expected.get_column(name), actual.get_column(name)) {
                (Some(exp), Some(act)) => self.compare_column(exp, act, location, out),
                (Some(_), None) => {
                    out.push(Difference::presence(Category::MissingColumn, location))
                }
                (None, Some(_)) => out.push(Difference::presence(Category::ExtraColumn, location)),
                (None, None) => {}
            }
        }
    }

    fn compare_column(
        &self,
        expected: &Column,
        actual: &Column,
        location: Location,
        out: &mut Vec<Difference>,
    ) {
        let normalizer = &self.options.normalizer;

        if !normalizer.types_equivalent(&expected.data_type, &actual.data_type) {
            out.push(Difference::mismatch(
                Category::ColumnTypeMismatch,
                location.clone(),
                normalizer.canonical_type(&expected.data_type),
                normalizer.canonical_type(&actual.data_type),
            ));
        }

        if expected.nullable != actual.nullable {
            out.push(Difference::mismatch(
                Category::ColumnNullabilityMismatch,
                location.clone(),
                nullability(expected.nullable),
                nullability(actual.nullable),
            ));
        }

        if !normalizer.defaults_equivalent(expected.default.as_deref(), actual.default.as_deref()) {
            out.push(Difference::mismatch(
                Category::ColumnDefaultMismatch,
                location.clone(),
                describe(normalizer.canonical_default(expected.default.as_deref()).as_deref()),
                describe(normalizer.canonical_default(actual.default.as_deref()).as_deref()),
            ));
        }

        if !self.options.ignore_comments && expected.comment != actual.comment {
            out.push(Difference::mismatch(
                Category::CommentMismatch,
                location,
                describe(expected.comment.as_deref()),
                describe(actual.comment.as_deref()),
            ));
        }
    }

    fn compare_indexes(&self, expected: &Table, actual: &Table, out: &mut Vec<Difference>) {
        let names: BTreeSet<&str> = expected
            .indexes
            .iter()
            .chain(&actual.indexes)
            .map(|i| i.name.as_str())
            .collect();

        for name in names {
            let location = Location::object(&expected.name, name);
            match (expected.get_index(name), actual.get_index(name)) {
                (Some(exp), Some(act)) => {
                    if !same_index(exp, act) {
                        out.push(Difference::mismatch(
                            Category::IndexDefinitionMismatch,
                            location,
                            exp.to_string(),
                            act.to_string(),
                        ));
                    }
                }
                (Some(_), None) => out.push(Difference::presence(Category::MissingIndex, location)),
                (None, Some(_)) => out.push(Difference::presence(Category::ExtraIndex, location)),
                (None, None) => {}
            }
        }
    }

    fn compare_constraints(&self, expected: &Table, actual: &Table, out: &mut Vec<Difference>) {
        for pair in constraints::match_constraints(&expected.constraints, &actual.constraints) {
            let location = Location::object(&expected.name, pair.label);
            match (pair.expected, pair.actual) {
                (Some(exp), Some(act)) => {
                    if !constraints::same_definition(exp, act) {
                        out.push(Difference::mismatch(
                            Category::ConstraintDefinitionMismatch,
                            location,
                            exp.definition(),
                            act.definition(),
                        ));
                    }
                }
                (Some(_), None) => {
                    out.push(Difference::presence(Category::MissingConstraint, location))
                }
                (None, Some(_)) => {
                    out.push(Difference::presence(Category::ExtraConstraint, location))
                }
                (None, None) => {}
            }
        }
    }
}

/// Columns are compared in order, as canonical expressions.
fn same_index(expected: &Index, actual: &Index) -> bool {
    let columns = |idx: &Index| -> Vec<String> {
        idx.columns.iter().map(|c| canonical_expression(c)).collect()
    };
    let predicate = |idx: &Index| idx.predicate.as_deref().map(canonical_expression);

    expected.unique == actual.unique
        && expected.method.eq_ignore_ascii_case(&actual.method)
        && columns(expected) == columns(actual)
        && predicate(expected) == predicate(actual)
}

fn nullability(nullable: bool) -> &'static str {
    if nullable {
        "nullable"
    } else {
        "not null"
    }
}

fn describe(value: Option<&str>) -> String {
    value.unwrap_or("(none)").to_string()
}
