// ABOUTME: Human-readable rendering of comparison results
// ABOUTME: One line per difference, phrased as `location: problem: actual != expected`

use crate::diff::{Category, Difference};
use crate::schema::normalize::differs_only_in_modifier;
use crate::utils::sanitize_identifier;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render differences as text, one line each.
///
/// Lines keep the comparator's order, so each table's lines are contiguous,
/// and every line starts with its `table` or `table.object` location.
/// Returns an empty string when there are no differences.
pub fn render(differences: &[Difference]) -> String {
    let mut out = String::new();
    for diff in differences {
        let _ = writeln!(out, "{}", line(diff));
    }
    out
}

/// Count of differences per category, in category order.
pub fn summary(differences: &[Difference]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for diff in differences {
        *counts.entry(diff.category).or_insert(0) += 1;
    }
    counts
}

fn line(diff: &Difference) -> String {
    let table = sanitize_identifier(&diff.location.table);
    let object = diff.location.object.as_deref().map(|object| {
        if is_constraint(diff.category) {
            // Unnamed constraints are labelled by their full signature
            object.chars().filter(|c| !c.is_control()).collect()
        } else {
            sanitize_identifier(object)
        }
    });
    let at = match &object {
        Some(object) => format!("{}.{}", table, object),
        None => table.clone(),
    };
    let expected = diff.expected.as_deref().unwrap_or_default();
    let actual = diff.actual.as_deref().unwrap_or_default();
    let object = object.unwrap_or_default();

    match diff.category {
        Category::MissingTable => format!("{}: table not found", at),
        Category::ExtraTable => format!("{}: table not expected", at),
        Category::MissingColumn => format!("{}: column not found", at),
        Category::ExtraColumn => format!("{}: column not expected", at),
        Category::MissingIndex => format!("{}: index not found: {}", table, object),
        Category::ExtraIndex => format!("{}: index not expected: {}", table, object),
        Category::MissingConstraint => format!("{}: constraint not found: {}", table, object),
        Category::ExtraConstraint => format!("{}: constraint not expected: {}", table, object),
        Category::TableTypeMismatch => {
            format!("{}: type mismatch: {} != {}", at, actual, expected)
        }
        Category::ColumnTypeMismatch if differs_only_in_modifier(expected, actual) => {
            format!("{}: type size mismatch: {} != {}", at, actual, expected)
        }
        Category::ColumnTypeMismatch => {
            format!("{}: type mismatch: {} != {}", at, actual, expected)
        }
        Category::ColumnNullabilityMismatch => {
            format!("{}: nullable mismatch: {} != {}", at, actual, expected)
        }
        Category::ColumnDefaultMismatch => {
            format!("{}: default mismatch: {} != {}", at, actual, expected)
        }
        Category::CommentMismatch => {
            format!("{}: comment mismatch: {} != {}", at, actual, expected)
        }
        Category::IndexDefinitionMismatch => {
            format!("{}: index {} mismatch: {} != {}", table, object, actual, expected)
        }
        Category::ConstraintDefinitionMismatch => {
            format!("{}: constraint {} mismatch: {} != {}", table, object, actual, expected)
        }
    }
}

fn is_constraint(category: Category) -> bool {
    matches!(
        category,
        Category::MissingConstraint
            | Category::ExtraConstraint
            | Category::ConstraintDefinitionMismatch
    )
}
