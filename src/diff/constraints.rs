// ABOUTME: Pairs expected and actual constraints for comparison
// ABOUTME: Matches by explicit name, or by structure when the model left the name to the engine

use crate::schema::normalize::canonical_expression;
use crate::schema::{Constraint, ConstraintKind};

/// An expected constraint, its actual counterpart, or both.
#[derive(Debug)]
pub(crate) struct ConstraintPair<'a> {
    pub label: String,
    pub expected: Option<&'a Constraint>,
    pub actual: Option<&'a Constraint>,
}

/// Pair constraints, sorted by label.
///
/// Named expected constraints claim the same-named actual constraint first.
/// Unnamed expected constraints then claim an unpaired actual constraint with
/// the same structural identity. Whatever is left over is unpaired.
pub(crate) fn match_constraints<'a>(
    expected: &'a [Constraint],
    actual: &'a [Constraint],
) -> Vec<ConstraintPair<'a>> {
    let mut claimed = vec![false; actual.len()];
    let mut matched: Vec<(&'a Constraint, Option<usize>)> = Vec::with_capacity(expected.len());

    for exp in expected.iter().filter(|c| c.name.is_some()) {
        let found = actual
            .iter()
            .enumerate()
            .position(|(i, act)| !claimed[i] && act.name.is_some() && act.name == exp.name);
        if let Some(i) = found {
            claimed[i] = true;
        }
        matched.push((exp, found));
    }

    for exp in expected.iter().filter(|c| c.name.is_none()) {
        let key = identity(exp);
        let found = actual
            .iter()
            .enumerate()
            .position(|(i, act)| !claimed[i] && identity(act) == key);
        if let Some(i) = found {
            claimed[i] = true;
        }
        matched.push((exp, found));
    }

    let mut pairs: Vec<ConstraintPair<'a>> = matched
        .into_iter()
        .map(|(exp, found)| {
            let act = found.map(|i| &actual[i]);
            ConstraintPair {
                label: act.unwrap_or(exp).label(),
                expected: Some(exp),
                actual: act,
            }
        })
        .collect();

    pairs.extend(
        actual
            .iter()
            .zip(claimed)
            .filter(|(_, claimed)| !claimed)
            .map(|(act, _)| ConstraintPair {
                label: act.label(),
                expected: None,
                actual: Some(act),
            }),
    );

    pairs.sort_by(|a, b| a.label.cmp(&b.label));
    pairs
}

/// Structural identity: kind, columns, and target, ignoring the name and
/// referential actions.
pub(crate) fn identity(constraint: &Constraint) -> String {
    match &constraint.kind {
        ConstraintKind::PrimaryKey | ConstraintKind::Unique => format!(
            "{} ({})",
            constraint.kind.keyword(),
            constraint.columns.join(",")
        ),
        ConstraintKind::ForeignKey {
            referenced_table,
            referenced_columns,
            ..
        } => format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            constraint.columns.join(","),
            referenced_table,
            referenced_columns.join(",")
        ),
        ConstraintKind::Check { expression } => {
            format!("CHECK ({})", canonical_expression(expression))
        }
    }
}

/// Whether two paired constraints have the same definition.
pub(crate) fn same_definition(expected: &Constraint, actual: &Constraint) -> bool {
    if identity(expected) != identity(actual) {
        return false;
    }
    match (&expected.kind, &actual.kind) {
        (
            ConstraintKind::ForeignKey {
                on_delete: exp_delete,
                on_update: exp_update,
                ..
            },
            ConstraintKind::ForeignKey {
                on_delete: act_delete,
                on_update: act_update,
                ..
            },
        ) => exp_delete == act_delete && exp_update == act_update,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReferentialAction;

    #[test]
    fn test_unnamed_expected_matches_engine_named_actual() {
        let expected = vec![Constraint::foreign_key(["user_id"], "users", ["id"])];
        let actual = vec![
            Constraint::foreign_key(["user_id"], "users", ["id"]).named("orders_user_id_fkey"),
        ];

        let pairs = match_constraints(&expected, &actual);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].label, "orders_user_id_fkey");
        assert!(pairs[0].expected.is_some() && pairs[0].actual.is_some());
    }

    #[test]
    fn test_named_constraints_match_by_name_only() {
        let expected = vec![Constraint::unique(["email"]).named("uq_email")];
        let actual = vec![Constraint::unique(["email"]).named("users_email_key")];

        let pairs = match_constraints(&expected, &actual);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].label, "uq_email");
        assert!(pairs[0].actual.is_none());
        assert_eq!(pairs[1].label, "users_email_key");
        assert!(pairs[1].expected.is_none());
    }

    #[test]
    fn test_named_claims_before_structural() {
        let expected = vec![
            Constraint::unique(["email"]),
            Constraint::unique(["email"]).named("b_key"),
        ];
        let actual = vec![
            Constraint::unique(["email"]).named("b_key"),
            Constraint::unique(["email"]).named("a_key"),
        ];

        let pairs = match_constraints(&expected, &actual);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.expected.is_some() && p.actual.is_some()));
        assert_eq!(pairs[0].label, "a_key");
        assert_eq!(pairs[1].label, "b_key");
    }

    #[test]
    fn test_same_definition_checks_actions() {
        let expected = Constraint::foreign_key(["user_id"], "users", ["id"])
            .on_delete(ReferentialAction::Cascade);
        let actual = Constraint::foreign_key(["user_id"], "users", ["id"]).named("fk");
        assert!(!same_definition(&expected, &actual));
        assert!(same_definition(&expected, &actual.clone().on_delete(ReferentialAction::Cascade)));
    }

    #[test]
    fn test_check_identity_uses_canonical_expression() {
        let a = Constraint::check("price > 0");
        let b = Constraint::check("(price > (0)::numeric)").named("orders_price_check");
        assert_eq!(identity(&a), identity(&b));
    }
}
