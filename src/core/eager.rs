//! Eager-load planning: which lookup relations a column selection needs

use crate::core::registry::ColumnRegistry;
use crate::entities::Relation;

/// Relations to prefetch for `selected` columns
///
/// The union of the selected columns' relationships in first-appearance
/// order. An empty union falls back to `default`, so there is always a
/// non-empty plan when a default is configured.
pub fn plan_eager_loads<S: AsRef<str>>(
    registry: &ColumnRegistry,
    selected: &[S],
    default: &[Relation],
) -> Vec<Relation> {
    let mut plan: Vec<Relation> = Vec::new();
    for key in selected {
        let Some(relation) = registry.get(key.as_ref()).and_then(|c| c.relationship) else {
            continue;
        };
        if !plan.contains(&relation) {
            plan.push(relation);
        }
    }

    if plan.is_empty() {
        tracing::debug!("no relationship columns selected, using default eager set");
        return default.to_vec();
    }
    plan
}
