//! Auto-Fixer stage: deterministic, idempotent repair heuristics.
//!
//! Only three repairs exist, applied in order: orphaned-recipe reassignment,
//! category URL normalization, and invalid-recipe removal. Rating/servings
//! anomalies and duplicate names stay as warnings for human review.

use std::collections::HashSet;

use crate::report::QualityReport;
use crate::slug::slugify;
use crate::types::{Category, Dataset};
use crate::validate::is_canonical_category_url;

/// Keyword groups mapped to category-name substrings, scanned in order;
/// first match against the lowercased recipe name wins.
///
/// The order reflects observed heuristics, not a documented business rule:
/// "chicken soup" lands in the soup group because soup precedes the
/// main-dish group. Treat reorderings as behavior changes.
const REASSIGNMENT_RULES: &[(&[&str], &[&str])] = &[
    (&["dip", "appetizer"], &["appetizer"]),
    (&["dessert", "cake", "cookie"], &["dessert"]),
    (&["soup", "stew"], &["soup"]),
    (&["salad"], &["salad"]),
    (&["main", "dinner", "chicken", "beef"], &["main", "entree"]),
];

/// What the fixer did to the dataset.
#[derive(Debug, Clone, Default)]
pub struct FixOutcome {
    pub fixed_count: usize,
    pub reassigned: usize,
    pub urls_normalized: usize,
    pub removed: usize,
}

/// Apply the repair heuristics to `dataset` in place.
///
/// The `report` parameter documents what triggered the run; the fixer
/// recomputes each defect from the dataset itself so that re-running on
/// already-fixed data finds nothing to do.
pub fn fix(dataset: &mut Dataset, _report: &QualityReport) -> FixOutcome {
    let mut outcome = FixOutcome::default();

    outcome.reassigned = reassign_orphans(dataset);
    outcome.urls_normalized = normalize_category_urls(dataset);
    outcome.removed = remove_invalid_recipes(dataset);

    outcome.fixed_count = outcome.reassigned + outcome.urls_normalized + outcome.removed;
    if outcome.fixed_count > 0 {
        tracing::info!(
            reassigned = outcome.reassigned,
            urls_normalized = outcome.urls_normalized,
            removed = outcome.removed,
            "auto-fix applied"
        );
    }
    outcome
}

/// Reassign every orphaned recipe to the best-matching category.
fn reassign_orphans(dataset: &mut Dataset) -> usize {
    if dataset.categories.is_empty() {
        // Nothing to reassign to; orphans stay errors for the re-validation.
        return 0;
    }

    let category_ids: HashSet<i64> =
        dataset.categories.iter().filter_map(|c| c.id).collect();
    let categories = dataset.categories.clone();
    let mut fixed = 0;

    for recipe in &mut dataset.recipes {
        let orphaned = match recipe.category_id {
            None => true,
            Some(id) => !category_ids.contains(&id),
        };
        if !orphaned {
            continue;
        }

        let target = match_category(&recipe.name, &categories)
            .or_else(|| categories.first())
            .and_then(|c| c.id.map(|id| (id, c)));

        if let Some((id, category)) = target {
            tracing::debug!(
                recipe = recipe.id,
                category = id,
                name = %category.name,
                "reassigning orphaned recipe"
            );
            recipe.category_id = Some(id);
            recipe.category_name = Some(category.name.clone());
            recipe.category_description = category.description.clone();
            fixed += 1;
        }
    }

    fixed
}

/// Find the target category for a recipe name via the ordered rule table.
fn match_category<'a>(name: &str, categories: &'a [Category]) -> Option<&'a Category> {
    let lowered = name.to_lowercase();
    for (keywords, substrings) in REASSIGNMENT_RULES {
        if keywords.iter().any(|k| lowered.contains(k)) {
            for substring in *substrings {
                if let Some(category) = categories
                    .iter()
                    .find(|c| c.name.to_lowercase().contains(substring))
                {
                    return Some(category);
                }
            }
        }
    }
    None
}

/// Rewrite every non-canonical category URL to `/recipes/category/<slug>`.
///
/// A fix is counted only when the url actually changes. Names that slug to
/// nothing (symbol-only) are skipped entirely: the rewrite could never reach
/// the canonical shape, so the url is left for the validator to keep warning
/// about instead of being rewritten on every run.
fn normalize_category_urls(dataset: &mut Dataset) -> usize {
    let mut fixed = 0;
    for category in &mut dataset.categories {
        let slug = slugify(&category.name);
        if slug.is_empty() {
            continue;
        }
        let canonical = category
            .url
            .as_deref()
            .map(is_canonical_category_url)
            .unwrap_or(false);
        if !canonical {
            let target = format!("/recipes/category/{slug}");
            if category.url.as_deref() != Some(target.as_str()) {
                category.url = Some(target);
                fixed += 1;
            }
        }
    }
    fixed
}

/// Drop recipes that still lack a usable name.
fn remove_invalid_recipes(dataset: &mut Dataset) -> usize {
    let before = dataset.recipes.len();
    dataset.recipes.retain(|r| r.has_name());
    before - dataset.recipes.len()
}
