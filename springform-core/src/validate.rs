//! Validator stage: structural and cross-referential checks.
//!
//! `validate` is a pure function of its input dataset: it never mutates the
//! data, and every rule builds its own partial report which the entry point
//! merges. That keeps each rule unit-testable in isolation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use url::Url;

use crate::report::{EntityKind, QualityReport, ValidationIssue};
use crate::types::Dataset;

/// Canonical category URL pattern: `/recipes/category/<slug>`.
static CATEGORY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/recipes/category/[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid category URL regex")
});

/// Completeness threshold below which the dataset gets an advisory warning.
const COMPLETENESS_WARN_PCT: f64 = 90.0;

/// Fields counted toward recipe completeness.
const COMPLETENESS_FIELDS: usize = 5;

/// Whether a category URL already has the canonical shape.
pub fn is_canonical_category_url(url: &str) -> bool {
    CATEGORY_URL_RE.is_match(url)
}

/// Validate a complete dataset, producing a finalized [`QualityReport`].
pub fn validate(dataset: &Dataset) -> QualityReport {
    let report = validate_recipes(dataset)
        .merge(validate_categories(dataset))
        .merge(validate_websites(dataset))
        .merge(validate_menu_items(dataset))
        .merge(compute_metrics(dataset));

    // Defense in depth: recompute the orphan check at dataset level and flag
    // anything the per-recipe pass missed.
    let report = cross_check_references(dataset, report);

    report.finalize(dataset.total_items())
}

fn validate_recipes(dataset: &Dataset) -> QualityReport {
    let mut report = QualityReport::new();
    let category_ids: HashSet<i64> =
        dataset.categories.iter().filter_map(|c| c.id).collect();
    let mut seen_names: HashMap<String, i64> = HashMap::new();

    for recipe in &dataset.recipes {
        let item = recipe.id.to_string();

        if !recipe.has_name() {
            report = report.error(ValidationIssue::new(
                EntityKind::Recipe,
                &item,
                "missing name",
            ));
        } else {
            let key = recipe.name.trim().to_lowercase();
            match seen_names.get(&key) {
                Some(first_id) => {
                    report = report.warning(
                        ValidationIssue::new(
                            EntityKind::Recipe,
                            &item,
                            format!("duplicate name \"{}\"", recipe.name.trim()),
                        )
                        .with_details(format!("first occurrence kept as canonical: id {first_id}")),
                    );
                }
                None => {
                    seen_names.insert(key, recipe.id);
                }
            }
        }

        if recipe.ingredients.as_deref().map_or(true, |s| s.trim().is_empty()) {
            report = report.warning(ValidationIssue::new(
                EntityKind::Recipe,
                &item,
                "missing ingredients",
            ));
        }
        if recipe.instructions.as_deref().map_or(true, |s| s.trim().is_empty()) {
            report = report.warning(ValidationIssue::new(
                EntityKind::Recipe,
                &item,
                "missing instructions",
            ));
        }

        if let Some(servings) = recipe.servings {
            if !(1..=50).contains(&servings) {
                report = report.warning(
                    ValidationIssue::new(
                        EntityKind::Recipe,
                        &item,
                        format!("servings {servings} outside expected range 1-50"),
                    ),
                );
            }
        }

        if let Some(rating) = recipe.rating {
            if !(0.0..=5.0).contains(&rating) {
                report = report.error(ValidationIssue::new(
                    EntityKind::Recipe,
                    &item,
                    format!("rating {rating} outside valid range 0-5"),
                ));
            }
        }

        match recipe.category_id {
            None => {
                report = report.error(ValidationIssue::new(
                    EntityKind::Recipe,
                    &item,
                    "orphaned recipe: missing categoryId",
                ));
            }
            Some(id) if !category_ids.contains(&id) => {
                report = report.error(ValidationIssue::new(
                    EntityKind::Recipe,
                    &item,
                    format!("orphaned recipe: categoryId {id} does not resolve"),
                ));
            }
            Some(_) => {}
        }
    }

    report
}

fn validate_categories(dataset: &Dataset) -> QualityReport {
    let mut report = QualityReport::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<i64> = HashSet::new();

    // "Used" means at least one recipe references the category id.
    let referenced: HashSet<i64> = dataset
        .recipes
        .iter()
        .filter_map(|r| r.category_id)
        .collect();

    for category in &dataset.categories {
        let item = category
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "general".to_string());

        match category.id {
            None => {
                report = report.error(ValidationIssue::new(
                    EntityKind::Category,
                    &item,
                    "missing id",
                ));
            }
            Some(id) => {
                if !seen_ids.insert(id) {
                    report = report.error(ValidationIssue::new(
                        EntityKind::Category,
                        &item,
                        format!("duplicate id {id}"),
                    ));
                }
            }
        }

        if category.name.trim().is_empty() {
            report = report.error(ValidationIssue::new(
                EntityKind::Category,
                &item,
                "missing name",
            ));
        } else if !seen_names.insert(category.name.trim().to_lowercase()) {
            report = report.error(ValidationIssue::new(
                EntityKind::Category,
                &item,
                format!("duplicate name \"{}\"", category.name.trim()),
            ));
        }

        let canonical = category
            .url
            .as_deref()
            .map(is_canonical_category_url)
            .unwrap_or(false);
        if !canonical {
            report = report.warning(
                ValidationIssue::new(
                    EntityKind::Category,
                    &item,
                    "url does not match /recipes/category/<slug>",
                )
                .with_details(format!("url: {:?}", category.url)),
            );
        }

        if let Some(id) = category.id {
            if !referenced.contains(&id) {
                report = report.warning(ValidationIssue::new(
                    EntityKind::Category,
                    &item,
                    format!("unused category \"{}\"", category.name.trim()),
                ));
            }
        }
    }

    report
}

fn validate_websites(dataset: &Dataset) -> QualityReport {
    let mut report = QualityReport::new();

    for website in &dataset.websites {
        let item = website
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "general".to_string());

        if website.id.is_none() {
            report = report.error(ValidationIssue::new(
                EntityKind::Website,
                &item,
                "missing id",
            ));
        }
        if website.name.trim().is_empty() {
            report = report.error(ValidationIssue::new(
                EntityKind::Website,
                &item,
                "missing name",
            ));
        }
        if let Some(raw) = website.website_url.as_deref() {
            if Url::parse(raw).is_err() {
                report = report.warning(
                    ValidationIssue::new(EntityKind::Website, &item, "malformed websiteUrl")
                        .with_details(format!("url: {raw}")),
                );
            }
        }
    }

    report
}

fn validate_menu_items(dataset: &Dataset) -> QualityReport {
    let mut report = QualityReport::new();

    for menu_item in &dataset.menu_items {
        let item = menu_item
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "general".to_string());

        if menu_item.title.trim().is_empty() {
            report = report.warning(ValidationIssue::new(
                EntityKind::MenuItem,
                &item,
                "missing title",
            ));
        }

        if let Some(raw) = menu_item.url.as_deref() {
            let absolute = Url::parse(raw).is_ok();
            let root_relative = raw.starts_with('/');
            if !absolute && !root_relative {
                report = report.warning(
                    ValidationIssue::new(
                        EntityKind::MenuItem,
                        &item,
                        "url is neither absolute nor root-relative",
                    )
                    .with_details(format!("url: {raw}")),
                );
            }
        }
    }

    report
}

/// Dataset-level referential check, independent of the per-recipe pass.
///
/// Compares the set of referenced category ids against the known id set and
/// flags any orphan the per-entity rules did not already report.
fn cross_check_references(dataset: &Dataset, mut report: QualityReport) -> QualityReport {
    let category_ids: HashSet<i64> =
        dataset.categories.iter().filter_map(|c| c.id).collect();

    let already_flagged: HashSet<String> = report
        .errors
        .iter()
        .filter(|i| i.category == EntityKind::Recipe && i.message.contains("orphaned"))
        .map(|i| i.item.clone())
        .collect();

    for recipe in &dataset.recipes {
        let orphaned = match recipe.category_id {
            None => true,
            Some(id) => !category_ids.contains(&id),
        };
        if orphaned && !already_flagged.contains(&recipe.id.to_string()) {
            report = report.error(
                ValidationIssue::new(
                    EntityKind::General,
                    "general",
                    format!("orphaned recipe {} missed by per-entity check", recipe.id),
                ),
            );
        }
    }

    report
}

/// Dataset metrics: totals, completeness, category distribution, and
/// missing-field counts. Low completeness is advisory only.
fn compute_metrics(dataset: &Dataset) -> QualityReport {
    let mut report = QualityReport::new();
    let mut metrics: BTreeMap<String, Value> = BTreeMap::new();

    metrics.insert("totalRecipes".into(), json!(dataset.recipes.len()));
    metrics.insert("totalCategories".into(), json!(dataset.categories.len()));
    metrics.insert("totalWebsites".into(), json!(dataset.websites.len()));
    metrics.insert("totalMenuItems".into(), json!(dataset.menu_items.len()));

    let mut missing: BTreeMap<&str, usize> = BTreeMap::new();
    let mut present = 0usize;
    for recipe in &dataset.recipes {
        let checks = [
            ("name", recipe.has_name()),
            ("description", field_present(recipe.description.as_deref())),
            ("ingredients", field_present(recipe.ingredients.as_deref())),
            ("instructions", field_present(recipe.instructions.as_deref())),
            ("images", !recipe.images.is_empty()),
        ];
        for (field, ok) in checks {
            if ok {
                present += 1;
            } else {
                *missing.entry(field).or_default() += 1;
            }
        }
    }

    let completeness = if dataset.recipes.is_empty() {
        100.0
    } else {
        present as f64 / (dataset.recipes.len() * COMPLETENESS_FIELDS) as f64 * 100.0
    };
    metrics.insert("recipeCompleteness".into(), json!(completeness));
    metrics.insert("missingFields".into(), json!(missing));

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for recipe in &dataset.recipes {
        let name = recipe
            .category_id
            .and_then(|id| dataset.category_by_id(id))
            .map(|c| c.name.trim().to_string())
            .unwrap_or_else(|| "(unresolved)".to_string());
        *distribution.entry(name).or_default() += 1;
    }
    metrics.insert("categoryDistribution".into(), json!(distribution));

    report.metrics = metrics;

    if completeness < COMPLETENESS_WARN_PCT {
        report = report.warning(
            ValidationIssue::new(
                EntityKind::General,
                "general",
                format!("recipe completeness {completeness:.1}% below {COMPLETENESS_WARN_PCT}%"),
            ),
        );
    }

    report
}

fn field_present(field: Option<&str>) -> bool {
    field.map_or(false, |s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, MenuItem, Recipe, Website};

    fn category(id: i64, name: &str) -> Category {
        Category {
            id: Some(id),
            name: name.to_string(),
            url: Some(format!("/recipes/category/{}", crate::slug::slugify(name))),
            is_active: true,
            ..Default::default()
        }
    }

    fn recipe(id: i64, name: &str, category_id: i64) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            description: Some("Tasty.".to_string()),
            ingredients: Some("1 cup flour\n2 eggs".to_string()),
            instructions: Some("Mix.\nBake.".to_string()),
            category_id: Some(category_id),
            images: vec!["photo.jpg".to_string()],
            ..Default::default()
        }
    }

    fn clean_dataset() -> Dataset {
        Dataset {
            recipes: vec![recipe(1, "Chili", 3), recipe(2, "Brownies", 4)],
            categories: vec![category(3, "Mains"), category(4, "Desserts")],
            websites: vec![Website {
                id: Some(1),
                name: "Springform Kitchen".to_string(),
                website_url: Some("https://springform.app".to_string()),
                ..Default::default()
            }],
            menu_items: vec![MenuItem {
                id: Some(1),
                title: "Recipes".to_string(),
                url: Some("/recipes".to_string()),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_clean_dataset_scores_100() {
        let report = validate(&clean_dataset());
        assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert_eq!(report.quality_score, 100.0);
        assert!(report.passed);
    }

    #[test]
    fn test_missing_recipe_name_is_error() {
        let mut dataset = clean_dataset();
        dataset.recipes[0].name = "  ".to_string();
        let report = validate(&dataset);
        assert!(report
            .errors
            .iter()
            .any(|i| i.category == EntityKind::Recipe && i.message == "missing name"));
    }

    #[test]
    fn test_orphaned_recipe_is_error() {
        let mut dataset = clean_dataset();
        dataset.recipes[0].category_id = Some(999);
        let report = validate(&dataset);
        let orphan_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|i| i.message.contains("orphaned"))
            .collect();
        assert_eq!(orphan_errors.len(), 1, "orphan flagged exactly once");
        assert_eq!(orphan_errors[0].item, "1");
    }

    #[test]
    fn test_rating_out_of_range_is_error() {
        let mut dataset = clean_dataset();
        dataset.recipes[0].rating = Some(6.5);
        let report = validate(&dataset);
        assert!(report.errors.iter().any(|i| i.message.contains("rating")));
    }

    #[test]
    fn test_servings_out_of_range_is_warning() {
        let mut dataset = clean_dataset();
        dataset.recipes[0].servings = Some(0);
        let report = validate(&dataset);
        assert!(report.errors.iter().all(|i| !i.message.contains("servings")));
        assert!(report.warnings.iter().any(|i| i.message.contains("servings")));
    }

    #[test]
    fn test_duplicate_recipe_name_warns_on_second_only() {
        let mut dataset = clean_dataset();
        dataset.recipes.push(recipe(9, "CHILI", 3));
        let report = validate(&dataset);
        let dups: Vec<_> = report
            .warnings
            .iter()
            .filter(|i| i.message.contains("duplicate name"))
            .collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].item, "9");
    }

    #[test]
    fn test_duplicate_category_name_is_error() {
        let mut dataset = clean_dataset();
        dataset.categories.push(category(5, "desserts"));
        dataset.recipes.push(recipe(3, "Tart", 5));
        let report = validate(&dataset);
        assert!(report
            .errors
            .iter()
            .any(|i| i.category == EntityKind::Category && i.message.contains("duplicate name")));
    }

    #[test]
    fn test_noncanonical_category_url_is_warning() {
        let mut dataset = clean_dataset();
        dataset.categories[0].url = Some("http://old.example/recipes/mains".to_string());
        let report = validate(&dataset);
        assert!(report
            .warnings
            .iter()
            .any(|i| i.message.contains("/recipes/category/")));
    }

    #[test]
    fn test_unused_category_is_warning() {
        let mut dataset = clean_dataset();
        dataset.categories.push(category(8, "Salads"));
        let report = validate(&dataset);
        assert!(report
            .warnings
            .iter()
            .any(|i| i.message.contains("unused category")));
        assert!(report.passed);
    }

    #[test]
    fn test_menu_item_url_shapes() {
        let mut dataset = clean_dataset();
        dataset.menu_items.push(MenuItem {
            id: Some(2),
            title: "External".to_string(),
            url: Some("https://example.com/blog".to_string()),
            ..Default::default()
        });
        dataset.menu_items.push(MenuItem {
            id: Some(3),
            title: "Broken".to_string(),
            url: Some("not a url".to_string()),
            ..Default::default()
        });
        let report = validate(&dataset);
        let bad: Vec<_> = report
            .warnings
            .iter()
            .filter(|i| i.message.contains("neither absolute"))
            .collect();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].item, "3");
    }

    #[test]
    fn test_low_completeness_warns() {
        let mut dataset = clean_dataset();
        for recipe in &mut dataset.recipes {
            recipe.description = None;
            recipe.images.clear();
        }
        let report = validate(&dataset);
        assert!(report
            .warnings
            .iter()
            .any(|i| i.message.contains("completeness")));
    }

    #[test]
    fn test_validator_does_not_mutate() {
        let dataset = clean_dataset();
        let before = serde_json::to_value(&dataset).unwrap();
        let _ = validate(&dataset);
        assert_eq!(serde_json::to_value(&dataset).unwrap(), before);
    }

    #[test]
    fn test_canonical_url_pattern() {
        assert!(is_canonical_category_url("/recipes/category/soups"));
        assert!(is_canonical_category_url("/recipes/category/bob-s-chili"));
        assert!(!is_canonical_category_url("/recipes/category/"));
        assert!(!is_canonical_category_url("/recipes/category/Soups"));
        assert!(!is_canonical_category_url("http://old.example/recipes/soups"));
    }
}
