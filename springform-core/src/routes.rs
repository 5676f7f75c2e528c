//! Route enumeration and canonical URL construction.
//!
//! Routes are derived, never persisted: every build recomputes the full set
//! from the frozen dataset so slugs, canonical URLs, and structured data can
//! never drift apart.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::slug::slugify;
use crate::structured::{
    breadcrumb_schema, category_item_list, home_schemas, recipe_schema, truncate_description,
};
use crate::types::Dataset;

/// One prerenderable static route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// Root-relative path, e.g. `/recipe/bob-s-chili`.
    pub path: String,
    pub title: String,
    pub description: String,
    /// Absolute URL; the embedded og:url must agree with this exactly.
    pub canonical_url: String,
    pub structured_data: Vec<Value>,
}

/// Resolve the site's public origin.
///
/// Precedence: explicit custom domain > deployment marker file (shortest
/// non-empty entry, first on ties) > repository-subpath fallback
/// (`https://<owner>.github.io/<repo>`).
pub fn resolve_origin(custom_domain: Option<&str>, marker: &Path, repository: &str) -> String {
    if let Some(domain) = custom_domain {
        let domain = domain.trim().trim_end_matches('/');
        if !domain.is_empty() {
            return if domain.starts_with("http://") || domain.starts_with("https://") {
                domain.to_string()
            } else {
                format!("https://{domain}")
            };
        }
    }

    if let Ok(contents) = std::fs::read_to_string(marker) {
        let best = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .min_by_key(|l| l.len());
        if let Some(entry) = best {
            return format!("https://{}", entry.trim_end_matches('/'));
        }
    }

    match repository.split_once('/') {
        Some((owner, repo)) => format!("https://{owner}.github.io/{repo}"),
        None => format!("https://{repository}.github.io"),
    }
}

/// Join the origin and a root-relative path into an absolute URL.
pub fn canonical_url(origin: &str, path: &str) -> String {
    if path == "/" {
        format!("{origin}/")
    } else {
        format!("{origin}{path}")
    }
}

/// Enumerate every static route the dataset implies: home, the two listing
/// pages, one route per recipe, and one per active category.
pub fn enumerate_routes(dataset: &Dataset, origin: &str, site_name: &str) -> Vec<RouteDescriptor> {
    let mut routes = Vec::with_capacity(3 + dataset.recipes.len() + dataset.categories.len());

    let site_description = dataset
        .websites
        .first()
        .and_then(|w| w.description.as_deref());

    let home = canonical_url(origin, "/");
    let recipes_url = canonical_url(origin, "/recipes");

    routes.push(RouteDescriptor {
        path: "/".to_string(),
        title: format!("{site_name} - Recipes Worth Baking"),
        description: site_description
            .map(|d| truncate_description(d, 155))
            .unwrap_or_else(|| format!("{site_name}: tested recipes, organized by category.")),
        canonical_url: home.clone(),
        structured_data: home_schemas(site_name, site_description, origin),
    });

    routes.push(RouteDescriptor {
        path: "/recipes".to_string(),
        title: format!("All Recipes - {site_name}"),
        description: format!("Browse every recipe on {site_name}."),
        canonical_url: recipes_url.clone(),
        structured_data: vec![breadcrumb_schema(&[
            ("Home", home.clone()),
            ("Recipes", recipes_url.clone()),
        ])],
    });

    routes.push(RouteDescriptor {
        path: "/categories".to_string(),
        title: format!("Recipe Categories - {site_name}"),
        description: format!("All recipe categories on {site_name}."),
        canonical_url: canonical_url(origin, "/categories"),
        structured_data: vec![breadcrumb_schema(&[
            ("Home", home.clone()),
            ("Categories", canonical_url(origin, "/categories")),
        ])],
    });

    // Duplicate names collapse to one slug; the first occurrence is the
    // canonical one and must be the route that gets prerendered, matching
    // the validator's duplicate-name rule and the sitemap's loc dedup.
    let mut seen_paths: HashSet<String> = HashSet::new();

    for recipe in &dataset.recipes {
        if !recipe.has_name() {
            continue;
        }
        let slug = slugify(&recipe.name);
        let path = format!("/recipe/{slug}");
        if !seen_paths.insert(path.clone()) {
            continue;
        }
        let url = canonical_url(origin, &path);
        let description = recipe
            .description
            .as_deref()
            .map(|d| truncate_description(d, 155))
            .unwrap_or_else(|| format!("{} recipe from {site_name}.", recipe.name.trim()));

        routes.push(RouteDescriptor {
            path,
            title: format!("{} Recipe - {site_name}", recipe.name.trim()),
            description,
            canonical_url: url.clone(),
            structured_data: vec![
                recipe_schema(recipe, origin, site_name),
                breadcrumb_schema(&[
                    ("Home", home.clone()),
                    ("Recipes", recipes_url.clone()),
                    (recipe.name.trim(), url),
                ]),
            ],
        });
    }

    for category in &dataset.categories {
        if !category.is_active || category.name.trim().is_empty() {
            continue;
        }
        let slug = slugify(&category.name);
        let path = format!("/recipes/category/{slug}");
        if !seen_paths.insert(path.clone()) {
            continue;
        }
        let url = canonical_url(origin, &path);
        let members: Vec<_> = dataset
            .recipes
            .iter()
            .filter(|r| r.category_id == category.id && r.has_name())
            .collect();

        routes.push(RouteDescriptor {
            path,
            title: format!("{} Recipes - {site_name}", category.name.trim()),
            description: category
                .description
                .as_deref()
                .map(|d| truncate_description(d, 155))
                .unwrap_or_else(|| {
                    format!("{} recipes from {site_name}.", category.name.trim())
                }),
            canonical_url: url.clone(),
            structured_data: vec![
                category_item_list(category, &members, origin),
                breadcrumb_schema(&[
                    ("Home", home.clone()),
                    ("Recipes", recipes_url.clone()),
                    (category.name.trim(), url),
                ]),
            ],
        });
    }

    routes
}
