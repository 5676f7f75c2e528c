//! JSON-LD structured data assembly.
//!
//! One builder per route type. Every builder runs its output through
//! [`prune`] so undefined/empty values never reach the serialized payload —
//! search engines treat explicit nulls as malformed.

use serde_json::{json, Map, Value};

use crate::slug::slugify;
use crate::types::{Category, Recipe};

/// Maximum recipes embedded in a category page's ItemList.
pub const ITEM_LIST_LIMIT: usize = 10;

/// Description budget for recipe schema, cut at a sentence boundary.
const DESCRIPTION_BUDGET: usize = 155;

/// Recursively remove null, empty-string, empty-array, and empty-object
/// values. Arrays and objects are pruned depth-first, so a container whose
/// members all prune away is itself dropped.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| {
                    let v = prune(v);
                    if is_empty(&v) {
                        None
                    } else {
                        Some((k, v))
                    }
                })
                .collect();
            Value::Object(pruned)
        }
        Value::Array(items) => {
            let pruned: Vec<Value> = items
                .into_iter()
                .map(prune)
                .filter(|v| !is_empty(v))
                .collect();
            Value::Array(pruned)
        }
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        // An object whose only surviving keys are @-prefixed markers
        // (@type, @context) carries no data.
        Value::Object(o) => o.keys().all(|k| k.starts_with('@')),
        _ => false,
    }
}

/// Truncate to the description budget, preferring a sentence boundary and
/// falling back to a word boundary with an ellipsis.
pub fn truncate_description(text: &str, budget: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let head: String = text.chars().take(budget).collect();
    if let Some(idx) = head.rfind(['.', '!', '?']) {
        if idx > 0 {
            return head[..=idx].to_string();
        }
    }
    match head.rfind(' ') {
        Some(idx) if idx > 0 => format!("{}…", head[..idx].trim_end()),
        _ => format!("{head}…"),
    }
}

/// Resolve an image reference: absolute URLs pass through, bare filenames
/// are served from the site's image directory.
fn image_url(image: &str, origin: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        image.to_string()
    } else {
        format!("{origin}/images/{image}")
    }
}

/// Split a newline-delimited text block into trimmed, non-empty lines.
fn split_lines(block: Option<&str>) -> Vec<String> {
    block
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// schema.org Recipe object for a recipe route.
pub fn recipe_schema(recipe: &Recipe, origin: &str, site_name: &str) -> Value {
    let ingredients = split_lines(recipe.ingredients.as_deref());
    let instructions: Vec<Value> = split_lines(recipe.instructions.as_deref())
        .into_iter()
        .map(|step| json!({"@type": "HowToStep", "text": step}))
        .collect();

    // Aggregate rating only when both the value and the count exist.
    let aggregate_rating = match (recipe.rating, recipe.rating_count) {
        (Some(rating), Some(count)) => json!({
            "@type": "AggregateRating",
            "ratingValue": rating,
            "ratingCount": count,
        }),
        _ => Value::Null,
    };

    prune(json!({
        "@context": "https://schema.org",
        "@type": "Recipe",
        "name": recipe.name.trim(),
        "description": recipe
            .description
            .as_deref()
            .map(|d| truncate_description(d, DESCRIPTION_BUDGET)),
        "image": recipe
            .images
            .iter()
            .map(|i| image_url(i, origin))
            .collect::<Vec<_>>(),
        "author": json!({
            "@type": "Person",
            "name": recipe.author_name.as_deref().unwrap_or_default(),
        }),
        "publisher": json!({
            "@type": "Organization",
            "name": site_name,
        }),
        "recipeIngredient": ingredients,
        "recipeInstructions": instructions,
        "recipeYield": recipe.servings.map(|s| s.to_string()),
        "keywords": recipe.seo_keywords.as_deref().unwrap_or_default().trim(),
        "aggregateRating": aggregate_rating,
        "datePublished": recipe.created_at.as_deref().unwrap_or_default(),
    }))
}

/// BreadcrumbList from ordered (name, url) pairs.
pub fn breadcrumb_schema(crumbs: &[(&str, String)]) -> Value {
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(i, (name, url))| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": name,
                "item": url,
            })
        })
        .collect();

    prune(json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    }))
}

/// ItemList of a category's member recipes, bounded by [`ITEM_LIST_LIMIT`].
pub fn category_item_list(category: &Category, members: &[&Recipe], origin: &str) -> Value {
    let items: Vec<Value> = members
        .iter()
        .take(ITEM_LIST_LIMIT)
        .enumerate()
        .map(|(i, recipe)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": recipe.name.trim(),
                "url": format!("{origin}/recipe/{}", slugify(&recipe.name)),
            })
        })
        .collect();

    prune(json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "name": category.name.trim(),
        "description": category.description.as_deref().unwrap_or_default(),
        "numberOfItems": members.len().min(ITEM_LIST_LIMIT),
        "itemListElement": items,
    }))
}

/// Organization and WebSite (with a SearchAction aimed at the recipe
/// listing) for the home route.
pub fn home_schemas(site_name: &str, description: Option<&str>, origin: &str) -> Vec<Value> {
    let organization = prune(json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": site_name,
        "url": format!("{origin}/"),
        "description": description.unwrap_or_default(),
    }));

    let website = prune(json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": site_name,
        "url": format!("{origin}/"),
        "potentialAction": {
            "@type": "SearchAction",
            "target": format!("{origin}/recipes?search={{search_term_string}}"),
            "query-input": "required name=search_term_string",
        },
    }));

    vec![organization, website]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        Recipe {
            id: 1,
            name: "Chili".to_string(),
            description: Some("A hearty bowl. Great for winter nights with plenty of spice and a long simmer that deepens the flavor considerably over several hours of cooking.".to_string()),
            ingredients: Some("1 lb beef\n2 cans beans\n\n1 onion".to_string()),
            instructions: Some("Brown the beef.\nSimmer.".to_string()),
            author_name: Some("Bob".to_string()),
            rating: Some(4.5),
            rating_count: Some(12),
            images: vec!["chili.jpg".to_string(), "https://cdn.example/c.jpg".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_prune_removes_empty_values() {
        let pruned = prune(json!({
            "keep": "x",
            "null": null,
            "empty": "",
            "list": [],
            "nested": {"inner": null},
            "zero": 0,
            "false": false,
        }));
        assert_eq!(pruned, json!({"keep": "x", "zero": 0, "false": false}));
    }

    #[test]
    fn test_recipe_schema_shape() {
        let schema = recipe_schema(&recipe(), "https://example.com", "Springform Kitchen");
        assert_eq!(schema["@type"], "Recipe");
        assert_eq!(schema["recipeIngredient"].as_array().unwrap().len(), 3);
        let steps = schema["recipeInstructions"].as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["@type"], "HowToStep");
        assert_eq!(
            schema["image"][0],
            "https://example.com/images/chili.jpg"
        );
        assert_eq!(schema["image"][1], "https://cdn.example/c.jpg");
        assert_eq!(schema["aggregateRating"]["ratingValue"], 4.5);
    }

    #[test]
    fn test_rating_requires_both_fields() {
        let mut r = recipe();
        r.rating_count = None;
        let schema = recipe_schema(&r, "https://example.com", "Springform Kitchen");
        assert!(schema.get("aggregateRating").is_none());
    }

    #[test]
    fn test_no_nulls_in_sparse_recipe() {
        let sparse = Recipe {
            id: 2,
            name: "Toast".to_string(),
            ..Default::default()
        };
        let schema = recipe_schema(&sparse, "https://example.com", "Springform Kitchen");
        let serialized = serde_json::to_string(&schema).unwrap();
        assert!(!serialized.contains("null"));
        assert!(schema.get("description").is_none());
        assert!(schema.get("author").is_none(), "empty author object pruned");
    }

    #[test]
    fn test_description_truncated_at_sentence() {
        let schema = recipe_schema(&recipe(), "https://example.com", "Springform Kitchen");
        let description = schema["description"].as_str().unwrap();
        assert!(description.chars().count() <= 155);
        assert!(description.ends_with('.'));
    }

    #[test]
    fn test_truncate_word_boundary_fallback() {
        let text = "word ".repeat(60);
        let cut = truncate_description(&text, 155);
        assert!(cut.chars().count() <= 156);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_description("Short.", 155), "Short.");
    }

    #[test]
    fn test_breadcrumbs_positions() {
        let schema = breadcrumb_schema(&[
            ("Home", "https://example.com/".to_string()),
            ("Recipes", "https://example.com/recipes".to_string()),
            ("Chili", "https://example.com/recipe/chili".to_string()),
        ]);
        let items = schema["itemListElement"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2]["position"], 3);
        assert_eq!(items[2]["name"], "Chili");
    }

    #[test]
    fn test_item_list_bounded() {
        let recipes: Vec<Recipe> = (0..20)
            .map(|i| Recipe {
                id: i,
                name: format!("Recipe {i}"),
                ..Default::default()
            })
            .collect();
        let refs: Vec<&Recipe> = recipes.iter().collect();
        let category = Category {
            id: Some(1),
            name: "Mains".to_string(),
            ..Default::default()
        };
        let schema = category_item_list(&category, &refs, "https://example.com");
        assert_eq!(schema["itemListElement"].as_array().unwrap().len(), ITEM_LIST_LIMIT);
        assert_eq!(schema["numberOfItems"], ITEM_LIST_LIMIT);
    }

    #[test]
    fn test_home_schemas() {
        let schemas = home_schemas("Springform Kitchen", None, "https://example.com");
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0]["@type"], "Organization");
        assert_eq!(schemas[1]["@type"], "WebSite");
        let target = schemas[1]["potentialAction"]["target"].as_str().unwrap();
        assert!(target.starts_with("https://example.com/recipes"));
    }
}
