//! Entity types for the content dataset.
//!
//! Field names follow the upstream API's camelCase dialect so the structs
//! serialize bit-compatibly into the frozen data files. The upstream APIs are
//! loosely validated, so most fields are optional with defaults; the
//! validator, not the deserializer, decides what is a defect.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// A recipe as delivered by the recipe API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Newline-delimited ingredient lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    /// Newline-delimited instruction steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Denormalized category snapshot carried alongside the foreign key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<i64>,
    /// Ordered image filenames or absolute URLs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Recipe {
    /// True when the recipe has a usable (non-whitespace) name.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A recipe category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    pub is_active: bool,
    /// Canonical form: `/recipes/category/<slug>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Site metadata from the CMS, with its embedded navigation menu.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Website {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// Menu items are embedded in the website payload, never fetched alone.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub menu_items: Vec<MenuItem>,
}

/// A navigation entry embedded in a [`Website`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// "recipe" entries point into recipe content; anything else is generic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
}

/// The complete in-memory dataset every stage after the Fetcher operates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub recipes: Vec<Recipe>,
    pub categories: Vec<Category>,
    pub websites: Vec<Website>,
    pub menu_items: Vec<MenuItem>,
}

impl Dataset {
    /// Total item count across all collections, used for score density.
    pub fn total_items(&self) -> usize {
        self.recipes.len() + self.categories.len() + self.websites.len() + self.menu_items.len()
    }

    /// Find a category by id.
    pub fn category_by_id(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == Some(id))
    }
}

/// The two upstream response envelopes, plus the bare-array dialect.
///
/// Discriminated by the presence of a `success` field; `unwrap_data` is the
/// single place envelope shapes are resolved.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope {
    Flagged { success: bool, data: Value },
    Wrapped { data: Value },
    Raw(Value),
}

impl ApiEnvelope {
    /// Unwrap the payload, treating `success: false` as an upstream failure.
    pub fn unwrap_data(self) -> Result<Value, FetchError> {
        match self {
            ApiEnvelope::Flagged { success: true, data } => Ok(data),
            ApiEnvelope::Flagged { success: false, .. } => {
                Err(FetchError::Upstream("success flag was false".to_string()))
            }
            ApiEnvelope::Wrapped { data } => Ok(data),
            ApiEnvelope::Raw(v) => Ok(v),
        }
    }
}

/// One page of the paginated recipe listing.
///
/// The endpoint returns either an object carrying the page plus an optional
/// reported total, or a bare array on older deployments.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecipePage {
    Paged {
        recipes: Vec<Recipe>,
        #[serde(rename = "totalPages")]
        total_pages: Option<u32>,
    },
    Bare(Vec<Recipe>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flagged_success() {
        let env: ApiEnvelope =
            serde_json::from_value(json!({"success": true, "data": [1, 2]})).unwrap();
        assert_eq!(env.unwrap_data().unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_envelope_flagged_failure() {
        let env: ApiEnvelope =
            serde_json::from_value(json!({"success": false, "data": null})).unwrap();
        assert!(env.unwrap_data().is_err());
    }

    #[test]
    fn test_envelope_wrapped() {
        let env: ApiEnvelope = serde_json::from_value(json!({"data": {"a": 1}})).unwrap();
        assert_eq!(env.unwrap_data().unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_envelope_raw_array() {
        let env: ApiEnvelope = serde_json::from_value(json!([{"id": 1}])).unwrap();
        assert_eq!(env.unwrap_data().unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn test_recipe_tolerates_sparse_payload() {
        let recipe: Recipe = serde_json::from_value(json!({"id": 7, "name": "Toast"})).unwrap();
        assert_eq!(recipe.id, 7);
        assert!(recipe.category_id.is_none());
        assert!(recipe.images.is_empty());
    }

    #[test]
    fn test_menu_items_embedded_in_website() {
        let site: Website = serde_json::from_value(json!({
            "id": 1,
            "name": "Springform Kitchen",
            "menuItems": [{"id": 10, "title": "Recipes", "url": "/recipes", "controller": "recipe"}]
        }))
        .unwrap();
        assert_eq!(site.menu_items.len(), 1);
        assert_eq!(site.menu_items[0].controller.as_deref(), Some("recipe"));
    }
}
