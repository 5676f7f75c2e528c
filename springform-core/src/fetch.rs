//! Fetcher stage: pull the full content dataset from the two upstream APIs.
//!
//! Recipes and categories come from the recipe API; websites (with embedded
//! menus) from the CMS API. The three top-level collections are independent
//! and fetched concurrently, but recipe pagination itself is sequential: the
//! decision to continue depends on the previous page's result.
//!
//! Failure policy: a failed collection degrades to an empty collection plus
//! a warning; a failed recipe page stops pagination but keeps every page
//! gathered so far. The Fetcher never aborts the build.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::FetchError;
use crate::http::HttpClient;
use crate::types::{ApiEnvelope, Category, Dataset, MenuItem, Recipe, RecipePage, Website};

/// Hard ceiling on pagination, in case the API reports neither a short page
/// nor a sane total-page count.
const MAX_PAGES: u32 = 500;

/// Everything the Fetcher produced, plus fetch-time context for the emitter.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub dataset: Dataset,
    /// Per-collection degradation notes (one per failed fetch).
    pub warnings: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Fetches the complete dataset from injected API clients.
pub struct Fetcher {
    recipe_api: Arc<dyn HttpClient>,
    cms_api: Arc<dyn HttpClient>,
    page_size: usize,
}

impl Fetcher {
    pub fn new(
        recipe_api: Arc<dyn HttpClient>,
        cms_api: Arc<dyn HttpClient>,
        page_size: usize,
    ) -> Self {
        Self {
            recipe_api,
            cms_api,
            page_size,
        }
    }

    /// Fetch all collections. Infallible by contract: failures degrade to
    /// empty collections with warnings.
    pub async fn fetch_all(&self) -> FetchOutcome {
        let (recipes, categories, websites) = tokio::join!(
            self.fetch_recipes(),
            self.fetch_categories(),
            self.fetch_websites()
        );

        let (recipes, mut warnings) = recipes;
        let (categories, category_warnings) = categories;
        let (websites, website_warnings) = websites;
        warnings.extend(category_warnings);
        warnings.extend(website_warnings);

        // Menus are embedded in website payloads; flatten them into their
        // own collection for downstream consumers.
        let menu_items: Vec<MenuItem> = websites
            .iter()
            .flat_map(|w| w.menu_items.iter().cloned())
            .collect();

        tracing::info!(
            recipes = recipes.len(),
            categories = categories.len(),
            websites = websites.len(),
            menu_items = menu_items.len(),
            warnings = warnings.len(),
            "fetch complete"
        );

        FetchOutcome {
            dataset: Dataset {
                recipes,
                categories,
                websites,
                menu_items,
            },
            warnings,
            fetched_at: Utc::now(),
        }
    }

    /// Paginate through `/recipes`, keeping partial results on page failure.
    ///
    /// Termination: a short page (fewer items than requested) always stops;
    /// an upstream-reported total-page count, when present, is an additional
    /// upper bound. The short page wins when both signals are available.
    async fn fetch_recipes(&self) -> (Vec<Recipe>, Vec<String>) {
        let mut recipes = Vec::new();
        let mut warnings = Vec::new();
        let mut reported_total: Option<u32> = None;
        let mut page: u32 = 1;

        loop {
            let query = [
                ("page", page.to_string()),
                ("pageSize", self.page_size.to_string()),
            ];
            let value = match self.recipe_api.get_json("/recipes", &query).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(page, error = %e, "recipe page fetch failed, keeping partial results");
                    warnings.push(format!(
                        "recipes: page {page} failed ({e}); kept {} recipes from earlier pages",
                        recipes.len()
                    ));
                    break;
                }
            };

            let (items, total_pages) = match parse_recipe_page(value) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(page, error = %e, "recipe page unparseable, keeping partial results");
                    warnings.push(format!(
                        "recipes: page {page} unparseable ({e}); kept {} recipes from earlier pages",
                        recipes.len()
                    ));
                    break;
                }
            };

            if let Some(total) = total_pages {
                reported_total = Some(total);
            }

            let short_page = items.len() < self.page_size;
            recipes.extend(items);

            if short_page {
                break;
            }
            if let Some(total) = reported_total {
                if page >= total {
                    break;
                }
            }
            if page >= MAX_PAGES {
                tracing::warn!(page, "pagination ceiling reached, stopping");
                warnings.push(format!("recipes: stopped at pagination ceiling ({MAX_PAGES} pages)"));
                break;
            }
            page += 1;
        }

        (recipes, warnings)
    }

    async fn fetch_categories(&self) -> (Vec<Category>, Vec<String>) {
        match self.fetch_collection::<Category>(&self.recipe_api, "/categories").await {
            Ok(categories) => (categories, Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "category fetch failed, degrading to empty");
                (Vec::new(), vec![format!("categories: fetch failed ({e})")])
            }
        }
    }

    async fn fetch_websites(&self) -> (Vec<Website>, Vec<String>) {
        match self.fetch_collection::<Website>(&self.cms_api, "/websites").await {
            Ok(websites) => (websites, Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "website fetch failed, degrading to empty");
                (Vec::new(), vec![format!("websites: fetch failed ({e})")])
            }
        }
    }

    /// Fetch and unwrap a non-paginated collection. A single-object payload
    /// (the CMS returns one website, not a list) is accepted as a
    /// one-element collection.
    async fn fetch_collection<T: serde::de::DeserializeOwned>(
        &self,
        client: &Arc<dyn HttpClient>,
        path: &str,
    ) -> Result<Vec<T>, FetchError> {
        let value = client.get_json(path, &[]).await?;
        let data = unwrap_envelope(value)?;
        match data {
            Value::Array(_) => serde_json::from_value(data)
                .map_err(|e| FetchError::BadEnvelope(format!("{path}: {e}"))),
            Value::Object(_) => {
                let single: T = serde_json::from_value(data)
                    .map_err(|e| FetchError::BadEnvelope(format!("{path}: {e}")))?;
                Ok(vec![single])
            }
            other => Err(FetchError::BadEnvelope(format!(
                "{path}: expected array or object, got {other}"
            ))),
        }
    }
}

/// Resolve whichever envelope dialect the upstream used.
pub fn unwrap_envelope(value: Value) -> Result<Value, FetchError> {
    let envelope: ApiEnvelope = serde_json::from_value(value)
        .map_err(|e| FetchError::BadEnvelope(e.to_string()))?;
    envelope.unwrap_data()
}

/// Parse one page of the recipe listing into items plus the reported total.
fn parse_recipe_page(value: Value) -> Result<(Vec<Recipe>, Option<u32>), FetchError> {
    let data = unwrap_envelope(value)?;
    let page: RecipePage =
        serde_json::from_value(data).map_err(|e| FetchError::BadEnvelope(e.to_string()))?;
    Ok(match page {
        RecipePage::Paged {
            recipes,
            total_pages,
        } => (recipes, total_pages),
        RecipePage::Bare(recipes) => (recipes, None),
    })
}
