//! Build configuration.
//!
//! Every knob is an environment variable so CI can drive the pipeline
//! without flags, with builder-style overrides for tests and the CLI.

use std::path::PathBuf;

/// Configuration for a full pipeline run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Base URL of the recipe/category API.
    pub recipe_api_base: String,
    /// Base URL of the CMS API (websites + embedded menus).
    pub cms_api_base: String,
    /// Bearer token for the CMS API.
    pub cms_token: Option<String>,
    /// Explicit public origin override, e.g. "www.example.com".
    pub custom_domain: Option<String>,
    /// `owner/repo`, used for the repository-subpath origin fallback.
    pub repository: String,
    /// Proceed past unresolved validation errors (loudly).
    pub force_publish: bool,
    /// Recipe pagination page size.
    pub page_size: usize,
    /// Where frozen data files are written.
    pub data_dir: PathBuf,
    /// Built site directory: template input and prerender/sitemap output.
    pub dist_dir: PathBuf,
    /// Deployment marker file (CNAME) consulted for the public origin.
    pub domain_marker: PathBuf,
    /// Display name used in titles, publisher blocks, and the Organization schema.
    pub site_name: String,
}

impl BuildConfig {
    /// Read configuration from the environment.
    ///
    /// Variables:
    /// - `SPRINGFORM_RECIPE_API`: recipe API base URL
    /// - `SPRINGFORM_CMS_API`: CMS base URL
    /// - `SPRINGFORM_CMS_TOKEN`: CMS bearer token
    /// - `SPRINGFORM_CUSTOM_DOMAIN`: public origin override
    /// - `SPRINGFORM_REPOSITORY`: `owner/repo` for the subpath fallback
    /// - `SPRINGFORM_FORCE_PUBLISH`: "true"/"1" to publish despite errors
    pub fn from_env() -> Self {
        let force_publish = std::env::var("SPRINGFORM_FORCE_PUBLISH")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            recipe_api_base: std::env::var("SPRINGFORM_RECIPE_API")
                .unwrap_or_else(|_| "https://api.springform.app".to_string()),
            cms_api_base: std::env::var("SPRINGFORM_CMS_API")
                .unwrap_or_else(|_| "https://cms.springform.app".to_string()),
            cms_token: std::env::var("SPRINGFORM_CMS_TOKEN").ok(),
            custom_domain: std::env::var("SPRINGFORM_CUSTOM_DOMAIN").ok(),
            repository: std::env::var("SPRINGFORM_REPOSITORY")
                .unwrap_or_else(|_| "springform/springform".to_string()),
            force_publish,
            page_size: 100,
            data_dir: PathBuf::from("src/data"),
            dist_dir: PathBuf::from("dist"),
            domain_marker: PathBuf::from("public/CNAME"),
            site_name: "Springform Kitchen".to_string(),
        }
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn dist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dist_dir = dir.into();
        self
    }

    pub fn custom_domain(mut self, domain: Option<String>) -> Self {
        self.custom_domain = domain;
        self
    }

    pub fn domain_marker(mut self, path: impl Into<PathBuf>) -> Self {
        self.domain_marker = path.into();
        self
    }

    pub fn force_publish(mut self, force: bool) -> Self {
        self.force_publish = force;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }
}
