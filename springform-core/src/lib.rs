//! Springform core: the data-quality and static-generation pipeline.
//!
//! Stage order is strictly sequential and batch-oriented:
//! fetch → validate → auto-fix → re-validate → freeze → enumerate routes →
//! prerender → sitemap → gate. Each stage consumes the complete output of
//! the previous one.

pub mod config;
pub mod emit;
pub mod error;
pub mod fetch;
pub mod fixer;
pub mod gate;
pub mod http;
pub mod prerender;
pub mod report;
pub mod routes;
pub mod sitemap;
pub mod slug;
pub mod structured;
pub mod types;
pub mod validate;

pub use config::BuildConfig;
pub use emit::{BuildVersion, Emitter, PHASE_INITIAL, PHASE_POST_FIX};
pub use error::{BuildError, FetchError};
pub use fetch::{FetchOutcome, Fetcher};
pub use fixer::{fix, FixOutcome};
pub use gate::{run_gate, GateReport};
pub use http::{ApiClient, ApiClientBuilder, HttpClient, MockClient, MockResponse};
pub use prerender::Prerenderer;
pub use report::{EntityKind, QualityReport, ValidationIssue};
pub use routes::{canonical_url, enumerate_routes, resolve_origin, RouteDescriptor};
pub use sitemap::{build_entries, write_sitemap, ChangeFreq, SitemapEntry};
pub use slug::{sanitize_for_filesystem, slugify};
pub use types::{Category, Dataset, MenuItem, Recipe, Website};
pub use validate::validate;
