//! Prerenderer: per-route HTML documents from a shared template.
//!
//! Each route gets its own clone of the template string; nothing here touches
//! shared state, so route renders stay independent. The head is rewritten
//! (title, description, canonical, og:url, JSON-LD) and the body is left
//! exactly as built. In particular the root mount node stays empty: injecting
//! placeholder markup there caused client-side reconciliation races after
//! hydration, so an empty mount is a hard correctness rule, not a style
//! preference.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::BuildError;
use crate::routes::RouteDescriptor;
use crate::slug::sanitize_for_filesystem;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title>.*?</title>").expect("Invalid title regex"));

static META_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*name\s*=\s*["']description["'][^>]*/?>"#)
        .expect("Invalid description regex")
});

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]*rel\s*=\s*["']canonical["'][^>]*/?>"#)
        .expect("Invalid canonical regex")
});

static OG_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*property\s*=\s*["']og:url["'][^>]*/?>"#)
        .expect("Invalid og:url regex")
});

static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head>").expect("Invalid head regex"));

/// Escape text for HTML element and attribute content.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders routes against a template loaded once per build.
#[derive(Debug)]
pub struct Prerenderer {
    template: String,
    out_dir: PathBuf,
}

impl Prerenderer {
    /// Load the base template. A missing template is unrecoverable: nothing
    /// downstream can render without it.
    pub fn load(template_path: &Path, out_dir: &Path) -> Result<Self, BuildError> {
        let template = fs::read_to_string(template_path).map_err(|_| {
            BuildError::MissingArtifact(format!(
                "HTML template not found at {}",
                template_path.display()
            ))
        })?;
        Ok(Self {
            template,
            out_dir: out_dir.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn from_template(template: &str, out_dir: &Path) -> Self {
        Self {
            template: template.to_string(),
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Render one route into a full HTML document.
    pub fn render_route(&self, route: &RouteDescriptor) -> String {
        let mut html = self.template.clone();

        let title_tag = format!("<title>{}</title>", escape_html(&route.title));
        html = if TITLE_RE.is_match(&html) {
            TITLE_RE
                .replace(&html, regex::NoExpand(&title_tag))
                .into_owned()
        } else {
            insert_before_head_close(&html, &title_tag)
        };

        let description_tag = format!(
            r#"<meta name="description" content="{}">"#,
            escape_html(&route.description)
        );
        html = if META_DESCRIPTION_RE.is_match(&html) {
            META_DESCRIPTION_RE
                .replace(&html, regex::NoExpand(&description_tag))
                .into_owned()
        } else {
            insert_before_head_close(&html, &description_tag)
        };

        // Canonical and og:url must agree exactly, so both come from the
        // route's single canonical_url.
        let canonical_tag = format!(
            r#"<link rel="canonical" href="{}">"#,
            escape_html(&route.canonical_url)
        );
        html = if CANONICAL_RE.is_match(&html) {
            CANONICAL_RE
                .replace(&html, regex::NoExpand(&canonical_tag))
                .into_owned()
        } else {
            insert_before_head_close(&html, &canonical_tag)
        };

        let og_url_tag = format!(
            r#"<meta property="og:url" content="{}">"#,
            escape_html(&route.canonical_url)
        );
        html = if OG_URL_RE.is_match(&html) {
            OG_URL_RE
                .replace(&html, regex::NoExpand(&og_url_tag))
                .into_owned()
        } else {
            insert_before_head_close(&html, &og_url_tag)
        };

        for schema in &route.structured_data {
            let json = serde_json::to_string(schema)
                .unwrap_or_default()
                // Keep a literal "</script>" inside a payload from closing
                // the script element early.
                .replace("</", "<\\/");
            let script = format!(r#"<script type="application/ld+json">{json}</script>"#);
            html = insert_before_head_close(&html, &script);
        }

        html
    }

    /// Map a route path to its on-disk output file.
    ///
    /// URL slugs are already safe, but each segment still passes through the
    /// filesystem sanitizer since route paths can carry pre-slug names.
    pub fn output_path(&self, route_path: &str) -> PathBuf {
        let mut path = self.out_dir.clone();
        for segment in route_path.split('/').filter(|s| !s.is_empty()) {
            path.push(sanitize_for_filesystem(segment));
        }
        path.join("index.html")
    }

    /// Render and write one route; returns the written path.
    pub fn write_route(&self, route: &RouteDescriptor) -> Result<PathBuf, BuildError> {
        let path = self.output_path(&route.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.render_route(route))?;
        tracing::debug!(route = %route.path, path = %path.display(), "prerendered");
        Ok(path)
    }

    /// Render and write every route; returns the number written.
    pub fn write_all(&self, routes: &[RouteDescriptor]) -> Result<usize, BuildError> {
        for route in routes {
            self.write_route(route)?;
        }
        tracing::info!(routes = routes.len(), "prerender complete");
        Ok(routes.len())
    }
}

fn insert_before_head_close(html: &str, fragment: &str) -> String {
    match HEAD_CLOSE_RE.find(html) {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + fragment.len() + 1);
            out.push_str(&html[..m.start()]);
            out.push_str(fragment);
            out.push('\n');
            out.push_str(&html[m.start()..]);
            out
        }
        // Degenerate template without a head; append so nothing is lost.
        None => format!("{html}{fragment}"),
    }
}
