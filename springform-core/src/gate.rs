//! SEO asset gate: the final structural check on the deployable surface.
//!
//! Runs after every artifact exists and blocks publication on structural
//! violations of the sitemap, robots policy, or SPA fallback page. Gate
//! errors have no override path; warnings are logged and never block.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid slug regex"));

static REDIRECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(window\.location|location\.replace|location\.href|http-equiv\s*=\s*["']?refresh)"#)
        .expect("Invalid redirect regex")
});

static NOINDEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*noindex[^>]*>"#).expect("Invalid noindex regex")
});

/// Gate verdict. Errors block publish; warnings never do.
#[derive(Debug, Clone, Default)]
pub struct GateReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl GateReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Sitemap document shape for structural parsing.
#[derive(Debug, Deserialize)]
struct Urlset {
    #[serde(rename = "url", default)]
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    loc: String,
}

/// Run the full gate against a built output directory.
pub fn run_gate(dist_dir: &Path) -> GateReport {
    let mut report = GateReport::default();

    check_robots(&dist_dir.join("robots.txt"), &mut report);
    check_sitemap(&dist_dir.join("sitemap.xml"), &mut report);
    check_fallback(&dist_dir.join("404.html"), &mut report);

    for warning in &report.warnings {
        tracing::warn!(%warning, "seo gate warning");
    }
    for error in &report.errors {
        tracing::error!(%error, "seo gate violation");
    }
    report
}

/// One robots.txt policy block: the user-agent lines plus the directives
/// that follow them.
#[derive(Debug, Default)]
struct RobotsBlock {
    agents: Vec<String>,
    disallows: Vec<String>,
}

/// Parse robots.txt into policy blocks plus the file-level sitemap URLs.
fn parse_robots(content: &str) -> (Vec<RobotsBlock>, Vec<String>) {
    let mut blocks: Vec<RobotsBlock> = Vec::new();
    let mut current: Option<RobotsBlock> = None;
    let mut in_agent_list = false;
    let mut sitemaps = Vec::new();

    for raw in content.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim().to_lowercase();
        let value = value.trim().to_string();

        match field.as_str() {
            "user-agent" => {
                // Consecutive user-agent lines share one block; a user-agent
                // after directives starts a new block.
                if !in_agent_list {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                    current = Some(RobotsBlock::default());
                    in_agent_list = true;
                }
                if let Some(block) = current.as_mut() {
                    block.agents.push(value);
                }
            }
            "sitemap" => {
                sitemaps.push(value);
                in_agent_list = false;
            }
            "disallow" => {
                if let Some(block) = current.as_mut() {
                    block.disallows.push(value);
                }
                in_agent_list = false;
            }
            _ => {
                in_agent_list = false;
            }
        }
    }
    if let Some(block) = current.take() {
        blocks.push(block);
    }

    (blocks, sitemaps)
}

fn check_robots(path: &Path, report: &mut GateReport) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            report.error(format!("robots.txt missing at {}", path.display()));
            return;
        }
    };

    let (blocks, sitemaps) = parse_robots(&content);

    let global = blocks.iter().find(|b| b.agents.iter().any(|a| a == "*"));
    match global {
        None => report.error("robots.txt: no global `User-agent: *` block"),
        Some(block) => {
            // Only the global block's own root-disallow is an error; a
            // scoped disallow under a specific agent is deliberate policy.
            if block.disallows.iter().any(|d| d == "/") {
                report.error("robots.txt: global block disallows the entire site (`Disallow: /`)");
            }
        }
    }

    let has_absolute_sitemap = sitemaps
        .iter()
        .any(|s| Url::parse(s).map(|u| u.scheme().starts_with("http")).unwrap_or(false));
    if !has_absolute_sitemap {
        report.error("robots.txt: no absolute `Sitemap:` URL");
    }
}

fn check_sitemap(path: &Path, report: &mut GateReport) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            report.error(format!("sitemap.xml missing at {}", path.display()));
            return;
        }
    };

    // Root element must be <urlset>; quick-xml's serde layer ignores the
    // root name, so check it before parsing.
    let body = content.trim_start();
    let after_decl = match body.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map(|(_, r)| r.trim_start()).unwrap_or(""),
        None => body,
    };
    if !after_decl.starts_with("<urlset") {
        report.error("sitemap.xml: root element is not <urlset>");
        return;
    }

    let urlset: Urlset = match quick_xml::de::from_str(&content) {
        Ok(u) => u,
        Err(e) => {
            report.error(format!("sitemap.xml: not well-formed ({e})"));
            return;
        }
    };

    if urlset.urls.is_empty() {
        report.error("sitemap.xml: no <url> entries");
        return;
    }

    let mut seen = HashSet::new();
    let mut has_homepage = false;

    for entry in &urlset.urls {
        if !seen.insert(entry.loc.as_str()) {
            report.error(format!("sitemap.xml: duplicate loc {}", entry.loc));
        }

        let Ok(url) = Url::parse(&entry.loc) else {
            report.error(format!("sitemap.xml: loc is not an absolute URL: {}", entry.loc));
            continue;
        };

        if url.path() == "/" || url.path().is_empty() {
            has_homepage = true;
        }

        // Recipe-shaped paths must follow /recipe/<slug>; deviation is
        // advisory only.
        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
        if segments.first() == Some(&"recipe") {
            let well_shaped = segments.len() == 2 && SLUG_RE.is_match(segments[1]);
            if !well_shaped {
                report.warning(format!(
                    "sitemap.xml: recipe URL deviates from /recipe/<slug>: {}",
                    entry.loc
                ));
            }
        }
    }

    if !has_homepage {
        report.error("sitemap.xml: no homepage URL");
    }
}

fn check_fallback(path: &Path, report: &mut GateReport) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            report.error(format!("404.html missing at {}", path.display()));
            return;
        }
    };

    if !REDIRECT_RE.is_match(&content) {
        report.error("404.html: no client-side redirect pattern");
    }
    if !NOINDEX_RE.is_match(&content) {
        report.error("404.html: no noindex directive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const GOOD_SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2026-08-01</lastmod><changefreq>weekly</changefreq><priority>1.0</priority></url>
  <url><loc>https://example.com/recipe/bob-s-chili</loc><lastmod>2026-08-01</lastmod><changefreq>monthly</changefreq><priority>0.8</priority></url>
</urlset>
"#;

    const GOOD_ROBOTS: &str = "User-agent: *\nAllow: /\n\nSitemap: https://example.com/sitemap.xml\n";

    const GOOD_FALLBACK: &str = r#"<!doctype html>
<html><head>
<meta name="robots" content="noindex">
<script>sessionStorage.redirect = location.href; window.location.replace('/');</script>
</head><body></body></html>"#;

    fn write_surface(dir: &Path, robots: &str, sitemap: &str, fallback: &str) {
        fs::write(dir.join("robots.txt"), robots).unwrap();
        fs::write(dir.join("sitemap.xml"), sitemap).unwrap();
        fs::write(dir.join("404.html"), fallback).unwrap();
    }

    #[test]
    fn test_clean_surface_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_surface(dir.path(), GOOD_ROBOTS, GOOD_SITEMAP, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report.passed(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_gate(dir.path());
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_global_root_disallow_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let robots = "User-agent: *\nDisallow: /\n\nSitemap: https://example.com/sitemap.xml\n";
        write_surface(dir.path(), robots, GOOD_SITEMAP, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("global block disallows")));
    }

    #[test]
    fn test_scoped_disallow_is_permitted() {
        let dir = tempfile::tempdir().unwrap();
        let robots = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n\nSitemap: https://example.com/sitemap.xml\n";
        write_surface(dir.path(), robots, GOOD_SITEMAP, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report.passed(), "errors: {:?}", report.errors);
    }

    #[test]
    fn test_relative_sitemap_url_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let robots = "User-agent: *\nAllow: /\n\nSitemap: /sitemap.xml\n";
        write_surface(dir.path(), robots, GOOD_SITEMAP, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("absolute `Sitemap:`")));
    }

    #[test]
    fn test_malformed_sitemap_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write_surface(
            dir.path(),
            GOOD_ROBOTS,
            "<urlset><url><loc>https://example.com/</loc></url>",
            GOOD_FALLBACK,
        );
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("not well-formed")));
    }

    #[test]
    fn test_wrong_root_element_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write_surface(
            dir.path(),
            GOOD_ROBOTS,
            "<?xml version=\"1.0\"?><sitemapindex></sitemapindex>",
            GOOD_FALLBACK,
        );
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("not <urlset>")));
    }

    #[test]
    fn test_duplicate_loc_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let sitemap = r#"<?xml version="1.0"?>
<urlset>
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/</loc></url>
</urlset>"#;
        write_surface(dir.path(), GOOD_ROBOTS, sitemap, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("duplicate loc")));
    }

    #[test]
    fn test_missing_homepage_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let sitemap = r#"<?xml version="1.0"?>
<urlset><url><loc>https://example.com/recipes</loc></url></urlset>"#;
        write_surface(dir.path(), GOOD_ROBOTS, sitemap, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("no homepage")));
    }

    #[test]
    fn test_odd_recipe_path_is_warning_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let sitemap = r#"<?xml version="1.0"?>
<urlset>
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/recipe/Bad_Slug/extra</loc></url>
</urlset>"#;
        write_surface(dir.path(), GOOD_ROBOTS, sitemap, GOOD_FALLBACK);
        let report = run_gate(dir.path());
        assert!(report.passed(), "errors: {:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.contains("deviates")));
    }

    #[test]
    fn test_fallback_without_noindex_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = "<html><head><script>window.location.replace('/')</script></head></html>";
        write_surface(dir.path(), GOOD_ROBOTS, GOOD_SITEMAP, fallback);
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("noindex")));
    }

    #[test]
    fn test_fallback_without_redirect_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = "<html><head><meta name=\"robots\" content=\"noindex\"></head></html>";
        write_surface(dir.path(), GOOD_ROBOTS, GOOD_SITEMAP, fallback);
        let report = run_gate(dir.path());
        assert!(report.errors.iter().any(|e| e.contains("redirect")));
    }

    #[test]
    fn test_robots_parser_blocks() {
        let (blocks, sitemaps) = parse_robots(
            "# comment\nUser-agent: A\nUser-agent: B\nDisallow: /private\n\nUser-agent: *\nAllow: /\nSitemap: https://e.com/s.xml\n",
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].agents, vec!["A", "B"]);
        assert_eq!(blocks[0].disallows, vec!["/private"]);
        assert_eq!(blocks[1].agents, vec!["*"]);
        assert_eq!(sitemaps, vec!["https://e.com/s.xml"]);
    }
}
