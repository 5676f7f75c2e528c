//! Sitemap generation.
//!
//! The URL set mirrors the Route Enumerator's output: static pages, one
//! entry per recipe, one per active category. Entries are deduplicated by
//! `loc` (first occurrence wins) before serialization.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::BuildError;
use crate::routes::canonical_url;
use crate::slug::slugify;
use crate::types::Dataset;

/// How often crawlers should expect a page to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

/// One `<url>` element of the sitemap.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    /// `YYYY-MM-DD`.
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

/// Derive the full, deduplicated entry set for a dataset.
pub fn build_entries(dataset: &Dataset, origin: &str, fetched_at: DateTime<Utc>) -> Vec<SitemapEntry> {
    let today = fetched_at.date_naive();
    let mut entries = Vec::new();

    entries.push(SitemapEntry {
        loc: canonical_url(origin, "/"),
        lastmod: format_date(today),
        changefreq: ChangeFreq::Weekly,
        priority: 1.0,
    });
    entries.push(SitemapEntry {
        loc: canonical_url(origin, "/recipes"),
        lastmod: format_date(today),
        changefreq: ChangeFreq::Weekly,
        priority: 0.9,
    });
    entries.push(SitemapEntry {
        loc: canonical_url(origin, "/categories"),
        lastmod: format_date(today),
        changefreq: ChangeFreq::Weekly,
        priority: 0.8,
    });

    for recipe in &dataset.recipes {
        if !recipe.has_name() {
            continue;
        }
        let lastmod = recipe
            .updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(today);
        entries.push(SitemapEntry {
            loc: canonical_url(origin, &format!("/recipe/{}", slugify(&recipe.name))),
            lastmod: format_date(lastmod),
            changefreq: ChangeFreq::Monthly,
            priority: 0.8,
        });
    }

    for category in &dataset.categories {
        if !category.is_active || category.name.trim().is_empty() {
            continue;
        }
        entries.push(SitemapEntry {
            loc: canonical_url(
                origin,
                &format!("/recipes/category/{}", slugify(&category.name)),
            ),
            lastmod: format_date(today),
            changefreq: ChangeFreq::Weekly,
            priority: 0.75,
        });
    }

    dedup_by_loc(entries)
}

/// Keep the first entry for each `loc`.
fn dedup_by_loc(entries: Vec<SitemapEntry>) -> Vec<SitemapEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.loc.clone()))
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_priority(priority: f64) -> String {
    // 1.0 and 0.8 render one decimal, 0.75 keeps two.
    let two = format!("{priority:.2}");
    if two.ends_with('0') {
        format!("{priority:.1}")
    } else {
        two
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serialize entries as a standard `<urlset>` document.
pub fn to_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(entries.len() * 160 + 128);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq.as_str()
        ));
        xml.push_str(&format!(
            "    <priority>{}</priority>\n",
            format_priority(entry.priority)
        ));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Build and write `sitemap.xml`; returns the entry count.
pub fn write_sitemap(
    dataset: &Dataset,
    origin: &str,
    fetched_at: DateTime<Utc>,
    dist_dir: &Path,
) -> Result<usize, BuildError> {
    let entries = build_entries(dataset, origin, fetched_at);
    fs::create_dir_all(dist_dir)?;
    fs::write(dist_dir.join("sitemap.xml"), to_xml(&entries))?;
    tracing::info!(entries = entries.len(), "sitemap written");
    Ok(entries.len())
}
