//! Static data emitter: freezes the dataset into the build's canonical
//! "database".
//!
//! Everything downstream — the component tree, the API compatibility shims,
//! the prerenderer — reads these files, never the network. Each run rewrites
//! the full set; there is no incremental state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::BuildError;
use crate::report::QualityReport;
use crate::types::Dataset;

/// Phase markers recorded in `validation-report.json`.
pub const PHASE_INITIAL: &str = "initial-validation";
pub const PHASE_POST_FIX: &str = "post-fix-validation";

/// Cache-busting build identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildVersion {
    pub version: String,
    pub hash: String,
    pub build_time: DateTime<Utc>,
}

/// Writes the frozen data files into one directory.
pub struct Emitter {
    data_dir: PathBuf,
}

impl Emitter {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.data_dir.join(name), json)?;
        Ok(())
    }

    /// Persist the per-entity files, the combined `api-data.json`, and the
    /// regenerated type declarations.
    pub fn write_dataset(
        &self,
        dataset: &Dataset,
        fetched_at: DateTime<Utc>,
        fetch_warnings: &[String],
    ) -> Result<(), BuildError> {
        fs::create_dir_all(&self.data_dir)?;

        self.write_json("recipes.json", &dataset.recipes)?;
        self.write_json("categories.json", &dataset.categories)?;
        self.write_json("websites.json", &dataset.websites)?;
        self.write_json("menu-items.json", &dataset.menu_items)?;

        let combined = json!({
            "recipes": dataset.recipes,
            "categories": dataset.categories,
            "websites": dataset.websites,
            "menuItems": dataset.menu_items,
            "metadata": {
                "fetchedAt": fetched_at,
                "counts": {
                    "recipes": dataset.recipes.len(),
                    "categories": dataset.categories.len(),
                    "websites": dataset.websites.len(),
                    "menuItems": dataset.menu_items.len(),
                },
                "fetchWarnings": fetch_warnings,
            },
        });
        self.write_json("api-data.json", &combined)?;

        fs::write(
            self.data_dir.join("api-data.d.ts"),
            type_declarations(fetched_at),
        )?;

        tracing::info!(dir = %self.data_dir.display(), "dataset frozen");
        Ok(())
    }

    /// Persist the validation report with its phase markers and fix count.
    pub fn write_validation_report(
        &self,
        initial: &QualityReport,
        post_fix: Option<&QualityReport>,
        fixes_applied: usize,
    ) -> Result<(), BuildError> {
        fs::create_dir_all(&self.data_dir)?;

        let mut phases: BTreeMap<&str, &QualityReport> = BTreeMap::new();
        phases.insert(PHASE_INITIAL, initial);
        if let Some(report) = post_fix {
            phases.insert(PHASE_POST_FIX, report);
        }

        let artifact = json!({
            "phases": phases,
            "fixesApplied": fixes_applied,
            "generatedAt": Utc::now(),
        });
        self.write_json("validation-report.json", &artifact)
    }

    /// Hash the frozen combined file into `build-version.json`.
    ///
    /// Fails if `api-data.json` has not been written yet: version identity
    /// is derived from frozen content, never recomputed from memory.
    pub fn write_build_version(&self, version: &str) -> Result<BuildVersion, BuildError> {
        let api_data_path = self.data_dir.join("api-data.json");
        let content = fs::read(&api_data_path).map_err(|_| {
            BuildError::MissingArtifact(format!("{} (freeze the dataset first)", api_data_path.display()))
        })?;

        let digest = Sha256::digest(&content);
        let hash = digest
            .iter()
            .take(6)
            .map(|b| format!("{b:02x}"))
            .collect::<String>();

        let build_version = BuildVersion {
            version: version.to_string(),
            hash,
            build_time: Utc::now(),
        };
        self.write_json("build-version.json", &build_version)?;
        Ok(build_version)
    }
}

/// TypeScript declarations mirroring the entity shapes. Regenerated on every
/// run so the frontend's types can never drift from the frozen data.
fn type_declarations(fetched_at: DateTime<Utc>) -> String {
    format!(
        r#"// Generated by springform at {fetched_at} — do not edit.

export interface Recipe {{
  id: number;
  name: string;
  description?: string;
  ingredients?: string;
  instructions?: string;
  servings?: number;
  authorName?: string;
  categoryId?: number;
  categoryName?: string;
  categoryDescription?: string;
  rating?: number;
  ratingCount?: number;
  images?: string[];
  seoKeywords?: string;
  createdAt?: string;
  updatedAt?: string;
}}

export interface Category {{
  id?: number;
  name: string;
  description?: string;
  displayOrder?: number;
  isActive: boolean;
  url?: string;
}}

export interface MenuItem {{
  id?: number;
  title: string;
  url?: string;
  controller?: string;
  parentId?: number;
  displayOrder?: number;
}}

export interface Website {{
  id?: number;
  name: string;
  description?: string;
  websiteUrl?: string;
  menuItems?: MenuItem[];
}}

export interface ApiData {{
  recipes: Recipe[];
  categories: Category[];
  websites: Website[];
  menuItems: MenuItem[];
  metadata: {{
    fetchedAt: string;
    counts: {{
      recipes: number;
      categories: number;
      websites: number;
      menuItems: number;
    }};
    fetchWarnings: string[];
  }};
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Recipe};
    use crate::validate::validate;
    use serde_json::Value;

    fn dataset() -> Dataset {
        Dataset {
            recipes: vec![Recipe {
                id: 1,
                name: "Chili".to_string(),
                category_id: Some(3),
                ingredients: Some("beans".to_string()),
                instructions: Some("cook".to_string()),
                ..Default::default()
            }],
            categories: vec![Category {
                id: Some(3),
                name: "Mains".to_string(),
                url: Some("/recipes/category/mains".to_string()),
                is_active: true,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_writes_all_data_files() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = Emitter::new(dir.path());
        emitter
            .write_dataset(&dataset(), Utc::now(), &["categories: fetch failed".to_string()])
            .unwrap();

        for name in [
            "recipes.json",
            "categories.json",
            "websites.json",
            "menu-items.json",
            "api-data.json",
            "api-data.d.ts",
        ] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }

        let combined: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("api-data.json")).unwrap())
                .unwrap();
        assert_eq!(combined["metadata"]["counts"]["recipes"], 1);
        assert_eq!(combined["metadata"]["fetchWarnings"][0], "categories: fetch failed");
        assert_eq!(combined["recipes"][0]["categoryId"], 3);
    }

    #[test]
    fn test_validation_report_phases() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = Emitter::new(dir.path());
        let ds = dataset();
        let initial = validate(&ds);
        let post = validate(&ds);
        emitter
            .write_validation_report(&initial, Some(&post), 2)
            .unwrap();

        let artifact: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("validation-report.json")).unwrap(),
        )
        .unwrap();
        assert!(artifact["phases"][PHASE_INITIAL].is_object());
        assert!(artifact["phases"][PHASE_POST_FIX].is_object());
        assert_eq!(artifact["fixesApplied"], 2);
    }

    #[test]
    fn test_build_version_hashes_frozen_content() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = Emitter::new(dir.path());
        let fetched_at: DateTime<Utc> = "2026-08-01T00:00:00Z".parse().unwrap();
        emitter.write_dataset(&dataset(), fetched_at, &[]).unwrap();

        let first = emitter.write_build_version("0.3.0").unwrap();
        assert_eq!(first.hash.len(), 12);
        let second = emitter.write_build_version("0.3.0").unwrap();
        assert_eq!(first.hash, second.hash, "hash is content-derived");
    }

    #[test]
    fn test_build_version_requires_frozen_data() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = Emitter::new(dir.path());
        let err = emitter.write_build_version("0.3.0").unwrap_err();
        assert!(matches!(err, BuildError::MissingArtifact(_)));
    }

    #[test]
    fn test_type_declarations_regenerated() {
        let decls = type_declarations(Utc::now());
        assert!(decls.contains("export interface Recipe"));
        assert!(decls.contains("menuItems: MenuItem[]"));
    }
}
