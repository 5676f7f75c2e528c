//! Stage orchestration for the build CLI.
//!
//! Runs the pipeline stages in their fixed order, times each one, prints a
//! human-readable summary, and decides the process exit code. Recoverable
//! conditions surface as reports; only missing build artifacts propagate as
//! fatal errors.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use springform_core::{
    enumerate_routes, fix, resolve_origin, run_gate, validate, write_sitemap, ApiClient,
    BuildConfig, Emitter, Fetcher, Prerenderer, QualityReport,
};

/// Exit code for a successful, gate-passing run.
pub const EXIT_OK: i32 = 0;
/// Exit code for unresolved validation errors or gate failures.
pub const EXIT_BLOCKED: i32 = 1;

struct StageTimer {
    started: Instant,
}

impl StageTimer {
    fn start(name: &str) -> Self {
        println!("==> {name}");
        Self {
            started: Instant::now(),
        }
    }

    fn finish(self, detail: &str) {
        println!("    {} ({} ms)", detail, self.started.elapsed().as_millis());
    }
}

fn print_issues(report: &QualityReport) {
    for issue in &report.errors {
        println!(
            "    ERROR [{}/{}] {}",
            issue.category.as_str(),
            issue.item,
            issue.message
        );
    }
    for issue in &report.warnings {
        println!(
            "    warn  [{}/{}] {}",
            issue.category.as_str(),
            issue.item,
            issue.message
        );
    }
}

fn build_fetcher(config: &BuildConfig) -> Result<Fetcher> {
    let recipe_api = ApiClient::new(&config.recipe_api_base)
        .context("building recipe API client")?;
    let cms_api = ApiClient::builder(&config.cms_api_base)
        .bearer_token(config.cms_token.clone())
        .build()
        .context("building CMS API client")?;
    Ok(Fetcher::new(
        Arc::new(recipe_api),
        Arc::new(cms_api),
        config.page_size,
    ))
}

/// Run the full pipeline: fetch through gate.
pub async fn run_build(config: BuildConfig) -> Result<i32> {
    let timer = StageTimer::start("fetch");
    let outcome = build_fetcher(&config)?.fetch_all().await;
    let mut dataset = outcome.dataset;
    timer.finish(&format!(
        "{} recipes, {} categories, {} websites, {} menu items, {} warnings",
        dataset.recipes.len(),
        dataset.categories.len(),
        dataset.websites.len(),
        dataset.menu_items.len(),
        outcome.warnings.len(),
    ));

    let timer = StageTimer::start("validate");
    let initial = validate(&dataset);
    timer.finish(&format!(
        "score {:.1}, {} errors, {} warnings",
        initial.quality_score,
        initial.errors.len(),
        initial.warnings.len(),
    ));

    // The fixer's mutation paths only run when something is actually broken.
    let (post_fix, fixes_applied) = if initial.passed {
        (None, 0)
    } else {
        let timer = StageTimer::start("auto-fix");
        let fix_outcome = fix(&mut dataset, &initial);
        timer.finish(&format!(
            "{} fixes ({} reassigned, {} urls, {} removed)",
            fix_outcome.fixed_count,
            fix_outcome.reassigned,
            fix_outcome.urls_normalized,
            fix_outcome.removed,
        ));

        let timer = StageTimer::start("re-validate");
        let post = validate(&dataset);
        timer.finish(&format!(
            "score {:.1}, {} errors remain",
            post.quality_score,
            post.errors.len(),
        ));
        (Some(post), fix_outcome.fixed_count)
    };

    let timer = StageTimer::start("freeze");
    let emitter = Emitter::new(&config.data_dir);
    emitter.write_dataset(&dataset, outcome.fetched_at, &outcome.warnings)?;
    emitter.write_validation_report(&initial, post_fix.as_ref(), fixes_applied)?;
    let build_version = emitter.write_build_version(env!("CARGO_PKG_VERSION"))?;
    timer.finish(&format!("build {}", build_version.hash));

    let effective = post_fix.as_ref().unwrap_or(&initial);
    if !effective.errors.is_empty() {
        println!(
            "\n{} validation error(s) could not be auto-fixed:",
            effective.errors.len()
        );
        print_issues(effective);
        if config.force_publish {
            println!("\nWARNING: force-publish is set; continuing despite unresolved errors.");
            tracing::warn!(
                errors = effective.errors.len(),
                "publishing despite unresolved validation errors"
            );
        } else {
            println!("\nBuild blocked. Set SPRINGFORM_FORCE_PUBLISH=true to override.");
            return Ok(EXIT_BLOCKED);
        }
    }

    let origin = resolve_origin(
        config.custom_domain.as_deref(),
        &config.domain_marker,
        &config.repository,
    );

    let timer = StageTimer::start("prerender");
    let routes = enumerate_routes(&dataset, &origin, &config.site_name);
    let template_path = config.dist_dir.join("index.html");
    let prerenderer = Prerenderer::load(&template_path, &config.dist_dir)?;
    let written = prerenderer.write_all(&routes)?;
    timer.finish(&format!("{written} routes under {origin}"));

    let timer = StageTimer::start("sitemap");
    let entries = write_sitemap(&dataset, &origin, outcome.fetched_at, &config.dist_dir)?;
    timer.finish(&format!("{entries} entries"));

    run_gate_stage(&config)
}

/// Fetch and validate only; writes the report, no other artifacts.
pub async fn run_validate(config: BuildConfig) -> Result<i32> {
    let timer = StageTimer::start("fetch");
    let outcome = build_fetcher(&config)?.fetch_all().await;
    timer.finish(&format!("{} items", outcome.dataset.total_items()));

    let timer = StageTimer::start("validate");
    let report = validate(&outcome.dataset);
    timer.finish(&format!(
        "score {:.1}, {} errors, {} warnings",
        report.quality_score,
        report.errors.len(),
        report.warnings.len(),
    ));
    print_issues(&report);

    Emitter::new(&config.data_dir).write_validation_report(&report, None, 0)?;

    Ok(if report.passed { EXIT_OK } else { EXIT_BLOCKED })
}

/// Run only the SEO asset gate against an existing output directory.
pub fn run_gate_stage(config: &BuildConfig) -> Result<i32> {
    let timer = StageTimer::start("seo gate");
    let report = run_gate(&config.dist_dir);
    timer.finish(&format!(
        "{} errors, {} warnings",
        report.errors.len(),
        report.warnings.len(),
    ));

    for warning in &report.warnings {
        println!("    warn  {warning}");
    }
    for error in &report.errors {
        println!("    ERROR {error}");
    }

    if report.passed() {
        println!("\nSEO surface OK.");
        Ok(EXIT_OK)
    } else {
        println!("\nSEO asset gate failed; publish blocked (no override).");
        Ok(EXIT_BLOCKED)
    }
}
