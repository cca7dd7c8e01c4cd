use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Serialize, Serializer};
use std::path::PathBuf;

use crate::analyze::{analyze, AnalysisReport};
use crate::conf::Conf;
use crate::extract::{extract, Origin, Source};
use crate::sqlite::{LoadSummary, Sqlite};
use crate::transform::{transform, TransformStats};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "as_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    pub users_origin: Origin,
    pub posts_origin: Origin,
    pub stats: TransformStats,
    pub loaded: LoadSummary,
    pub report: AnalysisReport,
    pub db_path: PathBuf,
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(elapsed.num_milliseconds())
}

/// Extract, transform, load, analyze. Only extraction recovers from
/// failure; any later error ends the run.
pub fn run_pipeline(conf: &Conf, source: &dyn Source) -> Result<RunSummary> {
    let started_at = Utc::now();
    info!("Starting ETL run at {}", started_at.to_rfc3339());

    let raw = extract(source);
    info!(
        "Extracted {} users ({}) and {} posts ({})",
        raw.users.len(),
        raw.users_origin,
        raw.posts.len(),
        raw.posts_origin
    );

    let (tables, stats) = transform(&raw.users, &raw.posts);

    let mut db = Sqlite::open(&conf.db_path)
        .with_context(|| format!("Failed to open database {}", conf.db_path.display()))?;
    let loaded = db
        .load(&tables)
        .with_context(|| format!("Failed to load tables into {}", conf.db_path.display()))?;

    let report = analyze(&mut db, &conf.analysis).context("Analysis query failed")?;

    let elapsed = Utc::now() - started_at;
    info!("ETL run finished in {} ms", elapsed.num_milliseconds());

    Ok(RunSummary {
        started_at,
        elapsed,
        users_origin: raw.users_origin,
        posts_origin: raw.posts_origin,
        stats,
        loaded,
        report,
        db_path: conf.db_path.clone(),
    })
}
