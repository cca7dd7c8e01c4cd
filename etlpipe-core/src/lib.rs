//! Small extract-transform-load pipeline: JSON users and posts from an HTTP
//! API (or built-in samples), cleaned into typed rows, loaded into SQLite and
//! queried.

pub mod analyze;
pub mod conf;
pub mod extract;
pub mod pipeline;
pub mod sample;
pub mod sqlite;
pub mod transform;

pub use crate::analyze::{analyze, AnalysisReport, AvgTitleLength, PostCount, ShortTitle, UserPost};
pub use crate::conf::{AnalysisConf, Conf};
pub use crate::extract::{
    extract, parse_records, ExtractError, HttpSource, OfflineSource, Origin, RawData, Resource,
    Source,
};
pub use crate::pipeline::{run_pipeline, RunSummary};
pub use crate::sqlite::model::{Post, User};
pub use crate::sqlite::{DbResult, LoadSummary, Sqlite, StoreError};
pub use crate::transform::{transform, Tables, TransformStats};
