use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::conf::Conf;
use crate::sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Posts,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Posts => "posts",
        }
    }

    pub fn fallback(self) -> Vec<Value> {
        match self {
            Resource::Users => sample::users(),
            Resource::Posts => sample::posts(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a list of raw records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Live,
    Fallback,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Live => f.write_str("api"),
            Origin::Fallback => f.write_str("fallback sample"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request failed: {0}")]
    Transport(#[source] attohttpc::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(#[source] attohttpc::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array, got {0}")]
    NotArray(&'static str),
    #[error("network access disabled")]
    Offline,
}

/// Something that can hand back the raw record list for a resource.
pub trait Source {
    fn fetch(&self, resource: Resource) -> Result<Vec<Value>, ExtractError>;
}

/// Blocking HTTP source rooted at an API base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_conf(conf: &Conf) -> Self {
        Self::new(&conf.api_base, conf.http_timeout())
    }

    pub fn url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base, resource.path())
    }
}

impl Source for HttpSource {
    fn fetch(&self, resource: Resource) -> Result<Vec<Value>, ExtractError> {
        let url = self.url(resource);
        debug!("GET {} (timeout {:?})", url, self.timeout);

        let response = attohttpc::get(&url)
            .timeout(self.timeout)
            .send()
            .map_err(ExtractError::Transport)?;

        let status = response.status();
        if status != attohttpc::StatusCode::OK {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let text = response.text().map_err(ExtractError::Body)?;
        parse_records(&text)
    }
}

/// Source that never touches the network, so every endpoint falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl Source for OfflineSource {
    fn fetch(&self, _resource: Resource) -> Result<Vec<Value>, ExtractError> {
        Err(ExtractError::Offline)
    }
}

/// Parses a response body that must be a JSON array. Elements are kept as-is.
pub fn parse_records(text: &str) -> Result<Vec<Value>, ExtractError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => Ok(items),
        other => Err(ExtractError::NotArray(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawData {
    pub users: Vec<Value>,
    pub posts: Vec<Value>,
    pub users_origin: Origin,
    pub posts_origin: Origin,
}

/// Fetches users and posts. Each endpoint falls back to its sample list on
/// its own; this never fails.
pub fn extract(source: &dyn Source) -> RawData {
    let (users, users_origin) = fetch_or_fallback(source, Resource::Users);
    let (posts, posts_origin) = fetch_or_fallback(source, Resource::Posts);

    RawData {
        users,
        posts,
        users_origin,
        posts_origin,
    }
}

fn fetch_or_fallback(source: &dyn Source, resource: Resource) -> (Vec<Value>, Origin) {
    match source.fetch(resource) {
        Ok(records) => {
            info!("Fetched {} {} from API", records.len(), resource);
            (records, Origin::Live)
        }
        Err(e) => {
            warn!("API fetch {} failed ({}). Using fallback sample.", resource, e);
            (resource.fallback(), Origin::Fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingUsers;

    impl Source for FailingUsers {
        fn fetch(&self, resource: Resource) -> Result<Vec<Value>, ExtractError> {
            match resource {
                Resource::Users => Err(ExtractError::Status(503)),
                Resource::Posts => Ok(vec![json!({"id": 99, "userId": 2, "title": "live"})]),
            }
        }
    }

    #[test]
    fn parse_records_accepts_arrays_only() {
        assert_eq!(parse_records("[]").unwrap(), Vec::<Value>::new());
        assert_eq!(parse_records(r#"[{"id":1}]"#).unwrap(), vec![json!({"id": 1})]);

        assert!(matches!(
            parse_records(r#"{"id":1}"#),
            Err(ExtractError::NotArray("an object"))
        ));
        assert!(matches!(parse_records("<html>"), Err(ExtractError::Json(_))));
    }

    #[test]
    fn endpoints_fall_back_independently() {
        let raw = extract(&FailingUsers);

        assert_eq!(raw.users_origin, Origin::Fallback);
        assert_eq!(raw.users, sample::users());
        assert_eq!(raw.posts_origin, Origin::Live);
        assert_eq!(raw.posts, vec![json!({"id": 99, "userId": 2, "title": "live"})]);
    }

    #[test]
    fn offline_source_uses_both_samples() {
        let raw = extract(&OfflineSource);
        assert_eq!(raw.users_origin, Origin::Fallback);
        assert_eq!(raw.posts_origin, Origin::Fallback);
        assert_eq!(raw.users.len(), 2);
        assert_eq!(raw.posts.len(), 3);
    }

    #[test]
    fn url_joins_base_and_resource() {
        let source = HttpSource::new("http://localhost:9/api/", Duration::from_secs(1));
        assert_eq!(source.url(Resource::Users), "http://localhost:9/api/users");
        assert_eq!(source.url(Resource::Posts), "http://localhost:9/api/posts");
    }
}
