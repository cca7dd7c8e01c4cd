use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::sqlite::model::{Post, User};

/// Cleaned, typed rows ready for bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tables {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub users_in: usize,
    pub users_kept: usize,
    pub users_invalid: usize,
    pub users_duplicate: usize,
    pub posts_in: usize,
    pub posts_kept: usize,
    pub posts_invalid: usize,
    pub posts_duplicate: usize,
    /// Kept posts whose `user_id` matches no kept user.
    pub orphaned_posts: usize,
}

pub fn transform(raw_users: &[Value], raw_posts: &[Value]) -> (Tables, TransformStats) {
    let mut stats = TransformStats {
        users_in: raw_users.len(),
        posts_in: raw_posts.len(),
        ..TransformStats::default()
    };

    let mut users = Vec::with_capacity(raw_users.len());
    let mut user_ids = HashSet::new();
    for (idx, raw) in raw_users.iter().enumerate() {
        let Some(user) = clean_user(raw) else {
            debug!("Dropping user #{}: missing or invalid id", idx);
            stats.users_invalid += 1;
            continue;
        };
        if !user_ids.insert(user.id) {
            debug!("Dropping user #{}: duplicate id {}", idx, user.id);
            stats.users_duplicate += 1;
            continue;
        }
        users.push(user);
    }

    let mut posts = Vec::with_capacity(raw_posts.len());
    let mut post_ids = HashSet::new();
    for (idx, raw) in raw_posts.iter().enumerate() {
        let Some(post) = clean_post(raw) else {
            debug!("Dropping post #{}: missing id, userId or title", idx);
            stats.posts_invalid += 1;
            continue;
        };
        if !post_ids.insert(post.id) {
            debug!("Dropping post #{}: duplicate id {}", idx, post.id);
            stats.posts_duplicate += 1;
            continue;
        }
        if !user_ids.contains(&post.user_id) {
            stats.orphaned_posts += 1;
        }
        posts.push(post);
    }

    stats.users_kept = users.len();
    stats.posts_kept = posts.len();

    info!(
        "Transformed {}/{} users and {}/{} posts",
        stats.users_kept, stats.users_in, stats.posts_kept, stats.posts_in
    );
    if stats.orphaned_posts > 0 {
        warn!(
            "{} posts reference users that are not in the users table; they are kept",
            stats.orphaned_posts
        );
    }

    (Tables { users, posts }, stats)
}

fn clean_user(raw: &Value) -> Option<User> {
    let id = coerce_id(raw.get("id"))?;
    Some(User {
        id,
        name: coerce_text(raw.get("name")),
        username: coerce_text(raw.get("username")),
        email: coerce_text(raw.get("email")),
    })
}

fn clean_post(raw: &Value) -> Option<Post> {
    let id = coerce_id(raw.get("id"))?;
    let user_id = coerce_id(non_null(raw, "userId").or_else(|| non_null(raw, "user_id")))?;
    let title = coerce_text(Some(non_null(raw, "title")?));
    let title_length = title.chars().count() as i64;

    Some(Post {
        id,
        user_id,
        title,
        body: coerce_text(raw.get("body")),
        title_length,
    })
}

fn non_null<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !v.is_null())
}

/// Integer identifier from a JSON integer, an integral float, or a numeric
/// string. Anything else yields `None`.
pub fn coerce_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Trimmed text for a field. Missing, null and structured values become "".
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) | None => String::new(),
    }
}
