//! End-to-end runs of the pipeline against in-memory sources and a real
//! SQLite file.

use etlpipe_core::*;
use serde_json::{json, Value};
use std::path::Path;

/// Serves fixed lists; `None` makes that endpoint fail.
struct StaticSource {
    users: Option<Vec<Value>>,
    posts: Option<Vec<Value>>,
}

impl Source for StaticSource {
    fn fetch(&self, resource: Resource) -> Result<Vec<Value>, ExtractError> {
        let records = match resource {
            Resource::Users => &self.users,
            Resource::Posts => &self.posts,
        };
        records.clone().ok_or(ExtractError::Status(500))
    }
}

fn live_users() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": " Leanne Graham ", "username": "Bret", "email": "Sincere@april.biz"}),
        json!({"id": 2, "name": "Ervin Howell", "username": "Antonette", "email": "Shanna@melissa.tv"}),
        json!({"id": 3, "name": "Clementine Bauch", "username": "Samantha"}),
    ]
}

fn live_posts() -> Vec<Value> {
    vec![
        json!({"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"}),
        json!({"userId": 1, "id": 2, "title": "qui est esse", "body": "est rerum tempore"}),
        json!({"userId": 2, "id": 3, "title": "ea molestias", "body": "et iusto sed"}),
        json!({"userId": 3, "id": 4, "title": "eum et est", "body": "ullam et saepe"}),
    ]
}

fn conf_at(db_path: &Path) -> Conf {
    Conf {
        db_path: db_path.to_path_buf(),
        ..Conf::default()
    }
}

#[test]
fn healthy_source_loads_live_data() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));
    let source = StaticSource {
        users: Some(live_users()),
        posts: Some(live_posts()),
    };

    let summary = run_pipeline(&conf, &source)?;
    assert_eq!(summary.users_origin, Origin::Live);
    assert_eq!(summary.posts_origin, Origin::Live);
    assert_eq!(summary.loaded, LoadSummary { users: 3, posts: 4 });

    let mut db = Sqlite::open(&conf.db_path)?;
    let users = db.users()?;
    assert_eq!(users[0].name, "Leanne Graham");
    assert_eq!(users[2].email, "");

    let top = &summary.report.top_posters;
    assert_eq!(top[0].username, "Bret");
    assert_eq!(top[0].post_count, 2);
    Ok(())
}

#[test]
fn failed_users_endpoint_joins_samples_with_live_posts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));
    let source = StaticSource {
        users: None,
        posts: Some(live_posts()),
    };

    let summary = run_pipeline(&conf, &source)?;
    assert_eq!(summary.users_origin, Origin::Fallback);
    assert_eq!(summary.posts_origin, Origin::Live);

    // Sample users are 1 (alice) and 2 (bob); the live post of user 3 is orphaned.
    assert_eq!(summary.stats.orphaned_posts, 1);
    let joined: Vec<(String, i64)> = summary
        .report
        .user_posts
        .iter()
        .map(|r| (r.username.clone(), r.post_id))
        .collect();
    assert_eq!(
        joined,
        vec![
            ("alice".to_string(), 1),
            ("alice".to_string(), 2),
            ("bob".to_string(), 3),
        ]
    );
    assert_eq!(summary.report.user_posts[0].title, "sunt aut facere");
    Ok(())
}

#[test]
fn failed_posts_endpoint_joins_live_users_with_sample_posts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));
    let source = StaticSource {
        users: Some(live_users()),
        posts: None,
    };

    let summary = run_pipeline(&conf, &source)?;
    assert_eq!(summary.users_origin, Origin::Live);
    assert_eq!(summary.posts_origin, Origin::Fallback);

    let joined: Vec<(&str, &str)> = summary
        .report
        .user_posts
        .iter()
        .map(|r| (r.username.as_str(), r.title.as_str()))
        .collect();
    assert_eq!(
        joined,
        vec![("Bret", "Hello"), ("Bret", "World"), ("Antonette", "Another")]
    );
    Ok(())
}

#[test]
fn rerun_produces_identical_tables() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));
    let source = StaticSource {
        users: Some(live_users()),
        posts: Some(live_posts()),
    };

    run_pipeline(&conf, &source)?;
    let mut db = Sqlite::open(&conf.db_path)?;
    let first = (db.users()?, db.posts()?);
    drop(db);

    run_pipeline(&conf, &source)?;
    let mut db = Sqlite::open(&conf.db_path)?;
    let second = (db.users()?, db.posts()?);

    assert_eq!(first, second);
    assert_eq!(db.table_counts()?, (3, 4));
    Ok(())
}

#[test]
fn rerun_discards_rows_from_previous_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));

    run_pipeline(
        &conf,
        &StaticSource {
            users: Some(live_users()),
            posts: Some(live_posts()),
        },
    )?;
    run_pipeline(&conf, &OfflineSource)?;

    let mut db = Sqlite::open(&conf.db_path)?;
    let usernames: Vec<String> = db.users()?.into_iter().map(|u| u.username).collect();
    assert_eq!(usernames, vec!["alice", "bob"]);
    assert_eq!(db.posts()?.len(), 3);
    Ok(())
}

#[test]
fn orphaned_post_survives_load_but_not_join() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));
    let source = StaticSource {
        users: Some(vec![json!({"id": 1, "username": "ada"})]),
        posts: Some(vec![
            json!({"id": 10, "userId": 1, "title": "Hi"}),
            json!({"id": 11, "userId": 404, "title": "Lost"}),
        ]),
    };

    let summary = run_pipeline(&conf, &source)?;
    let joined: Vec<i64> = summary.report.user_posts.iter().map(|r| r.post_id).collect();
    assert_eq!(joined, vec![10]);

    let mut db = Sqlite::open(&conf.db_path)?;
    let stored: Vec<i64> = db.posts()?.iter().map(|p| p.id).collect();
    assert_eq!(stored, vec![10, 11]);
    Ok(())
}

#[test]
fn unwritable_database_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let conf = conf_at(&dir.path().join("missing-dir").join("pipeline.db"));

    let err = run_pipeline(&conf, &OfflineSource).unwrap_err();
    assert!(err.downcast_ref::<StoreError>().is_some());
    assert!(err.to_string().starts_with("Failed to open database"), "{err:#}");
    assert!(err.to_string().contains("missing-dir"));
}

#[test]
fn summary_serializes_origins_counts_and_report() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let conf = conf_at(&dir.path().join("pipeline.db"));
    let source = StaticSource {
        users: None,
        posts: Some(live_posts()),
    };

    let summary = run_pipeline(&conf, &source)?;
    let value = serde_json::to_value(&summary)?;

    assert_eq!(value["users_origin"], "fallback");
    assert_eq!(value["posts_origin"], "live");
    assert_eq!(value["loaded"]["posts"], 4);
    assert_eq!(value["stats"]["orphaned_posts"], 1);
    assert!(value["elapsed_ms"].is_i64());
    assert_eq!(value["report"]["user_posts"][0]["username"], "alice");
    Ok(())
}
