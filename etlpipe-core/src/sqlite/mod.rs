use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use log::{debug, info};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

pub mod model;
#[rustfmt::skip]
pub mod schema;

use self::model::*;
use self::schema::*;
use crate::transform::Tables;

// No foreign key on posts.user_id: posts pointing at unknown users are kept.
const RECREATE_TABLES: &str = "
    DROP TABLE IF EXISTS posts;
    DROP TABLE IF EXISTS users;
    CREATE TABLE users (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        username TEXT NOT NULL,
        email TEXT NOT NULL
    );
    CREATE TABLE posts (
        id INTEGER PRIMARY KEY NOT NULL,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        title_length INTEGER NOT NULL
    );
    CREATE INDEX posts_user_id_idx ON posts (user_id);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: ConnectionError,
    },
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

pub type DbResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub users: usize,
    pub posts: usize,
}

pub struct Sqlite {
    connection: SqliteConnection,
    path: String,
}

impl Sqlite {
    /// Opens (or creates) the database file at `db_path`.
    pub fn open(db_path: &Path) -> DbResult<Self> {
        let path = db_path.to_string_lossy().into_owned();
        let sqlite = Self::establish_connection(&path)?;
        info!("Using SQLite database at: {:?}", path);
        Ok(sqlite)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::establish_connection(":memory:")
    }

    fn establish_connection(path: &str) -> DbResult<Self> {
        let connection =
            SqliteConnection::establish(path).map_err(|source| StoreError::Connection {
                path: path.to_string(),
                source,
            })?;
        Ok(Sqlite {
            connection,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.connection
    }

    /// Drops and recreates both tables, then bulk inserts every row, all in
    /// one transaction. Whatever a previous run left behind is gone afterwards.
    pub fn load(&mut self, tables: &Tables) -> DbResult<LoadSummary> {
        let summary = self.connection.transaction::<_, StoreError, _>(|conn| {
            conn.batch_execute(RECREATE_TABLES)?;
            debug!("Recreated users and posts tables");

            let users_written = if tables.users.is_empty() {
                0
            } else {
                diesel::insert_into(users::table)
                    .values(&tables.users)
                    .execute(conn)?
            };

            let posts_written = if tables.posts.is_empty() {
                0
            } else {
                diesel::insert_into(posts::table)
                    .values(&tables.posts)
                    .execute(conn)?
            };

            Ok(LoadSummary {
                users: users_written,
                posts: posts_written,
            })
        })?;

        info!(
            "Loaded {} users and {} posts into {}",
            summary.users, summary.posts, self.path
        );
        Ok(summary)
    }

    // get all users ordered by id
    pub fn users(&mut self) -> DbResult<Vec<User>> {
        let results = users::table
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut self.connection)?;
        Ok(results)
    }

    // get all posts ordered by id
    pub fn posts(&mut self) -> DbResult<Vec<Post>> {
        let results = posts::table
            .order(posts::id.asc())
            .select(Post::as_select())
            .load(&mut self.connection)?;
        Ok(results)
    }

    // row counts of (users, posts)
    pub fn table_counts(&mut self) -> DbResult<(i64, i64)> {
        let users: i64 = users::table.count().get_result(&mut self.connection)?;
        let posts: i64 = posts::table.count().get_result(&mut self.connection)?;
        Ok((users, posts))
    }
}
