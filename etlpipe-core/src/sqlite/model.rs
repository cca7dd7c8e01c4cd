use diesel::prelude::*;
use serde::Serialize;

use crate::sqlite::schema::{posts, users};

#[derive(Queryable, Selectable, Insertable, PartialEq, Eq, Debug, Clone, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Queryable, Selectable, Insertable, PartialEq, Eq, Debug, Clone, Serialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    /// Character count of `title`, not bytes.
    pub title_length: i64,
}
