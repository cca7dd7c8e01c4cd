use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Text};
use log::debug;
use serde::Serialize;
use std::fmt;

use crate::conf::AnalysisConf;
use crate::sqlite::{DbResult, Sqlite};

const TOP_POSTERS_SQL: &str = "
    SELECT u.id AS user_id, u.username, COUNT(p.id) AS post_count
    FROM users u
    LEFT JOIN posts p ON u.id = p.user_id
    GROUP BY u.id, u.username
    ORDER BY post_count DESC, u.id ASC
    LIMIT ?";

const AVG_TITLE_LENGTH_SQL: &str = "
    SELECT u.id AS user_id, u.username, AVG(p.title_length) AS avg_title_length
    FROM users u
    JOIN posts p ON u.id = p.user_id
    GROUP BY u.id, u.username
    ORDER BY avg_title_length DESC, u.id ASC
    LIMIT ?";

const SHORT_TITLES_SQL: &str = "
    SELECT id AS post_id, user_id, title, title_length
    FROM posts
    WHERE title_length < ?
    ORDER BY title_length ASC, id ASC
    LIMIT ?";

const USER_POSTS_SQL: &str = "
    SELECT u.username, p.id AS post_id, p.title
    FROM posts p
    JOIN users u ON u.id = p.user_id
    ORDER BY p.id ASC
    LIMIT ?";

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName, Serialize)]
pub struct PostCount {
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Text)]
    pub username: String,
    #[diesel(sql_type = BigInt)]
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct AvgTitleLength {
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Text)]
    pub username: String,
    #[diesel(sql_type = Double)]
    pub avg_title_length: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName, Serialize)]
pub struct ShortTitle {
    #[diesel(sql_type = BigInt)]
    pub post_id: i64,
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = BigInt)]
    pub title_length: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName, Serialize)]
pub struct UserPost {
    #[diesel(sql_type = Text)]
    pub username: String,
    #[diesel(sql_type = BigInt)]
    pub post_id: i64,
    #[diesel(sql_type = Text)]
    pub title: String,
}

/// Users ranked by number of posts. Users without posts count as zero.
pub fn top_posters(db: &mut Sqlite, limit: i64) -> DbResult<Vec<PostCount>> {
    let rows = diesel::sql_query(TOP_POSTERS_SQL)
        .bind::<BigInt, _>(limit)
        .load::<PostCount>(db.connection())?;
    Ok(rows)
}

pub fn avg_title_lengths(db: &mut Sqlite, limit: i64) -> DbResult<Vec<AvgTitleLength>> {
    let rows = diesel::sql_query(AVG_TITLE_LENGTH_SQL)
        .bind::<BigInt, _>(limit)
        .load::<AvgTitleLength>(db.connection())?;
    Ok(rows)
}

pub fn short_titles(db: &mut Sqlite, threshold: i64, limit: i64) -> DbResult<Vec<ShortTitle>> {
    let rows = diesel::sql_query(SHORT_TITLES_SQL)
        .bind::<BigInt, _>(threshold)
        .bind::<BigInt, _>(limit)
        .load::<ShortTitle>(db.connection())?;
    Ok(rows)
}

/// Inner join of posts and users; posts with an unknown `user_id` drop out.
pub fn user_posts(db: &mut Sqlite, limit: i64) -> DbResult<Vec<UserPost>> {
    let rows = diesel::sql_query(USER_POSTS_SQL)
        .bind::<BigInt, _>(limit)
        .load::<UserPost>(db.connection())?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub conf: AnalysisConf,
    pub top_posters: Vec<PostCount>,
    pub avg_title_lengths: Vec<AvgTitleLength>,
    pub short_titles: Vec<ShortTitle>,
    pub user_posts: Vec<UserPost>,
}

/// Runs the fixed query set in order. Any query error aborts the analysis.
pub fn analyze(db: &mut Sqlite, conf: &AnalysisConf) -> DbResult<AnalysisReport> {
    let top_posters = top_posters(db, conf.top_users)?;
    debug!("top posters: {} rows", top_posters.len());
    let avg_title_lengths = avg_title_lengths(db, conf.avg_title_users)?;
    debug!("average title lengths: {} rows", avg_title_lengths.len());
    let short_titles = short_titles(db, conf.short_title_threshold, conf.short_title_limit)?;
    debug!("short titles: {} rows", short_titles.len());
    let user_posts = user_posts(db, conf.join_limit)?;
    debug!("user posts: {} rows", user_posts.len());

    Ok(AnalysisReport {
        conf: *conf,
        top_posters,
        avg_title_lengths,
        short_titles,
        user_posts,
    })
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n1) Top {} users by number of posts:", self.conf.top_users)?;
        let rows = self
            .top_posters
            .iter()
            .map(|r| vec![r.user_id.to_string(), r.username.clone(), r.post_count.to_string()])
            .collect();
        write!(f, "{}", render_table(&["user_id", "username", "post_count"], rows))?;

        writeln!(f, "\n2) Average title length per user (descending):")?;
        let rows = self
            .avg_title_lengths
            .iter()
            .map(|r| {
                vec![
                    r.user_id.to_string(),
                    r.username.clone(),
                    format!("{:.2}", r.avg_title_length),
                ]
            })
            .collect();
        write!(f, "{}", render_table(&["user_id", "username", "avg_title_length"], rows))?;

        writeln!(
            f,
            "\n3) Posts with short titles (<{} chars):",
            self.conf.short_title_threshold
        )?;
        let rows = self
            .short_titles
            .iter()
            .map(|r| {
                vec![
                    r.post_id.to_string(),
                    r.user_id.to_string(),
                    r.title.clone(),
                    r.title_length.to_string(),
                ]
            })
            .collect();
        write!(
            f,
            "{}",
            render_table(&["post_id", "user_id", "title", "title_length"], rows)
        )?;

        writeln!(f, "\n4) Posts with their authors:")?;
        let rows = self
            .user_posts
            .iter()
            .map(|r| vec![r.username.clone(), r.post_id.to_string(), r.title.clone()])
            .collect();
        write!(f, "{}", render_table(&["username", "post_id", "title"], rows))
    }
}

/// Right-aligned plain-text table, one line per row.
pub fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "(no rows)\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    for cells in std::iter::once(&header_cells).chain(rows.iter()) {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{}{}", " ".repeat(pad), cell)
            })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}
