//! Post repository - slug assignment, filtered listings and soft delete
//!
//! Posts live in a single SQLite table. Every multi-statement write runs in
//! one transaction so readers never observe a half-applied edit.

mod page;
pub mod slug;

pub use page::{page_count, Paginated};

use chrono::{DateTime, Datelike, FixedOffset, SubsecRound};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Timezone;
use crate::content::{Format, Post, DELETED, VISIBLE};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    slug TEXT NOT NULL,
    tags TEXT NOT NULL,
    created_at TEXT NOT NULL,
    delete_status INTEGER NOT NULL DEFAULT 1,
    format TEXT NOT NULL DEFAULT 'txt'
)
"#;

const COLUMNS: &str = "id, title, content, slug, tags, created_at, delete_status, format";

/// Chronological, tolerant of posts stamped with different offsets
const NEWEST_FIRST: &str = " ORDER BY julianday(created_at) DESC, id DESC";

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} must not be empty")]
    Validation(&'static str),
    #[error("post not found")]
    NotFound,
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Listing filters
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Hide soft-deleted posts (anonymous readers)
    pub visible_only: bool,
    /// Substring match against the raw tags text
    pub tag: Option<String>,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl ListQuery {
    pub fn new(visible_only: bool, page_size: usize) -> Self {
        Self {
            visible_only,
            tag: None,
            page: 1,
            page_size,
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// A month that has at least one post
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    /// Archive path key, `YYYY/MM`
    pub fn path(&self) -> String {
        format!("{:04}/{:02}", self.year, self.month)
    }

    /// Display label, `YYYY-MM`
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Fields supplied by the admin when creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: String,
    #[serde(default)]
    pub format: Format,
}

/// Fields supplied by the admin when editing a post
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub format: Format,
    /// Regenerate the slug from the new title
    pub change_slug: bool,
    /// Hide the post; no other field is touched
    pub delete: bool,
}

impl<'r> FromRow<'r, SqliteRow> for Post {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let title: String = row.try_get("title")?;
        let content: String = row.try_get("content")?;
        let tags: String = row.try_get("tags")?;
        let format: String = row.try_get("format")?;
        let created_at: String = row.try_get("created_at")?;

        let mut post = Post::new(&title, &content, &tags, Format::parse(&format));
        post.id = Some(row.try_get("id")?);
        post.slug = row.try_get("slug")?;
        post.created_at = Some(parse_created_at(&created_at)?);
        post.delete_status = row.try_get("delete_status")?;
        Ok(post)
    }
}

fn parse_created_at(s: &str) -> std::result::Result<DateTime<FixedOffset>, sqlx::Error> {
    DateTime::parse_from_rfc3339(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Post storage
#[derive(Clone)]
pub struct PostRepository {
    pool: SqlitePool,
    timezone: Timezone,
}

impl PostRepository {
    pub fn new(pool: SqlitePool, timezone: Timezone) -> Self {
        Self { pool, timezone }
    }

    /// Open (creating if needed) the database at `url` and ensure the schema
    pub async fn connect(url: &str, timezone: Timezone) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let repo = Self::new(pool, timezone);
        repo.migrate().await?;
        tracing::info!("Connected to {}", url);
        Ok(repo)
    }

    /// A private in-memory database; one connection so every query sees the same data
    pub async fn in_memory(timezone: Timezone) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let repo = Self::new(pool, timezone);
        repo.migrate().await?;
        Ok(repo)
    }

    /// Create the posts table if it does not exist
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// One page of posts, newest first
    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<Post>> {
        let page_size = query.page_size.max(1);
        let page = query.page.max(1);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts");
        push_filters(&mut count, query);
        let record_count: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let record_count = record_count as usize;

        // Past the last page: nothing to fetch, and the offset may not fit in an i64
        if page > page_count(record_count, page_size) {
            return Ok(Paginated::new(Vec::new(), page, page_size, record_count));
        }
        let offset = (page - 1)
            .checked_mul(page_size)
            .and_then(|offset| i64::try_from(offset).ok())
            .unwrap_or(i64::MAX);
        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts", COLUMNS));
        push_filters(&mut select, query);
        select
            .push(NEWEST_FIRST)
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let items = select.build_query_as::<Post>().fetch_all(&self.pool).await?;

        tracing::debug!(
            "Listed page {} of {:?}: {} of {} posts",
            page,
            query.tag,
            items.len(),
            record_count
        );
        Ok(Paginated::new(items, page, page_size, record_count))
    }

    pub async fn find_by_slug(&self, slug: &str, visible_only: bool) -> Result<Option<Post>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_slug(&mut conn, slug, visible_only).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("SELECT {} FROM posts WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    /// Every post, newest first
    pub async fn archive(&self, visible_only: bool) -> Result<Vec<Post>> {
        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts", COLUMNS));
        push_filters(&mut select, &ListQuery::new(visible_only, 1));
        select.push(NEWEST_FIRST);
        Ok(select.build_query_as::<Post>().fetch_all(&self.pool).await?)
    }

    /// Newest visible posts, for the feed
    pub async fn recent(&self, limit: usize) -> Result<Vec<Post>> {
        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts", COLUMNS));
        push_filters(&mut select, &ListQuery::new(true, limit));
        select.push(NEWEST_FIRST).push(" LIMIT ").push_bind(limit as i64);
        Ok(select.build_query_as::<Post>().fetch_all(&self.pool).await?)
    }

    /// Posts created in the given month (in their own offset), newest first
    pub async fn posts_in_month(
        &self,
        visible_only: bool,
        year: i32,
        month: u32,
    ) -> Result<Vec<Post>> {
        let bucket = MonthBucket { year, month };
        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts", COLUMNS));
        push_filters(&mut select, &ListQuery::new(visible_only, 1));
        select
            .push(" AND substr(created_at, 1, 7) = ")
            .push_bind(bucket.label())
            .push(NEWEST_FIRST);
        Ok(select.build_query_as::<Post>().fetch_all(&self.pool).await?)
    }

    /// Distinct months with posts, most recent first
    pub async fn months_index(&self, visible_only: bool) -> Result<Vec<MonthBucket>> {
        let mut select = QueryBuilder::<Sqlite>::new("SELECT created_at FROM posts");
        push_filters(&mut select, &ListQuery::new(visible_only, 1));
        let dates: Vec<String> = select.build_query_scalar().fetch_all(&self.pool).await?;

        let mut buckets = BTreeSet::new();
        for date in dates {
            let date = parse_created_at(&date)?;
            buckets.insert(MonthBucket {
                year: date.year(),
                month: date.month(),
            });
        }
        Ok(buckets.into_iter().rev().collect())
    }

    /// Tag tokens with the number of posts carrying each, most used first
    pub async fn tag_counts(&self, visible_only: bool) -> Result<Vec<(String, usize)>> {
        let mut select = QueryBuilder::<Sqlite>::new("SELECT tags FROM posts");
        push_filters(&mut select, &ListQuery::new(visible_only, 1));
        let rows: Vec<String> = select.build_query_scalar().fetch_all(&self.pool).await?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tags in &rows {
            for tag in tags.split_whitespace() {
                *counts.entry(tag.to_string()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }

    /// Slug for `title` that does not collide with any stored post
    pub async fn make_slug(&self, title: &str) -> Result<String> {
        let mut conn = self.pool.acquire().await?;
        unique_slug(&mut conn, title).await
    }

    /// Insert a post with a fresh slug and the current time
    pub async fn create(&self, new_post: NewPost) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let mut post = Post::new(
            &new_post.title,
            &new_post.content,
            &new_post.tags,
            new_post.format,
        );
        post.slug = unique_slug(&mut tx, &new_post.title).await?;
        post.created_at = Some(self.timezone.now().trunc_subsecs(0));
        validate(&post)?;
        insert(&mut tx, &mut post).await?;

        tx.commit().await?;
        tracing::info!("Created post {:?} at {}", post.title, post.url());
        Ok(post)
    }

    /// Apply an admin edit to the post with `slug`, whatever its visibility
    pub async fn edit(&self, slug: &str, edit: PostEdit) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let mut post = fetch_by_slug(&mut tx, slug, false)
            .await?
            .ok_or(Error::NotFound)?;

        if edit.delete {
            post.delete_status = DELETED;
        } else {
            post.title = edit.title;
            post.tags = edit.tags;
            post.set_content(&edit.content);
            post.format = edit.format;
            if edit.change_slug {
                post.slug = unique_slug(&mut tx, &post.title).await?;
            }
            post.delete_status = VISIBLE;
        }
        validate(&post)?;
        update(&mut tx, &post).await?;

        tx.commit().await?;
        tracing::info!(
            "Updated post {:?} ({})",
            post.slug,
            if post.is_deleted() { "hidden" } else { "visible" }
        );
        Ok(post)
    }

    /// Insert or update a post
    ///
    /// New posts get `created_at` stamped when they do not carry one.
    pub async fn save(&self, post: &mut Post) -> Result<()> {
        if post.id.is_none() && post.created_at.is_none() {
            post.created_at = Some(self.timezone.now().trunc_subsecs(0));
        }
        validate(post)?;

        let mut conn = self.pool.acquire().await?;
        if post.id.is_some() {
            update(&mut conn, post).await
        } else {
            insert(&mut conn, post).await
        }
    }

    /// Flip a post between visible and hidden
    pub async fn set_deleted(&self, post: &mut Post, deleted: bool) -> Result<()> {
        let id = post.id.ok_or(Error::NotFound)?;
        let status = if deleted { DELETED } else { VISIBLE };

        let result = sqlx::query("UPDATE posts SET delete_status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }

        post.delete_status = status;
        Ok(())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ListQuery) {
    builder.push(" WHERE 1 = 1");
    if query.visible_only {
        builder.push(" AND delete_status = ").push_bind(VISIBLE);
    }
    if let Some(tag) = &query.tag {
        // Case-sensitive substring, so "art" also matches "cart"
        builder
            .push(" AND instr(tags, ")
            .push_bind(tag.clone())
            .push(") > 0");
    }
}

fn validate(post: &Post) -> Result<()> {
    let required = [
        ("title", post.title.as_str()),
        ("content", post.content()),
        ("tags", post.tags.as_str()),
        ("slug", post.slug.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(field));
        }
    }
    if post.created_at.is_none() {
        return Err(Error::Validation("created_at"));
    }
    Ok(())
}

async fn fetch_by_slug(
    conn: &mut SqliteConnection,
    slug: &str,
    visible_only: bool,
) -> Result<Option<Post>> {
    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM posts", COLUMNS));
    push_filters(&mut select, &ListQuery::new(visible_only, 1));
    select
        .push(" AND slug = ")
        .push_bind(slug.to_string())
        .push(" ORDER BY id LIMIT 1");
    Ok(select.build_query_as::<Post>().fetch_optional(&mut *conn).await?)
}

/// The slug itself when free, otherwise `<slug>-<n>` where `n` is the number
/// of posts already using the `<slug>-` prefix plus two
async fn unique_slug(conn: &mut SqliteConnection, title: &str) -> Result<String> {
    let base = slug::slugify(title);

    let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE slug = ? LIMIT 1")
        .bind(base.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    if taken.is_none() {
        return Ok(base);
    }

    let prefix = format!("{}-", base);
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE substr(slug, 1, length(?)) = ?")
            .bind(prefix.as_str())
            .bind(prefix.as_str())
            .fetch_one(&mut *conn)
            .await?;

    let slug = format!("{}{}", prefix, count + 2);
    tracing::debug!("Slug {:?} taken, using {:?}", base, slug);
    Ok(slug)
}

async fn insert(conn: &mut SqliteConnection, post: &mut Post) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO posts (title, content, slug, tags, created_at, delete_status, format) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(post.title.as_str())
    .bind(post.content())
    .bind(post.slug.as_str())
    .bind(post.tags.as_str())
    .bind(post.created_at.map(|date| date.to_rfc3339()))
    .bind(post.delete_status)
    .bind(post.format.as_str())
    .execute(&mut *conn)
    .await?;

    post.id = Some(result.last_insert_rowid());
    Ok(())
}

async fn update(conn: &mut SqliteConnection, post: &Post) -> Result<()> {
    let result = sqlx::query(
        "UPDATE posts SET title = ?, content = ?, slug = ?, tags = ?, created_at = ?, \
         delete_status = ?, format = ? WHERE id = ?",
    )
    .bind(post.title.as_str())
    .bind(post.content())
    .bind(post.slug.as_str())
    .bind(post.tags.as_str())
    .bind(post.created_at.map(|date| date.to_rfc3339()))
    .bind(post.delete_status)
    .bind(post.format.as_str())
    .bind(post.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}
