//! # PgStore
//!
//! Maps the relational model onto the domain models. Cascades are carried by
//! the foreign keys in `migrations/`, so every port operation is one statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::info;

use domains::{
    Comment, CommentId, CommentQuery, CommentRepository, DomainError, NewComment, NewPost, NewUser, Page, PageRequest,
    Post, PostChanges, PostId, PostQuery, PostRepository, Result, SortOrder, User, UserId, UserRepository,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, content, status, user_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, status, user_id, post_id, parent_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_err)?;
        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(DomainError::storage)?;
        info!("migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_err(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_string());
        }
    }
    DomainError::storage(err)
}

// Rows

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    status: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self> {
        Ok(Post {
            id: PostId(row.id),
            title: row.title,
            content: row.content,
            status: row.status.parse().map_err(DomainError::storage)?,
            user_id: UserId(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    status: String,
    user_id: i64,
    post_id: i64,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = DomainError;

    fn try_from(row: CommentRow) -> Result<Self> {
        Ok(Comment {
            id: CommentId(row.id),
            content: row.content,
            status: row.status.parse().map_err(DomainError::storage)?,
            user_id: UserId(row.user_id),
            post_id: PostId(row.post_id),
            parent_id: row.parent_id.map(CommentId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn posts_from(rows: Vec<PostRow>) -> Result<Vec<Post>> {
    rows.into_iter().map(Post::try_from).collect()
}

fn comments_from(rows: Vec<CommentRow>) -> Result<Vec<Comment>> {
    rows.into_iter().map(Comment::try_from).collect()
}

// Query building

fn order_by(order: SortOrder) -> &'static str {
    match order {
        SortOrder::NewestFirst => " ORDER BY created_at DESC, id DESC",
        SortOrder::OldestFirst => " ORDER BY created_at ASC, id ASC",
    }
}

/// `LIKE` pattern matching `needle` literally anywhere in the column.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_post_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    qb.push(" WHERE TRUE");
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(user_id) = query.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.0);
    }
    if let Some(search) = &query.search {
        let pattern = contains_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_comment_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CommentQuery) {
    qb.push(" WHERE TRUE");
    if let Some(status) = query.status {
        qb.push(" AND c.status = ").push_bind(status.as_str());
    }
    if let Some(user_id) = query.user_id {
        qb.push(" AND c.user_id = ").push_bind(user_id.0);
    }
    if let Some(post_id) = query.post_id {
        qb.push(" AND c.post_id = ").push_bind(post_id.0);
    }
    if let Some(parent_id) = query.parent_id {
        qb.push(" AND c.parent_id = ").push_bind(parent_id.0);
    }
    if query.replies_only {
        qb.push(" AND c.parent_id IS NOT NULL");
    }
    if query.post_published {
        qb.push(" AND EXISTS (SELECT 1 FROM posts p WHERE p.id = c.post_id AND p.status = 'published')");
    }
}

fn limit_offset(qb: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.per_page()))
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

fn raw_ids<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    ids.iter().map(|id| (*id).into()).collect()
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }

    async fn find(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(raw_ids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let row: PostRow = sqlx::query_as(&format!(
            "INSERT INTO posts (title, content, status, user_id) VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        ))
        .bind(post.title)
        .bind(post.content)
        .bind(post.status.as_str())
        .bind(post.user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row.try_into()
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Post::try_from).transpose()
    }

    async fn find_many(&self, ids: &[PostId]) -> Result<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)"))
            .bind(raw_ids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        posts_from(rows)
    }

    async fn update(&self, id: PostId, changes: PostChanges) -> Result<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "UPDATE posts SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                status = COALESCE($4, status), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id.0)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(Post::try_from).transpose()
    }

    async fn delete(&self, id: PostId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(done.rows_affected() > 0)
    }

    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_post_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        push_post_filters(&mut select, query);
        select.push(order_by(query.order));
        limit_offset(&mut select, page);
        let rows = select
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page::new(posts_from(rows)?, page, total.max(0) as u64))
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let row: CommentRow = sqlx::query_as(&format!(
            "INSERT INTO comments (content, status, user_id, post_id, parent_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment.content)
        .bind(comment.status.as_str())
        .bind(comment.user_id.0)
        .bind(comment.post_id.0)
        .bind(comment.parent_id.map(|id| id.0))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row.try_into()
    }

    async fn find(&self, id: CommentId) -> Result<Option<Comment>> {
        let row: Option<CommentRow> =
            sqlx::query_as(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(Comment::try_from).transpose()
    }

    async fn find_many(&self, ids: &[CommentId]) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> =
            sqlx::query_as(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ANY($1)"))
                .bind(raw_ids(ids))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        comments_from(rows)
    }

    async fn update_content(&self, id: CommentId, content: String) -> Result<Option<Comment>> {
        let row: Option<CommentRow> = sqlx::query_as(&format!(
            "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id.0)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(Comment::try_from).transpose()
    }

    async fn delete(&self, id: CommentId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(done.rows_affected() > 0)
    }

    async fn list(&self, query: &CommentQuery, page: PageRequest) -> Result<Page<Comment>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM comments c");
        push_comment_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {COMMENT_COLUMNS} FROM comments c"));
        push_comment_filters(&mut select, query);
        select.push(order_by(query.order));
        limit_offset(&mut select, page);
        let rows = select
            .build_query_as::<CommentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page::new(comments_from(rows)?, page, total.max(0) as u64))
    }

    async fn for_post(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(post_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        comments_from(rows)
    }

    async fn replies(&self, parent_id: CommentId) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(parent_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        comments_from(rows)
    }
}
