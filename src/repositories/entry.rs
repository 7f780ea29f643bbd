//! Entry repository and query builder.
//!
//! A deliberately small stand-in for the feed's entry storage: enough to
//! create entries and list them with filters contributed by other modules.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{Entry, EntryFilters, EntryStatus, InsertEntry, SortColumn, SortDirection};
use crate::error::{TagError, TagResult};
use crate::query::FilterFragment;

const ENTITY: &str = "entry";

/// Repository for entry rows.
#[derive(Clone)]
pub struct EntryRepository {
    pool: SqlitePool,
}

impl EntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new entry.
    pub async fn create(&self, entry: &InsertEntry) -> TagResult<Entry> {
        sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (user_id, title, url, status, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, user_id, title, url, status, published_at
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.title)
        .bind(&entry.url)
        .bind(entry.status.as_str())
        .bind(entry.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(TagError::storage(ENTITY, "create"))
    }

    /// Start a query over the user's entries.
    pub fn query(&self, user_id: i64) -> EntryQueryBuilder {
        EntryQueryBuilder::new(self.pool.clone(), user_id)
    }
}

/// Builds `SELECT`/`COUNT` statements over one user's entries.
///
/// Every condition, including contributed [`FilterFragment`]s, is joined
/// with `AND`.
pub struct EntryQueryBuilder {
    pool: SqlitePool,
    user_id: i64,
    statuses: Vec<EntryStatus>,
    excluded_status: Option<EntryStatus>,
    fragments: Vec<Box<dyn FilterFragment>>,
    sorting: Vec<(SortColumn, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl EntryQueryBuilder {
    pub fn new(pool: SqlitePool, user_id: i64) -> Self {
        Self {
            pool,
            user_id,
            statuses: Vec::new(),
            excluded_status: None,
            fragments: Vec::new(),
            sorting: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Add a predicate owned by another component.
    pub fn with_filter(mut self, fragment: impl FilterFragment + 'static) -> Self {
        self.fragments.push(Box::new(fragment));
        self
    }

    pub fn with_statuses(mut self, statuses: &[EntryStatus]) -> Self {
        self.statuses.extend_from_slice(statuses);
        self
    }

    pub fn without_status(mut self, status: EntryStatus) -> Self {
        self.excluded_status = Some(status);
        self
    }

    pub fn with_sorting(mut self, column: SortColumn, direction: SortDirection) -> Self {
        self.sorting.push((column, direction));
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = (offset > 0).then_some(offset);
        self
    }

    /// Apply status, sort and pagination filters in one go.
    pub fn with_filters(self, filters: &EntryFilters) -> Self {
        self.with_statuses(&filters.statuses)
            .with_sorting(filters.order, filters.direction)
            .with_sorting(SortColumn::Id, filters.direction)
            .with_limit(filters.limit)
            .with_offset(filters.offset)
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE e.user_id = ").push_bind(self.user_id);

        if !self.statuses.is_empty() {
            qb.push(" AND e.status IN (");
            let mut list = qb.separated(", ");
            for status in &self.statuses {
                list.push_bind(status.as_str());
            }
            list.push_unseparated(")");
        }

        if let Some(status) = self.excluded_status {
            qb.push(" AND e.status <> ").push_bind(status.as_str());
        }

        for fragment in &self.fragments {
            qb.push(" AND ");
            fragment.push_predicate(qb);
        }
    }

    /// The SQL of [`Self::get_entries`], for inspection.
    pub fn select_sql(&self) -> String {
        self.select_builder().into_sql()
    }

    fn select_builder(&self) -> QueryBuilder<'_, Sqlite> {
        let mut qb = QueryBuilder::new(
            "SELECT e.id, e.user_id, e.title, e.url, e.status, e.published_at FROM entries e",
        );
        self.push_conditions(&mut qb);

        if !self.sorting.is_empty() {
            qb.push(" ORDER BY ");
            let mut order = qb.separated(", ");
            for (column, direction) in &self.sorting {
                order.push(format!("{} {}", column.as_sql(), direction.as_sql()));
            }
        }

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                qb.push(" LIMIT ").push_bind(limit);
                if let Some(offset) = offset {
                    qb.push(" OFFSET ").push_bind(offset);
                }
            }
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
            (None, Some(offset)) => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(offset);
            }
            (None, None) => {}
        }

        qb
    }

    /// Fetch the matching page of entries.
    pub async fn get_entries(&self) -> TagResult<Vec<Entry>> {
        let mut qb = self.select_builder();
        qb.build_query_as::<Entry>()
            .fetch_all(&self.pool)
            .await
            .map_err(TagError::storage(ENTITY, "list"))
    }

    /// Count all matching entries, ignoring sort and pagination.
    pub async fn count_entries(&self) -> TagResult<i64> {
        let mut qb = QueryBuilder::new("SELECT count(*) FROM entries e");
        self.push_conditions(&mut qb);
        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(TagError::storage(ENTITY, "count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::UserTagFilter;
    use sqlx::sqlite::SqlitePoolOptions;

    fn lazy_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .unwrap()
    }

    #[tokio::test]
    async fn test_select_sql_composes_conjunctively() {
        let builder = EntryQueryBuilder::new(lazy_pool(), 1)
            .with_statuses(&[EntryStatus::Unread, EntryStatus::Read])
            .without_status(EntryStatus::Removed)
            .with_filter(UserTagFilter::new(1, 5))
            .with_sorting(SortColumn::Title, SortDirection::Asc)
            .with_limit(10)
            .with_offset(20);

        let sql = builder.select_sql();
        assert!(sql.contains("WHERE e.user_id = ?"));
        assert!(sql.contains(" AND e.status IN (?, ?)"));
        assert!(sql.contains(" AND e.status <> ?"));
        assert!(sql.contains(" AND e.id IN (SELECT eut.entry_id"));
        assert!(sql.contains("ORDER BY e.title ASC"));
        assert!(sql.ends_with("LIMIT ? OFFSET ?"));
    }

    #[tokio::test]
    async fn test_offset_without_limit() {
        let sql = EntryQueryBuilder::new(lazy_pool(), 1).with_offset(5).select_sql();
        assert!(sql.ends_with("LIMIT -1 OFFSET ?"));

        let sql = EntryQueryBuilder::new(lazy_pool(), 1).with_limit(0).select_sql();
        assert!(!sql.contains("LIMIT"));
    }
}
