//! Filter fragments contributed to entry queries.
//!
//! The entry listing owns its `SELECT`, sorting and pagination. Other
//! components only hand it predicates, which it joins with `AND`.

use sqlx::{QueryBuilder, Sqlite};

/// A single SQL predicate over the entry alias `e`.
pub trait FilterFragment: Send + Sync {
    /// Append the predicate (no leading `AND`) with its bind values.
    fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>);
}

/// Restricts entries to those carrying one tag of the requesting user.
///
/// Ownership is checked through the tag row, so a foreign tag ID matches
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTagFilter {
    pub user_id: i64,
    pub tag_id: i64,
}

impl UserTagFilter {
    pub fn new(user_id: i64, tag_id: i64) -> Self {
        Self { user_id, tag_id }
    }
}

impl FilterFragment for UserTagFilter {
    fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(
            "e.id IN (SELECT eut.entry_id FROM entry_user_tags eut \
             JOIN user_tags ut ON ut.id = eut.user_tag_id \
             WHERE eut.user_tag_id = ",
        )
        .push_bind(self.tag_id)
        .push(" AND ut.user_id = ")
        .push_bind(self.user_id)
        .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tag_filter_sql() {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT e.id FROM entries e WHERE e.user_id = ");
        qb.push_bind(1_i64).push(" AND ");
        UserTagFilter::new(1, 9).push_predicate(&mut qb);

        let sql = qb.sql();
        assert!(sql.contains("eut.user_tag_id = ?"));
        assert!(sql.contains("ut.user_id = ?"));
        assert!(sql.ends_with(')'));
        assert_eq!(sql.matches('?').count(), 3);
    }
}
