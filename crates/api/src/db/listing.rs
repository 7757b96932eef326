//! Filtered, paginated listing.
//!
//! A [`Filter`] collects the predicates of one listing request (tenant scope,
//! free-text search, exact-match filters). The same filter renders the
//! `WHERE` clause of both the `COUNT(*)` query and the page query, so the
//! reported `total` always describes exactly the rows being paged through.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use shopforge_core::{Page, PageRequest};

use super::RepositoryError;

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone)]
enum Predicate {
    Uuid(&'static str, Uuid),
    Text(&'static str, String),
    Flag(&'static str, bool),
    Search(&'static [&'static str], String),
}

/// Predicates for one listing request, joined with `AND`.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = id`.
    #[must_use]
    pub fn uuid(mut self, column: &'static str, id: impl Into<Uuid>) -> Self {
        self.predicates.push(Predicate::Uuid(column, id.into()));
        self
    }

    /// `column = value`.
    #[must_use]
    pub fn text(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Text(column, value.into()));
        self
    }

    /// `column = true|false`.
    #[must_use]
    pub fn flag(mut self, column: &'static str, value: bool) -> Self {
        self.predicates.push(Predicate::Flag(column, value));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    ///
    /// Blank or missing terms add nothing.
    #[must_use]
    pub fn search(mut self, columns: &'static [&'static str], term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty())
            && !columns.is_empty()
        {
            self.predicates
                .push(Predicate::Search(columns, format!("%{}%", escape_like(term))));
        }
        self
    }

    /// Append ` WHERE ...` (nothing when the filter is empty).
    pub fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            query.push(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Uuid(column, id) => {
                    query.push(*column).push(" = ").push_bind(*id);
                }
                Predicate::Text(column, value) => {
                    query.push(*column).push(" = ").push_bind(value.clone());
                }
                Predicate::Flag(column, value) => {
                    query
                        .push(*column)
                        .push(if *value { " = TRUE" } else { " = FALSE" });
                }
                Predicate::Search(columns, pattern) => {
                    query.push("(");
                    for (j, column) in columns.iter().enumerate() {
                        if j > 0 {
                            query.push(" OR ");
                        }
                        query
                            .push(*column)
                            .push(" ILIKE ")
                            .push_bind(pattern.clone())
                            .push(" ESCAPE '\\'");
                    }
                    query.push(")");
                }
            }
        }
    }
}

/// Static shape of a listing: source relation, selected columns, ordering.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    /// `FROM` target, optionally with joins (e.g. `products p LEFT JOIN ...`).
    pub from: &'static str,
    /// Select list.
    pub columns: &'static str,
    /// `ORDER BY` expression; only ever a constant chosen by the caller.
    pub order_by: &'static str,
}

impl ListQuery {
    /// `SELECT COUNT(*) FROM ... WHERE ...`
    #[must_use]
    pub fn count_query(&self, filter: &Filter) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.from));
        filter.push_where(&mut query);
        query
    }

    /// `SELECT ... FROM ... WHERE ... ORDER BY ... LIMIT $n OFFSET $m`
    #[must_use]
    pub fn page_query(&self, filter: &Filter, page: PageRequest) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!("SELECT {} FROM {}", self.columns, self.from));
        filter.push_where(&mut query);
        query
            .push(" ORDER BY ")
            .push(self.order_by)
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset());
        query
    }

    /// Run the count and page queries and assemble a [`Page`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn fetch<T>(
        &self,
        pool: &PgPool,
        filter: &Filter,
        page: PageRequest,
    ) -> Result<Page<T>, RepositoryError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut count = self.count_query(filter);
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        let mut select = self.page_query(filter, page);
        let rows: Vec<T> = select.build_query_as().fetch_all(pool).await?;

        Ok(Page::new(rows, page, total))
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    const PRODUCTS: ListQuery = ListQuery {
        from: "products",
        columns: "id, name",
        order_by: "created_at DESC",
    };

    fn where_clause(sql: &str) -> &str {
        sql.find(" WHERE ").map_or("", |i| {
            let rest = &sql[i..];
            rest.find(" ORDER BY ").map_or(rest, |j| &rest[..j])
        })
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_empty_filter_has_no_where() {
        let sql = PRODUCTS.count_query(&Filter::new()).into_sql();
        assert_eq!(sql, "SELECT COUNT(*) FROM products");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = Filter::new().search(&["name"], Some("   "));
        assert_eq!(PRODUCTS.count_query(&filter).into_sql(), "SELECT COUNT(*) FROM products");
    }

    #[test]
    fn test_count_and_page_share_predicates() {
        let combos = [
            Filter::new().uuid("shop_id", Uuid::nil()),
            Filter::new()
                .uuid("shop_id", Uuid::nil())
                .search(&["name", "sku"], Some("tea")),
            Filter::new()
                .uuid("shop_id", Uuid::nil())
                .text("status", "pending"),
            Filter::new()
                .uuid("shop_id", Uuid::nil())
                .search(&["order_number", "billing_email"], Some("ORD"))
                .text("status", "shipped")
                .flag("is_active", true),
        ];

        for filter in &combos {
            let count = PRODUCTS.count_query(filter).into_sql();
            let page = PRODUCTS.page_query(filter, PageRequest::default()).into_sql();
            assert_eq!(where_clause(&count), where_clause(&page));
            assert!(!where_clause(&count).is_empty());
        }
    }

    #[test]
    fn test_search_renders_or_group() {
        let filter = Filter::new()
            .uuid("shop_id", Uuid::nil())
            .search(&["email", "first_name"], Some("ann"));
        let sql = PRODUCTS.page_query(&filter, PageRequest::default()).into_sql();
        assert_eq!(
            sql,
            "SELECT id, name FROM products WHERE shop_id = $1 AND \
             (email ILIKE $2 ESCAPE '\\' OR first_name ILIKE $3 ESCAPE '\\') \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
    }
}
