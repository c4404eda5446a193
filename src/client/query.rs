//! Relational query builder for the backend's table endpoints.
//!
//! Covers exactly the operation surface the application consumes: select
//! with filter/order/limit/ilike, insert (optionally returning the row),
//! upsert, update, and exact counting.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::RemoteClient;
use crate::errors::AppError;

/// A query against one named collection. Filters accumulate; the terminal
/// method decides the verb.
pub struct TableQuery<'a> {
    client: &'a RemoteClient,
    table: String,
    select: Option<String>,
    /// (column, "op.value") pairs in backend filter syntax.
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn new(client: &'a RemoteClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Columns (or embedded joins) to return.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    /// Equality filter.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Case-insensitive substring match on a text column.
    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("ilike.*{}*", needle)));
        self
    }

    /// Order by a column, newest-first.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{}.desc", column));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    fn get_request(&self) -> reqwest::RequestBuilder {
        let req = self
            .client
            .http
            .get(self.client.rest_url(&self.table))
            .query(&self.query_pairs());
        self.client.authorize(req)
    }

    /// Fetch all matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, AppError> {
        let resp = self.get_request().send().await?;
        if !resp.status().is_success() {
            return Err(RemoteClient::reject(resp).await);
        }
        Ok(resp.json::<Vec<T>>().await?)
    }

    /// Fetch at most one row.
    pub async fn fetch_optional<T: DeserializeOwned>(mut self) -> Result<Option<T>, AppError> {
        self.limit = Some(1);
        let mut rows = self.fetch::<T>().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Insert a row; the backend's response body is discarded.
    pub async fn insert(self, row: &impl Serialize) -> Result<(), AppError> {
        self.write(reqwest::Method::POST, "return=minimal", row)
            .await
            .map(|_| ())
    }

    /// Insert a row and decode the returned representation.
    pub async fn insert_returning<T: DeserializeOwned>(
        self,
        row: &impl Serialize,
    ) -> Result<T, AppError> {
        let resp = self
            .write(reqwest::Method::POST, "return=representation", row)
            .await?;
        let mut rows = resp.json::<Vec<T>>().await?;
        if rows.is_empty() {
            return Err(AppError::BadResponse(
                "Insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    /// Whole-row upsert keyed on the table's conflict target.
    pub async fn upsert(self, row: &impl Serialize) -> Result<(), AppError> {
        self.write(
            reqwest::Method::POST,
            "resolution=merge-duplicates,return=minimal",
            row,
        )
        .await
        .map(|_| ())
    }

    /// Update matching rows with a partial document.
    pub async fn update(self, patch: &impl Serialize) -> Result<(), AppError> {
        self.write(reqwest::Method::PATCH, "return=minimal", patch)
            .await
            .map(|_| ())
    }

    async fn write(
        &self,
        method: reqwest::Method,
        prefer: &str,
        body: &impl Serialize,
    ) -> Result<reqwest::Response, AppError> {
        let req = self
            .client
            .http
            .request(method, self.client.rest_url(&self.table))
            .query(&self.query_pairs())
            .header("Prefer", prefer)
            .json(body);
        let resp = self.client.authorize(req).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteClient::reject(resp).await);
        }
        Ok(resp)
    }

    /// Exact row count for the current filters. Issues a HEAD request and
    /// reads the total from the Content-Range header.
    pub async fn count(self) -> Result<u64, AppError> {
        let req = self
            .client
            .http
            .head(self.client.rest_url(&self.table))
            .query(&self.query_pairs())
            .header("Prefer", "count=exact");
        let resp = self.client.authorize(req).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteClient::reject(resp).await);
        }

        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        range
            .rsplit('/')
            .next()
            .and_then(|total| total.parse::<u64>().ok())
            .ok_or_else(|| {
                AppError::BadResponse(format!("Uncountable content range: {:?}", range))
            })
    }
}
