// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Product endpoints and the list orderings used by the inventory and search
//! screens.

use chrono::NaiveDate;

use super::ApiClient;
use crate::dates;
use crate::error::ApiResult;
use crate::types::{Product, ProductPayload};

/// How many products the OP search shows before anything is typed.
pub const RECENT_PRODUCTS: usize = 5;

impl ApiClient {
    pub async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.get(&["products"]).await
    }

    /// `GET /products/search?q=`. A blank term loads the full list.
    pub async fn search_products(&self, term: &str) -> ApiResult<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_products().await;
        }
        self.get_with_query(&["products", "search"], &[("q", term.to_string())])
            .await
    }

    pub async fn products_by_op(&self, op: &str) -> ApiResult<Vec<Product>> {
        self.get(&["products", "by-op", op.trim()]).await
    }

    pub async fn products_by_team(&self, team_id: i64) -> ApiResult<Vec<Product>> {
        self.get(&["products", "module", &team_id.to_string()]).await
    }

    /// `GET /products/date-range?start=&end=[&teamId=]`
    pub async fn products_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<i64>,
    ) -> ApiResult<Vec<Product>> {
        let mut query = vec![
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
        ];
        if let Some(team_id) = team_id {
            query.push(("teamId", team_id.to_string()));
        }
        self.get_with_query(&["products", "date-range"], &query).await
    }

    pub async fn get_product(&self, id: i64) -> ApiResult<Product> {
        self.get(&["products", &id.to_string()]).await
    }

    /// Returns the stored product when the backend echoes it back.
    pub async fn create_product(&self, payload: &ProductPayload) -> ApiResult<Option<Product>> {
        let created: Option<Product> = self.post(&["products"], payload).await?;
        tracing::info!("PRODUCT_CREATED | op={} ref={}", payload.op, payload.reference);
        Ok(created)
    }

    pub async fn update_product(&self, id: i64, payload: &ProductPayload) -> ApiResult<Option<Product>> {
        let updated: Option<Product> = self.put(&["products", &id.to_string()], payload).await?;
        tracing::info!("PRODUCT_UPDATED | id={} op={}", id, payload.op);
        Ok(updated)
    }

    pub async fn delete_product(&self, id: i64) -> ApiResult<()> {
        self.delete::<()>(&["products", &id.to_string()]).await?;
        tracing::info!("PRODUCT_DELETED | id={}", id);
        Ok(())
    }
}

/// Inventory order: newest (highest id) first.
pub fn sort_newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.id.cmp(&a.id));
}

/// Report order: latest assigned date first; undated products last.
pub fn sort_by_assigned_date_desc(products: &mut [Product]) {
    products.sort_by_key(|p| {
        std::cmp::Reverse(p.assigned_date.as_deref().and_then(dates::parse_date))
    });
}

/// The last `count` products of the list as returned by the backend, most
/// recent first.
pub fn recent_products(products: &[Product], count: usize) -> Vec<Product> {
    products.iter().rev().take(count).cloned().collect()
}
