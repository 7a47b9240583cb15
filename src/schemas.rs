use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QuerySelect, Select};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::auth::TokenService;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Access token signer/verifier
    pub tokens: Arc<TokenService>,
}

/// Highest accepted page number. `MAX_PAGE * MAX_PAGE_SIZE` stays well inside u64.
pub const MAX_PAGE: u64 = 1_000_000;
pub const MAX_PAGE_SIZE: u64 = 500;

/// Query parameters accepted by every list endpoint.
///
/// Without `page` and `page_size` the whole list is returned.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct ListQuery {
    /// Page number (starting from 0)
    #[validate(range(max = MAX_PAGE))]
    pub page: Option<u64>,
    /// Page size (default: 50 once paging is requested)
    #[validate(range(min = 1, max = MAX_PAGE_SIZE))]
    pub page_size: Option<u64>,
}

impl ListQuery {
    pub const DEFAULT_PAGE_SIZE: u64 = 50;

    /// `(offset, limit)` when the caller asked for a page, `None` for the full list.
    pub fn window(&self) -> Option<(u64, u64)> {
        if self.page.is_none() && self.page_size.is_none() {
            return None;
        }
        let page = self.page.unwrap_or(0);
        let page_size = self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE);
        Some((page.saturating_mul(page_size), page_size))
    }

    /// Run `select`, restricted to the requested page if there is one.
    pub async fn fetch<E, C>(&self, select: Select<E>, db: &C) -> Result<Vec<E::Model>, DbErr>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        match self.window() {
            Some((offset, limit)) => select.offset(offset).limit(limit).all(db).await,
            None => select.all(db).await,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent stays `None`, `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
