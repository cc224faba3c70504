// src/models/mod.rs

pub mod notification;
pub mod quiz;
pub mod result;
pub mod student;
pub mod user;
pub mod video;

use serde::Deserialize;

use crate::config::MAX_PAGE_SIZE;

/// `?skip=&limit=` query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}
