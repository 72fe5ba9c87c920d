use axum::Json;
use serde::{Deserialize, Serialize};

/// Standard success envelope: `{"success": true, "data": ..., "pagination"?: ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        pagination: None,
    })
}

pub fn paginated<T: Serialize>(data: Vec<T>, pagination: Pagination) -> Json<ApiResponse<Vec<T>>> {
    Json(ApiResponse {
        success: true,
        data,
        pagination: Some(pagination),
    })
}

/// `?page=&limit=` query on collection endpoints. Page starts at 1,
/// limit defaults to 20 and is capped at 100.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageQuery { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        let limit = self.limit();
        Pagination {
            page: self.page(),
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 20);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_limit_is_capped() {
        let q = PageQuery {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 200);
    }

    #[test]
    fn test_page_floor_is_one() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(10),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_pages_round_up() {
        let q = PageQuery {
            page: Some(1),
            limit: Some(20),
        };
        assert_eq!(q.pagination(41).pages, 3);
        assert_eq!(q.pagination(40).pages, 2);
        assert_eq!(q.pagination(0).pages, 0);
    }
}
