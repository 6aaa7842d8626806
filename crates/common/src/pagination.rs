//! Pagination parameters shared by list endpoints.

use serde::Deserialize;

/// Pagination parameters as they arrive on a query string.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamp to sane bounds and return `(zero_based_page, per_page)`.
    pub fn normalize(self) -> (u64, u64) {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        ((page - 1) as u64, per_page as u64)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: Self::MAX_PER_PAGE } }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn normalize_clamps_zero_to_first_page() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let p: Pagination = serde_json::from_str(r#"{"perPage": 5}"#).unwrap();
        assert_eq!(p, Pagination { page: 1, per_page: 5 });
    }
}
