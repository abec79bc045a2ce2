use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw `?page=&pageSize=` query values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Fails when `page` or `page_size` is zero or `page_size` exceeds `max_page_size`.
    pub fn new(page: u32, page_size: u32, max_page_size: u32) -> Result<Self, String> {
        if page == 0 {
            return Err("page must be at least 1".to_string());
        }
        if page_size == 0 {
            return Err("pageSize must be at least 1".to_string());
        }
        if page_size > max_page_size {
            return Err(format!("pageSize must not exceed {max_page_size}"));
        }
        Ok(Self { page, page_size })
    }

    pub fn from_query(query: &PageQuery, max_page_size: u32) -> Result<Self, String> {
        Self::new(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_page_size,
        )
    }

    /// Page envelope for offset/limit style requests (`page = offset / limit + 1`).
    pub fn from_offset(offset: u32, limit: u32, max_page_size: u32) -> Result<(Self, u32), String> {
        let request = Self::new(1, limit, max_page_size)?;
        let page = (offset / limit)
            .checked_add(1)
            .ok_or_else(|| "offset is out of range".to_string())?;
        Ok((Self { page, ..request }, offset))
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
    pub total: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            page_count: total.div_ceil(request.page_size as u64),
            total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub pagination: Pagination,
}

/// `{ data, meta: { pagination } }` envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: Meta {
                pagination: Pagination::new(request, total),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_query(&PageQuery::default(), 100).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: 10 });
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let req = PageRequest::new(3, 25, 100).unwrap();
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn test_rejects_zero_and_oversized() {
        assert!(PageRequest::new(0, 10, 100).is_err());
        assert!(PageRequest::new(1, 0, 100).is_err());
        assert!(PageRequest::new(1, 101, 100).is_err());
        assert!(PageRequest::new(1, 100, 100).is_ok());
    }

    #[test]
    fn test_page_count_is_ceiling() {
        for (total, size, expected) in [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (99, 7, 15)] {
            let req = PageRequest::new(1, size, 100).unwrap();
            assert_eq!(Pagination::new(req, total).page_count, expected, "{total}/{size}");
        }
    }

    #[test]
    fn test_from_offset() {
        let (req, offset) = PageRequest::from_offset(40, 20, 100).unwrap();
        assert_eq!(req.page, 3);
        assert_eq!(req.page_size, 20);
        assert_eq!(offset, 40);
        assert!(PageRequest::from_offset(0, 0, 100).is_err());
    }

    #[test]
    fn test_from_offset_rejects_page_past_u32() {
        assert!(PageRequest::from_offset(u32::MAX, 1, 100).is_err());

        let (req, _) = PageRequest::from_offset(u32::MAX, 2, 100).unwrap();
        assert_eq!(req.page, u32::MAX / 2 + 1);
    }

    #[test]
    fn test_envelope_shape() {
        let req = PageRequest::new(2, 5, 100).unwrap();
        let page = Paginated::new(vec![1, 2], req, 7);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["pagination"]["page"], 2);
        assert_eq!(json["meta"]["pagination"]["pageSize"], 5);
        assert_eq!(json["meta"]["pagination"]["pageCount"], 2);
        assert_eq!(json["meta"]["pagination"]["total"], 7);
    }
}
