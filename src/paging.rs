//! Paginated, sorted listing of stored records.

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Result, TrafficError};
use crate::model::TrafficRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortField {
    #[default]
    Timestamp,
    CarCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Zero-based page request. Defaults to the newest ten records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub last: bool,
}

/// Sorts `records` and cuts out the requested page.
pub fn paginate(mut records: Vec<TrafficRecord>, req: PageRequest) -> Result<Page<TrafficRecord>> {
    if req.size == 0 {
        return Err(TrafficError::InvalidInput(
            "Page size must be greater than zero".into(),
        ));
    }

    match (req.sort, req.direction) {
        (SortField::Timestamp, SortDirection::Asc) => records.sort_by_key(|r| r.timestamp),
        (SortField::Timestamp, SortDirection::Desc) => {
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp))
        }
        (SortField::CarCount, SortDirection::Asc) => records.sort_by(|a, b| {
            a.car_count
                .cmp(&b.car_count)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        }),
        // earliest first among equal counts in both directions
        (SortField::CarCount, SortDirection::Desc) => {
            records.sort_by(TrafficRecord::busiest_first)
        }
    }

    let total_elements = records.len();
    let total_pages = total_elements.div_ceil(req.size);
    let content: Vec<TrafficRecord> = records
        .into_iter()
        .skip(req.page.saturating_mul(req.size))
        .take(req.size)
        .collect();

    Ok(Page {
        content,
        page_number: req.page,
        page_size: req.size,
        total_elements,
        total_pages,
        last: req.page.saturating_add(1) >= total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn records(counts: &[u32]) -> Vec<TrafficRecord> {
        let base = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| TrafficRecord::new(base + Duration::minutes(30 * i as i64), c))
            .collect()
    }

    fn req(page: usize, size: usize, sort: SortField, direction: SortDirection) -> PageRequest {
        PageRequest {
            page,
            size,
            sort,
            direction,
        }
    }

    #[test]
    fn test_default_is_newest_first() {
        let all = records(&[1, 2, 3]);
        let page = paginate(all.clone(), PageRequest::default()).unwrap();
        assert_eq!(page.content[0].timestamp, all[2].timestamp);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.last);
    }

    #[test]
    fn test_pages_split() {
        let all = records(&[1, 2, 3, 4, 5]);
        let first = paginate(
            all.clone(),
            req(0, 2, SortField::Timestamp, SortDirection::Asc),
        )
        .unwrap();
        assert_eq!(first.content.len(), 2);
        assert_eq!(first.total_pages, 3);
        assert!(!first.last);

        let last = paginate(all, req(2, 2, SortField::Timestamp, SortDirection::Asc)).unwrap();
        assert_eq!(last.content.len(), 1);
        assert_eq!(last.content[0].car_count, 5);
        assert!(last.last);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = paginate(
            records(&[1, 2]),
            req(5, 2, SortField::Timestamp, SortDirection::Asc),
        )
        .unwrap();
        assert!(page.content.is_empty());
        assert!(page.last);
    }

    #[test]
    fn test_sort_by_car_count() {
        let all = records(&[5, 9, 5, 1]);
        let desc = paginate(
            all.clone(),
            req(0, 10, SortField::CarCount, SortDirection::Desc),
        )
        .unwrap();
        let counts: Vec<u32> = desc.content.iter().map(|r| r.car_count).collect();
        assert_eq!(counts, vec![9, 5, 5, 1]);
        assert_eq!(desc.content[1].timestamp, all[0].timestamp);

        let asc = paginate(all, req(0, 10, SortField::CarCount, SortDirection::Asc)).unwrap();
        let counts: Vec<u32> = asc.content.iter().map(|r| r.car_count).collect();
        assert_eq!(counts, vec![1, 5, 5, 9]);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(paginate(
            records(&[1]),
            req(0, 0, SortField::Timestamp, SortDirection::Asc)
        )
        .is_err());
    }

    #[test]
    fn test_empty_input() {
        let page = paginate(Vec::new(), PageRequest::default()).unwrap();
        assert_eq!(page.total_pages, 0);
        assert!(page.last);
    }
}
