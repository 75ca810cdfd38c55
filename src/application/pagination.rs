//! Page slicing with out-of-range clamping.

use serde::Serialize;

/// One page of a listing plus the counters a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total: usize,
}

impl<T> Page<T> {
    /// A page over nothing; still reports page 1 of 1.
    pub fn empty() -> Self {
        Page {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total: 0,
        }
    }
}

impl<'a, T: Clone> Page<&'a T> {
    /// Clone only the sliced items, after filtering worked on borrows.
    pub fn into_owned(self) -> Page<T> {
        Page {
            items: self.items.into_iter().cloned().collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total: self.total,
        }
    }
}

/// Slice `items` into the requested page.
///
/// Any out-of-range request, including zero and negatives, clamps into
/// `1..=total_pages`; an empty input still yields page 1 of 1.
pub fn paginate<T: Clone>(items: &[T], requested_page: i64, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = u32::try_from(total.div_ceil(page_size)).unwrap_or(u32::MAX).max(1);
    let current_page = requested_page.clamp(1, i64::from(total_pages)) as u32;

    let start = (current_page as usize - 1) * page_size;
    let end = (start + page_size).min(total);
    let items = if start < total {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items,
        current_page,
        total_pages,
        total,
    }
}
