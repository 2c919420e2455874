use serde::Serialize;

/// Page size used when the query does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Page sizes offered by the paginator.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [3, 5, 10, 25];

fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pages: Vec<Option<usize>>,
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
}

impl<T> Paginated<T> {
    /// Wraps one page of `items` out of `total_count` records.
    pub fn new(items: Vec<T>, current_page: usize, page_size: usize, total_count: usize) -> Self {
        let current_page = if current_page == 0 { 1 } else { current_page };
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        let pages = get_pages(total_count.div_ceil(page_size), current_page, 2, 2, 4, 2);

        Self {
            items,
            pages,
            page: current_page,
            page_size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_no_pages() {
        let page: Paginated<()> = Paginated::new(vec![], 1, 3, 0);

        assert!(page.pages.is_empty());
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn short_listing_links_every_page() {
        let page: Paginated<()> = Paginated::new(vec![], 2, 3, 8);

        assert_eq!(page.pages, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn long_listing_collapses_gaps() {
        let page: Paginated<()> = Paginated::new(vec![], 10, 3, 60);

        assert_eq!(
            page.pages,
            vec![
                Some(1),
                Some(2),
                None,
                Some(8),
                Some(9),
                Some(10),
                Some(11),
                Some(12),
                Some(13),
                Some(14),
                None,
                Some(19),
                Some(20),
            ]
        );
    }

    #[test]
    fn zero_page_and_size_fall_back_to_defaults() {
        let page: Paginated<()> = Paginated::new(vec![], 0, 0, 7);

        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total_pages(), 3);
    }
}
