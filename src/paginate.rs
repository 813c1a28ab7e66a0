/// One page of an already filtered and sorted list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based, clamped into `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Never less than one, even for an empty list.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let total = total_pages.max(1) as i64;
    requested.clamp(1, total) as usize
}

pub fn paginate<T>(items: &[T], page_size: usize, requested: i64) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = clamp_page(requested, total_pages);
    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
        total_items: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_items_by_six() {
        let items: Vec<u32> = (1..=10).collect();
        let first = paginate(&items, 6, 1);
        assert_eq!(first.items.len(), 6);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());

        let second = paginate(&items, 6, 2);
        assert_eq!(second.items, &[7, 8, 9, 10]);
        assert!(!second.has_next());

        let clamped = paginate(&items, 6, 5);
        assert_eq!(clamped.page, 2);
        assert_eq!(clamped.items.len(), 4);
    }

    #[test]
    fn test_clamp_law() {
        for total in 1..6usize {
            for requested in [-10i64, -1, 0, 1, 3, 5, 99, i64::MAX] {
                let page = clamp_page(requested, total);
                assert!(page >= 1 && page <= total, "{} -> {} of {}", requested, page, total);
            }
        }
        assert_eq!(clamp_page(0, 0), 1);
    }

    #[test]
    fn test_empty_list_has_one_empty_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 12, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_pages_reconstruct_the_list() {
        for n in 0..40usize {
            let items: Vec<usize> = (0..n).collect();
            for size in 1..13usize {
                let pages = total_pages(n, size);
                assert_eq!(pages, std::cmp::max(1, n.div_ceil(size)));

                let mut rebuilt = Vec::new();
                for p in 1..=pages {
                    let page = paginate(&items, size, p as i64);
                    if n > 0 {
                        assert!(!page.items.is_empty());
                    }
                    rebuilt.extend_from_slice(page.items);
                }
                assert_eq!(rebuilt, items);
            }
        }
    }
}
