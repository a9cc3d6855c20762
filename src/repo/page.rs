//! Pagination of post listings

/// One page of a listing plus the numbers needed to link around it
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub record_count: usize,
    /// Never less than 1, even for an empty listing
    pub page_count: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: usize, page_size: usize, record_count: usize) -> Self {
        Self {
            items,
            page,
            page_size,
            record_count,
            page_count: page_count(record_count, page_size),
        }
    }

    pub fn prev_page(&self) -> Option<usize> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<usize> {
        (self.page < self.page_count).then(|| self.page + 1)
    }

    /// Whether the requested page lies past the last one
    pub fn is_past_end(&self) -> bool {
        self.page > self.page_count
    }
}

/// Number of pages needed for `record_count` rows
pub fn page_count(record_count: usize, page_size: usize) -> usize {
    record_count.div_ceil(page_size.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_prev_next() {
        let first = Paginated::new(vec![1, 2], 1, 2, 5);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.prev_page(), None);
        assert_eq!(first.next_page(), Some(2));

        let last = Paginated::new(vec![5], 3, 2, 5);
        assert_eq!(last.prev_page(), Some(2));
        assert_eq!(last.next_page(), None);
        assert!(!last.is_past_end());

        let beyond = Paginated::<i32>::new(Vec::new(), 4, 2, 5);
        assert!(beyond.is_past_end());
    }
}
