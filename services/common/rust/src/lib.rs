pub mod confidentiality;
pub mod config;
pub mod constant;
pub mod error;
pub mod logging;

use std::sync::Arc;

pub(crate) type AppLogAlias = Arc<String>;

pub mod util {
    /// Page window over a sequence of `total` items, page numbers start from 1
    #[derive(Debug, Clone, PartialEq)]
    pub struct AppPagination {
        pub current_page: u32,
        pub total_pages: u32,
        pub start_idx: usize,
        pub end_idx: usize,
    }

    impl AppPagination {
        /// requested page beyond the last one is clamped to the last page,
        /// page zero is treated as the first page.
        pub fn new(page: u32, per_page: u32, total: usize) -> Self {
            let per_page = per_page.max(1) as usize;
            let total_pages = total.div_ceil(per_page) as u32;
            let current_page = page.max(1).min(total_pages.max(1));
            let start_idx = ((current_page - 1) as usize * per_page).min(total);
            let end_idx = (start_idx + per_page).min(total);
            Self {
                current_page,
                total_pages,
                start_idx,
                end_idx,
            }
        }

        pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
            &items[self.start_idx..self.end_idx]
        }
    }
}
