use crate::model::PageRequest;

/// Server-side ceiling on the number of persons returned per page
pub const MAX_PAGE_SIZE: u32 = 5;

/// Enforces the page-size ceiling regardless of what the client asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    max_page_size: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl Paginator {
    pub fn new(max_page_size: u32) -> Self {
        Self { max_page_size }
    }

    /// Oversized requests are cut down to the ceiling, keeping page number
    /// and sort order. Anything else, including a size of zero, passes
    /// through untouched.
    pub fn clamp(&self, request: PageRequest) -> PageRequest {
        if request.size > self.max_page_size {
            PageRequest {
                size: self.max_page_size,
                ..request
            }
        } else {
            request
        }
    }
}
