//! Page-window computation for caller-controlled pagination.
//!
//! The caller owns `current_page`; the table only renders the window and
//! reports which page was requested.

/// One control in the pager strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerItem {
    /// `target` is `None` when already on the first page.
    Previous { target: Option<u32> },
    Page { number: u32, current: bool },
    Ellipsis,
    /// `target` is `None` when already on the last page.
    Next { target: Option<u32> },
}

impl PagerItem {
    pub fn target(&self) -> Option<u32> {
        match *self {
            PagerItem::Previous { target } | PagerItem::Next { target } => target,
            PagerItem::Page { number, .. } => Some(number),
            PagerItem::Ellipsis => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            PagerItem::Previous { target } | PagerItem::Next { target } => target.is_none(),
            PagerItem::Page { .. } => false,
            PagerItem::Ellipsis => true,
        }
    }
}

/// Pages within this distance of the current page are always shown.
pub const WINDOW_RADIUS: u32 = 2;

/// Visible window for a 1-indexed `current_page` out of `total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    current_page: u32,
    total_pages: u32,
}

impl PageWindow {
    /// `current_page` is clamped into `1..=total_pages`. A `total_pages`
    /// of zero yields a window with no page links.
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let current_page = if total_pages == 0 {
            0
        } else {
            current_page.clamp(1, total_pages)
        };
        Self {
            current_page,
            total_pages,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Target of the "previous" control, `None` on the first page.
    pub fn previous(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    /// Target of the "next" control, `None` on the last page.
    pub fn next(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    /// Whether `page` gets a link: first, last, or within the radius.
    pub fn is_visible(&self, page: u32) -> bool {
        page >= 1
            && page <= self.total_pages
            && (page == 1 || page == self.total_pages || page.abs_diff(self.current_page) <= WINDOW_RADIUS)
    }

    /// The full pager strip, previous and next controls included.
    ///
    /// The first-page link appears once page 1 leaves the window and its
    /// ellipsis only when at least one page is hidden behind it. The last
    /// page is handled symmetrically.
    pub fn items(&self) -> Vec<PagerItem> {
        let mut items = vec![PagerItem::Previous {
            target: self.previous(),
        }];

        if self.total_pages > 0 {
            let current = self.current_page;
            let start = current.saturating_sub(WINDOW_RADIUS).max(1);
            let end = current.saturating_add(WINDOW_RADIUS).min(self.total_pages);

            if start > 1 {
                items.push(self.page(1));
                if start > 2 {
                    items.push(PagerItem::Ellipsis);
                }
            }

            items.extend((start..=end).map(|n| self.page(n)));

            if end < self.total_pages {
                if end + 1 < self.total_pages {
                    items.push(PagerItem::Ellipsis);
                }
                items.push(self.page(self.total_pages));
            }
        }

        items.push(PagerItem::Next {
            target: self.next(),
        });
        items
    }

    /// Page numbers that get a link, in order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.items()
            .into_iter()
            .filter_map(|item| match item {
                PagerItem::Page { number, .. } => Some(number),
                _ => None,
            })
            .collect()
    }

    /// Invoke `on_page_change` for an activated control. Disabled controls
    /// and ellipses do nothing. Returns whether the callback ran.
    pub fn activate(&self, item: &PagerItem, on_page_change: impl FnOnce(u32)) -> bool {
        if item.is_disabled() {
            return false;
        }
        match item.target() {
            Some(page) => {
                on_page_change(page);
                true
            }
            None => false,
        }
    }

    fn page(&self, number: u32) -> PagerItem {
        PagerItem::Page {
            number,
            current: number == self.current_page,
        }
    }
}
