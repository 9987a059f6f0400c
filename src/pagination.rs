//! This modules defines the common functionality for paging data.

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of entries to display per page.
    pub page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            page_size: 20,
            max_pages: 5,
        }
    }
}

/// One element of the pagination bar.
#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// Work out which page links to show for `curr_page` out of `page_count`
/// pages, showing at most `max_pages` numbered links.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render the pagination bar, using `page_url` to build the link for a page number.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    let link_style = "block px-3 py-2 rounded-sm text-blue-600 hover:underline";

    html! {
        nav class="pagination flex justify-center"
        {
            ul class="pagination flex gap-2 items-center p-0 m-0"
            {
                @for indicator in indicators {
                    @match indicator {
                        PaginationIndicator::CurrPage(page) => li {
                            a
                                href=(page_url(*page))
                                aria-current="page"
                                class="block px-3 py-2 rounded-sm font-bold text-black dark:text-white"
                            { (page) }
                        },
                        PaginationIndicator::Page(page) => li {
                            a href=(page_url(*page)) class=(link_style) { (page) }
                        },
                        PaginationIndicator::Ellipsis => li {
                            span class="px-3 py-2" { "..." }
                        },
                        PaginationIndicator::BackButton(page) => li {
                            a href=(page_url(*page)) role="button" class=(link_style) { "Back" }
                        },
                        PaginationIndicator::NextButton(page) => li {
                            a href=(page_url(*page)) role="button" class=(link_style) { "Next" }
                        },
                    }
                }
            }
        }
    }
}
