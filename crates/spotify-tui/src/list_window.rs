//! The fully materialized collection and the fixed-size slice of it that is
//! shown in a table.
//!
//! The remote collection is fetched once, page by page, and kept in memory.
//! Only `[start, end)` of it is ever written into the display surface; the
//! [`Paginator`](crate::paginator::Paginator) decides which slice.

use spotify_proto::config::Config;
use spotify_proto::protocol::ItemDescription;
use tracing::{debug, info};
use unicode_width::UnicodeWidthChar;

use crate::error::{EmptyCollectionError, FetchError};
use crate::spotify::CollectionFetcher;

pub const HEADER: [&str; 2] = ["Title", "Artist"];

/// A table-like display. Row 0 is always the header once rendered.
///
/// Implementations report every selection change (including ones made
/// through [`RowSurface::select`]) back as a fresh selection event.
pub trait RowSurface {
    /// Remove every row, header included.
    fn clear_rows(&mut self);
    fn append_row(&mut self, cells: [String; 2]);
    fn row_count(&self) -> usize;
    fn select(&mut self, row: usize);
}

/// Sizes that used to be process-wide globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// Data rows per visible window.
    pub window_size: usize,
    /// Items per remote page request.
    pub page_size: usize,
    pub column_width: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            window_size: 45,
            page_size: 25,
            column_width: 20,
        }
    }
}

impl PageConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            window_size: config.ui.window_size.max(1),
            page_size: config.api.page_size.max(1),
            column_width: config.ui.column_width,
        }
    }
}

pub struct ListWindow {
    items: Vec<ItemDescription>,
    config: PageConfig,
}

impl ListWindow {
    pub fn new(config: PageConfig) -> Self {
        Self {
            items: Vec::new(),
            config,
        }
    }

    pub fn with_items(config: PageConfig, items: Vec<ItemDescription>) -> Self {
        Self { items, config }
    }

    pub fn config(&self) -> PageConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&ItemDescription> {
        self.items.get(idx)
    }

    /// Fetch every page of the remote collection and replace the local copy.
    ///
    /// The first request always counts as a page, so an empty collection
    /// costs one call. On error the current items are left untouched.
    /// Returns the number of pages fetched.
    pub async fn load<F>(&mut self, fetcher: &F) -> Result<usize, FetchError>
    where
        F: CollectionFetcher + ?Sized,
    {
        let page_size = self.config.page_size.max(1);

        let first = fetcher
            .fetch_page(page_size, 0)
            .await
            .map_err(|source| FetchError {
                pages_fetched: 0,
                offset: 0,
                source,
            })?;
        let total = first.total;
        let mut items = first.items;
        let mut pages = 1;

        let mut offset = page_size;
        while offset < total {
            let page = fetcher
                .fetch_page(page_size, offset)
                .await
                .map_err(|source| FetchError {
                    pages_fetched: pages,
                    offset,
                    source,
                })?;
            debug!("fetched {} items at offset {}", page.items.len(), offset);
            items.extend(page.items);
            pages += 1;
            offset += page_size;
        }

        info!("loaded {} of {} items in {} pages", items.len(), total, pages);
        self.items = items;
        Ok(pages)
    }

    /// Replace the surface rows with the header plus items `[start, end)`.
    ///
    /// `end` is clamped to the collection; a short or empty slice just
    /// yields fewer rows. Only an empty collection is an error, and the
    /// header is written even then.
    pub fn render_window(
        &self,
        start: usize,
        end: usize,
        surface: &mut dyn RowSurface,
    ) -> Result<(), EmptyCollectionError> {
        surface.clear_rows();
        surface.append_row(HEADER.map(String::from));
        if self.items.is_empty() {
            return Err(EmptyCollectionError);
        }

        let end = end.min(self.items.len());
        let start = start.min(end);
        let width = self.config.column_width;
        for item in &self.items[start..end] {
            surface.append_row([
                truncate_label(&item.primary_label, width),
                truncate_label(&item.secondary_label, width),
            ]);
        }
        Ok(())
    }
}

/// Cut `text` to `max_width` terminal columns and append "..." if anything
/// was dropped.
pub fn truncate_label(text: &str, max_width: usize) -> String {
    let mut width = 0;
    for (idx, ch) in text.char_indices() {
        width += ch.width().unwrap_or(0);
        if width > max_width {
            return format!("{}...", &text[..idx]);
        }
    }
    text.to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::spotify::Page;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records rows the way a table widget would.
    #[derive(Default)]
    pub(crate) struct FakeSurface {
        pub rows: Vec<[String; 2]>,
        pub select_calls: Vec<usize>,
    }

    impl RowSurface for FakeSurface {
        fn clear_rows(&mut self) {
            self.rows.clear();
        }

        fn append_row(&mut self, cells: [String; 2]) {
            self.rows.push(cells);
        }

        fn row_count(&self) -> usize {
            self.rows.len()
        }

        fn select(&mut self, row: usize) {
            self.select_calls.push(row);
        }
    }

    pub(crate) fn items(n: usize) -> Vec<ItemDescription> {
        (0..n)
            .map(|i| {
                ItemDescription::new(format!("Album {}", i), "Artist", format!("spotify:album:{}", i))
            })
            .collect()
    }

    /// Serves a collection of `total` items; `fail_on` makes that call
    /// (0-based) return an error.
    struct FakeFetcher {
        total: usize,
        fail_on: Option<usize>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl FakeFetcher {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(total: usize, call: usize) -> Self {
            Self {
                fail_on: Some(call),
                ..Self::new(total)
            }
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CollectionFetcher for FakeFetcher {
        async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Page, ApiError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((limit, offset));
                calls.len() - 1
            };
            if self.fail_on == Some(call) {
                return Err(ApiError::Other("err".into()));
            }
            let start = offset.min(self.total);
            let end = (offset + limit).min(self.total);
            Ok(Page {
                items: items(self.total)[start..end].to_vec(),
                total: self.total,
            })
        }
    }

    #[tokio::test]
    async fn test_load_fetches_no_pages_beyond_first_when_empty() {
        let fetcher = FakeFetcher::new(0);
        let mut window = ListWindow::new(PageConfig::default());
        assert_eq!(window.load(&fetcher).await.unwrap(), 1);
        assert!(window.is_empty());
        assert_eq!(fetcher.calls(), vec![(25, 0)]);
    }

    #[tokio::test]
    async fn test_load_single_page() {
        let fetcher = FakeFetcher::new(25);
        let mut window = ListWindow::new(PageConfig::default());
        window.load(&fetcher).await.unwrap();
        assert_eq!(window.len(), 25);
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_load_page_count_matches_total() {
        for (total, page_size) in [(50, 25), (51, 25), (135, 25), (7, 3), (1, 50)] {
            let fetcher = FakeFetcher::new(total);
            let config = PageConfig {
                page_size,
                ..PageConfig::default()
            };
            let mut window = ListWindow::new(config);
            let pages = window.load(&fetcher).await.unwrap();
            let expected = total.div_ceil(page_size);
            assert_eq!(window.len(), total, "total={} page={}", total, page_size);
            assert_eq!(pages, expected);
            assert_eq!(fetcher.calls().len(), expected);
        }
    }

    #[tokio::test]
    async fn test_load_keeps_remote_order() {
        let fetcher = FakeFetcher::new(60);
        let mut window = ListWindow::new(PageConfig::default());
        window.load(&fetcher).await.unwrap();
        assert_eq!(window.get(0).unwrap().primary_label, "Album 0");
        assert_eq!(window.get(26).unwrap().primary_label, "Album 26");
        assert_eq!(window.get(59).unwrap().primary_label, "Album 59");
        assert_eq!(fetcher.calls(), vec![(25, 0), (25, 25), (25, 50)]);
    }

    #[tokio::test]
    async fn test_load_fails_on_first_call() {
        let fetcher = FakeFetcher::failing_on(50, 0);
        let mut window = ListWindow::new(PageConfig::default());
        let err = window.load(&fetcher).await.unwrap_err();
        assert_eq!(err.pages_fetched, 0);
        assert_eq!(fetcher.calls().len(), 1);
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_load_fails_when_fetching_not_first_page() {
        let fetcher = FakeFetcher::failing_on(50, 1);
        let mut window = ListWindow::with_items(PageConfig::default(), items(3));
        let err = window.load(&fetcher).await.unwrap_err();
        assert_eq!(err.pages_fetched, 1);
        assert_eq!(err.offset, 25);
        assert_eq!(fetcher.calls().len(), 2);
        // previous contents survive a failed reload
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_render_empty_collection_fails() {
        let window = ListWindow::new(PageConfig::default());
        let mut surface = FakeSurface::default();
        assert_eq!(
            window.render_window(0, 45, &mut surface),
            Err(EmptyCollectionError)
        );
        assert_eq!(surface.rows.len(), 1);
        assert_eq!(surface.rows[0], HEADER.map(String::from));
    }

    #[test]
    fn test_render_short_collection_writes_all_rows() {
        let window = ListWindow::with_items(PageConfig::default(), items(5));
        let mut surface = FakeSurface::default();
        window.render_window(0, 45, &mut surface).unwrap();
        assert_eq!(surface.rows.len(), 6);
        assert_eq!(surface.rows[1][0], "Album 0");
        assert_eq!(surface.rows[5][0], "Album 4");
    }

    #[test]
    fn test_render_replaces_previous_rows() {
        let window = ListWindow::with_items(PageConfig::default(), items(50));
        let mut surface = FakeSurface::default();
        window.render_window(0, 45, &mut surface).unwrap();
        assert_eq!(surface.rows.len(), 46);
        window.render_window(45, 90, &mut surface).unwrap();
        assert_eq!(surface.rows.len(), 6);
        assert_eq!(surface.rows[0][0], "Title");
        assert_eq!(surface.rows[1][0], "Album 45");
    }

    #[test]
    fn test_render_past_the_end_writes_only_header() {
        let window = ListWindow::with_items(PageConfig::default(), items(45));
        let mut surface = FakeSurface::default();
        window.render_window(45, 90, &mut surface).unwrap();
        assert_eq!(surface.rows.len(), 1);
    }

    #[test]
    fn test_truncate_label() {
        let text = "Some text";
        assert_eq!(truncate_label(text, text.len()), "Some text");
        assert_eq!(truncate_label(text, text.len() - 1), "Some tex...");
        assert_eq!(truncate_label(text, text.len() + 1), "Some text");
        assert_eq!(truncate_label("Ólafur Arnalds", 6), "Ólafur...");
    }
}
