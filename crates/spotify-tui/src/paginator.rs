//! Turns raw table selection events into an absolute cursor and
//! flips the visible window when the user walks past either edge.
//!
//! The table only ever holds one window (header + `window_size` rows), so the
//! raw selection index alone cannot tell "moved down" from "moved up" across
//! redraws. The paginator keeps the last two raw indices and compares them.
//!
//! Flipping is re-entrant: after re-rendering, the paginator forces the
//! table selection to the first (or last) data row and the table reports
//! that as a new selection event, which is fed straight back in.

use tracing::{debug, warn};

use crate::list_window::{ListWindow, RowSurface};

/// Marker stored in the history when there is no meaningful previous index.
pub const NO_SELECTION: isize = -1;

/// (older, newer) raw selection indices.
pub type RecentSelections = (isize, isize);

/// What a selection event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Plain move within the current window.
    Moved,
    /// The next window was rendered and `select_row` forced.
    Advanced { select_row: usize },
    /// The previous window was rendered and `select_row` forced.
    Retreated { select_row: usize },
    /// A flip was due but the window could not be rendered.
    Abandoned,
}

impl Transition {
    /// Row the table was forced to, if any.
    #[cfg(test)]
    pub fn forced_row(self) -> Option<usize> {
        match self {
            Transition::Advanced { select_row } | Transition::Retreated { select_row } => {
                Some(select_row)
            }
            Transition::Moved | Transition::Abandoned => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paginator {
    window_size: usize,
    cursor: usize,
    recent: RecentSelections,
}

impl Paginator {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            cursor: 0,
            recent: (NO_SELECTION, NO_SELECTION),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn recent_selections(&self) -> RecentSelections {
        self.recent
    }

    #[cfg(test)]
    pub fn set_recent_selections(&mut self, recent: RecentSelections) {
        self.recent = recent;
    }

    /// Back to the state right after startup, for a freshly loaded list.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.recent = (NO_SELECTION, NO_SELECTION);
    }

    /// Collection index of the highlighted data row.
    ///
    /// The cursor counts the header visit plus a one-based row, hence the
    /// offset of two.
    pub fn highlighted_index(&self) -> Option<usize> {
        self.cursor.checked_sub(2)
    }

    /// Start of the window the cursor currently falls in.
    fn window_base(&self) -> usize {
        (self.cursor / self.window_size) * self.window_size
    }

    /// The last two moves were onto the last data row and then held there.
    pub fn should_advance(&self) -> bool {
        let w = self.window_size as isize;
        self.recent == (w - 1, w)
    }

    /// The user stepped from the first data row onto the header while not
    /// in the first window.
    pub fn should_retreat(&self, raw: usize) -> bool {
        self.recent.1 == 1 && raw == 0 && self.cursor >= self.window_size
    }

    /// Shift `raw` into the history and move the cursor by its direction.
    pub fn update_indexes(&mut self, raw: usize) {
        self.recent = (self.recent.1, raw as isize);
        let (older, newer) = self.recent;
        if older < newer {
            self.cursor += 1;
        } else if older > newer {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Handle one raw selection event from `surface`.
    pub fn on_selection_changed(
        &mut self,
        raw: usize,
        list: &ListWindow,
        surface: &mut dyn RowSurface,
    ) -> Transition {
        let w = self.window_size;

        if self.should_advance() {
            let start = self.window_base();
            if !list.is_empty() && start >= list.len() {
                // Nothing past the last item; behave like a clamped move.
                self.update_indexes(raw);
                return Transition::Moved;
            }
            if let Err(e) = list.render_window(start, start + w, surface) {
                warn!("could not render next window at {}: {}", start, e);
                return Transition::Abandoned;
            }
            debug!("advanced to window starting at {} ({} rows)", start, surface.row_count());
            self.recent = (NO_SELECTION, NO_SELECTION);
            surface.select(1);
            return Transition::Advanced { select_row: 1 };
        }

        if self.should_retreat(raw) {
            let end = self.window_base();
            let start = end.saturating_sub(w);
            if let Err(e) = list.render_window(start, end, surface) {
                warn!("could not render previous window at {}: {}", start, e);
                return Transition::Abandoned;
            }
            debug!("retreated to window starting at {} ({} rows)", start, surface.row_count());
            self.recent = (w as isize + 2, w as isize + 1);
            surface.select(w);
            return Transition::Retreated { select_row: w };
        }

        self.update_indexes(raw);
        Transition::Moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_window::tests::{items, FakeSurface};
    use crate::list_window::PageConfig;

    const W: usize = 45;

    fn list(n: usize) -> ListWindow {
        ListWindow::with_items(PageConfig::default(), items(n))
    }

    /// Feed `raw` and replay any forced selection, the way the album list does.
    fn select(
        p: &mut Paginator,
        raw: usize,
        list: &ListWindow,
        surface: &mut FakeSurface,
    ) -> Transition {
        let first = p.on_selection_changed(raw, list, surface);
        let mut next = first.forced_row();
        while let Some(row) = next.take() {
            next = p.on_selection_changed(row, list, surface).forced_row();
        }
        first
    }

    #[test]
    fn test_should_advance() {
        let mut p = Paginator::new(W);
        assert!(!p.should_advance());

        p.set_recent_selections((44, 45));
        assert!(p.should_advance());

        p.set_recent_selections((45, 44));
        assert!(!p.should_advance());

        p.set_recent_selections((45, 45));
        assert!(!p.should_advance());
    }

    #[test]
    fn test_should_retreat() {
        let mut p = Paginator::new(W);
        p.set_recent_selections((2, 1));
        // first window: nothing before it
        assert!(!p.should_retreat(0));

        p.cursor = W;
        assert!(p.should_retreat(0));
        assert!(!p.should_retreat(2));

        p.set_recent_selections((1, 2));
        assert!(!p.should_retreat(0));
    }

    #[test]
    fn test_update_indexes_tracks_direction() {
        let mut p = Paginator::new(W);
        p.update_indexes(0);
        assert_eq!(p.recent_selections(), (NO_SELECTION, 0));
        assert_eq!(p.cursor(), 1);

        p.update_indexes(1);
        p.update_indexes(2);
        assert_eq!(p.cursor(), 3);

        p.update_indexes(1);
        assert_eq!(p.recent_selections(), (2, 1));
        assert_eq!(p.cursor(), 2);

        // same index twice: no movement
        p.update_indexes(1);
        assert_eq!(p.cursor(), 2);
    }

    #[test]
    fn test_cursor_never_goes_negative() {
        let mut p = Paginator::new(W);
        p.set_recent_selections((3, 2));
        p.update_indexes(1);
        assert_eq!(p.cursor(), 0);
        assert_eq!(p.highlighted_index(), None);
    }

    #[test]
    fn test_advance_renders_next_window() {
        let list = list(50);
        let mut surface = FakeSurface::default();
        list.render_window(0, W, &mut surface).unwrap();

        let mut p = Paginator::new(W);
        p.cursor = 46;
        p.set_recent_selections((44, 45));

        let t = p.on_selection_changed(45, &list, &mut surface);
        assert_eq!(t, Transition::Advanced { select_row: 1 });
        assert_eq!(p.recent_selections(), (NO_SELECTION, NO_SELECTION));
        assert_eq!(surface.rows.len(), 6);
        assert_eq!(surface.rows[1][0], "Album 45");
        assert_eq!(surface.select_calls, vec![1]);
    }

    #[test]
    fn test_retreat_renders_previous_window() {
        let list = list(100);
        let mut surface = FakeSurface::default();
        list.render_window(45, 90, &mut surface).unwrap();

        let mut p = Paginator::new(W);
        p.cursor = 47;
        p.set_recent_selections((2, 1));

        let t = p.on_selection_changed(0, &list, &mut surface);
        assert_eq!(t, Transition::Retreated { select_row: W });
        assert_eq!(p.recent_selections(), (47, 46));
        assert_eq!(surface.rows.len(), W + 1);
        assert_eq!(surface.rows[1][0], "Album 0");
        assert_eq!(surface.rows[W][0], "Album 44");
        assert_eq!(surface.select_calls, vec![W]);
    }

    #[test]
    fn test_flip_on_empty_list_is_abandoned() {
        let list = list(0);
        let mut surface = FakeSurface::default();
        let mut p = Paginator::new(W);
        p.cursor = 46;
        p.set_recent_selections((44, 45));

        assert_eq!(p.on_selection_changed(45, &list, &mut surface), Transition::Abandoned);
        assert_eq!(p.recent_selections(), (44, 45));
        assert!(surface.select_calls.is_empty());
    }

    #[test]
    fn test_no_advance_past_last_item() {
        let list = list(45);
        let mut surface = FakeSurface::default();
        list.render_window(0, W, &mut surface).unwrap();
        let mut p = Paginator::new(W);
        p.cursor = 46;
        p.set_recent_selections((44, 45));

        assert_eq!(p.on_selection_changed(45, &list, &mut surface), Transition::Moved);
        assert_eq!(surface.rows.len(), W + 1);
        assert_eq!(p.cursor(), 46);
    }

    #[test]
    fn test_walk_down_into_second_window_and_back() {
        let list = list(50);
        let mut surface = FakeSurface::default();
        list.render_window(0, W, &mut surface).unwrap();
        let mut p = Paginator::new(W);

        // header, then every data row of the first window
        for raw in 0..=W {
            assert_eq!(select(&mut p, raw, &list, &mut surface), Transition::Moved);
        }
        assert!(p.should_advance());
        assert_eq!(p.cursor(), W + 1);
        assert_eq!(list.get(p.highlighted_index().unwrap()).unwrap().primary_label, "Album 44");

        // Down again on the last row: the table re-reports row 45
        let t = select(&mut p, W, &list, &mut surface);
        assert_eq!(t, Transition::Advanced { select_row: 1 });
        assert_eq!(surface.rows.len(), 6);
        assert_eq!(surface.rows[1][0], "Album 45");
        assert_eq!(p.recent_selections(), (NO_SELECTION, 1));
        assert_eq!(list.get(p.highlighted_index().unwrap()).unwrap().primary_label, "Album 45");

        // Up onto the header flips back to the first window
        let t = select(&mut p, 0, &list, &mut surface);
        assert_eq!(t, Transition::Retreated { select_row: W });
        assert_eq!(surface.rows[1][0], "Album 0");
        assert_eq!(list.get(p.highlighted_index().unwrap()).unwrap().primary_label, "Album 44");

        // one step up and back down re-arms the advance
        select(&mut p, W - 1, &list, &mut surface);
        select(&mut p, W, &list, &mut surface);
        assert!(p.should_advance());
    }
}
