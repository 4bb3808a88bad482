use serde::Serialize;

/// Release velocity (px/ms) that flips a page on a short flick.
pub const VELOCITY_THRESHOLD: f64 = 0.5;
/// Pages are laid out as 100% wide strips.
const PAGE_WIDTH_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Release {
    Next,
    Previous,
    SnapBack,
}

#[derive(Debug, Clone)]
struct Drag {
    start_x: f64,
    prev_x: f64,
    prev_time_ms: f64,
    velocity: f64,
    width: f64,
}

impl Drag {
    fn moved_by(&self) -> f64 {
        self.prev_x - self.start_x
    }
}

/// Horizontal paged view with drag and dot navigation.
#[derive(Debug, Clone)]
pub struct Pager {
    pages: usize,
    current: usize,
    drag: Option<Drag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PagerView {
    pub current: usize,
    pub pages: usize,
    pub dragging: bool,
    /// Translate of the page strip, in percent of one page
    pub offset_percent: f64,
}

impl Pager {
    pub fn new(pages: usize) -> Self {
        Self {
            pages: pages.max(1),
            current: 0,
            drag: None,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn start(&mut self, x: f64, time_ms: f64, width: f64) {
        self.drag = Some(Drag {
            start_x: x,
            prev_x: x,
            prev_time_ms: time_ms,
            velocity: 0.0,
            width: if width > 0.0 { width } else { 1.0 },
        });
    }

    pub fn move_to(&mut self, x: f64, time_ms: f64) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dt = (time_ms - drag.prev_time_ms).max(1.0);
        drag.velocity = (x - drag.prev_x) / dt;
        drag.prev_x = x;
        drag.prev_time_ms = time_ms;
    }

    /// Finish the drag. Distance past half a page is checked first; the
    /// flick velocity only counts when no distance commit happened.
    pub fn end(&mut self) -> Release {
        let Some(drag) = self.drag.take() else {
            return Release::SnapBack;
        };

        let moved = drag.moved_by();
        let half = drag.width / 2.0;
        let last = self.pages - 1;

        if moved < -half && self.current < last {
            self.current += 1;
            return Release::Next;
        }
        if moved > half && self.current > 0 {
            self.current -= 1;
            return Release::Previous;
        }
        if drag.velocity < -VELOCITY_THRESHOLD && self.current < last {
            self.current += 1;
            Release::Next
        } else if drag.velocity > VELOCITY_THRESHOLD && self.current > 0 {
            self.current -= 1;
            Release::Previous
        } else {
            Release::SnapBack
        }
    }

    pub fn go_to(&mut self, index: usize) -> usize {
        self.drag = None;
        self.current = index.min(self.pages - 1);
        self.current
    }

    pub fn offset_percent(&self) -> f64 {
        let base = -(self.current as f64) * PAGE_WIDTH_PERCENT;
        match &self.drag {
            Some(drag) => base + drag.moved_by() / drag.width * PAGE_WIDTH_PERCENT,
            None => base,
        }
    }

    pub fn view(&self) -> PagerView {
        PagerView {
            current: self.current,
            pages: self.pages,
            dragging: self.is_dragging(),
            offset_percent: self.offset_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(pager: &mut Pager, from: f64, to: f64, duration_ms: f64) -> Release {
        pager.start(from, 0.0, 800.0);
        pager.move_to(to, duration_ms);
        pager.end()
    }

    #[test]
    fn exactly_half_a_page_snaps_back() {
        let mut pager = Pager::new(3);
        // Slow enough that velocity stays under the threshold.
        assert_eq!(drag(&mut pager, 600.0, 200.0, 2000.0), Release::SnapBack);
        assert_eq!(pager.current(), 0);
    }

    #[test]
    fn just_past_half_commits() {
        let mut pager = Pager::new(3);
        assert_eq!(drag(&mut pager, 600.0, 199.0, 2000.0), Release::Next);
        assert_eq!(pager.current(), 1);
        assert_eq!(drag(&mut pager, 100.0, 501.0, 2000.0), Release::Previous);
        assert_eq!(pager.current(), 0);
    }

    #[test]
    fn fast_flick_commits_by_velocity() {
        let mut pager = Pager::new(3);
        assert_eq!(drag(&mut pager, 400.0, 340.0, 50.0), Release::Next);
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn velocity_does_not_add_to_distance_commit() {
        let mut pager = Pager::new(3);
        // Fast and far: one page only.
        assert_eq!(drag(&mut pager, 700.0, 100.0, 20.0), Release::Next);
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn boundary_drags_are_absorbed() {
        let mut pager = Pager::new(2);
        assert_eq!(drag(&mut pager, 100.0, 700.0, 20.0), Release::SnapBack);
        assert_eq!(pager.current(), 0);

        pager.go_to(1);
        assert_eq!(drag(&mut pager, 700.0, 100.0, 20.0), Release::SnapBack);
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn zero_time_delta_uses_one_millisecond() {
        let mut pager = Pager::new(3);
        pager.start(400.0, 10.0, 800.0);
        pager.move_to(399.0, 10.0);
        // -1px over the 1ms floor: velocity -1.0
        assert_eq!(pager.end(), Release::Next);
    }

    #[test]
    fn dots_clamp_and_offset_tracks_drag() {
        let mut pager = Pager::new(3);
        assert_eq!(pager.go_to(7), 2);
        assert_eq!(pager.offset_percent(), -200.0);

        pager.start(400.0, 0.0, 800.0);
        pager.move_to(600.0, 500.0);
        assert_eq!(pager.offset_percent(), -175.0);
        assert!(pager.view().dragging);
    }
}
