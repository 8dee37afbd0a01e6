use gpui::{Pixels, point, px};
use gpui_component::VirtualListScrollHandle;

/// Distance from the tail within which the list counts as reading the tail.
const NEAR_BOTTOM_THRESHOLD: Pixels = px(32.);
/// Small delta used to ignore floating-point scroll jitter.
const SCROLL_DELTA_EPSILON: f32 = 1.0;

/// Keeps a virtual message list following its tail without fighting the user.
///
/// Follow mode is sticky: while it holds, every render re-pins the viewport to
/// the tail, so rows that land after the pin was applied still get caught on
/// the next frame. Only a deliberate scroll away from the tail pauses it, and
/// scrolling back near the tail resumes it.
pub struct FollowScroll {
    handle: VirtualListScrollHandle,
    pending_bottom: bool,
    follow_bottom: bool,
    last_offset: Pixels,
    last_max_offset: Pixels,
}

/// Scroll geometry observed across one frame boundary.
struct FrameObservation {
    offset: Pixels,
    max_offset: Pixels,
    last_offset: Pixels,
    last_max_offset: Pixels,
    follow_bottom: bool,
    pending_bottom: bool,
}

impl FollowScroll {
    pub fn new() -> Self {
        Self {
            handle: VirtualListScrollHandle::new(),
            pending_bottom: true,
            follow_bottom: true,
            last_offset: Pixels::ZERO,
            last_max_offset: Pixels::ZERO,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.handle
    }

    pub fn viewport_width(&self) -> Pixels {
        self.handle.bounds().size.width
    }

    pub fn is_following(&self) -> bool {
        self.follow_bottom
    }

    /// Unconditionally pins to the tail and re-enters follow mode.
    pub fn request_bottom(&mut self) {
        self.pending_bottom = true;
        self.follow_bottom = true;
    }

    /// Pins to the tail only while follow mode holds (or the last observed
    /// frame was already at the tail).
    pub fn request_bottom_if_following(&mut self) {
        if self.follow_bottom || near_bottom(self.last_offset, self.last_max_offset) {
            self.pending_bottom = true;
        }
    }

    /// Reconciles follow mode with what happened since the last frame;
    /// called at render time before `apply`.
    pub fn update_follow_state(&mut self) {
        let offset = self.handle.offset().y;
        let max_offset = self.handle.max_offset().height;

        self.follow_bottom = next_follow_state(&FrameObservation {
            offset,
            max_offset,
            last_offset: self.last_offset,
            last_max_offset: self.last_max_offset,
            follow_bottom: self.follow_bottom,
            pending_bottom: self.pending_bottom,
        });

        self.last_offset = offset;
        self.last_max_offset = max_offset;
    }

    /// Re-pins the viewport to the tail while following or explicitly requested.
    pub fn apply(&mut self) {
        if self.follow_bottom || self.pending_bottom {
            let max_offset = self.handle.max_offset().height;
            let current_x = self.handle.offset().x;
            let target_y = if max_offset > Pixels::ZERO {
                // GPUI scroll offsets grow negative toward the tail.
                -max_offset
            } else {
                Pixels::ZERO
            };

            self.handle.set_offset(point(current_x, target_y));
        }

        self.pending_bottom = false;
    }
}

impl Default for FollowScroll {
    fn default() -> Self {
        Self::new()
    }
}

fn next_follow_state(frame: &FrameObservation) -> bool {
    let offset_delta = f32::from(frame.offset) - f32::from(frame.last_offset);
    let max_delta = (f32::from(frame.max_offset) - f32::from(frame.last_max_offset)).abs();
    let content_size_changed = max_delta > SCROLL_DELTA_EPSILON;
    let user_scrolled_up = offset_delta > SCROLL_DELTA_EPSILON && !content_size_changed;
    let user_scrolled_down = offset_delta < -SCROLL_DELTA_EPSILON && !content_size_changed;

    if frame.pending_bottom
        || (content_size_changed && near_bottom(frame.last_offset, frame.last_max_offset))
    {
        return true;
    }

    if frame.follow_bottom {
        // Pause follow mode only when the user deliberately scrolls away.
        !user_scrolled_up
    } else {
        user_scrolled_down && near_bottom(frame.offset, frame.max_offset)
    }
}

fn near_bottom(offset: Pixels, max_offset: Pixels) -> bool {
    if max_offset <= Pixels::ZERO {
        return true;
    }

    // Negative Y offsets grow toward the tail, so `offset + max` approaches 0.
    (offset + max_offset).abs() <= NEAR_BOTTOM_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tall_incoming_rows_keep_follow_mode_across_frames() {
        // The previous frame pinned to the tail at max offset 100; a new 60px
        // row grew the content before this frame observed it. The stale pin
        // leaves the viewport a full row above the tail, which must not be
        // mistaken for the user scrolling away.
        let follow = next_follow_state(&FrameObservation {
            offset: px(-100.),
            max_offset: px(160.),
            last_offset: px(-100.),
            last_max_offset: px(100.),
            follow_bottom: true,
            pending_bottom: false,
        });

        assert!(follow);
    }

    #[test]
    fn scrolling_up_pauses_follow_mode() {
        let follow = next_follow_state(&FrameObservation {
            offset: px(-40.),
            max_offset: px(160.),
            last_offset: px(-160.),
            last_max_offset: px(160.),
            follow_bottom: true,
            pending_bottom: false,
        });

        assert!(!follow);
    }

    #[test]
    fn returning_near_the_tail_resumes_follow_mode() {
        let follow = next_follow_state(&FrameObservation {
            offset: px(-150.),
            max_offset: px(160.),
            last_offset: px(-60.),
            last_max_offset: px(160.),
            follow_bottom: false,
            pending_bottom: false,
        });

        assert!(follow);
    }

    #[test]
    fn reading_history_stays_put_while_content_grows() {
        // Parked 200px above the tail; new rows keep arriving.
        let follow = next_follow_state(&FrameObservation {
            offset: px(-100.),
            max_offset: px(360.),
            last_offset: px(-100.),
            last_max_offset: px(300.),
            follow_bottom: false,
            pending_bottom: false,
        });

        assert!(!follow);
    }

    #[test]
    fn explicit_bottom_request_overrides_a_paused_follow() {
        let follow = next_follow_state(&FrameObservation {
            offset: px(-40.),
            max_offset: px(160.),
            last_offset: px(-40.),
            last_max_offset: px(160.),
            follow_bottom: false,
            pending_bottom: true,
        });

        assert!(follow);
    }

    #[test]
    fn fresh_lists_start_in_follow_mode() {
        let scroll = FollowScroll::new();
        assert!(scroll.is_following());
    }
}
