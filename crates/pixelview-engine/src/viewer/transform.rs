use bytemuck::{Pod, Zeroable};

use crate::coords::{Vec2, Viewport};

/// Zoom step applied per vertical scroll unit.
pub const ZOOM_SENSITIVITY: f32 = 0.1;

/// Cursor-anchored zoom state.
///
/// `zoom` never drops below 1.0 (the 1:1 view). `offset` is the displacement
/// of the sampled texture window, expressed in the NDC frame the cursor was
/// converted into.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomState {
    pub zoom: f32,
    pub offset: Vec2,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::zero(),
        }
    }
}

impl ZoomState {
    /// Applies one scroll step anchored near `cursor` (logical px, top-left
    /// origin).
    ///
    /// The effective anchor is the midpoint between the cursor and the
    /// viewport center: the view magnifies toward the cursor without racing
    /// off-screen when zooming near an edge.
    pub fn apply_scroll(&mut self, cursor: Vec2, scroll_y: f32, client: Viewport) {
        if !client.is_valid() {
            return;
        }

        let cursor_ndc = cursor_to_ndc(cursor, client);

        self.zoom = (self.zoom + scroll_y * ZOOM_SENSITIVITY).max(1.0);

        let zoom_center = cursor_ndc.lerp(Vec2::zero(), 0.5);
        self.offset = zoom_center * (1.0 - 1.0 / self.zoom);
    }

    /// GPU mirror of this state.
    pub(crate) fn as_uniform(&self) -> ZoomUniform {
        ZoomUniform {
            zoom: self.zoom,
            _pad: 0.0,
            // NDC +Y points up, texture v points down: the v-axis component
            // flips when the offset enters texture space.
            offset: [self.offset.x, -self.offset.y],
        }
    }
}

/// Converts a cursor position (logical px, origin top-left, +Y down) to NDC
/// (origin center, +Y up).
///
/// The Y axis is flipped here; this is the convention the rest of the zoom
/// math assumes, and `ZoomState::as_uniform` undoes it on the v axis when
/// handing the offset to the shader.
pub fn cursor_to_ndc(cursor: Vec2, client: Viewport) -> Vec2 {
    Vec2::new(
        cursor.x / client.width * 2.0 - 1.0,
        1.0 - cursor.y / client.height * 2.0,
    )
}

/// Uniform block sampled by the blit shader's vertex stage.
///
/// Layout must match `ZoomUniform` in `shaders/blit.wgsl`: the vec2 member
/// sits at offset 8, so one f32 of padding follows `zoom`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ZoomUniform {
    pub zoom: f32,
    pub _pad: f32,
    pub offset: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: Viewport = Viewport::new(800.0, 600.0);

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── cursor NDC ────────────────────────────────────────────────────────

    #[test]
    fn ndc_center() {
        let ndc = cursor_to_ndc(Vec2::new(400.0, 300.0), CLIENT);
        assert_eq!(ndc, Vec2::zero());
    }

    #[test]
    fn ndc_top_left_flips_y() {
        // Window origin is top-left; NDC origin is the center with +Y up.
        let ndc = cursor_to_ndc(Vec2::zero(), CLIENT);
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn ndc_bottom_right() {
        let ndc = cursor_to_ndc(Vec2::new(800.0, 600.0), CLIENT);
        assert_eq!(ndc, Vec2::new(1.0, -1.0));
    }

    // ── clamp ─────────────────────────────────────────────────────────────

    #[test]
    fn zoom_never_drops_below_one() {
        let mut z = ZoomState::default();
        z.apply_scroll(Vec2::new(400.0, 300.0), -1000.0, CLIENT);
        assert_eq!(z.zoom, 1.0);
    }

    #[test]
    fn zoom_clamp_resets_offset_at_one() {
        let mut z = ZoomState::default();
        z.apply_scroll(Vec2::new(0.0, 0.0), 5.0, CLIENT);
        assert!(z.zoom > 1.0);

        z.apply_scroll(Vec2::new(0.0, 0.0), -100.0, CLIENT);
        assert_eq!(z.zoom, 1.0);
        // 1 - 1/zoom == 0 at zoom 1, so the offset collapses too.
        assert_eq!(z.offset, Vec2::zero());
    }

    // ── scenario: cursor at exact center ──────────────────────────────────

    #[test]
    fn scroll_at_center_leaves_offset_zero() {
        let mut z = ZoomState::default();
        z.apply_scroll(Vec2::new(400.0, 300.0), 1.0, CLIENT);
        assert!(approx(z.zoom, 1.1));
        assert_eq!(z.offset, Vec2::zero());
    }

    // ── scenario: cursor at top-left corner ───────────────────────────────

    #[test]
    fn scroll_at_top_left_corner() {
        let mut z = ZoomState::default();
        z.apply_scroll(Vec2::zero(), 1.0, CLIENT);

        assert!(approx(z.zoom, 1.1));
        // zoom_center = lerp((-1, 1), (0, 0), 0.5) = (-0.5, 0.5)
        let expected = 0.5 * (1.0 - 1.0 / 1.1);
        assert!(approx(z.offset.x, -expected));
        assert!(approx(z.offset.y, expected));
        assert!(approx(z.offset.x, -0.045_454_5));
    }

    // ── formula determinism ───────────────────────────────────────────────

    #[test]
    fn offset_matches_formula_exactly() {
        let cursor = Vec2::new(123.0, 456.0);
        let mut z = ZoomState {
            zoom: 2.5,
            offset: Vec2::new(0.3, -0.1),
        };
        z.apply_scroll(cursor, 3.0, CLIENT);

        let ndc = cursor_to_ndc(cursor, CLIENT);
        let new_zoom = 2.5 + 3.0 * ZOOM_SENSITIVITY;
        let expected = ndc.lerp(Vec2::zero(), 0.5) * (1.0 - 1.0 / new_zoom);

        assert_eq!(z.zoom, new_zoom);
        assert_eq!(z.offset, expected);
    }

    #[test]
    fn zoom_accumulates_across_events() {
        let mut z = ZoomState::default();
        for _ in 0..5 {
            z.apply_scroll(Vec2::new(400.0, 300.0), 1.0, CLIENT);
        }
        assert!(approx(z.zoom, 1.5));
    }

    #[test]
    fn degenerate_client_is_ignored() {
        let mut z = ZoomState::default();
        z.apply_scroll(Vec2::new(10.0, 10.0), 1.0, Viewport::new(0.0, 0.0));
        assert_eq!(z, ZoomState::default());
    }

    // ── uniform mirror ────────────────────────────────────────────────────

    #[test]
    fn uniform_flips_v_axis() {
        let z = ZoomState {
            zoom: 2.0,
            offset: Vec2::new(0.25, 0.25),
        };
        let u = z.as_uniform();
        assert_eq!(u.zoom, 2.0);
        assert_eq!(u.offset, [0.25, -0.25]);
    }

    #[test]
    fn uniform_layout_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ZoomUniform>(), 16);
    }
}
