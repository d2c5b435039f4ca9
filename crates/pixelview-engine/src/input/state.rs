use crate::coords::Vec2;

/// Pointer tracking for a single window.
///
/// The zoom controller needs a cursor position at wheel time, but the
/// platform delivers wheel events without one; the last observed move
/// position is kept here.
#[derive(Debug, Default)]
pub struct PointerState {
    pos: Option<Vec2>,
}

impl PointerState {
    pub fn moved(&mut self, pos: Vec2) {
        self.pos = Some(pos);
    }

    /// Pointer left the window surface.
    pub fn left(&mut self) {
        self.pos = None;
    }

    /// Last known position in logical pixels, if the pointer is inside the
    /// window.
    pub fn pos(&self) -> Option<Vec2> {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_last_move() {
        let mut p = PointerState::default();
        assert_eq!(p.pos(), None);

        p.moved(Vec2::new(10.0, 20.0));
        p.moved(Vec2::new(30.0, 40.0));
        assert_eq!(p.pos(), Some(Vec2::new(30.0, 40.0)));

        p.left();
        assert_eq!(p.pos(), None);
    }
}
