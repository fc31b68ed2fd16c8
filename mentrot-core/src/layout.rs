/// Trial geometry. Positions are centers in logical screen coordinates.
///
/// Offsets are fixed for the task: target above center, choice images
/// 250 px to either side below center, feedback indicator further down,
/// decorative overlay in the upper right.
pub const CHOICE_OFFSET_X: f32 = 250.0;
pub const TARGET_OFFSET_Y: f32 = -150.0;
pub const CHOICE_OFFSET_Y: f32 = 150.0;
pub const FEEDBACK_OFFSET_Y: f32 = 200.0;
pub const OVERLAY_OFFSET: (f32, f32) = (300.0, -200.0);

/// Side the correct image lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Axis-aligned rectangle, inclusive of all four edges for hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    /// Bounds of a `w`×`h` image blitted with its center at `pos`.
    pub fn centered_at(pos: (f32, f32), w: u32, h: u32) -> Self {
        let (w, h) = (w as f32, h as f32);
        Self {
            x: (pos.0 - w * 0.5).floor(),
            y: (pos.1 - h * 0.5).floor(),
            w,
            h,
        }
    }

    pub fn contains(&self, p: (f32, f32)) -> bool {
        p.0 >= self.x && p.0 <= self.x + self.w && p.1 >= self.y && p.1 <= self.y + self.h
    }
}

/// Screen positions for one trial presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialLayout {
    pub side: Side,
    pub target: (f32, f32),
    pub correct: (f32, f32),
    pub wrong: (f32, f32),
    pub overlay: (f32, f32),
    pub feedback: (f32, f32),
}

impl TrialLayout {
    pub fn place(center: (f32, f32), side: Side) -> Self {
        let (cx, cy) = center;
        let choice_y = cy + CHOICE_OFFSET_Y;
        let (correct_x, wrong_x) = match side {
            Side::Left => (cx - CHOICE_OFFSET_X, cx + CHOICE_OFFSET_X),
            Side::Right => (cx + CHOICE_OFFSET_X, cx - CHOICE_OFFSET_X),
        };
        Self {
            side,
            target: (cx, cy + TARGET_OFFSET_Y),
            correct: (correct_x, choice_y),
            wrong: (wrong_x, choice_y),
            overlay: (cx + OVERLAY_OFFSET.0, cy + OVERLAY_OFFSET.1),
            feedback: (cx, cy + FEEDBACK_OFFSET_Y),
        }
    }
}
