use glam::Vec2;

/// Inner margin of a panel, in pixels.
pub const PADDING: f32 = 8.0;

/// Screen-space rectangle, y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Where a panel's background and each of its lines go.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGeometry {
    pub background: Rect,
    /// Top-left corner of each line.
    pub line_origins: Vec<Vec2>,
}

/// Stacks lines of the given widths under `origin`, with [`PADDING`] on
/// every side of the background.
pub fn panel_geometry(origin: Vec2, line_widths: &[f32], line_height: f32) -> PanelGeometry {
    let inner = origin + Vec2::splat(PADDING);
    let line_origins = (0..line_widths.len())
        .map(|k| inner + Vec2::new(0.0, k as f32 * line_height))
        .collect();

    let width = line_widths.iter().copied().fold(0.0, f32::max);
    let height = line_widths.len() as f32 * line_height;
    PanelGeometry {
        background: Rect {
            min: origin,
            max: origin + Vec2::new(width, height) + Vec2::splat(2.0 * PADDING),
        },
        line_origins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_stack_inside_padding() {
        let g = panel_geometry(Vec2::new(10.0, 20.0), &[100.0, 140.0, 60.0], 18.0);
        assert_eq!(
            g.line_origins,
            vec![Vec2::new(18.0, 28.0), Vec2::new(18.0, 46.0), Vec2::new(18.0, 64.0)]
        );
        assert_eq!(g.background.min, Vec2::new(10.0, 20.0));
        assert_eq!(g.background.size(), Vec2::new(140.0 + 16.0, 54.0 + 16.0));
    }

    #[test]
    fn empty_panel_is_just_padding() {
        let g = panel_geometry(Vec2::ZERO, &[], 18.0);
        assert!(g.line_origins.is_empty());
        assert_eq!(g.background.size(), Vec2::splat(2.0 * PADDING));
    }
}
