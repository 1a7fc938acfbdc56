//! Immediate-mode text panels drawn over the finished frame.
//!
//! Between [`Overlay::begin_ui_frame`] and [`Overlay::end_ui_frame`] the
//! caller opens panels and adds lines of text to them; `end_ui_frame` lays
//! the panels out and records one pass that loads the target and draws on
//! top of it. Without a usable font every call is a no-op.

mod font;
mod layout;
mod renderer;

use glam::Vec2;

use crate::render::RenderCtx;

pub use font::{find_font, load_font_file, FontLoadError};
pub use layout::{panel_geometry, PanelGeometry, Rect, PADDING};
use renderer::TextRenderer;

const TEXT_SIZE: f32 = 16.0;
const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const PANEL_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.6];

/// A block of lines with a background.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    origin: Vec2,
    lines: Vec<String>,
}

impl Panel {
    pub fn text(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }
}

pub struct Overlay {
    renderer: Option<TextRenderer>,
    panels: Vec<Panel>,
    in_frame: bool,
}

impl Overlay {
    pub fn new(ctx: &RenderCtx<'_>, font: Option<fontdue::Font>) -> Self {
        Self {
            renderer: font.map(|font| TextRenderer::new(ctx, font)),
            panels: Vec::new(),
            in_frame: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn begin_ui_frame(&mut self) {
        if self.in_frame {
            log::warn!("begin_ui_frame called twice; discarding the open frame");
        }
        self.panels.clear();
        self.in_frame = true;
    }

    /// Opens a panel whose top-left corner is at `origin` (pixels).
    pub fn panel(&mut self, origin: Vec2) -> &mut Panel {
        let index = self.panels.len();
        self.panels.push(Panel {
            origin,
            lines: Vec::new(),
        });
        &mut self.panels[index]
    }

    /// Lays out and records every panel of the frame over `target`.
    pub fn end_ui_frame(&mut self, ctx: &RenderCtx<'_>, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        if !self.in_frame {
            log::warn!("end_ui_frame without begin_ui_frame");
            return;
        }
        self.in_frame = false;

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let line_height = renderer.line_height(TEXT_SIZE);
        for panel in self.panels.drain(..) {
            let widths: Vec<f32> = panel.lines.iter().map(|l| renderer.measure(l, TEXT_SIZE)).collect();
            let geometry = panel_geometry(panel.origin, &widths, line_height);
            renderer.push_rect(geometry.background, PANEL_COLOR);
            for (line, origin) in panel.lines.iter().zip(&geometry.line_origins) {
                renderer.push_text(ctx.queue, *origin, line, TEXT_SIZE, TEXT_COLOR);
            }
        }
        renderer.flush(ctx, encoder, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless() -> Overlay {
        Overlay {
            renderer: None,
            panels: Vec::new(),
            in_frame: false,
        }
    }

    #[test]
    fn panel_returns_the_panel_just_opened() {
        let mut overlay = headless();
        overlay.begin_ui_frame();
        overlay.panel(Vec2::new(1.0, 2.0)).text("a").text("b");
        overlay.panel(Vec2::new(3.0, 4.0)).text("c");

        assert_eq!(overlay.panels.len(), 2);
        assert_eq!(overlay.panels[0].origin, Vec2::new(1.0, 2.0));
        assert_eq!(overlay.panels[0].lines, ["a", "b"]);
        assert_eq!(overlay.panels[1].origin, Vec2::new(3.0, 4.0));
        assert_eq!(overlay.panels[1].lines, ["c"]);
    }

    #[test]
    fn begin_discards_previous_panels() {
        let mut overlay = headless();
        overlay.begin_ui_frame();
        overlay.panel(Vec2::ZERO).text("stale");
        overlay.begin_ui_frame();
        assert!(overlay.panels.is_empty());
        assert!(!overlay.is_enabled());
    }
}
