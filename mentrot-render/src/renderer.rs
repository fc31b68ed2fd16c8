use ab_glyph::FontVec;
use anyhow::Result;
use mentrot_assets::AssetRegistry;
use mentrot_core::layout::Bounds;
use mentrot_core::scene::{Scene, TrialScene};
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::text::TextCache;

const FONT_SIZE: f32 = 20.0;
const LINE_ADVANCE: f32 = 30.0;
const LINE_SLOT: f32 = 20.0;

/// Software presentation surface for the task: white background, centered
/// image blits, centered black text for fallback and summary screens.
pub struct TaskRenderer {
    center: (f32, f32),
    text: TextCache,
}

impl TaskRenderer {
    pub fn new(width: u32, height: u32, font: FontVec) -> Self {
        Self {
            center: (width as f32 / 2.0, height as f32 / 2.0),
            text: TextCache::new(font, FONT_SIZE, Color::from_rgba8(0, 0, 0, 255)),
        }
    }

    /// Compose one full frame for `scene` into `canvas`.
    pub fn render_frame(
        &mut self,
        canvas: &mut Pixmap,
        scene: &Scene,
        assets: &AssetRegistry,
    ) -> Result<()> {
        canvas.fill(Color::from_rgba8(255, 255, 255, 255));

        match scene {
            Scene::Blank => {}
            Scene::Screen { image, fallback } => {
                if let Some(pm) = assets.get(image) {
                    self.blit_centered(canvas, pm, self.center);
                } else {
                    self.draw_message(canvas, fallback);
                }
            }
            Scene::Trial(trial) => self.draw_trial(canvas, trial, assets),
            Scene::Feedback { image, pos } => {
                // indicator only when the asset exists; a blank dwell otherwise
                if let Some(pm) = assets.get(image) {
                    self.blit_centered(canvas, pm, *pos);
                }
            }
            Scene::Summary { lines } => {
                self.draw_lines(canvas, lines, self.center.1 - 40.0);
            }
        }
        Ok(())
    }

    fn draw_trial(&mut self, canvas: &mut Pixmap, trial: &TrialScene, assets: &AssetRegistry) {
        let layout = &trial.layout;
        for (name, pos) in [
            (trial.target.as_str(), layout.target),
            (trial.correct.as_str(), layout.correct),
            (trial.wrong.as_str(), layout.wrong),
            (trial.overlay.as_str(), layout.overlay),
        ] {
            if let Some(pm) = assets.get(name) {
                self.blit_centered(canvas, pm, pos);
            }
        }
    }

    /// Blit `pm` with its center at `pos` and report the covered bounds.
    pub fn blit_centered(&self, canvas: &mut Pixmap, pm: &Pixmap, pos: (f32, f32)) -> Bounds {
        let bounds = Bounds::centered_at(pos, pm.width(), pm.height());
        canvas.draw_pixmap(
            bounds.x as i32,
            bounds.y as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        bounds
    }

    /// Centered message block, laid out the way the intro screens expect.
    fn draw_message(&mut self, canvas: &mut Pixmap, lines: &[String]) {
        let start_y = self.center.1 - (lines.len() as f32 * LINE_SLOT) / 2.0;
        self.draw_lines(canvas, lines, start_y);
    }

    fn draw_lines(&mut self, canvas: &mut Pixmap, lines: &[String], start_y: f32) {
        let mut y = start_y;
        for line in lines {
            if !line.is_empty() {
                let pm = self.text.get_or_render(line);
                self.blit_centered(canvas, &pm, (self.center.0, y));
            }
            y += LINE_ADVANCE;
        }
    }
}
