use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Category;

// ---------------------------------------------------------------------------
// Ranking bars: one hue, fading with rank
// ---------------------------------------------------------------------------

/// `n` shades of `hue`, darkest first, for ranked bars.
pub fn shade_ramp(hue: f32, n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
            let hsl = Hsl::new(hue, 0.75, 0.30 + 0.35 * t);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Hue of the ranking chart (dark red).
pub const RANKING_HUE: f32 = 0.0;

// ---------------------------------------------------------------------------
// Category colours
// ---------------------------------------------------------------------------

/// Fixed colour per expenditure category, so a category keeps its colour
/// whatever else is selected.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    colors: [Color32; 5],
}

impl Default for CategoryColors {
    fn default() -> Self {
        Self {
            colors: [
                Color32::from_rgb(128, 0, 128), // purple
                Color32::from_rgb(255, 165, 0), // orange
                Color32::from_rgb(0, 128, 0),   // green
                Color32::from_rgb(0, 0, 255),   // blue
                Color32::GRAY,
            ],
        }
    }
}

impl CategoryColors {
    pub fn color_for(&self, category: Category) -> Color32 {
        let idx = Category::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or(0);
        self.colors[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_gets_lighter() {
        let ramp = shade_ramp(RANKING_HUE, 10);
        assert_eq!(ramp.len(), 10);
        let brightness = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(brightness(ramp[0]) < brightness(ramp[9]));
        assert!(shade_ramp(RANKING_HUE, 0).is_empty());
        assert_eq!(shade_ramp(RANKING_HUE, 1).len(), 1);
    }

    #[test]
    fn every_category_has_its_own_colour() {
        let colors = CategoryColors::default();
        let mut seen: Vec<Color32> = Category::ALL.iter().map(|c| colors.color_for(*c)).collect();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }
}
