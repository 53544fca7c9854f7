use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

/// Fill colour of histogram bars.
pub const HISTOGRAM_COLOR: Color32 = Color32::from_rgb(0x6B, 0x7F, 0xED);

// ---------------------------------------------------------------------------
// Continuous colour scales
// ---------------------------------------------------------------------------

/// A piecewise-linear colour scale, interpolated in linear RGB.
#[derive(Debug, Clone)]
pub struct ColorScale {
    stops: Vec<LinSrgb>,
}

impl ColorScale {
    /// Build a scale from sRGB stops, evenly spaced over `[0, 1]`.
    pub fn new(stops: &[(u8, u8, u8)]) -> Self {
        let stops = stops
            .iter()
            .map(|&(r, g, b)| -> LinSrgb {
                Srgb::new(r, g, b).into_format::<f32>().into_linear()
            })
            .collect();
        Self { stops }
    }

    /// Dark blue → magenta → yellow, for the stratification heatmap.
    pub fn plasma() -> Self {
        Self::new(&[
            (13, 8, 135),
            (126, 3, 168),
            (204, 71, 120),
            (248, 149, 64),
            (240, 249, 33),
        ])
    }

    /// Light to dark blue, for the counts-per-year bars.
    pub fn blues() -> Self {
        Self::new(&[(222, 235, 247), (107, 174, 214), (8, 48, 107)])
    }

    /// Colour at position `t`, clamped to `[0, 1]`.
    pub fn color_at(&self, t: f64) -> Color32 {
        let Some(last) = self.stops.len().checked_sub(1) else {
            return Color32::GRAY;
        };
        if last == 0 {
            return to_color32(self.stops[0]);
        }
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * last as f64;
        let i = (scaled.floor() as usize).min(last - 1);
        let frac = (scaled - i as f64) as f32;
        to_color32(self.stops[i].mix(self.stops[i + 1], frac))
    }

    /// Colour for `value` within `[min, max]`.
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> Color32 {
        let range = max - min;
        let t = if range > 0.0 { (value - min) / range } else { 0.5 };
        self.color_at(t)
    }
}

fn to_color32(c: LinSrgb) -> Color32 {
    let rgb: Srgb<u8> = Srgb::from_linear(c);
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}
