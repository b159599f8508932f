//! Derives overlay text and color from the current observation

use crate::feed::StockObservation;

/// Every overlay color uses this alpha.
pub const TEXT_ALPHA: f64 = 0.6;

/// Width of one percent-change bucket.
const BUCKET_STEP: f64 = 0.125;
const MAX_BUCKET: usize = 8;

// ColorBrewer 9-class "Greens", faint to saturated
const POSITIVE: [[f64; 3]; 9] = [
    [0.96862745, 0.98823529, 0.96078431],
    [0.89803922, 0.96078431, 0.87843137],
    [0.78039216, 0.91372549, 0.75294118],
    [0.63137255, 0.85098039, 0.60784314],
    [0.45490196, 0.76862745, 0.46274510],
    [0.25490196, 0.67058824, 0.36470588],
    [0.13725490, 0.54509804, 0.27058824],
    [0.00000000, 0.42745098, 0.17254902],
    [0.00000000, 0.26666667, 0.10588235],
];

// ColorBrewer 9-class "Reds", faint to saturated
const NEGATIVE: [[f64; 3]; 9] = [
    [1.00000000, 0.96078431, 0.94117647],
    [0.99607843, 0.87843137, 0.82352941],
    [0.98823529, 0.73333333, 0.63137255],
    [0.98823529, 0.57254902, 0.44705882],
    [0.98431373, 0.41568627, 0.29019608],
    [0.93725490, 0.23137255, 0.17254902],
    [0.79607843, 0.09411765, 0.11372549],
    [0.64705882, 0.05882353, 0.08235294],
    [0.40392157, 0.00000000, 0.05098039],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Positive,
    Negative,
}

impl Palette {
    fn ramp(self) -> &'static [[f64; 3]; 9] {
        match self {
            Palette::Positive => &POSITIVE,
            Palette::Negative => &NEGATIVE,
        }
    }
}

/// Straight (non-premultiplied) color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Packs into a premultiplied ARGB32 pixel for a depth-32 visual.
    pub fn to_argb_pixel(self) -> u32 {
        let a = self.a.clamp(0.0, 1.0);
        let channel = |c: f64| (c.clamp(0.0, 1.0) * a * 255.0).round() as u32;
        let alpha = (a * 255.0).round() as u32;
        (alpha << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn opaque(self) -> Self {
        Self { a: 1.0, ..self }
    }
}

/// What the renderer draws. Written by the runtime, read by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayAttributes {
    pub title: String,
    pub subtitle: String,
    pub color: Rgba,
}

impl Default for DisplayAttributes {
    fn default() -> Self {
        Self {
            title: "Waiting for quotes".to_string(),
            subtitle: String::new(),
            color: Rgba::new(1.0, 1.0, 1.0, TEXT_ALPHA),
        }
    }
}

impl DisplayAttributes {
    pub fn from_observation(obs: &StockObservation) -> Self {
        let (palette, index) = bucket(obs.percent_change);
        let [r, g, b] = palette.ramp()[index];
        Self {
            title: format!(
                "{:.2} {:+.2} {:+.3}%",
                obs.close, obs.change, obs.percent_change
            ),
            subtitle: format!("{} @ {}", obs.symbol, obs.formatted_time),
            color: Rgba::new(r, g, b, TEXT_ALPHA),
        }
    }
}

/// Palette by sign, index by magnitude in steps of 0.125, clamped to 8.
pub fn bucket(percent_change: f64) -> (Palette, usize) {
    let palette = if percent_change < 0.0 {
        Palette::Negative
    } else {
        Palette::Positive
    };
    // float-to-int casts saturate, NaN lands in bucket 0
    let index = ((percent_change.abs() / BUCKET_STEP).floor() as usize).min(MAX_BUCKET);
    (palette, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_observation(close: f64, change: f64, percent_change: f64) -> StockObservation {
        StockObservation {
            symbol: "SP500".to_string(),
            formatted_time: "2024-01-02 09:30:00".to_string(),
            close,
            change,
            percent_change,
            updated: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_bucket_selection() {
        assert_eq!(bucket(0.0), (Palette::Positive, 0));
        assert_eq!(bucket(1.5), (Palette::Positive, 8));
        assert_eq!(bucket(-0.05), (Palette::Negative, 0));
        assert_eq!(bucket(0.125), (Palette::Positive, 1));
        assert_eq!(bucket(-0.3), (Palette::Negative, 2));
        assert_eq!(bucket(-40.0), (Palette::Negative, 8));
        assert_eq!(bucket(f64::NAN).1, 0);
    }

    #[test]
    fn test_title_and_subtitle() {
        let attrs = DisplayAttributes::from_observation(&make_observation(102.0, 2.04, 2.0));
        assert_eq!(attrs.title, "102.00 +2.04 +2.000%");
        assert_eq!(attrs.subtitle, "SP500 @ 2024-01-02 09:30:00");
    }

    #[test]
    fn test_negative_title_signs() {
        let attrs = DisplayAttributes::from_observation(&make_observation(4780.5, -12.346, -0.2581));
        assert_eq!(attrs.title, "4780.50 -12.35 -0.258%");
    }

    #[test]
    fn test_color_uses_palette_entry_and_fixed_alpha() {
        let attrs = DisplayAttributes::from_observation(&make_observation(102.0, 2.04, 2.0));
        let [r, g, b] = POSITIVE[8];
        assert_eq!(attrs.color, Rgba::new(r, g, b, 0.6));

        let attrs = DisplayAttributes::from_observation(&make_observation(99.0, -0.05, -0.05));
        let [r, g, b] = NEGATIVE[0];
        assert_eq!(attrs.color, Rgba::new(r, g, b, 0.6));
    }

    #[test]
    fn test_argb_pixel_is_premultiplied() {
        assert_eq!(Rgba::new(1.0, 1.0, 1.0, 1.0).to_argb_pixel(), 0xFFFF_FFFF);
        assert_eq!(Rgba::new(1.0, 0.0, 0.0, 0.6).to_argb_pixel(), 0x9999_0000);
        assert_eq!(Rgba::new(0.0, 0.0, 0.0, 0.0).to_argb_pixel(), 0);
    }
}
