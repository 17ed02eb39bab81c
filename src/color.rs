use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Sequential palette (ColorBrewer YlOrRd)
// ---------------------------------------------------------------------------

type Rgb = (u8, u8, u8);

/// YlOrRd, 9-class, light to dark.
const YL_OR_RD: [Rgb; 9] = [
    (255, 255, 204),
    (255, 237, 160),
    (254, 217, 118),
    (254, 178, 76),
    (253, 141, 60),
    (252, 78, 42),
    (227, 26, 28),
    (189, 0, 38),
    (128, 0, 38),
];

/// The published YlOrRd scheme for `n` classes, 3 to 9.
fn brewer_classes(n: usize) -> Option<&'static [Rgb]> {
    const C3: [Rgb; 3] = [(255, 237, 160), (254, 178, 76), (240, 59, 32)];
    const C4: [Rgb; 4] = [(255, 255, 178), (254, 204, 92), (253, 141, 60), (227, 26, 28)];
    const C5: [Rgb; 5] = [
        (255, 255, 178),
        (254, 204, 92),
        (253, 141, 60),
        (240, 59, 32),
        (189, 0, 38),
    ];
    const C6: [Rgb; 6] = [
        (255, 255, 178),
        (254, 217, 118),
        (254, 178, 76),
        (253, 141, 60),
        (240, 59, 32),
        (189, 0, 38),
    ];
    const C7: [Rgb; 7] = [
        (255, 255, 178),
        (254, 217, 118),
        (254, 178, 76),
        (253, 141, 60),
        (252, 78, 42),
        (227, 26, 28),
        (177, 0, 38),
    ];
    const C8: [Rgb; 8] = [
        (255, 255, 204),
        (255, 237, 160),
        (254, 217, 118),
        (254, 178, 76),
        (253, 141, 60),
        (252, 78, 42),
        (227, 26, 28),
        (177, 0, 38),
    ];

    match n {
        3 => Some(&C3),
        4 => Some(&C4),
        5 => Some(&C5),
        6 => Some(&C6),
        7 => Some(&C7),
        8 => Some(&C8),
        9 => Some(&YL_OR_RD),
        _ => None,
    }
}

/// Outline of every boundary polygon: dark grey at 20 % opacity, premultiplied.
pub const OUTLINE: Color32 = Color32::from_rgba_premultiplied(12, 12, 12, 51);

/// Fill of boundaries with no data for the current selection.
pub const NO_DATA: Color32 = Color32::TRANSPARENT;

/// `n` YlOrRd colours, light to dark. Uses the ColorBrewer class table when
/// one exists for `n`, otherwise samples the 9-class ramp in linear RGB.
pub fn yl_or_rd(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    if let Some(classes) = brewer_classes(n) {
        return classes
            .iter()
            .map(|&(r, g, b)| Color32::from_rgb(r, g, b))
            .collect();
    }
    let anchors: Vec<LinSrgb> = YL_OR_RD
        .iter()
        .map(|&(r, g, b)| Srgb::new(r, g, b).into_format::<f32>().into_linear())
        .collect();
    let last = (anchors.len() - 1) as f32;

    (0..n)
        .map(|i| {
            let pos = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 * last };
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(anchors.len() - 1);
            let mixed = anchors[lo].mix(anchors[hi], pos - lo as f32);
            let srgb: Srgb = Srgb::from_linear(mixed);
            let rgb: Srgb<u8> = srgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Choropleth scale: accident total → fill colour
// ---------------------------------------------------------------------------

/// Equal-width bins over `[min, max]`, one palette colour per bin.
#[derive(Debug, Clone)]
pub struct ChoroplethScale {
    min: u64,
    max: u64,
    colors: Vec<Color32>,
}

impl ChoroplethScale {
    /// `None` when there is nothing to shade.
    pub fn new(range: Option<(u64, u64)>, bins: usize, fill_opacity: f32) -> Option<Self> {
        let (min, max) = range?;
        let alpha = (fill_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let colors = yl_or_rd(bins.max(1))
            .into_iter()
            .map(|c| Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha))
            .collect();
        Some(ChoroplethScale { min, max, colors })
    }

    pub fn bins(&self) -> usize {
        self.colors.len()
    }

    /// Index of the bin holding `value`; the top edge belongs to the last bin.
    pub fn bin_for(&self, value: u64) -> usize {
        if self.max <= self.min {
            return 0;
        }
        let value = value.clamp(self.min, self.max);
        let frac = (value - self.min) as f64 / (self.max - self.min) as f64;
        ((frac * self.bins() as f64) as usize).min(self.bins() - 1)
    }

    pub fn color_for(&self, value: u64) -> Color32 {
        self.colors[self.bin_for(value)]
    }

    /// Legend rows: `"lo – hi"` label and bin colour.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        let width = (self.max - self.min) as f64 / self.bins() as f64;
        self.colors
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let lo = self.min as f64 + width * i as f64;
                let hi = self.min as f64 + width * (i + 1) as f64;
                (format!("{lo:.0} – {hi:.0}"), c)
            })
            .collect()
    }
}
