//! Contrast-tuned stimulus generation.
//!
//! Each stimulus is a triangle inside a circle; difficulty is driven by
//! the contrast ratio between the two colors (WCAG relative luminance),
//! the triangle size and the visibility window. Color pairs are found
//! by rejection sampling inside the difficulty's contrast band.

use anyhow::{Result, bail};
use rand::Rng;

use crate::db::ItemConfigInput;

const MAX_SAMPLING_ATTEMPTS: u32 = 1000;

const ORIENTATIONS: [&str; 4] = ["N", "E", "S", "W"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

struct DifficultyRanges {
    contrast_min: f64,
    contrast_max: f64,
    triangle_size_min: i32,
    triangle_size_max: i32,
    time_visible_min: i32,
    time_visible_max: i32,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// The well-known test config holding this difficulty's stimulus
    /// pool (seeded by the initial migration).
    #[must_use]
    pub const fn test_config_id(self) -> i32 {
        match self {
            Self::Easy => 1,
            Self::Medium => 3,
            Self::Hard => 4,
        }
    }

    const fn ranges(self) -> DifficultyRanges {
        match self {
            Self::Easy => DifficultyRanges {
                contrast_min: 1.08,
                contrast_max: 1.11,
                triangle_size_min: 50,
                triangle_size_max: 100,
                time_visible_min: 300,
                time_visible_max: 500,
            },
            Self::Medium => DifficultyRanges {
                contrast_min: 1.05,
                contrast_max: 1.07,
                triangle_size_min: 30,
                triangle_size_max: 70,
                time_visible_min: 150,
                time_visible_max: 300,
            },
            Self::Hard => DifficultyRanges {
                contrast_min: 1.03,
                contrast_max: 1.05,
                triangle_size_min: 8,
                triangle_size_max: 15,
                time_visible_min: 50,
                time_visible_max: 100,
            },
        }
    }
}

/// WCAG relative luminance of a `#rrggbb` color.
pub fn relative_luminance(color_hex: &str) -> Result<f64> {
    let hex = color_hex.trim_start_matches('#');
    // Length alone is not enough: byte-slicing below must not land on
    // a char boundary inside a multi-byte character.
    if hex.len() != 6 || !hex.is_ascii() {
        bail!("Invalid hex color: {color_hex}");
    }

    let channel = |range: std::ops::Range<usize>| -> Result<f64> {
        let value = u8::from_str_radix(&hex[range], 16)
            .map_err(|_| anyhow::anyhow!("Invalid hex color: {color_hex}"))?;
        Ok(linearize(value))
    };

    let r = channel(0..2)?;
    let g = channel(2..4)?;
    let b = channel(4..6)?;

    Ok(0.2126 * r + 0.7152 * g + 0.0722 * b)
}

fn linearize(value: u8) -> f64 {
    let c = f64::from(value) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[must_use]
pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
    let lighter = l1.max(l2);
    let darker = l1.min(l2);
    (lighter + 0.05) / (darker + 0.05)
}

/// Rejection-sample a color pair whose contrast ratio falls inside
/// `[contrast_min, contrast_max]`.
pub fn generate_color_pair(contrast_min: f64, contrast_max: f64) -> Result<(String, String)> {
    let mut rng = rand::rng();

    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        let a = format!("#{:06x}", rng.random_range(0..=0xFF_FFFFu32));
        let b = format!("#{:06x}", rng.random_range(0..=0xFF_FFFFu32));

        let ratio = contrast_ratio(relative_luminance(&a)?, relative_luminance(&b)?);
        if (contrast_min..=contrast_max).contains(&ratio) {
            return Ok((a, b));
        }
    }

    bail!("Could not find color pair with contrast between {contrast_min} and {contrast_max}")
}

/// Generate one stimulus for the given difficulty.
pub fn generate_item_config(difficulty: Difficulty) -> Result<ItemConfigInput> {
    let ranges = difficulty.ranges();
    let mut rng = rand::rng();

    let triangle_size = rng.random_range(ranges.triangle_size_min..=ranges.triangle_size_max);
    let time_visible_ms = rng.random_range(ranges.time_visible_min..=ranges.time_visible_max);
    let circle_size = rng.random_range(300..=600);

    let (first, second) = generate_color_pair(ranges.contrast_min, ranges.contrast_max)?;
    let (triangle_color, circle_color) = if rng.random_bool(0.5) {
        (first, second)
    } else {
        (second, first)
    };

    let orientation = ORIENTATIONS[rng.random_range(0..ORIENTATIONS.len())].to_string();

    Ok(ItemConfigInput {
        triangle_size,
        triangle_color,
        circle_size,
        circle_color,
        time_visible_ms,
        orientation,
    })
}

/// Generate a batch of stimuli for a difficulty.
pub fn generate_batch(difficulty: Difficulty, count: usize) -> Result<Vec<ItemConfigInput>> {
    (0..count).map(|_| generate_item_config(difficulty)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_extremes() {
        assert!(relative_luminance("#000000").unwrap().abs() < 1e-9);
        assert!((relative_luminance("#ffffff").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn luminance_rejects_bad_input() {
        assert!(relative_luminance("#12345").is_err());
        assert!(relative_luminance("not-a-color").is_err());
        // 6 bytes but not 6 hex digits; must error, not panic.
        assert!(relative_luminance("#aa\u{20ac}a").is_err());
        assert!(relative_luminance("#gghhii").is_err());
    }

    #[test]
    fn contrast_ratio_is_symmetric_and_bounded() {
        let white = relative_luminance("#ffffff").unwrap();
        let black = relative_luminance("#000000").unwrap();

        let ratio = contrast_ratio(white, black);
        assert!((ratio - 21.0).abs() < 0.01);
        assert!((contrast_ratio(black, white) - ratio).abs() < 1e-9);
        assert!((contrast_ratio(white, white) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sampled_pairs_land_in_band() {
        let (a, b) = generate_color_pair(1.05, 1.2).unwrap();
        let ratio = contrast_ratio(
            relative_luminance(&a).unwrap(),
            relative_luminance(&b).unwrap(),
        );
        assert!((1.05..=1.2).contains(&ratio));
    }

    #[test]
    fn generated_stimuli_respect_difficulty_ranges() {
        let item = generate_item_config(Difficulty::Hard).unwrap();

        assert!((8..=15).contains(&item.triangle_size));
        assert!((50..=100).contains(&item.time_visible_ms));
        assert!((300..=600).contains(&item.circle_size));
        assert!(ORIENTATIONS.contains(&item.orientation.as_str()));

        let ratio = contrast_ratio(
            relative_luminance(&item.triangle_color).unwrap(),
            relative_luminance(&item.circle_color).unwrap(),
        );
        assert!((1.03..=1.05).contains(&ratio));
    }

    #[test]
    fn difficulty_parsing() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("medium"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("extreme"), None);
        assert_eq!(Difficulty::parse("Easy"), None);
    }
}
