use serde::Serialize;

use crate::color::Color;
use crate::reducer::PaletteEntry;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Swatch {
    pub color: Color,
    pub count: usize,
    pub brightness: f32,
}

/// Unique-color summary for display, brightest swatch first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaletteReport {
    pub total_colors: usize,
    pub swatches: Vec<Swatch>,
}

impl PaletteReport {
    pub fn hex_colors(&self) -> Vec<String> {
        self.swatches.iter().map(|s| s.color.to_hex()).collect()
    }
}

/// Sort `palette` by descending luma. Equal brightness keeps palette order.
pub fn palette_report(palette: &[PaletteEntry]) -> PaletteReport {
    let mut entries = palette.to_vec();
    entries.sort_by(|a, b| b.color.luma_key().cmp(&a.color.luma_key()));

    PaletteReport {
        total_colors: entries.len(),
        swatches: entries
            .into_iter()
            .map(|e| Swatch {
                color: e.color,
                count: e.count,
                brightness: e.color.brightness(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(r: u8, g: u8, b: u8) -> PaletteEntry {
        PaletteEntry {
            color: Color::new(r, g, b),
            count: 1,
        }
    }

    #[test]
    fn sorted_brightest_first() {
        let report = palette_report(&[
            entry(0, 0, 0),
            entry(0, 0, 255),
            entry(255, 255, 255),
            entry(0, 255, 0),
        ]);
        assert_eq!(report.total_colors, 4);
        assert_eq!(report.hex_colors(), vec!["#FFFFFF", "#00FF00", "#0000FF", "#000000"]);
        assert!(report
            .swatches
            .windows(2)
            .all(|w| w[0].brightness >= w[1].brightness));
    }

    #[test]
    fn equal_brightness_keeps_input_order() {
        // both have luma 18197 / 1000
        let green = entry(0, 31, 0);
        let violet = entry(1, 0, 157);
        let report = palette_report(&[violet, entry(200, 200, 200), green]);
        assert_eq!(report.hex_colors(), vec!["#C8C8C8", "#01009D", "#001F00"]);

        let report = palette_report(&[green, violet]);
        assert_eq!(report.hex_colors(), vec!["#001F00", "#01009D"]);
    }

    #[test]
    fn empty_palette() {
        let report = palette_report(&[]);
        assert_eq!(report.total_colors, 0);
        assert!(report.swatches.is_empty());
    }

    #[test]
    fn serializes_hex_colors() {
        let json = serde_json::to_value(palette_report(&[entry(255, 0, 0)])).unwrap();
        assert_eq!(json["total_colors"], 1);
        assert_eq!(json["swatches"][0]["color"], "#FF0000");
    }
}
