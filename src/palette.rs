use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Symbol assigned to height 1; subsequent heights use the following code points.
pub const FIRST_MAP_CHAR: char = 'A';

/// Palette substituted when an unknown name is requested.
pub const DEFAULT_PALETTE: &str = "landscape_16";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const BLACK: Rgb = Rgb::new(0, 0, 0);

/// One palette slot: the glyph used for console/tile rendering plus its color pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub symbol: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

/// An ordered, fixed-cardinality table mapping 1-based heights to color pairs.
/// Entries are never reordered once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    entries: Vec<PaletteEntry>,
}

impl Palette {
    fn new(name: &str, entries: Vec<PaletteEntry>) -> Self {
        Palette {
            name: name.to_string(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Bounds-checked lookup: height `h` maps to entry `h - 1`.
    pub fn entry_for_height(&self, height: i32) -> Result<&PaletteEntry, MapError> {
        if height < 1 || height as usize > self.entries.len() {
            return Err(MapError::OutOfRangeHeight {
                height,
                len: self.entries.len(),
            });
        }
        Ok(&self.entries[height as usize - 1])
    }

    /// Recovers the 1-based height whose entry carries `symbol`, if any.
    pub fn height_for_symbol(&self, symbol: char) -> Option<i32> {
        self.entries
            .iter()
            .position(|e| e.symbol == symbol)
            .map(|i| i as i32 + 1)
    }
}

/// Immutable registry of the built-in palettes, constructed once at startup and
/// passed by reference to every component that needs lookups.
#[derive(Debug, Clone)]
pub struct PaletteCatalog {
    palettes: Vec<Palette>,
}

impl Default for PaletteCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PaletteCatalog {
    pub fn builtin() -> Self {
        let mut palettes = vec![
            Palette::new("landscape_4", landscape_4()),
            Palette::new("landscape_8", landscape_8()),
            Palette::new("landscape_16", landscape_16()),
        ];

        // Formula-generated hue ramps, 16 shades each.
        let hues: [(&str, [u8; 3]); 7] = [
            ("grey", [1, 1, 1]),
            ("red", [1, 0, 0]),
            ("green", [0, 1, 0]),
            ("blue", [0, 0, 1]),
            ("yellow", [1, 1, 0]),
            ("magenta", [1, 0, 1]),
            ("cyan", [0, 1, 1]),
        ];
        for (name, mask) in hues {
            palettes.push(Palette::new(
                &format!("{}_16", name),
                shade_ramp(16, mask),
            ));
        }

        // Deeper grayscale ramps for taller height ranges.
        for shades in [32usize, 64, 128] {
            palettes.push(Palette::new(
                &format!("grey_{}", shades),
                shade_ramp(shades, [1, 1, 1]),
            ));
        }

        PaletteCatalog { palettes }
    }

    /// Resolves a palette by name, substituting the default for unknown names.
    /// This is a deliberate fallback policy, not error suppression.
    pub fn resolve(&self, name: &str) -> &Palette {
        self.palettes
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| self.get(DEFAULT_PALETTE))
    }

    /// Side-effect-free color-pair sequence for display purposes.
    pub fn preview(&self, name: &str) -> &[PaletteEntry] {
        self.resolve(name).entries()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.name.as_str())
    }

    fn get(&self, name: &str) -> &Palette {
        self.palettes
            .iter()
            .find(|p| p.name == name)
            .expect("built-in palette table always contains the default")
    }
}

/// Builds a `shades`-entry ramp along the color axes selected by `mask`.
/// The step uses truncating division (255 / shades); rounding instead would
/// shift every shade of every seeded map already exported.
fn shade_ramp(shades: usize, mask: [u8; 3]) -> Vec<PaletteEntry> {
    let step = 255 / shades;
    (0..shades)
        .map(|i| {
            let level = (i * step) as u8;
            PaletteEntry {
                symbol: symbol_for_index(i),
                fg: WHITE,
                bg: Rgb::new(level * mask[0], level * mask[1], level * mask[2]),
            }
        })
        .collect()
}

fn symbol_for_index(index: usize) -> char {
    char::from_u32(FIRST_MAP_CHAR as u32 + index as u32)
        .expect("palette cardinality never exceeds 128 symbols")
}

fn authored(colors: &[(Rgb, Rgb)]) -> Vec<PaletteEntry> {
    colors
        .iter()
        .enumerate()
        .map(|(i, &(fg, bg))| PaletteEntry {
            symbol: symbol_for_index(i),
            fg,
            bg,
        })
        .collect()
}

// Hand-authored landscape ramps: water, plains, forest, mountain, snow bands.

fn landscape_4() -> Vec<PaletteEntry> {
    authored(&[
        (WHITE, Rgb::new(0, 0, 255)),
        (WHITE, Rgb::new(215, 175, 0)),
        (WHITE, Rgb::new(0, 191, 0)),
        (BLACK, Rgb::new(255, 255, 255)),
    ])
}

fn landscape_8() -> Vec<PaletteEntry> {
    authored(&[
        (WHITE, Rgb::new(0, 0, 63)),
        (WHITE, Rgb::new(0, 0, 255)),
        (WHITE, Rgb::new(215, 175, 0)),
        (WHITE, Rgb::new(0, 191, 0)),
        (WHITE, Rgb::new(0, 63, 0)),
        (WHITE, Rgb::new(138, 117, 88)),
        (BLACK, Rgb::new(85, 85, 85)),
        (BLACK, Rgb::new(255, 255, 255)),
    ])
}

fn landscape_16() -> Vec<PaletteEntry> {
    authored(&[
        (WHITE, Rgb::new(0, 0, 63)),
        (WHITE, Rgb::new(0, 0, 127)),
        (WHITE, Rgb::new(0, 0, 191)),
        (WHITE, Rgb::new(0, 0, 255)),
        (WHITE, Rgb::new(215, 175, 0)),
        (WHITE, Rgb::new(0, 191, 0)),
        (WHITE, Rgb::new(0, 127, 0)),
        (WHITE, Rgb::new(0, 63, 0)),
        (WHITE, Rgb::new(81, 69, 52)),
        (WHITE, Rgb::new(100, 85, 64)),
        (WHITE, Rgb::new(119, 101, 76)),
        (WHITE, Rgb::new(138, 117, 88)),
        (BLACK, Rgb::new(85, 85, 85)),
        (BLACK, Rgb::new(135, 135, 135)),
        (BLACK, Rgb::new(150, 150, 150)),
        (BLACK, Rgb::new(255, 255, 255)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contains_all_builtins() {
        let catalog = PaletteCatalog::builtin();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names.len(), 13);
        for name in [
            "landscape_4",
            "landscape_8",
            "landscape_16",
            "grey_16",
            "red_16",
            "green_16",
            "blue_16",
            "yellow_16",
            "magenta_16",
            "cyan_16",
            "grey_32",
            "grey_64",
            "grey_128",
        ] {
            assert!(names.contains(&name), "missing palette {}", name);
        }
    }

    #[test]
    fn test_unknown_palette_falls_back_to_default() {
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("no_such_palette");
        assert_eq!(palette.name, DEFAULT_PALETTE);
        assert_eq!(palette.len(), 16);
    }

    #[test]
    fn test_shade_ramp_step_formula() {
        let catalog = PaletteCatalog::builtin();
        let blue = catalog.resolve("blue_16");
        // step = 255 / 16 = 15 (truncating division)
        let entries = blue.entries();
        assert_eq!(entries[0].bg, Rgb::new(0, 0, 0));
        assert_eq!(entries[1].bg, Rgb::new(0, 0, 15));
        assert_eq!(entries[15].bg, Rgb::new(0, 0, 225));
        for entry in entries {
            assert_eq!(entry.fg, WHITE);
        }
    }

    #[test]
    fn test_grey_128_cardinality_and_symbols() {
        let catalog = PaletteCatalog::builtin();
        let grey = catalog.resolve("grey_128");
        assert_eq!(grey.len(), 128);
        assert_eq!(grey.entries()[0].symbol, 'A');
        assert_eq!(grey.entries()[25].symbol, 'Z');
        // step = 255 / 128 = 1
        assert_eq!(grey.entries()[127].bg, Rgb::new(127, 127, 127));
    }

    #[test]
    fn test_landscape_16_authored_ramp() {
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("landscape_16");
        let entries = palette.entries();
        assert_eq!(entries[0].bg, Rgb::new(0, 0, 63)); // deep water
        assert_eq!(entries[4].bg, Rgb::new(215, 175, 0)); // sand
        assert_eq!(entries[15].bg, Rgb::new(255, 255, 255)); // snow
        assert_eq!(entries[15].fg, BLACK);
        assert_eq!(entries[15].symbol, 'P');
    }

    #[test]
    fn test_height_lookup_is_one_based() {
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("landscape_4");
        assert_eq!(palette.entry_for_height(1).unwrap().symbol, 'A');
        assert_eq!(palette.entry_for_height(4).unwrap().symbol, 'D');
        assert!(palette.entry_for_height(0).is_err());
        assert!(palette.entry_for_height(5).is_err());
    }

    #[test]
    fn test_height_for_symbol_round_trips() {
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("landscape_8");
        for h in 1..=8 {
            let symbol = palette.entry_for_height(h).unwrap().symbol;
            assert_eq!(palette.height_for_symbol(symbol), Some(h));
        }
        assert_eq!(palette.height_for_symbol('z'), None);
    }

    #[test]
    fn test_preview_does_not_disturb_other_lookups() {
        let catalog = PaletteCatalog::builtin();
        let before = catalog.resolve("landscape_16").entries().to_vec();
        let _ = catalog.preview("red_16");
        let after = catalog.resolve("landscape_16").entries();
        assert_eq!(before, after);
    }
}
