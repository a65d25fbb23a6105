//! Codec for the multi-layer binary tile format consumed by the console-art
//! viewer. All integers are packed little-endian; tiles are flattened
//! column-major (`index = col * height + row`), with the column as the outer
//! write loop. Both properties are load-bearing for viewer compatibility.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::MapError;
use crate::generator::HeightMap;
use crate::legend::LegendTemplate;
use crate::palette::{Palette, Rgb, BLACK, WHITE};

pub const XP_VERSION: i32 = 1;

/// Row where the first summary line lands in the legend layer.
pub const LEGEND_START_ROW: usize = 4;
/// Column where summary values start; labels start at column 0.
pub const LEGEND_VALUE_COL: usize = 17;

/// The atomic unit of the format: a glyph plus a foreground/background pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub glyph: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Tile {
    pub const fn new(glyph: char, fg: Rgb, bg: Rgb) -> Self {
        Tile { glyph, fg, bg }
    }
}

/// One layer of tiles. Dimensions are in tiles, not pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct XpLayer {
    pub width: usize,
    pub height: usize,
    tiles: Vec<Tile>,
}

impl XpLayer {
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        XpLayer {
            width,
            height,
            tiles: vec![tile; width * height],
        }
    }

    fn from_tiles(width: usize, height: usize, tiles: Vec<Tile>) -> Self {
        XpLayer {
            width,
            height,
            tiles,
        }
    }

    /// Column-major flattening. `(row=2, col=4)` in a layer of height 5 lands
    /// at index 22.
    pub fn index(&self, row: usize, col: usize) -> usize {
        col * self.height + row
    }

    pub fn tile(&self, row: usize, col: usize) -> &Tile {
        &self.tiles[self.index(row, col)]
    }

    pub fn tile_mut(&mut self, row: usize, col: usize) -> &mut Tile {
        let idx = self.index(row, col);
        &mut self.tiles[idx]
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Writes `text` one character per tile starting at `(row, col)`, advancing
    /// one column per character. Only the glyph is replaced; each underlying
    /// tile keeps its colors. There is no wrapping: text that reaches other
    /// template content overwrites it silently, and text running past the
    /// layer's right edge is dropped.
    pub fn write_text(&mut self, row: usize, col: usize, text: &str) {
        for (i, c) in text.chars().enumerate() {
            let target = col + i;
            if target >= self.width {
                break;
            }
            self.tile_mut(row, target).glyph = c;
        }
    }
}

// ---------------------------------------------------------------------------
// Layer construction
// ---------------------------------------------------------------------------

/// Background-color layer: one solid-color tile per grid cell. The glyph is a
/// literal space and the palette entry's background color fills BOTH color
/// slots, so viewers render an opaque block regardless of glyph handling.
pub fn background_layer(height_map: &HeightMap, palette: &Palette) -> Result<XpLayer, MapError> {
    let size = height_map.len();
    let mut tiles = Vec::with_capacity(size * size);
    for col in 0..size {
        for row in 0..size {
            let entry = palette.entry_for_height(height_map[row][col])?;
            tiles.push(Tile::new(' ', entry.bg, entry.bg));
        }
    }
    Ok(XpLayer::from_tiles(size, size, tiles))
}

/// Optional glyph layer: each cell's palette symbol, white on black.
pub fn glyph_layer(height_map: &HeightMap, palette: &Palette) -> Result<XpLayer, MapError> {
    let size = height_map.len();
    let mut tiles = Vec::with_capacity(size * size);
    for col in 0..size {
        for row in 0..size {
            let entry = palette.entry_for_height(height_map[row][col])?;
            tiles.push(Tile::new(entry.symbol, WHITE, BLACK));
        }
    }
    Ok(XpLayer::from_tiles(size, size, tiles))
}

/// Legend layer: a fresh copy of the bundled template with the parameter
/// summary composited on top. The cached template itself is never mutated.
pub fn legend_layer(template: &LegendTemplate, summary: &[(String, String)]) -> XpLayer {
    let mut layer = template.to_layer();
    for (j, (label, value)) in summary.iter().enumerate() {
        layer.write_text(LEGEND_START_ROW + j, 0, label);
        layer.write_text(LEGEND_START_ROW + j, LEGEND_VALUE_COL, value);
    }
    layer
}

/// Encodes a generated map as a complete tile file: background layer, the
/// glyph layer when requested, and the legend layer last.
pub fn save_map_xp(
    path: &Path,
    height_map: &HeightMap,
    palette: &Palette,
    summary: &[(String, String)],
    template: &LegendTemplate,
    export_glyphs: bool,
) -> Result<(), MapError> {
    let mut layers = vec![background_layer(height_map, palette)?];
    if export_glyphs {
        layers.push(glyph_layer(height_map, palette)?);
    }
    layers.push(legend_layer(template, summary));

    let file = File::create(path)?;
    write_xp(&mut BufWriter::new(file), &layers)
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

fn write_i32<W: Write>(w: &mut W, value: i32) -> Result<(), MapError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_tile<W: Write>(w: &mut W, tile: &Tile) -> Result<(), MapError> {
    write_i32(w, tile.glyph as i32)?;
    w.write_all(&[
        tile.fg.r, tile.fg.g, tile.fg.b, tile.bg.r, tile.bg.g, tile.bg.b,
    ])?;
    Ok(())
}

pub fn write_xp<W: Write>(w: &mut W, layers: &[XpLayer]) -> Result<(), MapError> {
    write_i32(w, XP_VERSION)?;
    write_i32(w, layers.len() as i32)?;
    write_i32(w, layers[0].width as i32)?;
    write_i32(w, layers[0].height as i32)?;

    for (k, layer) in layers.iter().enumerate() {
        // The first layer inherits the header dimensions.
        if k > 0 {
            write_i32(w, layer.width as i32)?;
            write_i32(w, layer.height as i32)?;
        }
        for tile in layer.tiles() {
            write_tile(w, tile)?;
        }
    }
    w.flush()?;
    Ok(())
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, MapError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            MapError::Truncated
        } else {
            MapError::Io(e)
        }
    })?;
    Ok(i32::from_le_bytes(buf))
}

fn read_tile<R: Read>(r: &mut R) -> Result<Tile, MapError> {
    let glyph_code = read_i32(r)?;
    let mut colors = [0u8; 6];
    r.read_exact(&mut colors).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            MapError::Truncated
        } else {
            MapError::Io(e)
        }
    })?;
    Ok(Tile::new(
        decode_glyph(glyph_code),
        Rgb::new(colors[0], colors[1], colors[2]),
        Rgb::new(colors[3], colors[4], colors[5]),
    ))
}

pub fn read_xp<R: Read>(r: &mut R) -> Result<Vec<XpLayer>, MapError> {
    let version = read_i32(r)?;
    if version != XP_VERSION {
        return Err(MapError::BadVersion {
            found: version,
            expected: XP_VERSION,
        });
    }
    let layer_count = read_i32(r)?.max(0) as usize;
    let mut width = read_i32(r)?.max(0) as usize;
    let mut height = read_i32(r)?.max(0) as usize;

    let mut layers = Vec::with_capacity(layer_count);
    for k in 0..layer_count {
        if k > 0 {
            width = read_i32(r)?.max(0) as usize;
            height = read_i32(r)?.max(0) as usize;
        }
        let mut tiles = Vec::with_capacity(width * height);
        for _ in 0..width * height {
            tiles.push(read_tile(r)?);
        }
        layers.push(XpLayer::from_tiles(width, height, tiles));
    }
    Ok(layers)
}

pub fn load_xp(path: &Path) -> Result<Vec<XpLayer>, MapError> {
    let file = File::open(path)?;
    read_xp(&mut BufReader::new(file))
}

// ---------------------------------------------------------------------------
// Height reconstruction
// ---------------------------------------------------------------------------

/// Rebuilds a height grid from a background or glyph layer by looking each
/// tile's glyph up in the palette's symbol table. A glyph matching no symbol
/// is rejected rather than clamped or tagged.
///
/// Color pairs are catalogued in order of first appearance and returned
/// alongside the grid; height reconstruction does not use them yet (reserved
/// for loading a custom palette straight from a file).
pub fn decode_height_map(
    layer: &XpLayer,
    palette: &Palette,
) -> Result<(HeightMap, Vec<(Rgb, Rgb)>), MapError> {
    let mut height_map = vec![vec![0i32; layer.width]; layer.height];
    let mut seen_colors: Vec<(Rgb, Rgb)> = Vec::new();

    for col in 0..layer.width {
        for row in 0..layer.height {
            let tile = layer.tile(row, col);
            let pair = (tile.fg, tile.bg);
            if !seen_colors.contains(&pair) {
                seen_colors.push(pair);
            }
            let height = palette
                .height_for_symbol(tile.glyph)
                .ok_or(MapError::UnknownGlyph { glyph: tile.glyph })?;
            height_map[row][col] = height;
        }
    }
    Ok((height_map, seen_colors))
}

// ---------------------------------------------------------------------------
// Glyph decoding
// ---------------------------------------------------------------------------

/// Glyph codes below 256 are interpreted as code page 437 (the format's
/// single-byte legacy encoding); larger codes are taken as Unicode scalar
/// values, which is what the encoder emits for non-ASCII glyphs.
pub fn decode_glyph(code: i32) -> char {
    match code {
        0..=127 => code as u8 as char,
        128..=255 => CP437_HIGH[(code - 128) as usize],
        _ => char::from_u32(code as u32).unwrap_or('\u{FFFD}'),
    }
}

/// Code page 437, upper half (0x80..=0xFF).
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■',
    '\u{00A0}',
];
