use std::path::PathBuf;
use thiserror::Error;

/// All failure modes of map generation and export.
#[derive(Debug, Error)]
pub enum MapError {
    /// The requested height range cannot be represented by the selected palette.
    /// Checked before the generation loop runs so a large grid is never computed
    /// only to fail at export time.
    #[error(
        "palette '{palette}' has only {colors} colors; max height must be lower or \
         equal to the number of colors in the selected palette (requested {height_max})"
    )]
    PaletteCapacity {
        palette: String,
        colors: usize,
        height_max: i32,
    },

    /// A height value fell outside the palette's 1-based entry range.
    #[error("height {height} is out of range for a palette with {len} entries")]
    OutOfRangeHeight { height: i32, len: usize },

    /// The bundled legend template could not be found. This is a packaged asset,
    /// not user data, so its absence means the installation is broken.
    #[error(
        "legend template {path:?} is missing; the installation appears to be \
         corrupted, reinstall to restore the bundled assets"
    )]
    MissingResource { path: PathBuf },

    /// A tile file ended before the declared layers were fully read.
    #[error("tile file is truncated")]
    Truncated,

    /// A tile file declared a version this codec does not understand.
    #[error("unsupported tile file version {found} (expected {expected})")]
    BadVersion { found: i32, expected: i32 },

    /// A decoded tile carries a glyph that maps to no symbol of the active palette.
    #[error("glyph '{glyph}' does not match any symbol of the active palette")]
    UnknownGlyph { glyph: char },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
