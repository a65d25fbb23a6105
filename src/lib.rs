//! Deterministic height-map generation and export.
//!
//! The pipeline is: generate a height grid with diamond-square subdivision,
//! quantize it through a named color palette, then export as JSON, PNG, or a
//! multi-layer REXPaint-style tile file with a parameter legend.

pub mod error;
pub mod export;
pub mod generator;
pub mod legend;
pub mod palette;
pub mod summary;
pub mod xp;

pub use error::MapError;
pub use generator::{DiamondSquare, GenerationParams, HeightMap};
pub use palette::{Palette, PaletteCatalog};
