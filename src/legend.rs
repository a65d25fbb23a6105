use std::path::Path;

use crate::error::MapError;
use crate::xp::{load_xp, XpLayer};

/// Bundled legend frame, shipped next to the binary.
pub const LEGEND_PATH: &str = "assets/legend.xp";

/// The decorative frame composited under the parameter summary in tile
/// exports. Loaded once per run and cloned for each export, so the cached
/// copy stays pristine.
#[derive(Debug, Clone)]
pub struct LegendTemplate {
    layer: XpLayer,
}

impl LegendTemplate {
    pub fn load() -> Result<Self, MapError> {
        Self::load_from(Path::new(LEGEND_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self, MapError> {
        if !path.exists() {
            return Err(MapError::MissingResource {
                path: path.to_path_buf(),
            });
        }
        let mut layers = load_xp(path)?;
        if layers.is_empty() {
            return Err(MapError::Truncated);
        }
        let mut layer = layers.swap_remove(0);

        // Authoring tools leave NUL glyphs in untouched cells; normalize them
        // to spaces so text overlay and re-export behave uniformly.
        for col in 0..layer.width {
            for row in 0..layer.height {
                let tile = layer.tile_mut(row, col);
                if tile.glyph == '\0' {
                    tile.glyph = ' ';
                }
            }
        }
        Ok(LegendTemplate { layer })
    }

    pub fn layer(&self) -> &XpLayer {
        &self.layer
    }

    /// Fresh mutable copy for compositing; the template itself never changes.
    pub fn to_layer(&self) -> XpLayer {
        self.layer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Rgb, WHITE};
    use crate::xp::{write_xp, Tile, XpLayer};
    use std::fs::File;
    use std::io::BufWriter;

    fn write_template(path: &Path) {
        let mut layer = XpLayer::filled(6, 4, Tile::new('\0', WHITE, Rgb::new(0, 0, 64)));
        layer.tile_mut(0, 0).glyph = '═';
        layer.tile_mut(1, 1).glyph = 'L';
        let file = File::create(path).unwrap();
        write_xp(&mut BufWriter::new(file), &[layer]).unwrap();
    }

    #[test]
    fn test_missing_template_reports_resource_error() {
        let err = LegendTemplate::load_from(Path::new("no/such/legend.xp")).unwrap_err();
        assert!(matches!(err, MapError::MissingResource { .. }));
    }

    #[test]
    fn test_load_strips_nul_glyphs() {
        let dir = std::env::temp_dir().join("legend_template_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("legend.xp");
        write_template(&path);

        let template = LegendTemplate::load_from(&path).unwrap();
        let layer = template.layer();
        assert_eq!((layer.width, layer.height), (6, 4));
        assert_eq!(layer.tile(0, 0).glyph, '═');
        assert_eq!(layer.tile(1, 1).glyph, 'L');
        // Filler cells come back as plain spaces, colors intact.
        assert_eq!(layer.tile(2, 2).glyph, ' ');
        assert_eq!(layer.tile(2, 2).bg, Rgb::new(0, 0, 64));
        assert_eq!(layer.tile(2, 2).fg, WHITE);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_to_layer_clones_leave_template_untouched() {
        let dir = std::env::temp_dir().join("legend_template_clone_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("legend.xp");
        write_template(&path);

        let template = LegendTemplate::load_from(&path).unwrap();
        let mut copy = template.to_layer();
        copy.write_text(2, 0, "Seed");
        assert_eq!(copy.tile(2, 0).glyph, 'S');
        assert_eq!(template.layer().tile(2, 0).glyph, ' ');

        std::fs::remove_file(&path).unwrap();
    }
}
