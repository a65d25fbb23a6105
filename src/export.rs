//! Structured (JSON) and raster (PNG) exporters. The tile-file exporter lives
//! in the codec module because it shares the wire-format internals.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::Serialize;

use crate::error::MapError;
use crate::generator::{GenerationParams, HeightMap};
use crate::palette::Palette;
use crate::summary::ALGORITHM_NAME;

/// The parameter block of a structured export. Field order is the document's
/// key order, which downstream tooling keys on.
#[derive(Debug, Serialize)]
pub struct ParametersDoc {
    #[serde(rename = "Map size")]
    pub map_size: usize,
    #[serde(rename = "Algorithm")]
    pub algorithm: String,
    #[serde(rename = "Max height")]
    pub max_height: i32,
    #[serde(rename = "Roughness")]
    pub roughness: f64,
    #[serde(rename = "Random seed")]
    pub random_seed: u64,
    #[serde(rename = "Palette")]
    pub palette: String,
}

impl ParametersDoc {
    pub fn from_params(params: &GenerationParams) -> Self {
        ParametersDoc {
            map_size: params.size,
            algorithm: ALGORITHM_NAME.to_string(),
            max_height: params.height_max,
            roughness: params.roughness,
            random_seed: params.seed,
            palette: params.palette_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapDocument<'a> {
    pub parameters: ParametersDoc,
    pub height_map: &'a HeightMap,
}

/// Writes the height grid plus its generation parameters as pretty-printed
/// JSON with 4-space indentation.
pub fn save_json(
    path: &Path,
    params: &GenerationParams,
    height_map: &HeightMap,
) -> Result<(), MapError> {
    let document = MapDocument {
        parameters: ParametersDoc::from_params(params),
        height_map,
    };
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    document.serialize(&mut ser)?;
    writer.flush()?;
    Ok(())
}

/// One pixel per cell; pixel `(x, y)` takes the background color of the
/// palette entry for `height_map[y][x]`.
pub fn render_rgb(height_map: &HeightMap, palette: &Palette) -> Result<RgbImage, MapError> {
    let size = height_map.len() as u32;
    let mut img = RgbImage::new(size, size);
    for (y, row) in height_map.iter().enumerate() {
        for (x, &height) in row.iter().enumerate() {
            let bg = palette.entry_for_height(height)?.bg;
            img.put_pixel(x as u32, y as u32, image::Rgb([bg.r, bg.g, bg.b]));
        }
    }
    Ok(img)
}

/// Renders the grid to a PNG, upscaled with nearest-neighbor so cells stay
/// crisp blocks, and embeds the generation parameters as tEXt chunks.
pub fn save_png(
    path: &Path,
    params: &GenerationParams,
    height_map: &HeightMap,
    palette: &Palette,
    summary: &[(String, String)],
    scale_up: u32,
) -> Result<(), MapError> {
    let img = render_rgb(height_map, palette)?;
    let scale = scale_up.max(1);
    let new_size = img.width() * scale;
    let img = imageops::resize(&img, new_size, new_size, FilterType::Nearest);

    let map_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), new_size, new_size);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    encoder.add_text_chunk("Title".to_string(), format!("{} - height map", map_name))?;
    encoder.add_text_chunk("Software".to_string(), "heightmapper".to_string())?;
    encoder.add_text_chunk(
        "Comment".to_string(),
        "Generated with the heightmapper command line tool".to_string(),
    )?;
    for (label, value) in summary {
        encoder.add_text_chunk(label.clone(), value.clone())?;
    }
    let mut description = vec!["Height map generated using heightmapper".to_string()];
    for (label, value) in summary {
        description.push(format!("{:15}: {}", label, value));
    }
    encoder.add_text_chunk("Description".to_string(), description.join("\n"))?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(img.as_raw())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteCatalog;
    use crate::summary::parameter_summary;

    fn small_map() -> (GenerationParams, HeightMap) {
        let params = GenerationParams {
            size: 2,
            height_max: 4,
            palette_name: "landscape_4".to_string(),
            ..GenerationParams::default()
        };
        (params, vec![vec![1, 2], vec![3, 4]])
    }

    #[test]
    fn test_json_document_key_order() {
        let (params, height_map) = small_map();
        let document = MapDocument {
            parameters: ParametersDoc::from_params(&params),
            height_map: &height_map,
        };
        let text = serde_json::to_string_pretty(&document).unwrap();

        let positions: Vec<usize> = [
            "\"parameters\"",
            "\"Map size\"",
            "\"Algorithm\"",
            "\"Max height\"",
            "\"Roughness\"",
            "\"Random seed\"",
            "\"Palette\"",
            "\"height_map\"",
        ]
        .iter()
        .map(|key| text.find(key).unwrap_or_else(|| panic!("missing {}", key)))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
        assert!(text.contains("\"Algorithm\": \"diamond square\""));
        // Roughness serializes as a float, not an integer.
        assert!(text.contains("\"Roughness\": 16.0"));
    }

    #[test]
    fn test_json_file_uses_four_space_indent() {
        let (params, height_map) = small_map();
        let dir = std::env::temp_dir().join("export_json_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("map.json");
        save_json(&path, &params, &height_map).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"parameters\""));
        assert!(text.contains("\"height_map\""));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["height_map"][1][0], 3);
        assert_eq!(parsed["parameters"]["Map size"], 2);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_render_pixel_mapping() {
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("landscape_4");
        let height_map = vec![vec![1, 2], vec![3, 4]];
        let img = render_rgb(&height_map, palette).unwrap();

        // pixel (x=1, y=0) shows height_map[0][1] = 2.
        let expected = palette.entry_for_height(2).unwrap().bg;
        assert_eq!(
            img.get_pixel(1, 0),
            &image::Rgb([expected.r, expected.g, expected.b])
        );
        let snow = palette.entry_for_height(4).unwrap().bg;
        assert_eq!(img.get_pixel(1, 1), &image::Rgb([snow.r, snow.g, snow.b]));
    }

    #[test]
    fn test_render_rejects_out_of_range_height() {
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("landscape_4");
        let height_map = vec![vec![1, 9], vec![3, 4]];
        assert!(matches!(
            render_rgb(&height_map, palette).unwrap_err(),
            MapError::OutOfRangeHeight { height: 9, .. }
        ));
    }

    #[test]
    fn test_png_export_scales_and_embeds_metadata() {
        let (params, height_map) = small_map();
        let catalog = PaletteCatalog::builtin();
        let palette = catalog.resolve("landscape_4");
        let summary = parameter_summary(&params);

        let dir = std::env::temp_dir().join("export_png_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tiny.png");
        save_png(&path, &params, &height_map, palette, &summary, 3).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (6, 6));

        let text_of = |keyword: &str| {
            info.uncompressed_latin1_text
                .iter()
                .find(|c| c.keyword == keyword)
                .map(|c| c.text.clone())
        };
        assert_eq!(text_of("Title").unwrap(), "tiny - height map");
        assert_eq!(text_of("Software").unwrap(), "heightmapper");
        assert_eq!(text_of("Map size").unwrap(), "2");
        assert_eq!(text_of("Roughness").unwrap(), "16.0");
        assert_eq!(text_of("Palette").unwrap(), "landscape_4");
        let description = text_of("Description").unwrap();
        assert!(description.contains("Map size       : 2"));

        std::fs::remove_file(&path).unwrap();
    }
}
