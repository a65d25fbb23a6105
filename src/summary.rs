use crate::generator::GenerationParams;

pub const ALGORITHM_NAME: &str = "diamond square";

/// Builds the ordered label/value pairs describing one generation session.
/// The same sequence feeds the console printout, the PNG metadata, and the
/// legend overlay of the tile export, so insertion order matters.
pub fn parameter_summary(params: &GenerationParams) -> Vec<(String, String)> {
    vec![
        ("Map size".to_string(), params.size.to_string()),
        ("Algorithm".to_string(), ALGORITHM_NAME.to_string()),
        ("Max height".to_string(), params.height_max.to_string()),
        ("Roughness".to_string(), format!("{:?}", params.roughness)),
        ("Random seed".to_string(), params.seed.to_string()),
        ("Palette".to_string(), params.palette_name.clone()),
    ]
}
