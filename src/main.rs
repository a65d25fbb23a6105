use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use heightmapper::error::MapError;
use heightmapper::export;
use heightmapper::generator::{
    DiamondSquare, GenerationParams, HeightMap, DEFAULT_MAP_SIZE, DEFAULT_ROUGHNESS, HEIGHT_MAX,
};
use heightmapper::legend::LegendTemplate;
use heightmapper::palette::{Palette, PaletteCatalog, DEFAULT_PALETTE};
use heightmapper::summary::parameter_summary;
use heightmapper::xp;

const MAPS_FOLDER: &str = "maps";

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    name: String,
    size: usize,
    max_height: i32,
    roughness: f64,
    seed: Option<u64>,
    palette: String,
    scale_up: u32,
    export_json: bool,
    export_png: bool,
    export_xp: bool,
    glyphs: bool,
    printout: bool,
    list_palettes: bool,
    help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            name: "map".to_string(),
            size: DEFAULT_MAP_SIZE,
            max_height: HEIGHT_MAX,
            roughness: DEFAULT_ROUGHNESS,
            seed: None,
            palette: DEFAULT_PALETTE.to_string(),
            scale_up: 4,
            export_json: false,
            export_png: false,
            export_xp: false,
            glyphs: false,
            printout: true,
            list_palettes: false,
            help: false,
        }
    }
}

fn parse_args_from(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--name" | "-n" => {
                if i + 1 < args.len() {
                    options.name = args[i + 1].clone();
                    i += 1;
                }
            }
            "--size" | "-m" => {
                if i + 1 < args.len() {
                    if let Ok(value) = args[i + 1].parse::<usize>() {
                        options.size = value;
                        i += 1;
                    }
                }
            }
            "--max-height" | "-x" => {
                if i + 1 < args.len() {
                    if let Ok(value) = args[i + 1].parse::<i32>() {
                        options.max_height = value.max(1);
                        i += 1;
                    }
                }
            }
            "--roughness" | "-r" => {
                if i + 1 < args.len() {
                    if let Ok(value) = args[i + 1].parse::<f64>() {
                        options.roughness = value;
                        i += 1;
                    }
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    if let Ok(value) = args[i + 1].parse::<u64>() {
                        options.seed = Some(value);
                        i += 1;
                    }
                }
            }
            "--palette" | "-p" => {
                if i + 1 < args.len() {
                    options.palette = args[i + 1].clone();
                    i += 1;
                }
            }
            "--scale-up" | "-u" => {
                if i + 1 < args.len() {
                    if let Ok(value) = args[i + 1].parse::<u32>() {
                        options.scale_up = value.max(1);
                        i += 1;
                    }
                }
            }
            "--export-json" => options.export_json = true,
            "--export-png" => options.export_png = true,
            "--export-xp" => options.export_xp = true,
            "--glyphs" => options.glyphs = true,
            "--no-printout" => options.printout = false,
            "--list-palettes" => options.list_palettes = true,
            "--help" => options.help = true,
            _ => {}
        }
        i += 1;
    }

    options
}

fn parse_args() -> CliOptions {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

fn print_help() {
    println!("Height Map Generator");
    println!("\nUsage: heightmapper [OPTIONS]");
    println!("\nOptions:");
    println!("  --name, -n <name>     Output file name without extension (default: map)");
    println!("  --size, -m <n>        Map edge length, must be 2^k + 1 (default: 65)");
    println!("  --max-height, -x <n>  Highest terrain level (default: 16)");
    println!("  --roughness, -r <f>   Initial perturbation strength (default: 16.0)");
    println!("  --seed, -s <n>        Random seed; omit for a random map");
    println!("  --palette, -p <name>  Color palette (default: landscape_16)");
    println!("  --scale-up, -u <n>    PNG upscale factor (default: 4)");
    println!("  --export-json         Save the height grid as JSON");
    println!("  --export-png          Save the map as a PNG image");
    println!("  --export-xp           Save the map as a REXPaint tile file");
    println!("  --glyphs              Add a glyph layer to the tile export");
    println!("  --no-printout         Skip the console map preview");
    println!("  --list-palettes       Show all palettes and exit");
    println!("  --help                Show this help message");
    println!("\nExample:");
    println!("  heightmapper --size 65 --seed 111 --palette landscape_16 --export-png");
}

fn print_map(height_map: &HeightMap, palette: &Palette) -> Result<(), MapError> {
    for row in height_map {
        for &height in row {
            let bg = palette.entry_for_height(height)?.bg;
            print!("\x1b[48;2;{};{};{}m  \x1b[0m", bg.r, bg.g, bg.b);
        }
        println!();
    }
    println!();
    Ok(())
}

fn print_palette_swatch(palette: &Palette) {
    print!("  {:13} ", palette.name);
    for entry in palette.entries() {
        print!(
            "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}\x1b[0m",
            entry.fg.r, entry.fg.g, entry.fg.b, entry.bg.r, entry.bg.g, entry.bg.b, entry.symbol
        );
    }
    println!();
}

fn print_summary(summary: &[(String, String)]) {
    println!("\x1b[1mParameters:\x1b[0m");
    for (label, value) in summary {
        println!("  {:15}: {}", label, value);
    }
}

fn run(options: &CliOptions) -> Result<(), MapError> {
    let catalog = PaletteCatalog::builtin();

    if options.list_palettes {
        println!("\x1b[1mAvailable palettes:\x1b[0m");
        for name in catalog.names() {
            print_palette_swatch(catalog.resolve(name));
        }
        return Ok(());
    }

    let seed = options
        .seed
        .unwrap_or_else(|| rand::thread_rng().gen_range(0..10000));
    // Unknown palette names fall back to the default; the summary reports the
    // palette actually used.
    let palette = catalog.resolve(&options.palette);
    let params = GenerationParams {
        size: options.size,
        height_max: options.max_height,
        roughness: options.roughness,
        seed,
        palette_name: palette.name.clone(),
        ..GenerationParams::default()
    };

    let mut session = DiamondSquare::new(params.clone());
    let height_map = session.generate(palette)?.clone();
    let summary = parameter_summary(&params);

    if options.printout {
        print_map(&height_map, palette)?;
        print_palette_swatch(palette);
        println!();
    }
    print_summary(&summary);

    if options.export_json || options.export_png || options.export_xp {
        fs::create_dir_all(MAPS_FOLDER)?;
    }

    if options.export_json {
        let path = map_path(&options.name, "json");
        export::save_json(&path, &params, &height_map)?;
        report_saved(&path);
    }
    if options.export_png {
        let path = map_path(&options.name, "png");
        export::save_png(
            &path,
            &params,
            &height_map,
            palette,
            &summary,
            options.scale_up,
        )?;
        report_saved(&path);
    }
    if options.export_xp {
        let template = LegendTemplate::load()?;
        let path = map_path(&options.name, "xp");
        xp::save_map_xp(
            &path,
            &height_map,
            palette,
            &summary,
            &template,
            options.glyphs,
        )?;
        report_saved(&path);
    }

    Ok(())
}

fn map_path(name: &str, extension: &str) -> PathBuf {
    Path::new(MAPS_FOLDER).join(format!("{}.{}", name, extension))
}

fn report_saved(path: &Path) {
    println!("Map saved to '\x1b[1m{}\x1b[0m'.", path.display());
}

fn main() {
    let options = parse_args();

    if options.help {
        print_help();
        return;
    }

    let probe = GenerationParams {
        size: options.size,
        ..GenerationParams::default()
    };
    if !probe.size_is_valid() {
        eprintln!(
            "\x1b[91mInvalid map size {}; use 2^k + 1, e.g. 9, 17, 33, 65 or 129.\x1b[0m",
            options.size
        );
        std::process::exit(1);
    }

    if let Err(e) = run(&options) {
        eprintln!("\x1b[91mError: {}\x1b[0m", e);
        std::process::exit(1);
    }
}
