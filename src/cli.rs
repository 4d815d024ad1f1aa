use crate::config::load_config;
use crate::layout::{compute_scene_layout, hit_test};
use crate::layout_dump::LayoutDump;
use crate::parser::parse_scene;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "arrowr",
    version,
    about = "Route connectors between boxes and render the result"
)]
pub struct Args {
    /// Scene file (JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,

    /// Report the connector under canvas point X,Y instead of rendering
    #[arg(long = "hit", value_name = "X,Y", value_parser = parse_point)]
    pub hit: Option<(f32, f32)>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    config.render.width = args.width;
    config.render.height = args.height;

    let input = read_input(args.input.as_deref())?;
    let scene = parse_scene(&input)?;
    let layout = compute_scene_layout(&scene, &config.theme, &config.layout);

    if let Some(point) = args.hit {
        match hit_test(&layout, point, config.layout.hit_tolerance) {
            Some(id) => println!("{id}"),
            None => println!("none"),
        }
        return Ok(());
    }

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&scene, &layout, &config.theme, &config.layout, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(&scene, &layout, &config.theme, &config.layout, &config.render);
            write_output_png(&svg, &output, &config.render)?;
        }
        OutputFormat::Json => {
            let json = LayoutDump::from_layout(&layout, &scene).to_json()?;
            match args.output.as_deref() {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    output
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Output path required for {ext} output"))
}

fn parse_point(raw: &str) -> Result<(f32, f32), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{raw}`"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f32>()
            .map_err(|err| format!("invalid coordinate `{value}`: {err}"))
    };
    Ok((parse(x)?, parse(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_point_accepts_pairs() {
        assert_eq!(parse_point("10,20.5"), Ok((10.0, 20.5)));
        assert_eq!(parse_point(" -3 , 4 "), Ok((-3.0, 4.0)));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn args_accept_hit_and_format() {
        let args = Args::try_parse_from(["arrowr", "-i", "scene.json5", "-e", "json", "--hit", "5,6"])
            .unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.hit, Some((5.0, 6.0)));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert_eq!(
            ensure_output(&Some(PathBuf::from("out.png")), "png").unwrap(),
            PathBuf::from("out.png")
        );
    }
}
