use anyhow::{anyhow, Context, Result};
use clap::Parser;
use env_logger::Env;
use image::ImageReader;
use log::debug;

use menu_deskew::{BicubicRotator, Cli, HoughSegmentDetector, MenuCorrector, Mode};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let options = cli.detection_options().map_err(|e| anyhow!(e))?;
    debug!("Detection options: {:?}", options);

    // Load input image
    let img = ImageReader::open(&cli.input)
        .with_context(|| format!("Failed to open input file: {:?}", cli.input))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read input file: {:?}", cli.input))?
        .decode()
        .with_context(|| format!("Failed to decode image: {:?}", cli.input))?;

    debug!("Loaded image: {:?} ({}x{})", cli.input, img.width(), img.height());

    let corrector = MenuCorrector::new(
        HoughSegmentDetector::new(options),
        BicubicRotator::new(cli.background),
    );

    let result = match cli.mode {
        Mode::Deskew => corrector.deskew(&img),
        Mode::Crop => corrector.crop(&img),
        Mode::Both => corrector.correct(&img),
        Mode::Outline => corrector.outline(&img),
    }
    .with_context(|| format!("Failed to correct image: {:?}", cli.input))?;

    let output_path = cli.output_path();
    result
        .save(&output_path)
        .with_context(|| format!("Failed to save output: {:?}", output_path))?;

    eprintln!("Saved {:?} result: {:?}", cli.mode, output_path);
    eprintln!(
        "Dimensions: {}x{} -> {}x{}",
        img.width(),
        img.height(),
        result.width(),
        result.height()
    );

    Ok(())
}
