use std::env;

use image::Luma;
use imageops_matte::{MattePipeline, PipelineConfig, Smoother};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args.len() > 5 {
        eprintln!(
            "Usage: {} <input_image> <output_image> [tolerance] [guided|bilateral|none]",
            args[0]
        );
        eprintln!("Example: {} photo.png cutout.png 30 guided", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let mut config = PipelineConfig::default();
    if let Some(tolerance) = args.get(3) {
        config.classifier.tolerance = tolerance.parse().map_err(|_| "Invalid tolerance")?;
    }
    if let Some(smoother) = args.get(4) {
        config.smoother = match smoother.as_str() {
            "guided" => Smoother::default(),
            "bilateral" => Smoother::Bilateral {
                spatial_sigma: 2.0,
                range_sigma: 0.1,
            },
            "none" => Smoother::None,
            other => return Err(format!("Unknown smoother: {other}").into()),
        };
    }

    let image = image::open(input_path)?.into_rgba8();
    println!("Processing {}x{} image", image.width(), image.height());

    let result = MattePipeline::new(config).run(&image)?;

    let opaque = result.alpha.pixels().filter(|Luma([a])| *a == 255).count();
    let partial = result.alpha.pixels().filter(|Luma([a])| *a != 0 && *a != 255).count();
    println!("Foreground pixels: {opaque}, edge pixels: {partial}");

    result.composite(&image)?.save(output_path)?;
    println!("Cutout saved to: {}", output_path);

    Ok(())
}
