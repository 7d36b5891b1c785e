use argh::FromArgs;
use std::path::PathBuf;

use pano::stitch::{StitchConfig, Stitcher};

/// Stitch an ordered sequence of overlapping photographs into a panorama.
#[derive(FromArgs)]
struct Args {
    /// paths to the images, ordered so that neighbours overlap
    #[argh(positional)]
    images: Vec<PathBuf>,

    /// path to write the panorama to
    #[argh(option, short = 'o', default = "PathBuf::from(\"panorama.png\")")]
    output: PathBuf,

    /// optional JSON file overriding the default stitching parameters
    #[argh(option)]
    config: Option<PathBuf>,

    /// log progress of every stage
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match &args.config {
        Some(path) => StitchConfig::from_json_file(path)?,
        None => StitchConfig::default(),
    };

    if args.images.is_empty() {
        log::warn!("no input images given, nothing to do");
        return Ok(());
    }
    log::info!("stitching {} images", args.images.len());

    let stitcher = Stitcher::from_config(config)?;
    match stitcher.stitch_files(&args.images, &args.output)? {
        Some(size) => println!("Wrote {} panorama to {}", size, args.output.display()),
        None => println!("Nothing to stitch"),
    }

    Ok(())
}
