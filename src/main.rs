mod acquirer;
mod authority;
mod cli;
mod io;
mod logging;
mod manifest;
mod naming;
mod outside;
mod result;
mod run;
mod settings;
mod types;

use clap::Parser;
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::{debug, info};

use crate::{
    acquirer::SegmentAcquirer,
    cli::Args,
    outside::{Ffmpeg, Ytdl},
    run::Runner,
    settings::Settings,
};

fn main() -> Result<()> {
    // Initialize the environment & CLI
    let args = Args::parse();
    logging::init_logging(args.level())?;

    let (config_file, required) = args.config_file();
    let settings = Settings::load(&config_file, required)?;
    debug!("Settings: {settings:?}");

    let wav_root = args.root.join("wav");

    if args.dry_run {
        info!("Dry run, nothing will be downloaded");
        let manifest = manifest::open(&args.manifest)?;
        let summary = Runner::dry_run(wav_root).process(manifest);
        info!("Done: {summary}");
        return Ok(());
    }

    // Nothing can be downloaded without cookies, stop before touching anything
    let authority = run::authorize(&args.root, &settings, dirs::home_dir().as_deref())?;

    let (ytdl, ffmpeg) = load_external_components(&settings)?;

    std::fs::create_dir_all(&wav_root)
        .into_diagnostic()
        .wrap_err("Could not create wav directory")?;
    let manifest = manifest::open(&args.manifest)?;

    let strategies = authority.strategies();
    let acquirer = SegmentAcquirer::new(&ytdl, &ffmpeg, &strategies, args.skip_existing);
    let summary = Runner::new(wav_root, Some(acquirer)).process(manifest);

    info!("All jobs processed: {summary}");
    Ok(())
}

/// Load the external components
fn load_external_components(settings: &Settings) -> Result<(Ytdl, Ffmpeg)> {
    // Checking the programs means running them, do both at once
    std::thread::scope(|scope| -> Result<(Ytdl, Ffmpeg)> {
        let ytdl = scope.spawn(|| {
            Ytdl::new(&settings.ytdl_program, settings.ffmpeg_location.clone())
        });
        let ffmpeg = scope.spawn(|| {
            Ffmpeg::new(
                &settings.ffmpeg_program,
                settings.sample_rate,
                settings.channels,
            )
        });

        let ytdl = ytdl
            .join()
            .map_err(|_| miette!("yt-dlp check panicked"))?
            .map_err(miette::Report::from)
            .wrap_err_with(|| format!("{} is not usable", settings.ytdl_program))?;
        let ffmpeg = ffmpeg
            .join()
            .map_err(|_| miette!("ffmpeg check panicked"))?
            .map_err(miette::Report::from)
            .wrap_err_with(|| format!("{} is not usable", settings.ffmpeg_program))?;

        Ok((ytdl, ffmpeg))
    })
}
