use anyhow::Result;
use chrono::Local;
use futures::TryStreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cli::arguments::{ArgumentBundle, ArgumentView, Arguments};
use crate::cli::options::{CommandSpec, OptionSpec};
use crate::cli::registry::{handler, RegisteredCommand};
use crate::core::images::{ImagePipeline, PipelineOptions, PipelineReport};
use crate::core::services::{ImageResult, ImagesQuery, SearchClient};
use crate::error::CommandError;
use crate::services::SimpleServices;
use crate::utils::output::{run_directory_name, write_records, OutputFormat};

pub const NAME: &str = "images";

pub fn spec() -> CommandSpec {
    CommandSpec::new(NAME, "CLI function to perform a images search using DuckDuckGo API")
        .settings(super::settings())
        .option(super::keywords())
        .option(super::region())
        .option(super::safesearch())
        .option(super::timelimit(&["d", "w", "m", "y"]))
        .option(OptionSpec::choice("size", &["Small", "Medium", "Large", "Wallpaper"]))
        .option(
            OptionSpec::choice(
                "color",
                &[
                    "color", "Monochrome", "Red", "Orange", "Yellow", "Green", "Blue", "Purple", "Pink", "Brown",
                    "Black", "Gray", "Teal", "White",
                ],
            )
            .short('c'),
        )
        .option(
            OptionSpec::choice("type_image", &["photo", "clipart", "gif", "transparent", "line"]).alias("type"),
        )
        .option(OptionSpec::choice("layout", &["Square", "Tall", "Wide"]).short('l'))
        .option(
            OptionSpec::choice(
                "license_image",
                &["any", "Public", "Share", "ShareCommercially", "Modify", "ModifyCommercially"],
            )
            .alias("lic"),
        )
        .option(super::max_results().default_value("90"))
        .option(super::output())
        .option(OptionSpec::flag("download").short('d').help("download images to a new local folder"))
        .option(
            OptionSpec::integer("threads")
                .alias("th")
                .help("download threads, default: 10"),
        )
        .option(super::proxy())
}

pub fn command() -> RegisteredCommand {
    RegisteredCommand::new(spec(), handler(execute))
}

/// Pipeline settings from the invocation arguments, falling back to config
pub fn pipeline_options(
    services: &SimpleServices,
    destination: PathBuf,
    arguments: ArgumentView<'_>,
) -> Result<PipelineOptions> {
    let config = services.config();
    let threads = match arguments.integer("threads")? {
        Some(threads) if threads < 1 => {
            return Err(CommandError::InvalidArgument {
                option: "threads".to_string(),
                reason: format!("must be at least 1, got {}", threads),
            }
            .into())
        }
        Some(threads) => threads as usize,
        None => config.download_threads,
    };

    let mut options = PipelineOptions::new(destination);
    options.threads = threads;
    options.proxy = services.proxy(arguments.str("proxy")?);
    options.exiftool = config.exiftool_path.clone();
    options.delete_unscrubbed = config.delete_unscrubbed;
    Ok(options)
}

pub fn log_report(report: &PipelineReport) {
    info!("Downloaded {} of {} images", report.downloaded.len(), report.submitted);
    if let Some(scrub) = &report.scrub {
        if !scrub.skipped {
            info!(
                "Metadata removed from {} files, {} deleted, {} left as is",
                scrub.scrubbed.len(),
                scrub.removed.len(),
                scrub.kept_unscrubbed.len()
            );
        }
    }
    if let Some(duplicates) = &report.duplicates {
        info!("Removed {} duplicate files", duplicates.len());
    }
}

pub async fn execute(arguments: Arguments, services: Arc<SimpleServices>) -> Result<()> {
    let bundle = ArgumentBundle::for_operation(&arguments, ImagesQuery::PARAMETERS);
    let query: ImagesQuery = bundle.service().deserialize()?;
    let original = bundle.original();
    let client = services.create_search_client(original.str("proxy")?)?;

    if !original.flag("download")? {
        let results: Vec<ImageResult> = client.images(query).try_collect().await?;
        return write_records(
            &results,
            OutputFormat::parse(original.str("output")?),
            &mut std::io::stdout(),
        );
    }

    let destination = PathBuf::from(run_directory_name(NAME, &query.keywords, Local::now()));
    tokio::fs::create_dir_all(&destination).await?;
    info!("Saving images to {}", destination.display());

    let options = pipeline_options(&services, destination, original)?;
    let report = ImagePipeline::new(services.create_downloader(), options)
        .run(client.images(query))
        .await?;
    log_report(&report);
    Ok(())
}
