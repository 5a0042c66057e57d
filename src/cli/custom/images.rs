use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::cli::arguments::{ArgumentBundle, Arguments};
use crate::cli::core::images::{log_report, pipeline_options};
use crate::cli::inherit::CustomCommand;
use crate::cli::options::OptionSpec;
use crate::cli::registry::handler;
use crate::core::images::ImagePipeline;
use crate::core::services::{ImagesQuery, SearchClient};
use crate::error::CommandError;
use crate::services::SimpleServices;

pub const NAME: &str = "myimages";

pub fn custom() -> CustomCommand {
    CustomCommand::new(
        "Search images and download them into an existing folder",
        handler(execute),
    )
    .option(OptionSpec::flag("del-duplicates").help("delete byte-identical images after download"))
    .option(OptionSpec::flag("remove-metadata").help("strip metadata from downloaded images with exiftool"))
    .option(
        OptionSpec::directory("folder")
            .required()
            .help("existing folder to download images into"),
    )
}

pub async fn execute(arguments: Arguments, services: Arc<SimpleServices>) -> Result<()> {
    let bundle = ArgumentBundle::for_operation(&arguments, ImagesQuery::PARAMETERS);
    let query: ImagesQuery = bundle.service().deserialize()?;
    let original = bundle.original();

    let folder = original.path("folder")?.ok_or_else(|| CommandError::MissingArgument {
        option: "folder".to_string(),
    })?;

    let mut options = pipeline_options(&services, folder, original)?;
    options.remove_metadata = original.flag("remove_metadata")?;
    options.delete_duplicates = original.flag("del_duplicates")?;
    info!(
        "Downloading '{}' images to {} with {} threads",
        query.keywords,
        options.destination.display(),
        options.threads
    );

    let client = services.create_search_client(original.str("proxy")?)?;
    let report = ImagePipeline::new(services.create_downloader(), options)
        .run(client.images(query))
        .await?;
    log_report(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::core;
    use crate::cli::inherit::inherit_spec;

    #[test]
    fn test_myimages_surface() {
        let source = core::images::spec();
        let custom = custom();
        let spec = inherit_spec(&source, NAME, &custom.about, custom.options);

        let names: Vec<_> = spec.options.iter().map(|o| o.name.as_str()).collect();
        let inherited: Vec<_> = source.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(&names[..inherited.len()], &inherited[..]);
        assert_eq!(
            &names[inherited.len()..],
            &["del_duplicates", "remove_metadata", "folder"]
        );

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().to_str().unwrap();
        let cmd = spec.to_command();
        assert!(cmd
            .clone()
            .try_get_matches_from(["myimages", "-k", "cats", "--th", "3", "--folder", folder])
            .is_ok());
        // --folder is required and must exist
        assert!(cmd.clone().try_get_matches_from(["myimages", "-k", "cats"]).is_err());
        assert!(cmd
            .try_get_matches_from(["myimages", "-k", "cats", "--folder", "/definitely/not/here"])
            .is_err());
    }

    #[test]
    fn test_folder_reaches_pipeline_options() {
        let source = core::images::spec();
        let custom = custom();
        let spec = inherit_spec(&source, NAME, &custom.about, custom.options);
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().to_str().unwrap();

        let matches = spec
            .to_command()
            .try_get_matches_from(["myimages", "-k", "cats", "--folder", folder, "--del-duplicates"])
            .unwrap();
        let arguments = Arguments::from_matches(&spec, &matches);
        let view = arguments.view();

        assert_eq!(view.path("folder").unwrap().as_deref(), Some(dir.path()));
        assert!(view.flag("del_duplicates").unwrap());
        assert!(!view.flag("remove_metadata").unwrap());
    }
}
