pub mod compare;
#[cfg(feature = "download")]
pub mod fetch;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Result;
use districtshift::{Config, JsonResultsProvider, Pipeline, ResultsProvider};

/// Output directory argument, defaulting to the working directory.
fn output_dir(output: &Option<PathBuf>) -> PathBuf {
    output.clone().unwrap_or_else(|| ".".into())
}

/// Results come from local JSON files when a directory is given, otherwise
/// from the election authority.
fn provider(config: &Config, results: Option<&Path>, out_dir: &Path) -> Result<Box<dyn ResultsProvider>> {
    if let Some(dir) = results {
        return Ok(Box::new(JsonResultsProvider::new(dir)));
    }

    #[cfg(feature = "download")]
    {
        let _ = out_dir;
        Ok(Box::new(districtshift::VrkClient::new(config.catalog.clone())?))
    }

    #[cfg(not(feature = "download"))]
    {
        let _ = config;
        Ok(Box::new(JsonResultsProvider::new(out_dir)))
    }
}

/// Load the configuration and build a pipeline writing into `output`.
fn pipeline(config_path: &Path, output: &Option<PathBuf>, results: Option<&Path>) -> Result<Pipeline> {
    let config = Config::from_file(config_path)?;
    let out_dir = output_dir(output);
    let provider = provider(&config, results, &out_dir)?;
    Pipeline::new(config, &out_dir, provider)
}
