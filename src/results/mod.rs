#[cfg(feature = "download")]
mod vrk;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{common, election::ElectionResults};

#[cfg(feature = "download")]
pub use vrk::VrkClient;

/// Source of per-district election results.
pub trait ResultsProvider {
    fn results(&self, election: &str) -> Result<ElectionResults>;
}

/// Reads results from `results_<election>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct JsonResultsProvider {
    dir: PathBuf,
}

impl JsonResultsProvider {
    pub fn new(dir: &Path) -> Self { Self { dir: dir.to_path_buf() } }

    /// Path of the results file of `election`.
    pub fn path(&self, election: &str) -> PathBuf {
        self.dir.join(format!("results_{election}.json"))
    }

    /// Write results in the format this provider reads.
    pub fn save(&self, election: &str, results: &ElectionResults) -> Result<PathBuf> {
        common::ensure_dir_exists(&self.dir)?;
        let path = self.path(election);
        common::write_json(&path, results)?;
        Ok(path)
    }
}

impl ResultsProvider for JsonResultsProvider {
    fn results(&self, election: &str) -> Result<ElectionResults> {
        common::read_json(&self.path(election))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::DistrictResult;

    #[test]
    fn saved_results_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = JsonResultsProvider::new(tmp.path());

        let mut results = ElectionResults::default();
        results.districts.insert("1:1:a".into(), DistrictResult {
            votes: [("LSDP".to_string(), 12.5)].into(),
            turnout: Some(48.1),
            voters: None,
        });
        results.total.turnout = Some(50.0);

        provider.save("2020_LRS", &results).unwrap();
        assert!(provider.path("2020_LRS").ends_with("results_2020_LRS.json"));
        assert_eq!(provider.results("2020_LRS").unwrap(), results);
        assert!(provider.results("2016_LRS").is_err());
    }
}
