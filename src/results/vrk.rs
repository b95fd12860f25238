use std::{collections::{BTreeMap, HashMap}, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::{
    config::{ElectionConfig, VrkSource},
    district::{normalize_id_field, slugify, DistrictId},
    election::{DistrictResult, ElectionResults},
};
use super::ResultsProvider;

const VRK_BASE_URL: &str = "https://www.vrk.lt/statiniai/puslapiai/rinkimai/";

/// Text of a JSON scalar (ids are published both as numbers and strings).
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric value of a JSON scalar, accepting decimal commas in text.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Rows of a `{"data": [...]}` document.
fn rows<'a>(doc: &'a Value, url: &str) -> Result<&'a [Value]> {
    doc["data"].as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| anyhow!("[vrk] {url}: missing data array"))
}

/// All rows but the last, which holds the totals line.
fn body_rows(rows: &[Value]) -> &[Value] {
    &rows[..rows.len().saturating_sub(1)]
}

/// Client for the election authority's static JSON results pages.
#[derive(Debug, Clone)]
pub struct VrkClient {
    client: Client,
    base_url: String,
    catalog: BTreeMap<String, ElectionConfig>,
}

impl VrkClient {
    pub fn new(catalog: BTreeMap<String, ElectionConfig>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("districtshift/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, base_url: VRK_BASE_URL.into(), catalog })
    }

    /// Use a different server root (e.g. a mirror).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let body = self.client.get(url).send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned error status"))?
            .text()
            .with_context(|| format!("GET {url}: failed to read body"))?;
        serde_json::from_str(&body).with_context(|| format!("GET {url}: invalid JSON"))
    }

    /// Fetch every district's vote shares, then turnout and voters per
    /// constituency. Turnout pages that fail to load are skipped, leaving
    /// those districts without turnout.
    pub fn fetch(&self, election: &str) -> Result<ElectionResults> {
        let config = self.catalog.get(election)
            .ok_or_else(|| anyhow!("election {election} is not in the catalog"))?;
        let Some(VrkSource { dir, id }) = &config.vrk else {
            bail!("election {election} has no results source configured");
        };
        let base = format!("{}{}", self.base_url, dir);

        let rpl_url = format!("{base}rpl.json");
        let rpl_doc = self.get_json(&rpl_url)?;
        let rpg_url = format!("{base}rpg.json");
        let rpg_doc = self.get_json(&rpg_url)?;

        let rpg_nr = rows(&rpg_doc, &rpg_url)?.iter()
            .filter_map(|rpg| Some((text(&rpg["id"])?, text(&rpg["nr"])?)))
            .collect::<HashMap<_, _>>();

        let mut results = ElectionResults::default();
        let mut by_rpl_id: HashMap<String, DistrictId> = HashMap::new();
        let mut rpg_ids: Vec<String> = Vec::new();

        for rpl in rows(&rpl_doc, &rpl_url)? {
            let (Some(rpl_id), Some(rpg_id), Some(nr), Some(name)) =
                (text(&rpl["id"]), text(&rpl["rpg_id"]), text(&rpl["nr"]), rpl["pav"].as_str())
            else {
                bail!("[vrk] {rpl_url}: malformed district row {rpl}");
            };
            let constituency = rpg_nr.get(&rpg_id)
                .ok_or_else(|| anyhow!("[vrk] unknown constituency {rpg_id} for district {rpl_id}"))?;
            let district = DistrictId::new(&format!(
                "{}:{}:{}", normalize_id_field(constituency), normalize_id_field(&nr), slugify(name)
            ));

            let url = format!("{base}{id}/rezultatai/rezultataiDaugmRpl{rpl_id}.json");
            let doc = self.get_json(&url)?;
            let votes = doc["data"]["balsai"].as_array()
                .ok_or_else(|| anyhow!("[vrk] {url}: missing vote rows"))?;

            let mut result = DistrictResult::default();
            for item in body_rows(votes) {
                let Some(party) = item["partija"].as_str() else { continue };
                let label = config.labels.get(party).cloned().unwrap_or_else(|| party.to_string());
                if let Some(share) = number(&item["proc_nuo_gal_biul"]) {
                    result.votes.insert(label.clone(), share);
                }
                if let Some(share) = number(&item["proc_nuo_gal_biul_lt"]) {
                    results.total.votes.entry(label).or_insert(share);
                }
            }

            tracing::debug!(election, district = %district, parties = result.votes.len(), "district results fetched");
            results.districts.insert(district.clone(), result);
            by_rpl_id.insert(rpl_id, district);
            if !rpg_ids.contains(&rpg_id) { rpg_ids.push(rpg_id) }
        }

        for rpg_id in rpg_ids {
            let url = format!("{base}aktyvumas/aktyvumasRpg{rpg_id}.json");
            let doc = match self.get_json(&url) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!(election, url = %url, error = %err, "turnout fetch failed, skipping");
                    continue;
                }
            };
            let Ok(activity) = rows(&doc, &url) else {
                tracing::warn!(election, url = %url, "turnout page has no data, skipping");
                continue;
            };

            for item in body_rows(activity) {
                let Some(district) = text(&item["rpl_id"]).and_then(|id| by_rpl_id.get(&id)) else { continue };
                if let Some(result) = results.districts.get_mut(district) {
                    result.turnout = number(&item["val_viso"]);
                    result.voters = number(&item["rinkeju_skaicius"]);
                }
            }
        }

        results.recompute_total_turnout();
        tracing::info!(election, districts = results.districts.len(), "results fetched");
        Ok(results)
    }
}

impl ResultsProvider for VrkClient {
    fn results(&self, election: &str) -> Result<ElectionResults> { self.fetch(election) }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalars_parse_from_numbers_and_text() {
        assert_eq!(text(&json!(12)), Some("12".to_string()));
        assert_eq!(text(&json!("12")), Some("12".to_string()));
        assert_eq!(text(&json!(null)), None);
        assert_eq!(number(&json!("45,5")), Some(45.5));
        assert_eq!(number(&json!(3)), Some(3.0));
        assert_eq!(number(&json!("-")), None);
    }

    #[test]
    fn body_rows_drop_the_totals_line() {
        let all = vec![json!(1), json!(2), json!(3)];
        assert_eq!(body_rows(&all), &all[..2]);
        assert!(body_rows(&[]).is_empty());
    }

    #[test]
    fn missing_source_is_an_error() {
        let client = VrkClient::new(BTreeMap::new()).unwrap();
        assert!(client.fetch("2020_LRS").is_err());
    }
}
