//! Worked-before state built from an ADIF log.
//!
//! Calls and DXCC entities are tracked per band and over all bands, a lookup
//! then tells whether a call is new on a band, a new entity, or a dupe.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Instant;

use tracing::instrument;

use crate::adif::{self, Record};
use crate::band;
use crate::config::Config;
use crate::dxcc::{DxccCode, DxccList, Entity};
use crate::error::Result;

/// Worked-before set for one band (or all bands), counting QSOs per item
#[derive(Debug, Clone)]
pub struct Wbf<K> {
    band: String,
    items: HashMap<K, u32>,
}

impl<K: Eq + Hash> Wbf<K> {
    pub fn new(band: impl Into<String>) -> Self {
        Wbf {
            band: band.into(),
            items: HashMap::new(),
        }
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    pub fn add_item(&mut self, item: K) {
        *self.items.entry(item).or_default() += 1;
    }

    /// Number of QSOs logged with the item, `None` if never worked.
    pub fn lookup<Q>(&self, item: &Q) -> Option<u32>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.items.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Worked-before status of a call on a band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Call already logged on this band
    WorkedBefore,
    /// Entity never worked, or entity unknown
    NewDxcc,
    /// Entity worked, but not on this band
    NewDxccOnBand,
    /// Entity worked on this band, call never logged
    NewCall,
    /// Entity worked on this band, call logged on other bands only
    NewCallOnBand,
}

impl Status {
    pub fn is_new(self) -> bool {
        self != Status::WorkedBefore
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::WorkedBefore => "worked before",
            Status::NewDxcc => "new DXCC",
            Status::NewDxccOnBand => "new DXCC on band",
            Status::NewCall => "new call",
            Status::NewCallOnBand => "new call on band",
        })
    }
}

#[derive(Debug)]
pub struct WorkedBefore {
    dxcc: DxccList,
    use_dxcc: bool,
    calls: Wbf<String>,
    calls_by_band: HashMap<String, Wbf<String>>,
    entities: Wbf<DxccCode>,
    entities_by_band: HashMap<String, Wbf<DxccCode>>,
}

impl WorkedBefore {
    /// Empty state: nothing has been worked yet.
    ///
    /// With `use_dxcc` the DXCC, COUNTRY and COUNTRY_INTL fields of a record
    /// decide its entity, otherwise the logged call is matched against the
    /// DXCC list.
    pub fn new(dxcc: DxccList, use_dxcc: bool) -> Self {
        WorkedBefore {
            dxcc,
            use_dxcc,
            calls: Wbf::new("ALL"),
            calls_by_band: HashMap::new(),
            entities: Wbf::new("ALL"),
            entities_by_band: HashMap::new(),
        }
    }

    /// Load the country file and the ADIF log named in the [Config].
    #[instrument(skip_all, fields(cty = %config.cty.display()))]
    pub fn from_config(config: &Config) -> Result<Self> {
        let dxcc = DxccList::from_path(&config.cty)?;
        let mut wbf = WorkedBefore::new(dxcc, config.use_dxcc);
        if let Some(path) = &config.adif {
            let records = adif::read_path(path, &config.encoding)?;
            wbf.extend(&records);
        } else {
            tracing::info!("No ADIF log given, every call is new.");
        }
        Ok(wbf)
    }

    /// Add records, returns how many of them were used.
    pub fn extend<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let ts = Instant::now();
        let mut total = 0;
        let mut added = 0;
        for record in records {
            total += 1;
            if self.add_record(record) {
                added += 1;
            }
        }
        tracing::debug!(
            elapsed_ms = ts.elapsed().as_millis(),
            "Added {added} of {total} records, {} calls and {} entities worked.",
            self.calls.len(),
            self.entities.len()
        );
        added
    }

    /// Add a single QSO. Records without call or band are skipped.
    pub fn add_record(&mut self, record: &Record) -> bool {
        let Some(call) = record.call().map(normalize_call) else {
            tracing::debug!("Skipping record without call: {record:?}");
            return false;
        };
        let Some(band) = record_band(record) else {
            tracing::debug!("Skipping {call}, record has no band.");
            return false;
        };

        let code = self.match_dxcc(&call, record);
        if code.is_none() {
            tracing::debug!("No unique DXCC entity for {call}.");
        }

        self.calls_by_band
            .entry(band.clone())
            .or_insert_with(|| Wbf::new(band.clone()))
            .add_item(call.clone());
        self.calls.add_item(call);

        if let Some(code) = code {
            self.entities_by_band
                .entry(band.clone())
                .or_insert_with(|| Wbf::new(band))
                .add_item(code);
            self.entities.add_item(code);
        }
        true
    }

    fn match_dxcc(&self, call: &str, record: &Record) -> Option<DxccCode> {
        if self.use_dxcc {
            if let Some(dxcc) = record.dxcc() {
                match dxcc.parse::<DxccCode>() {
                    // Entity 0 is for stations outside any DXCC entity
                    Ok(DxccCode(0)) => return None,
                    Ok(code) => return Some(code),
                    Err(err) => tracing::warn!("{call}: bad DXCC field {dxcc:?}: {err}"),
                }
            }
            for name in [record.country(), record.country_intl()].into_iter().flatten() {
                match self.dxcc.by_name(name) {
                    Some(entity) => return Some(entity.code),
                    None => tracing::warn!("{call}: unknown country {name:?}"),
                }
            }
        }
        self.dxcc.fuzzy_match_code(call)
    }

    pub fn dxcc(&self) -> &DxccList {
        &self.dxcc
    }

    /// All DXCC entities the call may belong to.
    pub fn fuzzy_match_dxcc(&self, call: &str) -> Vec<Entity> {
        self.dxcc.fuzzy_match(call)
    }

    /// Bands the call has been logged on, in band plan order.
    pub fn bands_worked(&self, call: &str) -> Vec<&str> {
        let call = normalize_call(call);
        let mut bands: Vec<&str> = self
            .calls_by_band
            .values()
            .filter(|wbf| wbf.lookup(call.as_str()).is_some())
            .map(|wbf| wbf.band())
            .collect();
        bands.sort_by_key(|b| band::sort_key(b));
        bands
    }

    /// Worked-before status of the call on the band.
    ///
    /// A call matching several entities is only considered worked when all
    /// of them have been worked.
    #[instrument(skip(self))]
    pub fn lookup(&self, band: &str, call: &str) -> Status {
        let band = band::normalize(band);
        let call = normalize_call(call);

        if self
            .calls_by_band
            .get(&band)
            .and_then(|w| w.lookup(call.as_str()))
            .is_some()
        {
            return Status::WorkedBefore;
        }

        let codes = self.dxcc.fuzzy_match_codes(&call);
        if codes.is_empty() || !codes.iter().all(|c| self.entities.lookup(c).is_some()) {
            return Status::NewDxcc;
        }

        let entities_on_band = self.entities_by_band.get(&band);
        if !codes
            .iter()
            .all(|c| entities_on_band.and_then(|w| w.lookup(c)).is_some())
        {
            return Status::NewDxccOnBand;
        }

        if self.calls.lookup(call.as_str()).is_some() {
            Status::NewCallOnBand
        } else {
            Status::NewCall
        }
    }

    /// Human readable worked-before status of the call on the band.
    pub fn lookup_verbose(&self, band: &str, call: &str) -> String {
        let status = self.lookup(band, call);
        let band = band::normalize(band);
        match status {
            Status::WorkedBefore => {
                let qsos = self
                    .calls_by_band
                    .get(&band)
                    .and_then(|w| w.lookup(normalize_call(call).as_str()))
                    .unwrap_or_default();
                let plural = if qsos == 1 { "" } else { "s" };
                format!("worked before on {band} ({qsos} QSO{plural})")
            }
            Status::NewDxcc | Status::NewCall => status.to_string(),
            Status::NewDxccOnBand => format!("new DXCC on {band}"),
            Status::NewCallOnBand => format!(
                "new call on {band} (worked on {})",
                self.bands_worked(call).join(", ")
            ),
        }
    }
}

fn normalize_call(call: &str) -> String {
    call.trim().to_ascii_uppercase()
}

fn record_band(record: &Record) -> Option<String> {
    if let Some(band) = record.band() {
        return Some(band::normalize(band));
    }
    record
        .freq()
        .and_then(band::from_frequency)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dxcc::SAMPLE_CTY;

    const LOG: &str = "\
<CALL:6>OE3RSU <BAND:3>40m <EOR>
<CALL:6>OE3RSU <BAND:3>40M <EOR>
<CALL:6>OE1ABC <BAND:3>20m <EOR>
<CALL:5>DL1AB <FREQ:6>14.074 <EOR>
<CALL:5>RK3LG <BAND:3>40m <EOR>
<CALL:5>UA9XX <BAND:3>40m <EOR>
<CALL:6>XX9XXX <BAND:3>15m <DXCC:3>224 <EOR>
<CALL:6>YY9YYY <BAND:3>17m <COUNTRY:7>finland <EOR>
<CALL:6>ZZ1ZZZ <BAND:3>12m <COUNTRY_INTL:7>Austria <EOR>
<CALL:6>DL9ZZZ <BAND:3>10m <DXCC:1>0 <EOR>
<CALL:6>UA9ABC <BAND:2>6m <COUNTRY:7>Nowhere <EOR>
<CALL:5>W1AW/ <EOR>
";

    fn worked_before(use_dxcc: bool) -> WorkedBefore {
        let records = adif::parse(LOG).unwrap();
        let mut wbf = WorkedBefore::new(DxccList::from_str(SAMPLE_CTY).unwrap(), use_dxcc);
        assert_eq!(wbf.extend(&records), 11);
        wbf
    }

    #[test]
    fn wbf_counts() {
        let mut wbf = Wbf::new("40m");
        wbf.add_item("OE3RSU".to_owned());
        wbf.add_item("OE3RSU".to_owned());
        assert_eq!(wbf.band(), "40m");
        assert_eq!(wbf.lookup("OE3RSU"), Some(2));
        assert_eq!(wbf.lookup("OE1ABC"), None);
        assert_eq!(wbf.len(), 1);
    }

    #[test]
    fn statuses() {
        let wbf = worked_before(false);
        assert_eq!(wbf.lookup("40m", "OE3RSU"), Status::WorkedBefore);
        assert_eq!(wbf.lookup("40M", "oe3rsu"), Status::WorkedBefore);
        assert_eq!(wbf.lookup("20m", "OE3RSU"), Status::NewCallOnBand);
        assert_eq!(wbf.lookup("40m", "OE5XYZ"), Status::NewCall);
        assert_eq!(wbf.lookup("40m", "DL2XX"), Status::NewDxccOnBand);
        assert_eq!(wbf.lookup("20m", "DL1AB"), Status::WorkedBefore);
        assert_eq!(wbf.lookup("40m", "OH2BH"), Status::NewDxcc);
        assert_eq!(wbf.lookup("40m", "QQ1ABC"), Status::NewDxcc);
        assert_eq!(wbf.lookup("160m", "OE3RSU"), Status::NewDxccOnBand);
    }

    #[test]
    fn ambiguous_entity_needs_all_worked() {
        let wbf = worked_before(false);
        // RK0 matches both European and Asiatic Russia, both worked on 40m
        assert_eq!(wbf.lookup("40m", "RK0AB"), Status::NewCall);
        assert_eq!(wbf.lookup("20m", "RK0AB"), Status::NewDxccOnBand);
    }

    #[test]
    fn dxcc_fields_only_with_use_dxcc() {
        let wbf = worked_before(false);
        assert_eq!(wbf.lookup("15m", "OH2BH"), Status::NewDxcc);

        let wbf = worked_before(true);
        assert_eq!(wbf.lookup("15m", "OH2BH"), Status::NewCall);
        assert_eq!(wbf.lookup("17m", "OH2BH"), Status::NewCall);
        assert_eq!(wbf.lookup("40m", "OH2BH"), Status::NewDxccOnBand);
    }

    #[test]
    fn log_country_fields() {
        let wbf = worked_before(true);
        // COUNTRY_INTL names the entity when COUNTRY is missing
        assert_eq!(wbf.lookup("12m", "OE1XYZ"), Status::NewCall);
        // DXCC 0 is no entity at all, the call is still worked
        assert_eq!(wbf.lookup("10m", "DL2XX"), Status::NewDxccOnBand);
        assert_eq!(wbf.lookup("10m", "DL9ZZZ"), Status::WorkedBefore);
        // unknown COUNTRY falls back to the callsign
        assert_eq!(wbf.lookup("6m", "UA9XYZ"), Status::NewCall);
        assert_eq!(wbf.lookup("6m", "RK3LG"), Status::NewDxccOnBand);

        let wbf = worked_before(false);
        assert_eq!(wbf.lookup("12m", "OE1XYZ"), Status::NewDxccOnBand);
        assert_eq!(wbf.lookup("10m", "DL2XX"), Status::NewCall);
        assert_eq!(wbf.lookup("6m", "UA9XYZ"), Status::NewCall);
    }

    #[test]
    fn verbose() {
        let wbf = worked_before(false);
        assert_eq!(
            wbf.lookup_verbose("40m", "OE3RSU"),
            "worked before on 40m (2 QSOs)"
        );
        assert_eq!(
            wbf.lookup_verbose("20m", "DL1AB"),
            "worked before on 20m (1 QSO)"
        );
        assert_eq!(
            wbf.lookup_verbose("20M", "OE3RSU"),
            "new call on 20m (worked on 40m)"
        );
        assert_eq!(wbf.lookup_verbose("40m", "DL2XX"), "new DXCC on 40m");
        assert_eq!(wbf.lookup_verbose("40m", "OH2BH"), "new DXCC");
        assert_eq!(wbf.lookup_verbose("40m", "OE5XYZ"), "new call");
    }

    #[test]
    fn bands_in_band_plan_order() {
        let records = adif::parse(
            "<CALL:4>W1AW<BAND:3>20m<EOR><CALL:4>W1AW<BAND:4>160m<EOR><CALL:4>W1AW<BAND:2>2m<EOR>",
        )
        .unwrap();
        let mut wbf = WorkedBefore::new(DxccList::from_str(SAMPLE_CTY).unwrap(), false);
        wbf.extend(&records);
        assert_eq!(wbf.bands_worked("w1aw"), ["160m", "20m", "2m"]);
        assert!(Status::NewCallOnBand.is_new());
        assert!(!Status::WorkedBefore.is_new());
    }

    #[test]
    fn from_config_without_log() {
        let dir = tempfile::tempdir().unwrap();
        let cty = dir.path().join("cty.csv");
        std::fs::write(&cty, SAMPLE_CTY).unwrap();
        let config = Config {
            cty,
            ..Config::default()
        };
        let wbf = WorkedBefore::from_config(&config).unwrap();
        assert_eq!(wbf.dxcc().len(), 8);
        assert_eq!(wbf.lookup("40m", "OE3RSU"), Status::NewDxcc);
        assert_eq!(wbf.fuzzy_match_dxcc("OE3RSU")[0].name, "Austria");
    }
}
