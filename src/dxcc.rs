//! # DXCC entity list
//!
//! Loaded from the `cty.csv` flavour of the country files, which carries the
//! ADIF DXCC entity number next to every entity.
//!
//! <https://www.country-files.com/cty-dat-format/>

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Instant;

use chumsky::prelude::*;
use patricia_tree::PatriciaMap;
use tinystr::TinyAsciiStr;
use tracing::instrument;

use crate::error::{Error, Result};

/// Designators that say nothing about the location of a station.
const PORTABLE_SUFFIXES: &[&str] = &["P", "M", "A", "QRP"];

/// Maritime and aeronautical mobile stations belong to no entity.
const NO_ENTITY_SUFFIXES: &[&str] = &["MM", "AM"];

type Matches = Vec<(Rc<Entity>, Vec<Override>)>;

/// ADIF DXCC entity number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DxccCode(pub u16);

impl fmt::Display for DxccCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for DxccCode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(DxccCode)
    }
}

#[derive(Debug)]
pub struct DxccList {
    /// All entities in file order, WAE-only entries included
    entities: Vec<Rc<Entity>>,
    /// A trie holding all exact callsigns
    callsign_trie: PatriciaMap<Matches>,
    /// A trie holding all callsign prefixes
    prefix_trie: PatriciaMap<Matches>,
    /// DXCC entities (never WAE-only ones) by entity number
    by_code: HashMap<DxccCode, Rc<Entity>>,
    /// DXCC entities by upper-cased name
    by_name: HashMap<String, Rc<Entity>>,
}

impl DxccList {
    #[instrument(skip(s))]
    pub fn from_str(s: &str) -> Result<DxccList> {
        let ts = Instant::now();

        let records = parser().parse(s).map_err(|errs| {
            tracing::error!("Parse errors found: {:?}", errs);
            Error::CountryFile(describe_errors(s, &errs))
        })?;

        let mut list = DxccList {
            entities: Vec::with_capacity(records.len()),
            callsign_trie: PatriciaMap::new(),
            prefix_trie: PatriciaMap::new(),
            by_code: HashMap::new(),
            by_name: HashMap::new(),
        };

        for (entity, prefixes) in records {
            let entity = Rc::new(entity);
            if !entity.wae {
                list.by_code
                    .entry(entity.code)
                    .or_insert_with(|| entity.clone());
                list.by_name
                    .entry(entity.name.to_ascii_uppercase())
                    .or_insert_with(|| entity.clone());
            }
            for prefix in prefixes {
                let (trie, key, overrides) = match prefix {
                    Prefix::Callsign(callsign, overrides) => {
                        (&mut list.callsign_trie, callsign.to_string(), overrides)
                    }
                    Prefix::Prefix(prefix, overrides) => {
                        (&mut list.prefix_trie, prefix.to_string(), overrides)
                    }
                };
                let key = key.to_ascii_uppercase();
                if let Some(matches) = trie.get_mut(&key) {
                    matches.push((entity.clone(), overrides));
                } else {
                    trie.insert_str(&key, vec![(entity.clone(), overrides)]);
                }
            }
            list.entities.push(entity);
        }

        tracing::debug!(
            elapsed_ms = ts.elapsed().as_millis(),
            "Parsed {} entities. {} exact callsigns found and {} prefixes found.",
            list.entities.len(),
            list.callsign_trie.len(),
            list.prefix_trie.len()
        );

        Ok(list)
    }

    #[instrument(fields(path = %path.as_ref().to_string_lossy()))]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DxccList> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let s = std::str::from_utf8(&bytes).map_err(|source| Error::Utf8 {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(s)
    }

    /// Number of entries in the list, WAE-only entries included.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().map(|e| e.as_ref())
    }

    pub fn by_code(&self, code: DxccCode) -> Option<&Entity> {
        self.by_code.get(&code).map(|e| e.as_ref())
    }

    /// Look up a DXCC entity by its name, ignoring case.
    pub fn by_name(&self, name: &str) -> Option<&Entity> {
        self.by_name
            .get(&name.trim().to_ascii_uppercase())
            .map(|e| e.as_ref())
    }

    /// Exact callsign entry, also tried with portable designators removed.
    fn exact_match(&self, callsign: &str) -> Option<&Matches> {
        if let Some(matches) = self.callsign_trie.get(callsign) {
            return Some(matches);
        }
        let mut base = callsign;
        while let Some((head, suffix)) = base.rsplit_once('/') {
            if !PORTABLE_SUFFIXES.contains(&suffix) {
                break;
            }
            base = head;
        }
        if base.len() == callsign.len() {
            return None;
        }
        self.callsign_trie.get(base)
    }

    /// Find every DXCC entity the callsign may belong to.
    ///
    /// An exact callsign entry always wins. Otherwise the callsign is
    /// normalized (see [normalize_call]) and matched against the longest
    /// known prefix. A prefix shared by several entities yields all of them.
    #[instrument(skip(self))]
    pub fn fuzzy_match(&self, callsign: &str) -> Vec<Entity> {
        let ts = Instant::now();
        let callsign = callsign.trim().to_ascii_uppercase();

        if let Some(matches) = self.exact_match(&callsign) {
            let entities = self.resolve(matches);
            tracing::debug!(
                elapsed_μs = ts.elapsed().as_micros(),
                "Found exact match for callsign {callsign}: {} entities.",
                entities.len()
            );
            return entities;
        }

        let Some(normalized) = normalize_call(&callsign) else {
            tracing::debug!("Callsign {callsign} has no DXCC entity.");
            return Vec::new();
        };

        if let Some((prefix, matches)) = self.prefix_trie.get_longest_common_prefix(&normalized) {
            let entities = self.resolve(matches);
            tracing::debug!(
                elapsed_μs = ts.elapsed().as_micros(),
                "Found prefix match {} for callsign {callsign}: {} entities.",
                String::from_utf8_lossy(prefix),
                entities.len()
            );
            return entities;
        }

        tracing::debug!(
            elapsed_μs = ts.elapsed().as_micros(),
            "Match not found for callsign {callsign}."
        );
        Vec::new()
    }

    pub fn fuzzy_match_codes(&self, callsign: &str) -> Vec<DxccCode> {
        self.fuzzy_match(callsign).iter().map(|e| e.code).collect()
    }

    /// Entity number of the callsign, only if it is unambiguous.
    pub fn fuzzy_match_code(&self, callsign: &str) -> Option<DxccCode> {
        match self.fuzzy_match_codes(callsign).as_slice() {
            [code] => Some(*code),
            _ => None,
        }
    }

    fn resolve(&self, matches: &Matches) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::with_capacity(matches.len());
        for (entity, overrides) in matches {
            if entities.iter().any(|e| e.code == entity.code) {
                continue;
            }
            let mut found = entity.implement_overrides(overrides);
            if found.wae {
                if let Some(dxcc) = self.by_code.get(&found.code) {
                    found.name = dxcc.name.clone();
                    found.primary_prefix = dxcc.primary_prefix;
                    found.wae = false;
                }
            }
            entities.push(found);
        }
        entities
    }
}

/// Single entity from the country file
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Entity name
    pub name: String,
    /// ADIF DXCC entity number
    pub code: DxccCode,
    /// CQ Zone
    pub cq_zone: u8,
    /// ITU Zone
    pub itu_zone: u8,
    /// 2-letter continent abbreviation
    pub continent: TinyAsciiStr<2>,
    /// Latitude in degrees, + for North
    pub latitude: f32,
    /// Longitude in degrees, + for West
    pub longitude: f32,
    /// Local time offset from GMT
    pub time_offset: f32,
    /// Primary prefix
    pub primary_prefix: TinyAsciiStr<8>,
    /// Entry only counts for the CQ WAE list, not for DXCC
    pub wae: bool,
}

impl Entity {
    /// Return new copy of [Entity] after implementing the provided list of [Override]s.
    fn implement_overrides(&self, overrides: &[Override]) -> Entity {
        let mut entity = self.clone();
        for or in overrides {
            match or {
                Override::Continent(continent) => entity.continent = *continent,
                Override::Coordinates(lat, lon) => {
                    entity.latitude = *lat;
                    entity.longitude = *lon;
                }
                Override::CqZone(cq_zone) => entity.cq_zone = *cq_zone,
                Override::ItuZone(itu_zone) => entity.itu_zone = *itu_zone,
                Override::TimeOffset(offset) => entity.time_offset = *offset,
            }
        }
        entity
    }
}

/// A single alias prefix or exact callsign
#[derive(Debug, Clone)]
pub enum Prefix {
    /// A full callsign, must match exactly
    Callsign(TinyAsciiStr<32>, Vec<Override>),
    /// A prefix, the longest one wins
    Prefix(TinyAsciiStr<16>, Vec<Override>),
}

/// Alias prefixes can override some data of their [Entity].
#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    CqZone(u8),
    ItuZone(u8),
    Coordinates(f32, f32),
    Continent(TinyAsciiStr<2>),
    TimeOffset(f32),
}

/// Reduce a callsign to the part that tells its location.
///
/// Returns `None` for maritime and aeronautical mobile stations. Portable
/// designators are dropped, a single digit suffix changes the call area
/// (`K2ND/4` is looked up as `K4ND`) and of two remaining parts the shorter
/// one is taken as the operating prefix (`DL/OE3RSU` is looked up as `DL`).
/// On equal length the first part is kept (`W1AW/KH6X` stays `W1AW`).
pub fn normalize_call(call: &str) -> Option<String> {
    let mut parts = call.split('/').filter(|p| !p.is_empty());
    let base = parts.next()?;

    let mut location = base;
    let mut relocated = false;
    let mut area = None;
    for part in parts {
        if NO_ENTITY_SUFFIXES.contains(&part) {
            return None;
        }
        if PORTABLE_SUFFIXES.contains(&part) {
            continue;
        }
        match part.as_bytes() {
            [digit] if digit.is_ascii_digit() => area = Some(char::from(*digit)),
            _ if part.len() < location.len() => {
                location = part;
                relocated = true;
            }
            _ => {}
        }
    }

    let mut call = location.to_owned();
    if let (Some(area), false) = (area, relocated) {
        change_area(&mut call, area);
    }
    Some(call)
}

/// Replace the last digit of the callsign with the new call area.
fn change_area(call: &mut String, area: char) {
    if let Some(pos) = call.rfind(|c: char| c.is_ascii_digit()) {
        call.replace_range(pos..pos + 1, area.encode_utf8(&mut [0; 4]));
    }
}

fn describe_errors(s: &str, errs: &[Simple<char>]) -> String {
    let Some(first) = errs.first() else {
        return "unknown error".to_owned();
    };
    let offset = first.span().start;
    let line = s.chars().take(offset).filter(|c| *c == '\n').count() + 1;
    let found = first
        .found()
        .map_or_else(|| "end of input".to_owned(), |c| format!("{c:?}"));
    format!("unexpected {found} on line {line} ({} errors)", errs.len())
}

fn tiny<const N: usize>(
    s: &str,
    span: Range<usize>,
) -> std::result::Result<TinyAsciiStr<N>, Simple<char>> {
    TinyAsciiStr::from_str(s).map_err(|e| Simple::custom(span, format!("{e}")))
}

fn parser() -> impl Parser<char, Vec<(Entity, Vec<Prefix>)>, Error = Simple<char>> {
    let not_comma = |c: &char| !c.is_control() && *c != ',';
    let ascii_float = |c: &char| c.is_ascii_digit() || *c == '-' || *c == '+' || *c == '.';
    let prefix_char = |c: &char| c.is_ascii_alphanumeric() || *c == '/';

    let primary_prefix = just('*')
        .or_not()
        .map(|star| star.is_some())
        .then(
            filter(prefix_char)
                .repeated()
                .at_least(1 /* K, F */)
                .labelled("Primary prefix")
                .collect::<String>()
                .try_map(|s, span| tiny::<8>(&s, span)),
        );

    let name = filter(not_comma)
        .repeated()
        .at_least(1)
        .labelled("Entity name")
        .collect::<String>();

    let code = text::digits(10)
        .labelled("DXCC entity number")
        .try_map(|s: String, span| {
            s.parse::<u16>()
                .map(DxccCode)
                .map_err(|e| Simple::custom(span, format!("{e}")))
        });

    let cq_zone = text::digits(10)
        .labelled("CQ zone")
        .try_map(|s: String, span| s.parse::<u8>().map_err(|e| Simple::custom(span, format!("{e}"))));

    let itu_zone = text::digits(10)
        .labelled("ITU zone")
        .try_map(|s: String, span| s.parse::<u8>().map_err(|e| Simple::custom(span, format!("{e}"))));

    let continent = filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .exactly(2)
        .labelled("Continent")
        .collect::<String>()
        .try_map(|s, span| tiny::<2>(&s, span));

    let float = |label: &'static str| {
        filter(ascii_float)
            .repeated()
            .at_least(1)
            .labelled(label)
            .collect::<String>()
            .try_map(|s, span| {
                s.parse::<f32>()
                    .map_err(|e| Simple::custom(span, format!("{e}")))
            })
    };

    let prefix_list = {
        let prefix = filter(prefix_char)
            .repeated()
            .at_least(1)
            .labelled("DXCC Prefix")
            .collect::<String>();

        // The following special characters can be applied after an alias prefix:
        // (#)      Override CQ Zone
        // [#]      Override ITU Zone
        // <#/#>    Override latitude/longitude
        // {aa}     Override Continent
        // ~#~      Override local time offset from GMT
        let over_ride = cq_zone
            .clone()
            .delimited_by(just('('), just(')'))
            .map(Override::CqZone)
            .or(itu_zone
                .clone()
                .delimited_by(just('['), just(']'))
                .map(Override::ItuZone))
            .or(continent
                .clone()
                .delimited_by(just('{'), just('}'))
                .map(Override::Continent))
            .or(float("Time offset")
                .delimited_by(just('~'), just('~'))
                .map(Override::TimeOffset))
            .or(float("Latitude")
                .then_ignore(just('/'))
                .then(float("Longitude"))
                .delimited_by(just('<'), just('>'))
                .map(|(lat, lon)| Override::Coordinates(lat, lon)));

        let one_dxcc = just('=')
            .or_not()
            .then(prefix)
            .then(over_ride.repeated())
            .try_map(|((exact, p), o), span: Range<usize>| {
                if exact.is_some() {
                    Ok(Prefix::Callsign(tiny::<32>(&p, span)?, o))
                } else {
                    Ok(Prefix::Prefix(tiny::<16>(&p, span)?, o))
                }
            });

        one_dxcc
            .padded()
            .repeated()
            .at_least(1)
            .then_ignore(just(';'))
    };

    let one_entity = primary_prefix
        .then_ignore(just(','))
        .then(name)
        .then_ignore(just(','))
        .then(code)
        .then_ignore(just(','))
        .then(continent)
        .then_ignore(just(','))
        .then(cq_zone)
        .then_ignore(just(','))
        .then(itu_zone)
        .then_ignore(just(','))
        .then(float("Latitude"))
        .then_ignore(just(','))
        .then(float("Longitude"))
        .then_ignore(just(','))
        .then(float("Time offset"))
        .then_ignore(just(','))
        .then(prefix_list)
        .map(|value| {
            let (value, prefix_list) = value;
            let (value, time_offset) = value;
            let (value, longitude) = value;
            let (value, latitude) = value;
            let (value, itu_zone) = value;
            let (value, cq_zone) = value;
            let (value, continent) = value;
            let (value, code) = value;
            let ((wae, primary_prefix), name) = value;
            let entity = Entity {
                name,
                code,
                cq_zone,
                itu_zone,
                continent,
                latitude,
                longitude,
                time_offset,
                primary_prefix,
                wae,
            };
            (entity, prefix_list)
        });

    one_entity.padded().repeated().then_ignore(end())
}

#[cfg(test)]
pub(crate) const SAMPLE_CTY: &str = "\
OE,Austria,206,EU,15,28,47.33,-13.33,-1.0,OE =OE2022EYOF/7 =OE50URC(14)[28];
*4U1V,Vienna Intl Ctr,206,EU,15,28,48.20,-16.30,-1.0,=4U0R =4U1A =4U1VIC;
DL,Fed. Rep. of Germany,230,EU,14,28,51.00,-10.00,-1.0,DA DB DC DD DF DG DH DJ DK DL DM DN DO DP DQ DR;
OH,Finland,224,EU,15,18,63.78,-27.08,-2.0,OF OG OH OI OJ =OH1AF/LH;
UA,European Russia,054,EU,16,29,53.65,-41.37,-4.0,R U RK0 =R8FF/1;
UA9,Asiatic Russia,015,AS,17,30,55.88,-84.08,-7.0,R0 R8 R9 RK0 UA0 UA8 UA9 =R3AB/9;
K,United States,291,NA,05,08,37.53,91.67,5.0,AA AB AC AD AE AF AG AI AJ AK K N W
    =KH6XX(31)[61]<21.12/157.48>~10.0~;
KH6,Hawaii,110,OC,31,61,21.12,157.48,10.0,AH6 AH7 KH6 KH7 NH6 NH7 WH6 WH7;
";
