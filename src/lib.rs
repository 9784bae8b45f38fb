//! # Worked-before and DXCC lookup for amateur radio callsigns
//!
//! Callsigns are matched against a DXCC country file in `cty.csv` format and
//! checked against the QSOs of an ADIF log.
//!
//! <https://www.country-files.com/cty-dat-format/>

pub mod adif;
pub mod band;
pub mod config;
pub mod dxcc;
mod error;
pub mod report;
pub mod wbf;

pub use config::Config;
pub use dxcc::{DxccCode, DxccList, Entity};
pub use error::{Error, Result};
pub use wbf::{Status, Wbf, WorkedBefore};
