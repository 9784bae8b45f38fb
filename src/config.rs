use std::path::PathBuf;

pub const DEFAULT_CTY_FILE: &str = "cty.csv";
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Where the worked-before data comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Country file in `cty.csv` format
    pub cty: PathBuf,
    /// ADIF log, without one nothing has been worked
    pub adif: Option<PathBuf>,
    /// Encoding label of the ADIF log
    pub encoding: String,
    /// Trust the DXCC, COUNTRY and COUNTRY_INTL fields of logged QSOs
    pub use_dxcc: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cty: PathBuf::from(DEFAULT_CTY_FILE),
            adif: None,
            encoding: DEFAULT_ENCODING.to_owned(),
            use_dxcc: false,
        }
    }
}
