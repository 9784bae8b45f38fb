//! Command-line arguments of `wbf`.

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use wbf::config::{Config, DEFAULT_CTY_FILE, DEFAULT_ENCODING};

#[derive(Parser, Debug)]
#[command(
    name = "wbf",
    version,
    about = "Look up DXCC entities and worked-before status of callsigns"
)]
pub struct Cli {
    /// Callsigns to look up
    #[arg(required = true, value_name = "CALLSIGN")]
    pub callsign: Vec<String>,

    /// Band to check the worked-before status on
    #[arg(short, long, default_value = "40m")]
    pub band: String,

    /// Use the DXCC, COUNTRY and COUNTRY_INTL fields of logged QSOs
    /// instead of matching the logged call against the DXCC list.
    #[arg(short = 'D', long)]
    pub use_dxcc: bool,

    /// ADIF log with the QSOs worked so far
    #[arg(short, long, env = "WBF_ADIF", value_name = "FILE")]
    pub adif: Option<PathBuf>,

    /// Character encoding of the ADIF log
    #[arg(short, long, env = "WBF_ENCODING", default_value = DEFAULT_ENCODING)]
    pub encoding: String,

    /// DXCC country file in cty.csv format
    #[arg(short, long, env = "WBF_CTY", value_name = "FILE", default_value = DEFAULT_CTY_FILE)]
    pub cty: PathBuf,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            cty: self.cty.clone(),
            adif: self.adif.clone(),
            encoding: self.encoding.clone(),
            use_dxcc: self.use_dxcc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["wbf", "OE3RSU", "DL1AB"]).unwrap();
        assert_eq!(cli.callsign, ["OE3RSU", "DL1AB"]);
        assert_eq!(cli.band, "40m");
        assert!(!cli.use_dxcc);
    }

    #[test]
    fn flags() {
        let cli = Cli::try_parse_from([
            "wbf", "-b", "20m", "-D", "-a", "log.adi", "-e", "latin1", "-c", "my.csv", "K1ABC",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(cli.band, "20m");
        assert!(config.use_dxcc);
        assert_eq!(config.adif, Some(PathBuf::from("log.adi")));
        assert_eq!(config.encoding, "latin1");
        assert_eq!(config.cty, PathBuf::from("my.csv"));
    }

    #[test]
    fn callsign_required() {
        assert!(Cli::try_parse_from(["wbf", "-b", "20m"]).is_err());
    }
}
