//! Amateur radio bands as named in ADIF.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub name: &'static str,
    /// Lower band edge in MHz
    pub lower_mhz: f64,
    /// Upper band edge in MHz
    pub upper_mhz: f64,
}

const fn band(name: &'static str, lower_mhz: f64, upper_mhz: f64) -> Band {
    Band {
        name,
        lower_mhz,
        upper_mhz,
    }
}

/// ADIF band enumeration, longest wavelength first
pub const BANDS: &[Band] = &[
    band("2190m", 0.1357, 0.1378),
    band("630m", 0.472, 0.479),
    band("560m", 0.501, 0.504),
    band("160m", 1.8, 2.0),
    band("80m", 3.5, 4.0),
    band("60m", 5.06, 5.45),
    band("40m", 7.0, 7.3),
    band("30m", 10.1, 10.15),
    band("20m", 14.0, 14.35),
    band("17m", 18.068, 18.168),
    band("15m", 21.0, 21.45),
    band("12m", 24.89, 24.99),
    band("10m", 28.0, 29.7),
    band("8m", 40.0, 45.0),
    band("6m", 50.0, 54.0),
    band("5m", 54.000001, 69.9),
    band("4m", 70.0, 71.0),
    band("2m", 144.0, 148.0),
    band("1.25m", 222.0, 225.0),
    band("70cm", 420.0, 450.0),
    band("33cm", 902.0, 928.0),
    band("23cm", 1240.0, 1300.0),
    band("13cm", 2300.0, 2450.0),
    band("9cm", 3300.0, 3500.0),
    band("6cm", 5650.0, 5925.0),
    band("3cm", 10000.0, 10500.0),
    band("1.25cm", 24000.0, 24250.0),
    band("6mm", 47000.0, 47200.0),
    band("4mm", 75500.0, 81000.0),
    band("2.5mm", 119980.0, 123000.0),
    band("2mm", 134000.0, 149000.0),
    band("1mm", 241000.0, 250000.0),
    band("submm", 300000.0, 7500000.0),
];

/// Band names are case-insensitive in ADIF, we keep them lower case.
pub fn normalize(band: &str) -> String {
    band.trim().to_ascii_lowercase()
}

pub fn is_known(band: &str) -> bool {
    position(band).is_some()
}

fn position(band: &str) -> Option<usize> {
    let band = normalize(band);
    BANDS.iter().position(|b| b.name == band)
}

/// Name of the band containing the frequency.
pub fn from_frequency(mhz: f64) -> Option<&'static str> {
    BANDS
        .iter()
        .find(|b| (b.lower_mhz..=b.upper_mhz).contains(&mhz))
        .map(|b| b.name)
}

/// Sort key putting known bands in band plan order and unknown ones last.
pub fn sort_key(band: &str) -> (usize, String) {
    (position(band).unwrap_or(BANDS.len()), normalize(band))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_to_band() {
        assert_eq!(from_frequency(7.074), Some("40m"));
        assert_eq!(from_frequency(14.0), Some("20m"));
        assert_eq!(from_frequency(144.174), Some("2m"));
        assert_eq!(from_frequency(432.1), Some("70cm"));
        assert_eq!(from_frequency(9.0), None);
    }

    #[test]
    fn names() {
        assert!(is_known("40M"));
        assert!(is_known(" 70cm "));
        assert!(!is_known("41m"));
        assert_eq!(normalize("20M"), "20m");
    }

    #[test]
    fn ordering() {
        let mut bands = vec!["2m", "foo", "20m", "160m", "40m"];
        bands.sort_by_key(|b| sort_key(b));
        assert_eq!(bands, ["160m", "40m", "20m", "2m", "foo"]);
    }
}
