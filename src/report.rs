//! Output lines of the `wbf` command.

use crate::dxcc::Entity;

/// `<callsign>: Entities: <name> (<code>), ...`, the callsign as given.
pub fn entities_line(callsign: &str, entities: &[Entity]) -> String {
    if entities.is_empty() {
        return format!("{callsign}: No DXCC Entities found for this call");
    }
    let entities = entities
        .iter()
        .map(|e| format!("{} ({})", e.name, e.code))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{callsign}: Entities: {entities}")
}

pub fn status_line(status: &str) -> String {
    format!("     WBF-Status: {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dxcc::{DxccList, SAMPLE_CTY};

    #[test]
    fn lines() {
        let list = DxccList::from_str(SAMPLE_CTY).unwrap();
        assert_eq!(
            entities_line("rk0ab", &list.fuzzy_match("rk0ab")),
            "rk0ab: Entities: European Russia (054), Asiatic Russia (015)"
        );
        assert_eq!(
            entities_line("QQ1ABC", &[]),
            "QQ1ABC: No DXCC Entities found for this call"
        );
        assert_eq!(status_line("new call"), "     WBF-Status: new call");
    }
}
