//! G.988 attribute decoders.
//!
//! Each decoder turns the raw scalar of one MIB attribute into dump lines for
//! the inspector. A value that does not decode yields `None` and the
//! attribute keeps its plain rendering.

use netgraph::decode::{hex_to_ascii, hex_to_bytes, word_bits};
use netgraph::model::FieldDecoder;

/* ------------------------------------------------------------------------- */
/* Numbers                                                                   */
/* ------------------------------------------------------------------------- */

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Rates given in bytes per second.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesPerSecond;

impl FieldDecoder for BytesPerSecond {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        let bytes: i64 = raw.trim().parse().ok()?;
        Some(vec![
            format!("{bytes} byte/s"),
            format!("{} bit/s", bytes.saturating_mul(8)),
        ])
    }
}

/// Two ASCII characters packed big-endian into a 16-bit code.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorProductCode;

impl FieldDecoder for VendorProductCode {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        let code = netgraph::model::canonical_int(raw.trim())?;
        let text = if code == 0 {
            "NOT_SET".to_string()
        } else {
            let hi = ((code >> 8) & 0xff) as u8;
            let lo = (code & 0xff) as u8;
            format!("STR: \"{}{}\"", char::from(hi), char::from(lo))
        };
        Some(vec![text, format!("HEX: 0x{:04x}", code & 0xffff)])
    }
}

/// Eight hex bytes: a four character vendor id and a four byte serial.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialNumber;

impl FieldDecoder for SerialNumber {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.is_ascii() {
            return None;
        }
        let (vendor, serial) = raw.split_at(raw.len().min(8));
        Some(vec![
            format!("Hex(8): {}-{}", vendor.to_uppercase(), serial.to_uppercase()),
            format!("STR(4)+HEX(4): \"{}{}\"", hex_to_ascii(vendor), serial.to_uppercase()),
            format!("STR(8): \"{}\"", hex_to_ascii(raw)),
        ])
    }
}

/* ------------------------------------------------------------------------- */
/* Bridging                                                                  */
/* ------------------------------------------------------------------------- */

const DOWNSTREAM_MODE: [&str; 9] = [
    "0 INVERSE",
    "1 TRANSPARENT",
    "2 FILTER_VLAN_PBIT_INVERSE_OR_FORWARD",
    "3 FILTER_VLAN_INVERSE_OR_FORWARD",
    "4 FILTER_PBIT_INVERSE_OR_FORWARD",
    "5 FILTER_VLAN_PBIT_INVERSE_OR_DROP",
    "6 FILTER_VLAN_INVERSE_OR_DROP",
    "7 FILTER_PBIT_INVERSE_OR_DROP",
    "8 DROP",
];

/// Extended VLAN tagging downstream mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtVlanDownstreamMode;

impl FieldDecoder for ExtVlanDownstreamMode {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        let mode = usize::try_from(parse_number(raw)?).ok()?;
        DOWNSTREAM_MODE.get(mode).map(|m| vec![m.to_string()])
    }
}

/// Up to twelve 16-bit TCI entries; all-zero entries are unused.
#[derive(Debug, Clone, Copy, Default)]
pub struct VlanFilterList;

impl FieldDecoder for VlanFilterList {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        if raw.trim().is_empty() {
            return Some(vec!["<Empty>".to_string()]);
        }
        let bytes = hex_to_bytes(raw)?;
        let lines: Vec<String> = bytes
            .chunks(2)
            .map(|pair| (u16::from(pair[0]) << 8) | u16::from(pair.get(1).copied().unwrap_or(0)))
            .filter(|tci| *tci != 0)
            .map(|tci| {
                format!(
                    "0x{tci:04x}: VID {}, PBIT {}, CFI {}",
                    tci & 0x0fff,
                    tci >> 13,
                    (tci >> 12) & 0x1
                )
            })
            .collect();
        if lines.is_empty() {
            return Some(vec!["<Empty>".to_string()]);
        }
        Some(lines)
    }
}

/// (mode, tagged action, untagged action)
const FORWARD_OPTION: [(&str, &str, &str); 34] = [
    ("0x00", "Bridging (a) (no investigation)", "Bridging (a)"),
    ("0x01", "Discarding (c)", "Bridging (a)"),
    ("0x02", "Bridging (a) (no investigation)", "Discarding (c)"),
    ("0x03", "Action (h) (VID investigation)", "Bridging (a)"),
    ("0x04", "Action (h) (VID investigation)", "Discarding (c)"),
    ("0x05", "Action (g) (VID investigation)", "Bridging (a)"),
    ("0x06", "Action (g) (VID investigation)", "Discarding (c)"),
    ("0x07", "Action (h) (user priority investigation)", "Bridging (a)"),
    ("0x08", "Action (h) (user priority investigation)", "Discarding (c)"),
    ("0x09", "Action (g) (user priority investigation)", "Bridging (a)"),
    ("0x0A", "Action (g) (user priority investigation)", "Discarding (c)"),
    ("0x0B", "Action (h) (TCI investigation)", "Bridging (a)"),
    ("0x0C", "Action (h) (TCI investigation)", "Discarding (c)"),
    ("0x0D", "Action (g) (TCI investigation)", "Bridging (a)"),
    ("0x0E", "Action (g) (TCI investigation)", "Discarding (c)"),
    ("0x0F", "Action (h) (VID investigation)", "Bridging (a)"),
    ("0x10", "Action (h) (VID investigation)", "Discarding (c)"),
    ("0x11", "Action (h) (user priority investigation)", "Bridging (a)"),
    ("0x12", "Action (h) (user priority investigation)", "Discarding (c)"),
    ("0x13", "Action (h) (TCI investigation)", "Bridging (a)"),
    ("0x14", "Action (h) (TCI investigation)", "Discarding (c)"),
    ("0x15", "Bridging (a) (no investigation)", "Discarding (c)"),
    ("0x16", "Action (j) (VID investigation)", "Bridging (a)"),
    ("0x17", "Action (j) (VID investigation)", "Discarding (c)"),
    ("0x18", "Action (j) (user priority investigation)", "Bridging (a)"),
    ("0x19", "Action (j) (user priority investigation)", "Discarding (c)"),
    ("0x1A", "Action (j) (TCI investigation)", "Bridging (a)"),
    ("0x1B", "Action (j) (TCI investigation)", "Discarding (c)"),
    ("0x1C", "Action (h) (VID investigation)", "Bridging (a)"),
    ("0x1D", "Action (h) (VID investigation)", "Discarding (c)"),
    ("0x1E", "Action (h) (user priority investigation)", "Bridging (a)"),
    ("0x1F", "Action (h) (user priority investigation)", "Discarding (c)"),
    ("0x20", "Action (h) (TCI investigation)", "Bridging (a)"),
    ("0x21", "Action (h) (TCI investigation)", "Discarding (c)"),
];

const FORWARD_ACTIONS: [(&str, &str); 5] = [
    ("(a)", "Bridging (a) Basic MAC bridge operation"),
    ("(c)", "Discarding (c) Unconditional discarding"),
    ("(g)", "Action (g) Negative filtering by TCI"),
    ("(h)", "Action (h) Bidirectional positive filtering by TCI"),
    ("(j)", "Action (j) Positive filtering by TCI and DA"),
];

/// VLAN tagging filter forward operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardOption;

impl FieldDecoder for ForwardOption {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        let mode = usize::try_from(parse_number(raw)?).ok()?;
        let (code, tagged, untagged) = FORWARD_OPTION.get(mode)?;

        let mut lines = vec![format!("Mode: {code}")];
        for (prefix, action) in [("Tagged: ", tagged), ("Untagged: ", untagged)] {
            lines.push(format!("{prefix}{action}"));
            if let Some((_, meaning)) = FORWARD_ACTIONS.iter().find(|(tag, _)| action.contains(tag)) {
                lines.push(format!("{prefix}{meaning}"));
            }
        }
        Some(lines)
    }
}

/* ------------------------------------------------------------------------- */
/* VLAN tagging operation table                                              */
/* ------------------------------------------------------------------------- */

const FILTER_PRIO_MAX: u32 = 7;
const FILTER_PRIO_DEFAULT: u32 = 14;
const FILTER_IGNORE: u32 = 15;
const FILTER_VID_NONE: u32 = 4096;
const FILTER_TPID_DEI_NONE: u32 = 0;
const FILTER_ETHER_NONE: u32 = 0;

const TREATMENT_REMOVE_NONE: u32 = 0;
const TREATMENT_PRIO_MAX: u32 = 7;
const TREATMENT_PRIO_DONT_ADD: u32 = 15;
const TREATMENT_VID_COPY_FROM_INNER: u32 = 4096;

const FILTER_TPID_DEI: [&str; 8] = [
    "-",
    "Reserved (1)",
    "Reserved (2)",
    "Reserved (3)",
    "TPID=0x8100",
    "TPID=input",
    "TPID=input, DEI=0",
    "TPID=input, DEI=1",
];

const FILTER_ETHERTYPE: [&str; 6] = [
    "-",
    "0x0800 (IPOE)",
    "0x8863 (PPPOE)",
    "0x0806 (ARP)",
    "0x86DD (IPv6)",
    "0x8864 (PPPOE_2)",
];

const TREATMENT_TAG_REMOVE: [&str; 4] = ["no remove", "remove outer", "remove both", "discard frame"];

/// Treatment priorities 8..=14.
const TREATMENT_PRIO: [&str; 7] = [
    "copy from inner",
    "copy from outer",
    "DSCP",
    "Reserved (11)",
    "Reserved (12)",
    "Reserved (13)",
    "Reserved (14)",
];

const TREATMENT_VID: [&str; 2] = ["copy from inner", "copy from outer"];

const TREATMENT_TPID_DEI: [&str; 8] = [
    "copy TPID/DEI from inner",
    "copy TPID/DEI from outer",
    "TPID=output, DEI=copy from inner",
    "TPID=output, DEI=copy from outer",
    "TPDI=0x8100",
    "Reserved (5)",
    "TPID=output, DEI=0",
    "TPID=output, DEI=1",
];

fn name_of(table: &[&str], index: u32) -> String {
    table
        .get(index as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Reserved ({index})"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagFilter {
    prio: u32,
    vid: u32,
    tpid_dei: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagTreatment {
    prio: u32,
    vid: u32,
    tpid_dei: u32,
}

/// One 16-byte row of the received frame VLAN tagging operation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanTaggingRule {
    filter_outer: TagFilter,
    filter_inner: TagFilter,
    filter_ethertype: u32,
    tags_to_remove: u32,
    treatment_outer: TagTreatment,
    treatment_inner: TagTreatment,
}

impl VlanTaggingRule {
    /// Words are numbered 0..=3 here, 1..=4 in G.988.
    pub fn parse(hex: &str) -> Option<Self> {
        let bytes = hex_to_bytes(hex)?;
        let bits = |word, start, end| word_bits(&bytes, 4, word, start, end);

        let filter = |word| -> Option<TagFilter> {
            Some(TagFilter {
                prio: bits(word, 28, 31)?,
                vid: bits(word, 15, 27)?,
                tpid_dei: bits(word, 12, 14)?,
            })
        };
        let treatment = |word| -> Option<TagTreatment> {
            Some(TagTreatment {
                prio: bits(word, 16, 19)?,
                vid: bits(word, 3, 15)?,
                tpid_dei: bits(word, 0, 2)?,
            })
        };

        Some(Self {
            filter_outer: filter(0)?,
            filter_inner: filter(1)?,
            filter_ethertype: bits(1, 0, 3)?,
            tags_to_remove: bits(2, 30, 31)?,
            treatment_outer: treatment(2)?,
            treatment_inner: treatment(3)?,
        })
    }

    pub fn tag_count(&self) -> u8 {
        match (self.filter_outer.prio, self.filter_inner.prio) {
            (outer, inner) if outer != FILTER_IGNORE && inner != FILTER_IGNORE => 2,
            (_, inner) if inner != FILTER_IGNORE => 1,
            _ => 0,
        }
    }

    pub fn dump(&self) -> Vec<String> {
        let mut lines = vec![format!("<{}-tag>", self.tag_count())];

        for (which, filter, default_rule) in [
            ("outer", &self.filter_outer, "<Default 2-tag rule>"),
            ("inner", &self.filter_inner, "<Default 1-tag rule>"),
        ] {
            if filter.prio == FILTER_IGNORE {
                continue;
            }
            if filter.prio <= FILTER_PRIO_MAX {
                lines.push(format!("<Filter><{which}> Priority: {}", filter.prio));
            } else if filter.prio == FILTER_PRIO_DEFAULT {
                lines.push(default_rule.to_string());
            }
            if filter.vid != FILTER_VID_NONE {
                lines.push(format!("<Filter><{which}> VID: {}", filter.vid));
            }
            if filter.tpid_dei != FILTER_TPID_DEI_NONE {
                lines.push(format!(
                    "<Filter><{which}> TPID/DEI: {} ({})",
                    name_of(&FILTER_TPID_DEI, filter.tpid_dei),
                    filter.tpid_dei
                ));
            }
        }

        if self.filter_ethertype != FILTER_ETHER_NONE {
            lines.push(format!(
                "<Filter> Ethertype: {} (0x{:x})",
                name_of(&FILTER_ETHERTYPE, self.filter_ethertype),
                self.filter_ethertype
            ));
        }
        if self.tags_to_remove != TREATMENT_REMOVE_NONE {
            lines.push(format!(
                "<Treatment> Tag treatment: {} ({})",
                name_of(&TREATMENT_TAG_REMOVE, self.tags_to_remove),
                self.tags_to_remove
            ));
        }

        for (which, treatment) in [("outer", &self.treatment_outer), ("inner", &self.treatment_inner)] {
            if treatment.prio == TREATMENT_PRIO_DONT_ADD {
                continue;
            }
            let prio = if treatment.prio <= TREATMENT_PRIO_MAX {
                treatment.prio.to_string()
            } else {
                name_of(&TREATMENT_PRIO, treatment.prio - TREATMENT_PRIO_MAX - 1)
            };
            let vid = if treatment.vid < TREATMENT_VID_COPY_FROM_INNER {
                treatment.vid.to_string()
            } else {
                name_of(&TREATMENT_VID, treatment.vid - TREATMENT_VID_COPY_FROM_INNER)
            };
            lines.push(format!("<Treatment><{which}> Priority: {prio}"));
            lines.push(format!("<Treatment><{which}> VID: {vid}"));
            lines.push(format!(
                "<Treatment><{which}> TPID/DEI: {} ({})",
                name_of(&TREATMENT_TPID_DEI, treatment.tpid_dei),
                treatment.tpid_dei
            ));
        }
        lines
    }
}

/// Row decoder for [`VlanTaggingRule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VlanTaggingBehaviour;

impl FieldDecoder for VlanTaggingBehaviour {
    fn decode(&self, raw: &str) -> Option<Vec<String>> {
        VlanTaggingRule::parse(raw).map(|rule| rule.dump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(v: &[&str]) -> Option<Vec<String>> {
        Some(v.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn untagged_rule_with_single_tag_push() {
        // Filter: outer and inner ignored (0xF), no VID, ethertype none.
        // Treatment: no removal, outer not added, inner prio 0 VID 100 TPID 0x8100.
        let row = "F8000000F8000000000F000000000324";
        assert_eq!(
            VlanTaggingBehaviour.decode(row),
            lines(&[
                "<0-tag>",
                "<Treatment><inner> Priority: 0",
                "<Treatment><inner> VID: 100",
                "<Treatment><inner> TPID/DEI: TPDI=0x8100 (4)",
            ])
        );
    }

    #[test]
    fn default_single_tag_rule_and_removal() {
        // Inner filter prio 14 (default rule), remove outer, copy priority and VID from inner.
        let row = "F8000000E8000000400F000000088000";
        let rule = VlanTaggingRule::parse(row).expect("16 bytes");
        assert_eq!(rule.tag_count(), 1);
        let dump = rule.dump();
        assert_eq!(dump[1], "<Default 1-tag rule>");
        assert_eq!(dump[2], "<Treatment> Tag treatment: remove outer (1)");
        assert_eq!(dump[3], "<Treatment><inner> Priority: copy from inner");
        assert_eq!(dump[4], "<Treatment><inner> VID: copy from inner");
    }

    #[test]
    fn short_rows_do_not_decode() {
        assert_eq!(VlanTaggingBehaviour.decode("F8000000"), None);
        assert_eq!(VlanTaggingBehaviour.decode("zz"), None);
    }

    #[test]
    fn serial_number_views() {
        assert_eq!(
            SerialNumber.decode("4252434d12345678"),
            lines(&[
                "Hex(8): 4252434D-12345678",
                "STR(4)+HEX(4): \"BRCM12345678\"",
                "STR(8): \"BRCM\u{12}4Vx\"",
            ])
        );
        assert_eq!(SerialNumber.decode("  "), None);
    }

    #[test]
    fn vendor_product_code_and_rates() {
        assert_eq!(VendorProductCode.decode("16706"), lines(&["STR: \"AB\"", "HEX: 0x4142"]));
        assert_eq!(VendorProductCode.decode("0"), lines(&["NOT_SET", "HEX: 0x0000"]));
        assert_eq!(VendorProductCode.decode("0042"), None);
        assert_eq!(BytesPerSecond.decode("125"), lines(&["125 byte/s", "1000 bit/s"]));
    }

    #[test]
    fn downstream_mode_range() {
        assert_eq!(ExtVlanDownstreamMode.decode("1"), lines(&["1 TRANSPARENT"]));
        assert_eq!(ExtVlanDownstreamMode.decode("9"), None);
        assert_eq!(ExtVlanDownstreamMode.decode("-1"), None);
    }

    #[test]
    fn vlan_filter_list_skips_unused_entries() {
        assert_eq!(
            VlanFilterList.decode("0064000030C8"),
            lines(&["0x0064: VID 100, PBIT 0, CFI 0", "0x30c8: VID 200, PBIT 1, CFI 1"])
        );
        assert_eq!(VlanFilterList.decode("00000000"), lines(&["<Empty>"]));
        assert_eq!(VlanFilterList.decode(""), lines(&["<Empty>"]));
    }

    #[test]
    fn forward_option_explains_both_actions() {
        assert_eq!(
            ForwardOption.decode("16"),
            lines(&[
                "Mode: 0x10",
                "Tagged: Action (h) (VID investigation)",
                "Tagged: Action (h) Bidirectional positive filtering by TCI",
                "Untagged: Discarding (c)",
                "Untagged: Discarding (c) Unconditional discarding",
            ])
        );
        assert_eq!(ForwardOption.decode("0x22"), None);
    }
}
