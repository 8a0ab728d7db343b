//! Pure parsers for the router's undocumented response formats.
//!
//! The router's output is observed to vary between firmware states (zero
//! clients, placeholder pages, missing sections), so every parser here treats
//! absent markers and malformed lines as "no data" and never fails. Transport
//! problems are the caller's concern.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::router::{Client, ConnectionSample};

const BLOCKED_MACS_PREFIX: &str = "time_scheduling_mac";
const CLIENT_LIST_PREFIX: &str = "fromNetworkmapd";
const CLIENT_SEPARATOR: &str = "<0>";
const STATUS_TABLE_MARKER: &str = "idx MAC";
const STATUS_HEADER_MARKER: &str = "Associated Authorized";

/// The client-list endpoint emits percent-encoded pseudo-JavaScript.
/// Undecodable input is parsed as-is; the prefix scan will simply not match.
fn percent_decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Extracts the blocked MAC addresses from an `update_clients.asp` blob.
///
/// The addresses appear as the single-quoted argument of a
/// `time_scheduling_mac('AA:...>BB:...')` call. The router repeats the line
/// when settings were applied more than once; the last occurrence is current.
pub fn parse_blocked_macs(raw: &str) -> Vec<String> {
    let decoded = percent_decode(raw);
    let Some(line) = decoded
        .lines()
        .filter(|line| line.starts_with(BLOCKED_MACS_PREFIX))
        .last()
    else {
        return vec![];
    };
    match quoted_call_argument(line) {
        Some(arg) => arg
            .split('>')
            .filter(|mac| !mac.is_empty())
            .map(str::to_owned)
            .collect(),
        None => vec![],
    }
}

/// Returns the `('...')` argument of a single-argument call, provided it is
/// made of MAC-list characters only and long enough to not be a degenerate
/// empty call.
fn quoted_call_argument(line: &str) -> Option<&str> {
    let start = line.find("('")? + 2;
    let end = start + line[start..].find("')")?;
    let arg = &line[start..end];
    let valid = arg
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b':' || b == b'>');
    (valid && arg.len() >= 2).then_some(arg)
}

/// Extracts (name, ip, mac) triples from an `update_clients.asp` blob.
///
/// Only the first `fromNetworkmapd` line is consulted. It consists of
/// `<0>`-separated entries, each a `>`-delimited field list; anything past
/// the first three fields is router-internal and discarded.
pub fn parse_connected_clients(raw: &str) -> Vec<(String, String, String)> {
    let decoded = percent_decode(raw);
    let Some(line) = decoded
        .lines()
        .find(|line| line.starts_with(CLIENT_LIST_PREFIX))
    else {
        return vec![];
    };
    line.split(CLIENT_SEPARATOR)
        .filter_map(|entry| {
            let fields: Vec<&str> = entry.split('>').collect();
            if fields.len() > 2 {
                Some((
                    fields[0].to_owned(),
                    fields[1].to_owned(),
                    fields[2].to_owned(),
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Builds full client records from one fetched blob, cross-referencing the
/// connected-client list with the blocked-MAC list. Both lists must come from
/// the same snapshot or the blocked flags drift.
pub fn parse_clients(raw: &str) -> Vec<Client> {
    let blocked: HashSet<String> = parse_blocked_macs(raw).into_iter().collect();
    parse_connected_clients(raw)
        .into_iter()
        .map(|(name, ip_addr, mac_addr)| {
            let is_blocked = blocked.contains(&mac_addr);
            Client {
                name,
                ip_addr,
                mac_addr,
                is_blocked,
            }
        })
        .collect()
}

/// Parses the wireless status page (`Main_WStatus_Content.asp`) into one
/// sample per associated client.
///
/// The page embeds a fixed-width text table in its single `<textarea>`. Rows
/// follow a header containing `idx MAC`; a page without that marker is the
/// router's placeholder state and yields no samples. Capture timestamps are
/// assigned here, at parse time.
pub fn parse_connection_status_page(html: &str) -> Vec<ConnectionSample> {
    let Some(table) = textarea_contents(html) else {
        return vec![];
    };
    let Some(marker) = table.find(STATUS_TABLE_MARKER) else {
        return vec![];
    };
    table[marker + STATUS_TABLE_MARKER.len()..]
        .lines()
        .filter(|line| !line.contains(STATUS_HEADER_MARKER))
        .filter_map(parse_status_row)
        .collect()
}

/// Row layout: MAC first, then a firmware-dependent run of flag columns, then
/// RSSI, TX rate, RX rate and connection time as the last four fields.
fn parse_status_row(line: &str) -> Option<ConnectionSample> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }
    let n = fields.len();
    Some(ConnectionSample::new(
        fields[0],
        fields[n - 4],
        fields[n - 3],
        fields[n - 2],
        fields[n - 1],
    ))
}

fn textarea_contents(html: &str) -> Option<&str> {
    let open = html.find("<textarea")?;
    let text_start = open + html[open..].find('>')? + 1;
    let text_end = text_start + html[text_start..].find("</textarea")?;
    Some(&html[text_start..text_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE_BLOCKED: &str = "\
fromNetworkmapd%28%27%3C0%3Eandroid-1964d212bfe2cad%3E192.168.1.96%3E9C%3AD9%3A17%3A85%3A1A%3A5C%3E0%3C0%3Eamazon-e9064d55c%3E192.168.1.198%3EB4%3A7C%3A9C%3AC5%3A50%3A31%3E0%27%29\n\
wl_status%28%29";

    const ONE_BLOCKED: &str = "\
fromNetworkmapd%28%27%3C0%3Eandroid-2cf34b28e2eecd6f%3E192.168.1.116%3EFC%3AC2%3ADE%3A53%3ABA%3A96%3E0%3C0%3ELoganHahsiPhone%3E192.168.1.157%3EA4%3AB8%3A05%3AD8%3A64%3ADD%3E0%27%29\n\
time_scheduling_mac%28%27FC%3AC2%3ADE%3A53%3ABA%3A96%27%29";

    const TWO_BLOCKED: &str = "\
time_scheduling_mac%28%27FC%3AC2%3ADE%3A53%3ABA%3A96%3E68%3A37%3AE9%3A1D%3AA7%3ACE%27%29";

    const STATUS_PAGE: &str = "\
<html><body><textarea class=\"table\" readonly>\n\
Stations List\n\
----------------------------------------\n\
idx MAC               Associated Authorized RSSI PHY NSS Tx rate Rx rate Connect Time\n\
    34:DE:1A:01:A1:E9 Yes        Yes       n 2 -60dBm 121.5M 6.5M 00:01:42\n\
    DC:0B:34:97:C8:69 Yes        Yes       n 1 -69dBm 26M 6.5M 00:06:00\n\
    FC:C2:DE:53:BA:96 Yes        Yes       n 2 -65dBm 1M 24M 01:24:12\n\
</textarea></body></html>";

    const STATUS_PAGE_NO_CLIENTS: &str =
        "<html><body><textarea class=\"table\" readonly>\n\n</textarea></body></html>";

    #[test]
    fn no_blocked_macs() {
        assert!(parse_blocked_macs(NONE_BLOCKED).is_empty());
    }

    #[test]
    fn one_blocked_mac() {
        assert_eq!(parse_blocked_macs(ONE_BLOCKED), vec!["FC:C2:DE:53:BA:96"]);
    }

    #[test]
    fn two_blocked_macs_keep_order() {
        assert_eq!(
            parse_blocked_macs(TWO_BLOCKED),
            vec!["FC:C2:DE:53:BA:96", "68:37:E9:1D:A7:CE"]
        );
    }

    #[test]
    fn last_blocked_macs_line_wins() {
        let raw = format!("{ONE_BLOCKED}\n{TWO_BLOCKED}");
        assert_eq!(
            parse_blocked_macs(&raw),
            vec!["FC:C2:DE:53:BA:96", "68:37:E9:1D:A7:CE"]
        );
    }

    #[test]
    fn degenerate_blocked_macs_call_is_ignored() {
        assert!(parse_blocked_macs("time_scheduling_mac%28%27%27%29").is_empty());
    }

    #[test]
    fn connected_clients_absent_line() {
        assert!(parse_connected_clients("wl_status%28%29").is_empty());
    }

    #[test]
    fn connected_clients_in_source_order() {
        let expected = vec![
            (
                "android-1964d212bfe2cad".to_owned(),
                "192.168.1.96".to_owned(),
                "9C:D9:17:85:1A:5C".to_owned(),
            ),
            (
                "amazon-e9064d55c".to_owned(),
                "192.168.1.198".to_owned(),
                "B4:7C:9C:C5:50:31".to_owned(),
            ),
        ];
        assert_eq!(parse_connected_clients(NONE_BLOCKED), expected);
    }

    #[test]
    fn short_entries_are_skipped() {
        let raw = "fromNetworkmapd%28%27%3C0%3Eonlyname%3E192.168.1.4%3C0%3Ephone%3E192.168.1.5%3E11%3A22%3A33%3A44%3A55%3A66%3E0%27%29";
        assert_eq!(
            parse_connected_clients(raw),
            vec![(
                "phone".to_owned(),
                "192.168.1.5".to_owned(),
                "11:22:33:44:55:66".to_owned()
            )]
        );
    }

    #[test]
    fn clients_empty_blob() {
        assert!(parse_clients("").is_empty());
    }

    #[test]
    fn clients_blocked_flag_set_for_matching_mac() {
        let clients = parse_clients(ONE_BLOCKED);
        assert_eq!(clients.len(), 2);
        let blocked: Vec<&Client> = clients.iter().filter(|c| c.is_blocked).collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].mac_addr, "FC:C2:DE:53:BA:96");
    }

    #[test]
    fn clients_none_blocked() {
        let clients = parse_clients(NONE_BLOCKED);
        let expected = vec![
            Client {
                name: "android-1964d212bfe2cad".to_owned(),
                ip_addr: "192.168.1.96".to_owned(),
                mac_addr: "9C:D9:17:85:1A:5C".to_owned(),
                is_blocked: false,
            },
            Client {
                name: "amazon-e9064d55c".to_owned(),
                ip_addr: "192.168.1.198".to_owned(),
                mac_addr: "B4:7C:9C:C5:50:31".to_owned(),
                is_blocked: false,
            },
        ];
        assert_eq!(clients, expected);
    }

    #[test]
    fn status_page_three_samples() {
        let expected = vec![
            ConnectionSample::new("34:DE:1A:01:A1:E9", "-60dBm", "121.5M", "6.5M", "00:01:42"),
            ConnectionSample::new("DC:0B:34:97:C8:69", "-69dBm", "26M", "6.5M", "00:06:00"),
            ConnectionSample::new("FC:C2:DE:53:BA:96", "-65dBm", "1M", "24M", "01:24:12"),
        ];
        assert_eq!(parse_connection_status_page(STATUS_PAGE), expected);
    }

    #[test]
    fn status_page_without_marker_is_empty() {
        assert!(parse_connection_status_page(STATUS_PAGE_NO_CLIENTS).is_empty());
    }

    #[test]
    fn status_page_without_textarea_is_empty() {
        assert!(parse_connection_status_page("<html><body>booting</body></html>").is_empty());
    }

    #[test]
    fn reparsing_yields_equal_samples() {
        assert_eq!(
            parse_connection_status_page(STATUS_PAGE),
            parse_connection_status_page(STATUS_PAGE)
        );
    }
}
