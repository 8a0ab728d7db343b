//! Form encoding for the router's "apply firewall rule" endpoint.

use serde::Serialize;

/// Placeholder device name the router stores next to each filtered MAC; it
/// never surfaces anywhere, it just has to be non-empty.
const DEVICE_NAME: &str = "boogie";

/// Form body for `start_apply2.htm`. The fixed fields select a firewall
/// restart; the `MULTIFILTER_*` fields carry one `>`-joined entry per MAC.
///
/// The endpoint replaces the whole filter list on every apply: a MAC absent
/// from the list becomes unblocked. Blocking one more client therefore means
/// posting the full current blocked set plus the addition, and posting an
/// empty list unblocks everyone.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BlockPayload {
    action_mode: &'static str,
    action_script: &'static str,
    action_wait: &'static str,
    current_page: &'static str,
    next_page: &'static str,
    modified: &'static str,
    #[serde(rename = "MULTIFILTER_ALL")]
    multifilter_all: &'static str,
    #[serde(rename = "MULTIFILTER_DEVICENAME")]
    pub device_names: String,
    #[serde(rename = "MULTIFILTER_ENABLE")]
    pub enable_flags: String,
    #[serde(rename = "MULTIFILTER_MAC")]
    pub macs: String,
    #[serde(rename = "MULTIFILTER_MACFILTER_DAYTIME")]
    pub daytimes: String,
    #[serde(rename = "custom_clientlist")]
    pub client_list: String,
}

impl BlockPayload {
    /// Builds the payload for an ordered MAC list. Order determines the join
    /// order of the accumulator fields, nothing more.
    pub fn for_macs(macs: &[String]) -> Self {
        BlockPayload {
            action_mode: "apply",
            action_script: "restart_firewall",
            action_wait: "5",
            current_page: "ParentalControl.asp",
            next_page: "ParentalControl.asp",
            modified: "0",
            multifilter_all: "1",
            device_names: vec![DEVICE_NAME; macs.len()].join(">"),
            enable_flags: vec!["1"; macs.len()].join(">"),
            macs: macs.join(">"),
            // One "<" per MAC, "><" between entries: "<", "<><", "<><><", ...
            daytimes: vec!["<"; macs.len()].join(">"),
            client_list: macs
                .iter()
                .map(|mac| format!("<{DEVICE_NAME}>{mac}>0>0>>"))
                .collect(),
        }
    }
}
