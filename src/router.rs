use anyhow::Result;
use chrono::{DateTime, Utc};

pub trait Router {
    fn connected_clients(&self) -> Result<Vec<Client>>;
    fn client_connection_statuses(&self) -> Result<Vec<ConnectionSample>>;
    /// The router treats absence from the list as "unblock", so callers must
    /// pass the full set of MACs that should remain blocked, not just additions.
    fn block_clients(&self, macs: &[String]) -> Result<String>;
    fn unblock_all_clients(&self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub name: String,
    pub ip_addr: String,
    pub mac_addr: String,
    pub is_blocked: bool,
}

/// One radio-link observation for a single client, taken from the router's
/// wireless status page. String fields keep the router's native representation,
/// unit suffixes included ("-60dBm", "121.5M").
#[derive(Debug, Clone)]
pub struct ConnectionSample {
    pub mac_addr: String,
    pub rssi: String,
    pub tx_rate: String,
    pub rx_rate: String,
    pub connection_time: String,
    pub sampled_at: DateTime<Utc>,
}

impl ConnectionSample {
    pub fn new(
        mac_addr: &str,
        rssi: &str,
        tx_rate: &str,
        rx_rate: &str,
        connection_time: &str,
    ) -> Self {
        ConnectionSample {
            mac_addr: mac_addr.to_owned(),
            rssi: rssi.to_owned(),
            tx_rate: tx_rate.to_owned(),
            rx_rate: rx_rate.to_owned(),
            connection_time: connection_time.to_owned(),
            sampled_at: Utc::now(),
        }
    }
}

// Two samples with the same readings are the same observation, no matter when
// they were captured.
impl PartialEq for ConnectionSample {
    fn eq(&self, other: &Self) -> bool {
        self.mac_addr == other.mac_addr
            && self.rssi == other.rssi
            && self.tx_rate == other.tx_rate
            && self.rx_rate == other.rx_rate
            && self.connection_time == other.connection_time
    }
}

impl Eq for ConnectionSample {}
