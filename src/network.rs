use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    disk_storage::{DiskStorageInterface, FileFormat},
    heatmap::{HeatScale, Rgb},
};

/// Inclusive pair of block heights bounding a query window on a chain.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl BlockRange {
    /// Block numbers go over the wire as 0x-prefixed hex strings.
    pub fn start_hex(&self) -> String {
        format!("0x{:x}", self.start)
    }

    pub fn end_hex(&self) -> String {
        format!("0x{:x}", self.end)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Network {
    pub name: String,
    pub name_alchemy: Option<String>,
    #[serde(default)]
    pub name_aliases: Vec<String>,
    pub chain_id: u32,
    pub symbol: Option<String>,
    #[serde(default)]
    pub is_testnet: bool,
    /// Color endpoints for the heatmap scale, low activity to high activity.
    #[serde(default)]
    pub heat_scale: Option<HeatScale>,
    /// Known calendar-year block windows, keyed by year. Years present here
    /// resolve without calling the block-by-timestamp API.
    #[serde(default)]
    pub block_ranges: BTreeMap<i32, BlockRange>,
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (chain_id: {})", self.name, self.chain_id)
    }
}

impl Network {
    pub fn year_range(&self, year: i32) -> Option<BlockRange> {
        self.block_ranges.get(&year).copied()
    }

    pub fn palette(&self) -> HeatScale {
        self.heat_scale.unwrap_or_default()
    }

    pub fn alchemy_name(&self) -> crate::Result<&str> {
        self.name_alchemy
            .as_deref()
            .ok_or_else(|| crate::Error::AlchemyNameMissing(self.name.clone()))
    }

    pub fn alchemy_rpc(&self) -> crate::Result<String> {
        Ok(format!(
            "https://{}.g.alchemy.com/v2/{}",
            self.alchemy_name()?,
            Config::alchemy_api_key()?
        ))
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .name_alchemy
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
            || self
                .name_aliases
                .iter()
                .any(|n| n.eq_ignore_ascii_case(name))
    }
}

impl FromStr for Network {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkStore::from_name(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NetworkStore {
    pub networks: Vec<Network>,
}

impl DiskStorageInterface for NetworkStore {
    const FILE_NAME: &'static str = "networks";
    const FORMAT: FileFormat = FileFormat::YAML;
}

impl NetworkStore {
    /// Built-in networks overridden by entries from the networks file on
    /// disk, matched by chain id. Disk entries win.
    pub fn load_merged() -> crate::Result<Vec<Network>> {
        let mut networks = default_networks();
        for stored in NetworkStore::load()?.networks {
            if let Some(existing) = networks
                .iter_mut()
                .find(|n| n.chain_id == stored.chain_id)
            {
                *existing = stored;
            } else {
                networks.push(stored);
            }
        }
        networks.sort_by_key(|n| (n.is_testnet, n.chain_id));
        Ok(networks)
    }

    pub fn from_name(name: &str) -> crate::Result<Network> {
        let networks = Self::load_merged()?;
        find_network(&networks, name).ok_or(crate::Error::NetworkNotFound(name.to_string()))
    }

    pub fn from_chain_id(chain_id: u32) -> crate::Result<Network> {
        let networks = Self::load_merged()?;
        networks
            .into_iter()
            .find(|n| n.chain_id == chain_id)
            .ok_or(crate::Error::NetworkNotFound(format!("Chain ID {chain_id}")))
    }
}

pub fn find_network(networks: &[Network], name: &str) -> Option<Network> {
    networks.iter().find(|n| n.matches_name(name)).cloned()
}

fn default_networks() -> Vec<Network> {
    vec![
        Network {
            name: "Mainnet".to_string(),
            name_alchemy: Some("eth-mainnet".to_string()),
            name_aliases: vec!["ETH".to_string(), "Ethereum".to_string()],
            chain_id: 1,
            symbol: Some("ETH".to_string()),
            is_testnet: false,
            heat_scale: Some(HeatScale {
                low: Rgb {
                    r: 0x3c,
                    g: 0x3c,
                    b: 0x3d,
                },
                high: Rgb {
                    r: 0x8c,
                    g: 0x8c,
                    b: 0x8c,
                },
            }),
            block_ranges: BTreeMap::from([(
                2024,
                BlockRange {
                    start: 18908895,
                    end: 21525890,
                },
            )]),
        },
        Network {
            name: "Optimism".to_string(),
            name_alchemy: Some("opt-mainnet".to_string()),
            name_aliases: vec!["OP".to_string()],
            chain_id: 10,
            symbol: Some("ETH".to_string()),
            is_testnet: false,
            heat_scale: Some(HeatScale {
                low: Rgb {
                    r: 0x77,
                    g: 0x31,
                    b: 0x2f,
                },
                high: Rgb {
                    r: 0xf3,
                    g: 0x3d,
                    b: 0x15,
                },
            }),
            block_ranges: BTreeMap::from([(
                2024,
                BlockRange {
                    start: 114234212,
                    end: 130045411,
                },
            )]),
        },
        Network {
            name: "Arbitrum".to_string(),
            name_alchemy: Some("arb-mainnet".to_string()),
            name_aliases: vec!["ARB".to_string()],
            chain_id: 42161,
            symbol: Some("ArbETH".to_string()),
            is_testnet: false,
            heat_scale: Some(HeatScale {
                low: Rgb {
                    r: 0x28,
                    g: 0xa0,
                    b: 0xf0,
                },
                high: Rgb {
                    r: 0x1a,
                    g: 0x2b,
                    b: 0x6b,
                },
            }),
            block_ranges: BTreeMap::from([(
                2024,
                BlockRange {
                    start: 0,
                    end: 290687172,
                },
            )]),
        },
    ]
}
