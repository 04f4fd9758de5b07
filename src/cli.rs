use std::str::FromStr;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use crate::{
    alchemy::{Alchemy, SortOrder, TransferCategory, TransferQuery},
    config::Config,
    disk_storage::DiskStorageInterface,
    heatmap::{self, GridFold, Heatmap, HeatmapRequest, BACKGROUND},
    network::{Network, NetworkStore},
    traits::TransferSource,
};

/// Top level CLI struct
#[derive(Parser)]
#[command(name = "heatmint")]
#[command(about = "Render a wallet's yearly on-chain activity as a 12x12 heatmap grid")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a year of transfers and print the heatmap grid
    #[command(alias = "hm")]
    Heatmap {
        /// Wallet address; omit to get the empty grid
        address: Option<String>,

        #[arg(long, default_value = "Mainnet")]
        network: Network,

        #[arg(long, default_value_t = 2024)]
        year: i32,

        /// Transfer categories to include, defaults to all of them
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Legacy cell fold where only the last day of a 3-day bucket shows
        #[arg(long)]
        overwrite_fold: bool,
    },

    /// List recent token transfers sent from an address
    #[command(alias = "tx")]
    Transfers {
        address: String,

        #[arg(long, default_value = "Mainnet")]
        network: Network,

        #[arg(long, default_value = "0x0")]
        from_block: String,
    },

    /// Show known networks and their static year windows
    Networks,

    /// Get or set configuration
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(Subcommand)]
enum ConfigActions {
    /// Store the Alchemy API key
    SetAlchemyApiKey { key: String },

    /// Print the current configuration
    Show,
}

impl Cli {
    pub async fn run(self) -> crate::Result<()> {
        match self.command {
            Commands::Heatmap {
                address,
                network,
                year,
                categories,
                overwrite_fold,
            } => {
                let request = HeatmapRequest {
                    address: parse_address(address)?,
                    year,
                    categories: parse_categories(categories)?,
                    fold: if overwrite_fold {
                        GridFold::Overwrite
                    } else {
                        Config::load()?.grid_fold()
                    },
                };
                let heatmap = heatmap::aggregate(&Alchemy, &Alchemy, &network, &request).await?;
                print_heatmap(&network, year, &heatmap);
                Ok(())
            }

            Commands::Transfers {
                address,
                network,
                from_block,
            } => {
                let query = TransferQuery {
                    from_block,
                    to_block: None,
                    from_address: Address::from_str(&address)
                        .map_err(|_| crate::Error::InvalidAddress(address))?,
                    category: vec![
                        TransferCategory::Erc20,
                        TransferCategory::Erc721,
                        TransferCategory::Erc1155,
                    ],
                    with_metadata: false,
                    order: SortOrder::Ascending,
                    page_key: None,
                };
                let page = Alchemy.transfers_page(&network, &query).await?;
                print_transfers(&page.transfers);
                if page.page_key.is_some() {
                    println!("(more transfers available)");
                }
                Ok(())
            }

            Commands::Networks => {
                for network in NetworkStore::load_merged()? {
                    let years = network
                        .block_ranges
                        .keys()
                        .map(|year| year.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    if years.is_empty() {
                        println!("{network}");
                    } else {
                        println!("{network} [static ranges: {years}]");
                    }
                }
                Ok(())
            }

            Commands::Config { action } => match action {
                ConfigActions::SetAlchemyApiKey { key } => {
                    Config::set_alchemy_api_key(key)?;
                    println!("Alchemy API key saved.");
                    Ok(())
                }
                ConfigActions::Show => {
                    println!("{:#?}", Config::load()?);
                    Ok(())
                }
            },
        }
    }
}

fn parse_address(raw: Option<String>) -> crate::Result<Option<Address>> {
    raw.map(|raw| {
        Address::from_str(&raw).map_err(|_| crate::Error::InvalidAddress(raw))
    })
    .transpose()
}

fn parse_categories(raw: Vec<String>) -> crate::Result<Vec<TransferCategory>> {
    if raw.is_empty() {
        return Ok(TransferCategory::all());
    }
    raw.into_iter()
        .map(|s| {
            TransferCategory::from_str(&s).map_err(|_| crate::Error::UnknownCategory(s))
        })
        .collect()
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn print_heatmap(network: &Network, year: i32, heatmap: &Heatmap) {
    println!("{year} activity on {network}");
    println!();
    for (row, counts) in heatmap.grid.rows().iter().enumerate() {
        let cells = counts
            .iter()
            .map(|count| format!("{count:>6}"))
            .collect::<String>();
        println!("{:>3}{cells}", MONTHS[row]);
    }
    println!();
    let colors = &heatmap.colors;
    println!(
        "max count: {}, scale: {} -> {} on {}",
        colors.color_max, colors.scale.low, colors.scale.high, BACKGROUND
    );
}

fn print_transfers(transfers: &[crate::alchemy::AssetTransfer]) {
    println!(
        "{:<10} {:<42} {:<42} {:>16} {}",
        "block", "from", "to", "value", "category"
    );
    for transfer in transfers {
        let to = transfer
            .to
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        let value = match (transfer.value, &transfer.asset) {
            (Some(value), Some(asset)) => format!("{value} {asset}"),
            (Some(value), None) => value.to_string(),
            _ => "-".to_string(),
        };
        println!(
            "{:<10} {:<42} {:<42} {:>16} {}",
            transfer.block_num, transfer.from, to, value, transfer.category
        );
    }
}
