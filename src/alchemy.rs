use alloy::primitives::Address;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use url::Url;

use crate::{
    config::Config,
    network::{BlockRange, Network},
    serde::{SerdeResponseParse, SerdeResponseParseAsync},
    traits::{BlockLookup, TransferSource},
};

/// Classification of a value-moving event, as named by the Alchemy transfers
/// API. `External` is a native currency transfer.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransferCategory {
    External,
    Erc20,
    Erc721,
    Erc1155,
}

impl TransferCategory {
    pub fn all() -> Vec<TransferCategory> {
        TransferCategory::iter().collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// Parameter object for `alchemy_getAssetTransfers`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuery {
    pub from_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<String>,
    pub from_address: Address,
    pub category: Vec<TransferCategory>,
    pub with_metadata: bool,
    pub order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

impl TransferQuery {
    /// Query covering a resolved block window in ascending chronological
    /// order, both endpoints inclusive.
    pub fn year_window(
        range: &BlockRange,
        from_address: Address,
        category: Vec<TransferCategory>,
    ) -> Self {
        Self {
            from_block: range.start_hex(),
            to_block: Some(range.end_hex()),
            from_address,
            category,
            with_metadata: true,
            order: SortOrder::Ascending,
            page_key: None,
        }
    }

    pub fn with_page_key(&self, page_key: Option<String>) -> Self {
        Self {
            page_key,
            ..self.clone()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransferMetadata {
    pub block_timestamp: String,
}

/// One value-transfer event from the transfers API.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    /// Block number as a 0x-prefixed hex string.
    pub block_num: String,
    pub hash: Option<String>,
    pub from: Address,
    pub to: Option<Address>,
    pub value: Option<f64>,
    pub asset: Option<String>,
    pub category: TransferCategory,
    #[serde(default)]
    pub metadata: Option<TransferMetadata>,
}

impl AssetTransfer {
    /// Block timestamp of the transfer, if the record carries a parsable one.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .as_ref()
            .and_then(|m| DateTime::parse_from_rfc3339(&m.block_timestamp).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransfersPage {
    pub transfers: Vec<AssetTransfer>,
    #[serde(default)]
    pub page_key: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupDirection {
    #[serde(rename = "BEFORE")]
    Before,
    #[serde(rename = "AFTER")]
    After,
}

/// A block number paired with its actual timestamp.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BlockStamp {
    pub number: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
struct BlockByTimestampResponse {
    data: Vec<BlockMatch>,
}

#[derive(Deserialize, Debug)]
struct BlockMatch {
    #[allow(dead_code)]
    network: String,
    block: BlockStamp,
}

pub struct Alchemy;

impl Alchemy {
    // TODO accept the api key as a parameter so callers can scope credentials
    // per request instead of reading the global config on every call
    pub fn api_key() -> crate::Result<String> {
        Config::alchemy_api_key()
    }

    async fn rpc(network: &Network, method: &str, params: Value) -> crate::Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let client = Client::new();
        let response = client
            .post(network.alchemy_rpc()?)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(crate::Error::AlchemyRpc(err.to_string()));
        }

        response
            .get("result")
            .cloned()
            .ok_or(crate::Error::AlchemyResponse("'result' not present"))
    }
}

impl TransferSource for Alchemy {
    // docs: https://docs.alchemy.com/reference/alchemy-getassettransfers
    async fn transfers_page(
        &self,
        network: &Network,
        query: &TransferQuery,
    ) -> crate::Result<TransfersPage> {
        let result = Self::rpc(network, "alchemy_getAssetTransfers", json!([query])).await?;
        result.serde_parse_custom()
    }
}

impl BlockLookup for Alchemy {
    // docs: https://docs.alchemy.com/reference/get-block-by-timestamp
    async fn block_by_timestamp(
        &self,
        network: &Network,
        timestamp: DateTime<Utc>,
        direction: LookupDirection,
    ) -> crate::Result<BlockStamp> {
        let api_key = Self::api_key()?;
        let url = format!(
            "https://api.g.alchemy.com/data/v1/{api_key}/utility/blocks/by-timestamp\
             ?networks={networks}&timestamp={timestamp}&direction={direction}",
            networks = network.alchemy_name()?,
            timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            direction = serde_plain::to_string(&direction)
                .map_err(|_| crate::Error::AlchemyResponse("direction not serializable"))?,
        );
        let url = Url::parse(&url).map_err(|e| crate::Error::UrlParsingFailed(url, e))?;

        let client = Client::new();
        let response: BlockByTimestampResponse = client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .serde_parse_custom()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|m| m.block)
            .ok_or(crate::Error::AlchemyResponse("no block match for timestamp"))
    }
}
