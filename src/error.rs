use std::path::PathBuf;

use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Alchemy API key not set in config, please set it.")]
    AlchemyApiKeyNotSet,

    #[error("Network not found: {0}.")]
    NetworkNotFound(String),

    #[error("Network '{0}' has no Alchemy name, cannot query the Alchemy API for it.")]
    AlchemyNameMissing(String),

    #[error("Address '{0}' is not a valid Ethereum address.")]
    InvalidAddress(String),

    #[error("Unknown transfer category '{0}', expected external, erc20, erc721 or erc1155.")]
    UnknownCategory(String),

    #[error("Year {0} is not a valid calendar year.")]
    InvalidYear(i32),

    #[error("Color '{0}' is not a valid #rrggbb hex color.")]
    InvalidColor(String),

    #[error("Could not resolve block range for {network} in {year}.")]
    RangeUnavailable {
        network: String,
        year: i32,
        #[source]
        source: Box<Error>,
    },

    #[error("Transfer history fetch failed on page {page}, discarding partial data.")]
    SourceUnavailable {
        page: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Transfer pagination exceeded {limit} pages, the upstream cursor never terminated.")]
    TooManyPages { limit: usize },

    #[error("Failed to parse Alchemy response: {0}.")]
    AlchemyResponse(&'static str),

    #[error("Alchemy RPC error: {0}.")]
    AlchemyRpc(String),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdePathToError(#[from] serde_path_to_error::Error<serde_json::Error>),

    #[error("Failed to parse JSON value: {0:?}. (Error: {1:?})")]
    SerdeJsonValueParseFailed(Value, serde_json::Error),

    #[error("Failed to parse URL: {0}. (Error: {1:?})")]
    UrlParsingFailed(String, url::ParseError),

    #[error("Failed to get base directories.")]
    BaseDirsFailed,

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Parsing the toml file failed: {0}. (Error: {1:?})")]
    TomlParsingFailed(PathBuf, toml::de::Error),

    #[error("Formatting to toml format failed: {0}. (Error: {1:?})")]
    TomlFormattingFailed(String, toml::ser::Error),

    #[error("Parsing the yaml file failed: {0}. (Error: {1:?})")]
    YamlParsingFailed(PathBuf, serde_yaml::Error),

    #[error("Formatting to yaml format failed: {0}. (Error: {1:?})")]
    YamlFormattingFailed(String, serde_yaml::Error),
}
