use serde::{Deserialize, Serialize};

use crate::{
    disk_storage::{DiskStorageInterface, FileFormat},
    heatmap::GridFold,
};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Config {
    pub alchemy_api_key: Option<String>,
    #[serde(default)]
    pub testnet_mode: bool,
    /// Legacy grid fold where a cell only shows the last day mapped into it
    /// instead of the cell total.
    #[serde(default)]
    pub overwrite_fold: bool,
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
    const FORMAT: FileFormat = FileFormat::TOML;
}

impl Config {
    pub fn alchemy_api_key() -> crate::Result<String> {
        Config::load()?
            .alchemy_api_key
            .ok_or(crate::Error::AlchemyApiKeyNotSet)
    }

    pub fn set_alchemy_api_key(alchemy_api_key: String) -> crate::Result<()> {
        let mut config = Config::load()?;
        config.alchemy_api_key = Some(alchemy_api_key);
        config.save()?;
        Ok(())
    }

    pub fn grid_fold(&self) -> GridFold {
        if self.overwrite_fold {
            GridFold::Overwrite
        } else {
            GridFold::Sum
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn overwrite_flag_selects_fold_mode() {
        let config = Config::default();
        assert_eq!(config.grid_fold(), GridFold::Sum);

        let config = Config {
            overwrite_fold: true,
            ..Default::default()
        };
        assert_eq!(config.grid_fold(), GridFold::Overwrite);
    }
}
