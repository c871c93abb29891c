use anyhow::Error;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub led_count: usize,
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            led_count: 60,
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    /// Read config.ron from the working directory, falling back to the
    /// defaults when the file is absent.
    pub fn load() -> Result<Config, Error> {
        let config: Config = match std::fs::read_to_string("config.ron") {
            Ok(contents) => ron::from_str(&contents)?,
            Err(_) => {
                info!("no config.ron found, using defaults");
                Config::default()
            }
        };

        if config.led_count == 0 {
            anyhow::bail!("led_count must be at least 1");
        }

        Ok(config)
    }
}
