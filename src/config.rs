use crate::synthesis::SynthesisOption;
use anyhow::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FUNCTION_PATH: &str = "/.netlify/functions/tts";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(version, long_version = crate::version::get_version_info())]
pub struct Cli {
    #[clap(long, default_value = "voicecraft.toml")]
    pub conf: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    /// Directory holding the browser front-end.
    pub static_dir: String,
    pub function_path: String,
    /// Paths left out of the access log; a trailing `*` matches by prefix.
    pub access_log_skip: Vec<String>,
    /// Largest request body the function accepts.
    pub max_body_bytes: usize,
    pub synthesis: SynthesisOption,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8888".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            static_dir: "static".to_string(),
            function_path: DEFAULT_FUNCTION_PATH.to_string(),
            access_log_skip: vec!["/static/*".to_string(), "/favicon.ico".to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            synthesis: SynthesisOption::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }
}
