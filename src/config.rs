use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;

use crate::weather::OPEN_METEO_BASE_URL;

const PLACEHOLDER_URL: &str = "YOUR_SUPABASE_URL";
const PLACEHOLDER_KEY: &str = "YOUR_SUPABASE_ANON_KEY";

#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub weather_base_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Reads configuration through `get` instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let supabase_url = get("SUPABASE_URL")
            .filter(|v| !v.is_empty() && v != PLACEHOLDER_URL)
            .ok_or_else(|| anyhow!("SUPABASE_URL missing or still set to the placeholder"))?;
        let supabase_anon_key = get("SUPABASE_ANON_KEY")
            .filter(|v| !v.is_empty() && v != PLACEHOLDER_KEY)
            .ok_or_else(|| anyhow!("SUPABASE_ANON_KEY missing or still set to the placeholder"))?;
        let weather_base_url =
            get("OPEN_METEO_BASE_URL").unwrap_or_else(|| OPEN_METEO_BASE_URL.into());

        let data_dir = match get("SIPWISE_DATA_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("app", "sipwise", "sipwise")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| anyhow!("no home directory; set SIPWISE_DATA_DIR"))?,
        };

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            weather_base_url,
            data_dir,
        })
    }
}
