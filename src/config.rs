use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_OWNER_KEY: &str = "admin12345";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/";
pub const DEFAULT_CLIENT_COMPANY: &str = "Agriculture & Forestry";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

const ORDERS_FILE: &str = "master_orders.csv";
const TOKENS_FILE: &str = "tokens.csv";

/// Startup configuration for the dashboard.
///
/// Built once (from flags or environment variables) and handed to the access
/// resolver, the exports and the web server. Nothing reads configuration
/// from global state.
#[derive(Debug, Clone, Parser)]
#[command(about = "Warehouse orders dashboard")]
pub struct Config {
    /// Shared secret that grants owner mode via `?admin=`
    #[arg(long, env = "OWNER_KEY", default_value = DEFAULT_OWNER_KEY)]
    pub owner_key: String,

    /// Public URL used to build shareable token links
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Company label shown on the dashboard and stamped on issued tokens
    #[arg(long, env = "CLIENT_COMPANY", default_value = DEFAULT_CLIENT_COMPANY)]
    pub client_company: String,

    /// Directory holding master_orders.csv
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding tokens.csv
    #[arg(long, env = "TOKEN_DIR", default_value = "tokens")]
    pub token_dir: PathBuf,

    /// Address the web server listens on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Write dashboard edits back to master_orders.csv instead of keeping them in memory
    #[arg(long, env = "PERSIST_EDITS")]
    pub persist_edits: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            owner_key: DEFAULT_OWNER_KEY.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client_company: DEFAULT_CLIENT_COMPANY.to_string(),
            data_dir: PathBuf::from("data"),
            token_dir: PathBuf::from("tokens"),
            bind: DEFAULT_BIND.to_string(),
            persist_edits: false,
        }
    }
}

impl Config {
    pub fn orders_path(&self) -> PathBuf {
        self.data_dir.join(ORDERS_FILE)
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.token_dir.join(TOKENS_FILE)
    }

    /// True while the owner secret is still the shipped placeholder.
    pub fn uses_default_owner_key(&self) -> bool {
        self.owner_key == DEFAULT_OWNER_KEY
    }

    /// Link that opens the dashboard in client mode for `token`.
    pub fn share_link(&self, token: &str) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}token={}",
            self.base_url,
            separator,
            urlencoding::encode(token)
        )
    }
}
