use std::path::PathBuf;

const CACHE_DIR: &str = "pl_ledger";
const DB_FILE: &str = "ledger.sqlite";
const DEFAULT_POOL_SIZE: u32 = 5;

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub db_path: PathBuf,
    pub pool_size: u32,
    pub league_code: String,
    pub league_name: String,
}

impl LedgerConfig {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            pool_size: DEFAULT_POOL_SIZE,
            league_code: "E0".to_string(),
            league_name: "Premier League".to_string(),
        }
    }

    /// Reads `LEDGER_*` variables, loading a `.env` file first if one exists.
    /// Returns `None` only when no database path can be resolved at all.
    pub fn from_env() -> Option<Self> {
        let _ = dotenvy::dotenv();

        let db_path = env_non_empty("LEDGER_DB_PATH")
            .map(PathBuf::from)
            .or_else(default_db_path)?;
        let mut cfg = Self::new(db_path);

        if let Some(size) = env_non_empty("LEDGER_POOL_SIZE").and_then(|v| v.parse::<u32>().ok()) {
            cfg.pool_size = size.max(1);
        }
        if let Some(code) = env_non_empty("LEDGER_LEAGUE_CODE") {
            cfg.league_code = code;
        }
        if let Some(name) = env_non_empty("LEDGER_LEAGUE_NAME") {
            cfg.league_name = name;
        }
        Some(cfg)
    }

    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        self.db_path = path;
        self
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Some(base) = env_non_empty("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env_non_empty("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
