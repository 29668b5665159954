use serde::{Deserialize, Serialize};

/// Hard upper bound on clients per generation request. Config may lower it,
/// never raise it.
pub const HARD_CLIENT_CAP: usize = 20;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// No key means every record comes from the fallback generator.
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            max_tokens: 4096,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub max_clients: usize,
    pub default_client_count: usize,
    pub default_jurisdictions: Vec<String>,
    pub database_path: String,
    /// Master seed. `None` derives one from the clock at run start.
    pub seed: Option<u64>,
    pub llm: LlmConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_clients: HARD_CLIENT_CAP,
            default_client_count: 5,
            default_jurisdictions: ["CA", "TX", "NY", "FL", "WA"]
                .into_iter()
                .map(String::from)
                .collect(),
            database_path: "nexus.db".into(),
            seed: None,
            llm: LlmConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults, overlaid by an optional JSON file, overlaid by the
    /// environment. In tests, use GeneratorConfig::default_test().
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
                serde_json::from_str(&content)
                    .map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay environment values. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(key) = lookup("NEXUS_LLM_API_KEY").or_else(|| lookup("ANTHROPIC_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("NEXUS_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(endpoint) = lookup("NEXUS_LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(db) = lookup("NEXUS_DB_PATH") {
            self.database_path = db;
        }
        if let Some(seed) = lookup("NEXUS_SEED") {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("NEXUS_SEED '{seed}': {e}"))?;
            self.seed = Some(seed);
        }
        if let Some(max) = lookup("NEXUS_MAX_CLIENTS") {
            self.max_clients = max
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("NEXUS_MAX_CLIENTS '{max}': {e}"))?;
        }
        Ok(())
    }

    /// Per-request cap actually enforced.
    pub fn client_cap(&self) -> usize {
        self.max_clients.clamp(1, HARD_CLIENT_CAP)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self {
            database_path: ":memory:".into(),
            seed: Some(42),
            ..Self::default()
        }
    }
}
