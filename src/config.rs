use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Maximum concurrent analysis pipelines
    pub max_concurrent_analyses: usize,
    /// GitHub search configuration
    pub github: GithubConfig,
    /// Web search (Tavily) configuration
    pub tavily: TavilyConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL for the GitHub API
    pub base_url: String,
    /// Personal access token; unauthenticated requests work but are
    /// heavily rate-limited
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyConfig {
    /// Base URL for the Tavily API
    pub base_url: String,
    /// API key; without it web search is skipped entirely
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for report generation
    pub chat_model: String,
    /// Cheaper model for classification
    pub fast_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            max_concurrent_analyses: 3,
            github: GithubConfig::default(),
            tavily: TavilyConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token: None,
        }
    }
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            fast_model: "llama3.2".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("VIBCHECK_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("VIBCHECK_MAX_CONCURRENT_ANALYSES") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_analyses = v;
            }
        }
        if let Ok(url) = std::env::var("GITHUB_API_BASE_URL") {
            config.github.base_url = url;
        }
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            config.github.token = Some(token);
        }
        if let Ok(url) = std::env::var("TAVILY_BASE_URL") {
            config.tavily.base_url = url;
        }
        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            config.tavily.api_key = Some(key);
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_FAST_MODEL") {
            config.llm.fast_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }

        config
    }
}
