use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use phia_agent::DEFAULT_MAX_STEPS;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Google,
    Ollama,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Google => phia_llm::DEFAULT_GEMINI_MODEL,
            Provider::Ollama => "llama3.1",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "phia")]
#[command(about = "Answer questions about your wearable health data")]
#[command(version)]
pub struct Args {
    /// Question to answer. Starts an interactive session when omitted.
    pub question: Option<String>,

    /// Model backend
    #[arg(long, env = "PHIA_PROVIDER", value_enum, default_value_t = Provider::Google)]
    pub provider: Provider,

    /// Model name (defaults per provider)
    #[arg(long, env = "PHIA_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Falls back to mock search when unset or empty
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: Option<String>,

    #[arg(long, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434")]
    pub ollama_base_url: String,

    /// Directory of worked-example notebooks (*.ipynb)
    #[arg(long, env = "PHIA_EXEMPLARS")]
    pub exemplars: Option<PathBuf>,

    #[arg(long, env = "PHIA_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    /// Python file run before every code action, e.g. to load dataframes
    #[arg(long, env = "PHIA_PRELUDE")]
    pub prelude: Option<PathBuf>,

    /// Interpreter used by the code tool
    #[arg(long, default_value = "python3")]
    pub python: String,

    /// Seconds a single code action may run
    #[arg(long, default_value_t = 30)]
    pub code_timeout: u64,

    /// Send questions without the default instruction prefix
    #[arg(long)]
    pub no_question_prefix: bool,

    /// Print the full trajectory as JSON after each answer
    #[arg(long)]
    pub show_trajectory: bool,
}

impl Args {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn tavily_key(&self) -> Option<&str> {
        self.tavily_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
