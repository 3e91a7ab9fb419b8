use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use phia_agent::{
    load_exemplar_dir, ControllerConfig, ExemplarCompiler, StepController,
};
use phia_core::{TextLlm, ToolRegistry, Trajectory};
use phia_llm::{GoogleClient, OllamaClient};
use phia_prompt::DEFAULT_QUESTION_PREFIX;
use phia_tools::{FinishTool, PythonTool, SearchTool, TavilySearch};

use crate::args::{Args, Provider};

pub fn build_controller(args: &Args) -> Result<StepController> {
    let mut config = ControllerConfig::default().with_max_steps(args.max_steps);
    if !args.no_question_prefix {
        config = config.with_question_prefix(DEFAULT_QUESTION_PREFIX);
    }

    let controller = StepController::builder()
        .llm(build_llm(args)?)
        .tools(build_tools(args)?)
        .exemplars(load_exemplars(args)?)
        .config(config)
        .build()?;
    tracing::info!(
        provider = ?args.provider,
        model = args.model(),
        tools = ?controller.tools().names(),
        exemplars = controller.exemplars().len(),
        "controller ready"
    );
    Ok(controller)
}

fn build_llm(args: &Args) -> Result<Arc<dyn TextLlm>> {
    let llm: Arc<dyn TextLlm> = match args.provider {
        Provider::Google => {
            let api_key = args
                .google_api_key
                .clone()
                .context("GOOGLE_API_KEY is required for the google provider")?;
            Arc::new(
                GoogleClient::builder()
                    .api_key(api_key)
                    .model(args.model())
                    .build()?,
            )
        }
        Provider::Ollama => Arc::new(OllamaClient::new(&args.ollama_base_url, args.model())?),
    };
    Ok(llm)
}

fn build_tools(args: &Args) -> Result<ToolRegistry> {
    let mut python = PythonTool::new()
        .with_interpreter(&args.python)
        .with_timeout(Duration::from_secs(args.code_timeout));
    if let Some(path) = &args.prelude {
        let prelude = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prelude {}", path.display()))?;
        python = python.with_prelude(prelude);
    }

    let search = match args.tavily_key() {
        Some(key) => SearchTool::new(TavilySearch::new(key)?),
        None => {
            tracing::warn!("TAVILY_API_KEY not set, using mock search");
            SearchTool::mock()
        }
    };

    let tools = ToolRegistry::new()
        .with_tool(Arc::new(python))?
        .with_tool(Arc::new(search))?
        .with_tool(Arc::new(FinishTool))?;
    Ok(tools)
}

fn load_exemplars(args: &Args) -> Result<Vec<Trajectory>> {
    let Some(dir) = &args.exemplars else {
        tracing::warn!("no exemplar directory configured, prompting without examples");
        return Ok(Vec::new());
    };
    let documents = load_exemplar_dir(dir)
        .with_context(|| format!("failed to list exemplars in {}", dir.display()))?;
    let compiled = ExemplarCompiler::new().compile_all(&documents);
    tracing::info!(
        found = documents.len(),
        compiled = compiled.len(),
        "loaded exemplars"
    );
    Ok(compiled
        .into_iter()
        .map(|exemplar| exemplar.trajectory)
        .collect())
}
