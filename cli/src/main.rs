//! thoughtree CLI: solve a problem with a Tree-of-Thought search over an
//! OpenAI-compatible chat model.
//!
//! Prints the final thought on stdout (or `No solution found`). Exit code 0 when solved,
//! 2 when the step budget ran out, 1 on error.

mod logging;

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use clap::Parser;
use cli::{exit_code, run_search, RunOptions};
use thoughtree::{
    ChatOpenAI, LabelMatcher, Language, LlmClient, OpenAIEmbedder, SearchConfig, Strategy,
};

#[derive(Parser, Debug)]
#[command(name = "thoughtree")]
#[command(about = "Tree-of-Thought search: generate, check, descend")]
struct Args {
    /// Problem statement (all positional arguments are joined with spaces)
    #[arg(required = true, trailing_var_arg = true)]
    problem: Vec<String>,

    /// Step budget: maximum generate/check cycles
    #[arg(short = 'k', long, value_name = "N")]
    k: Option<usize>,

    /// Branching factor: thoughts requested per proposal call
    #[arg(short = 'c', long, value_name = "N")]
    c: Option<usize>,

    /// Generation strategy: sample, propose or checked-propose
    #[arg(long, value_name = "NAME")]
    strategy: Option<Strategy>,

    /// Prompt language: en or ja
    #[arg(long, value_name = "LANG")]
    language: Option<Language>,

    /// Backtrack out of exhausted branches instead of pure depth-first descent
    /// (`--backtrack=false` overrides THOUGHTREE_BACKTRACK)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    backtrack: Option<bool>,

    /// Chat model for both oracles
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Embedding model for classifying validity replies without a keyword
    /// (default: offline hashing)
    #[arg(long, env = "THOUGHTREE_EMBEDDING_MODEL", value_name = "MODEL")]
    embedding_model: Option<String>,

    /// Sampling temperature (0-2)
    #[arg(long)]
    temperature: Option<f32>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Print every step to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// `THOUGHTREE_*` environment first, then flags.
    fn search_config(&self) -> Result<SearchConfig, thoughtree::ConfigError> {
        self.apply_flags(SearchConfig::from_env()?)
    }

    fn apply_flags(
        &self,
        mut config: SearchConfig,
    ) -> Result<SearchConfig, thoughtree::ConfigError> {
        if let Some(k) = self.k {
            config = config.with_k(k);
        }
        if let Some(c) = self.c {
            config = config.with_c(c);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(language) = self.language {
            config = config.with_language(language);
        }
        if let Some(enable) = self.backtrack {
            config = config.with_backtracking(enable);
        }
        config.validate()?;
        Ok(config)
    }

    fn openai_config(&self) -> OpenAIConfig {
        match self.base_url.as_deref().filter(|s| !s.is_empty()) {
            Some(base) => OpenAIConfig::default().with_api_base(base.trim_end_matches('/')),
            None => OpenAIConfig::default(),
        }
    }

    fn llm(&self) -> Arc<dyn LlmClient> {
        let mut client = ChatOpenAI::with_config(self.openai_config(), &self.model);
        if let Some(t) = self.temperature {
            client = client.with_temperature(t);
        }
        Arc::new(client)
    }

    fn matcher(&self) -> LabelMatcher {
        match self.embedding_model.as_deref().filter(|s| !s.is_empty()) {
            Some(model) => LabelMatcher::new()
                .with_embedder(Arc::new(OpenAIEmbedder::with_config(self.openai_config(), model))),
            None => LabelMatcher::new(),
        }
    }
}

async fn run(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let opts = RunOptions {
        problem: args.problem.join(" "),
        config: args.search_config()?,
        verbose: args.verbose,
    };
    tracing::debug!(config = ?opts.config, model = %args.model, "starting search");

    let result = run_search(&opts, args.llm(), args.matcher()).await;
    let code = exit_code(&result);
    let outcome = result?;
    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!("{}", outcome);
    }
    Ok(code)
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_and_apply("thoughtree", None) {
        eprintln!("warning: config not loaded: {}", e);
    }
    let args = Args::parse();
    if let Err(e) = logging::init() {
        eprintln!("warning: logging not initialized: {}", e);
    }

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
