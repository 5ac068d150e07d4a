use clap::Parser;
use color_eyre::{Result, eyre::Context};
use serde_json::Value;
use signpost::{
    adapters::{MemoryAjaxRegistrar, MemoryQueryVars, MemoryRewriteStore, build_router},
    config::{RouterConfig, RouterConfigValidator, load_config},
    core::request::RequestContext,
    tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "routes.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate a route configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "routes.toml")]
        config: String,
    },
    /// Print the rewrite rules and content hash a configuration exports
    Rules {
        /// Configuration file to use
        #[clap(short, long, default_value = "routes.toml")]
        config: String,
    },
    /// Resolve a request path against the configured route set
    Resolve {
        /// Request path to resolve
        path: String,

        /// Configuration file to use
        #[clap(short, long, default_value = "routes.toml")]
        config: String,

        /// Query-state entries as key=value pairs
        #[clap(short, long)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_setup::init_console_tracing()?;

    let args = Args::parse();
    match args.command {
        Some(Commands::Validate { config }) => validate_command(&config),
        Some(Commands::Rules { config }) => rules_command(&config),
        Some(Commands::Resolve {
            path,
            config,
            query,
        }) => resolve_command(&config, &path, &query),
        None => rules_command(&args.config),
    }
}

fn load_validated(config_path: &str) -> Result<RouterConfig> {
    let config =
        load_config(config_path).with_context(|| format!("Failed to load {config_path}"))?;
    RouterConfigValidator::validate(&config)?;
    Ok(config)
}

fn validate_command(config_path: &str) -> Result<()> {
    load_validated(config_path)?;
    println!("Configuration '{config_path}' is valid");
    Ok(())
}

fn rules_command(config_path: &str) -> Result<()> {
    let config = load_validated(config_path)?;
    let mut router = build_router(&config);

    let mut store = MemoryRewriteStore::default();
    let mut vars = MemoryQueryVars::default();
    let mut ajax = MemoryAjaxRegistrar::default();
    router.configure(&mut store, &mut vars, &mut ajax)?;

    for (regex, target) in store.rules() {
        println!("{regex} => {target}");
    }
    println!("query vars: {}", vars.keys().join(", "));
    if let Some(hash) = store.hash() {
        println!("content hash: {hash}");
    }
    Ok(())
}

fn resolve_command(config_path: &str, path: &str, query: &[String]) -> Result<()> {
    let config = load_validated(config_path)?;
    let mut router = build_router(&config);

    let mut request = RequestContext::new(path);
    for pair in query {
        let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
        request.set_query_var(key, Value::String(value.to_string()));
    }

    if let Some(route) = router.resolve(&request)? {
        println!("resolved route '{}'", route.route_name());
        return Ok(());
    }

    if let Some(route) = router.match_path(path)? {
        println!("path matches route '{}'", route.route_name());
        if let Some(path_route) = route.as_path()
            && let Some(params) = path_route.extract(path)?
        {
            for (key, value) in params {
                match value {
                    Some(value) => println!("  {key} = {value}"),
                    None => println!("  {key} (unset)"),
                }
            }
        }
        return Ok(());
    }

    println!("no route owns '{path}'");
    Ok(())
}
