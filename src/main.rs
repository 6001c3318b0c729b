//! Main binary for the igloo-tools CLI

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use igloo_tools::{create_tool_registry, IglooClient, IglooConfig, ToolArgs};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Registry over an unconfigured client, only to describe the tools
    let placeholder = IglooConfig::default();
    let describe = create_tool_registry(Arc::new(IglooClient::from_config(&placeholder)?), &placeholder);

    let mut app = Command::new("igloo-tools")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search and read Igloo community content from the command line or an LLM agent")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Config file (default: config/igloo.toml when present)"),
        )
        .subcommand(
            Command::new("schemas")
                .about("Print the OpenAI function schemas of all tools as JSON")
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .action(ArgAction::SetTrue)
                        .help("Pretty-print the JSON"),
                ),
        );

    // One subcommand per registered tool
    for name in describe.list_tools() {
        let Some(tool) = describe.get_tool(&name) else {
            continue;
        };
        app = app.subcommand(
            Command::new(name.clone())
                .about(tool.description().to_string())
                .after_help(format!("Usage: {}", tool.signature()))
                .arg(
                    Arg::new("args")
                        .help("Tool arguments (positional values and --name=value pairs)")
                        .num_args(0..)
                        .allow_hyphen_values(true)
                        .value_name("ARGS"),
                ),
        );
    }

    let matches = app.get_matches();

    let Some((tool_name, sub_matches)) = matches.subcommand() else {
        eprintln!("No tool specified");
        std::process::exit(1);
    };

    if tool_name == "schemas" {
        let schemas = describe.get_all_schemas();
        let output = if sub_matches.get_flag("pretty") {
            serde_json::to_string_pretty(&schemas)?
        } else {
            serde_json::to_string(&schemas)?
        };
        println!("{}", output);
        return Ok(());
    }

    let config_path = sub_matches
        .get_one::<PathBuf>("config")
        .or_else(|| matches.get_one::<PathBuf>("config"));
    let config = IglooConfig::load(config_path.map(PathBuf::as_path))?;
    config.validate()?;

    let client = Arc::new(IglooClient::from_config(&config)?);
    client
        .authenticate()
        .await
        .context("Could not open an Igloo session")?;

    let registry = create_tool_registry(client, &config);

    let raw: Vec<&str> = sub_matches
        .get_many::<String>("args")
        .unwrap_or_default()
        .map(String::as_str)
        .collect();
    let tool_args = ToolArgs::from_args(&raw);

    info!(tool = tool_name, "running tool");
    match registry.execute_tool(tool_name, &tool_args).await {
        Ok(result) => {
            println!("{}", result.message);
            if !result.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
