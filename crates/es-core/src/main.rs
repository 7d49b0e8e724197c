use std::io::{self, IsTerminal, Read};
use std::time::Duration;

use es_backend::{mock, AgentClient, Backend};
use es_core::config::Config;
use es_core::provision;
use es_core::router::Router;
use es_core::shell;
use es_protocol::AgentConfigDocument;
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!("edgeshell — agent event-stream demo shell");
    println!();
    println!("Usage:");
    println!("  edgeshell \"query\"             Submit a query to the agent backend");
    println!("  echo \"query\" | edgeshell      Submit a query via stdin pipe");
    println!();
    println!("Options:");
    println!("  --server URL    Override the agent endpoint from the config file");
    println!("  --push-config   POST the demo agent configuration document and exit");
    println!("  --mock          Run against a built-in scripted backend (no network)");
    println!("  --version       Print version");
    println!("  --help          Print this help");
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("edgeshell {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let use_mock = args.iter().any(|a| a == "--mock");
    let push_config = args.iter().any(|a| a == "--push-config");

    let mut server_override: Option<String> = None;
    let mut query_arg: Option<String> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--server" {
            match iter.next() {
                Some(url) => server_override = Some(url.clone()),
                None => {
                    eprintln!("error: --server requires a URL");
                    std::process::exit(2);
                }
            }
        } else if !arg.starts_with('-') && query_arg.is_none() {
            query_arg = Some(arg.clone());
        }
    }

    let config = Config::load_or_default();
    let server_url = server_override.unwrap_or_else(|| config.backend.server_url.clone());

    // Query from the positional arg, or from piped stdin.
    let query = if let Some(arg) = query_arg {
        Some(arg)
    } else if !io::stdin().is_terminal() {
        let mut buf = String::new();
        if io::stdin().read_to_string(&mut buf).is_ok() && !buf.trim().is_empty() {
            Some(buf.trim().to_string())
        } else {
            None
        }
    } else {
        None
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    let client = AgentClient::with_timeout(Duration::from_secs(config.backend.request_timeout_secs));

    if push_config {
        let config_url = format!(
            "{}{}",
            server_url.trim_end_matches('/'),
            config.backend.config_path
        );
        let document = AgentConfigDocument::demo_default();
        let line =
            runtime.block_on(provision::push_agent_config(&client, &config_url, &document));
        println!("{line}");
        return;
    }

    let Some(query) = query else {
        print_help();
        std::process::exit(2);
    };

    let backend = if use_mock {
        Backend::Mock(mock::fixtures::working_then_completed(
            "This is a simulated response from the agent backend. The query has been \
             processed successfully.",
        ))
    } else {
        Backend::Http(client)
    };

    let router = Router::new(backend);
    if let Err(e) = runtime.block_on(shell::run_query(&router, &config, &server_url, &query)) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
