//! Promptline probe - run commands against a remote line console
//!
//! A small connectivity and diagnostics tool: connects to the configured
//! console, authenticates, runs the given command (or command sequence), and
//! prints the framed output.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{debug, error, info};

use promptline::{ClientConfig, ConfigLoader, ConsoleClient, SubmenuPolicy};

/// Probe invocation options
#[derive(Debug, Default)]
struct ProbeArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Console host override
    host: Option<String>,
    /// Console port override
    port: Option<u16>,
    /// Login username override
    username: Option<String>,
    /// Login password override
    password: Option<String>,
    /// Idle timeout override in milliseconds
    timeout_ms: Option<u64>,
    /// Run the commands as one sequence instead of one session each
    sequence: bool,
    /// Use the recovery submenu policy
    recover: bool,
    /// Enable debug logging
    debug: bool,
    /// Commands to run
    commands: Vec<String>,
}

impl ProbeArgs {
    /// Parse command line arguments
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();
        let mut probe_args = ProbeArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        probe_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("Missing config file path".to_string());
                    }
                }
                "--host" | "-H" => {
                    if i + 1 < args.len() {
                        probe_args.host = Some(args[i + 1].clone());
                        i += 1;
                    } else {
                        return Err("Missing host".to_string());
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        probe_args.port = args[i + 1].parse().ok();
                        i += 1;
                    } else {
                        return Err("Missing port".to_string());
                    }
                }
                "--username" | "-u" => {
                    if i + 1 < args.len() {
                        probe_args.username = Some(args[i + 1].clone());
                        i += 1;
                    } else {
                        return Err("Missing username".to_string());
                    }
                }
                "--password" | "-P" => {
                    if i + 1 < args.len() {
                        probe_args.password = Some(args[i + 1].clone());
                        i += 1;
                    } else {
                        return Err("Missing password".to_string());
                    }
                }
                "--timeout" | "-t" => {
                    if i + 1 < args.len() {
                        probe_args.timeout_ms = args[i + 1].parse().ok();
                        i += 1;
                    } else {
                        return Err("Missing timeout".to_string());
                    }
                }
                "--seq" | "-s" => {
                    probe_args.sequence = true;
                }
                "--recover" | "-r" => {
                    probe_args.recover = true;
                }
                "--debug" | "-d" => {
                    probe_args.debug = true;
                }
                "--help" | "-?" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("promptline-probe v{}", env!("CARGO_PKG_VERSION"));
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    return Err(format!("Unknown option: {}", arg));
                }
                _ => {
                    probe_args.commands.push(args[i].clone());
                }
            }
            i += 1;
        }

        if probe_args.commands.is_empty() {
            return Err("No command given".to_string());
        }

        Ok(probe_args)
    }
}

/// Print help information
fn print_help() {
    println!("promptline-probe - run commands against a remote line console");
    println!();
    println!("USAGE:");
    println!("    promptline-probe [OPTIONS] <COMMAND>...");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>      Path to configuration file");
    println!("    -H, --host <HOST>        Console host (default 127.0.0.1)");
    println!("    -p, --port <PORT>        Console port (default 8990)");
    println!("    -u, --username <USER>    Login username");
    println!("    -P, --password <PASS>    Login password");
    println!("    -t, --timeout <MS>       Idle timeout in milliseconds");
    println!("    -s, --seq                Run all commands as one sequence");
    println!("    -r, --recover            Enable submenu-stranding recovery");
    println!("    -d, --debug              Enable debug logging");
    println!("    -?, --help               Print this help message");
    println!("    -v, --version            Print version information");
    println!();
    println!("EXAMPLES:");
    println!("    promptline-probe 'user -l'");
    println!("    promptline-probe --seq 'group -a' 'gid operators' ok");
    println!();
    println!("ENVIRONMENT:");
    println!("    PROMPTLINE_CONFIG    Path to configuration file");
    println!("    RUST_LOG             Logging level (error, warn, info, debug, trace)");
}

/// Merge CLI overrides into the loaded configuration
fn build_config(args: &ProbeArgs) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config_path {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::load()?,
    };

    if let Some(host) = &args.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }
    if let Some(username) = &args.username {
        config.connection.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.connection.password = password.as_str().into();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.connection.idle_timeout_ms = timeout_ms;
    }
    if args.recover {
        config.runner.submenu_policy = SubmenuPolicy::Recovery;
    }

    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = ProbeArgs::parse().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        println!();
        print_help();
        process::exit(1);
    });

    let log_level = if args.debug { "debug" } else { "info" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .compact()
        .init();

    let config = build_config(&args).unwrap_or_else(|e| {
        error!("Failed to build configuration: {}", e);
        process::exit(1);
    });

    info!(
        host = %config.connection.host,
        port = config.connection.port,
        "probing console"
    );
    debug!("resolved configuration: {:?}", config);

    let client = match ConsoleClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let outcome = if args.sequence {
        client.execute_sequence(&args.commands).await.map(|outputs| {
            for (command, output) in args.commands.iter().zip(&outputs) {
                println!("$ {}", command);
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
        })
    } else {
        let mut result = Ok(());
        for command in &args.commands {
            match client.execute(command).await {
                Ok(output) => {
                    println!("$ {}", command);
                    if !output.is_empty() {
                        println!("{}", output);
                    }
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        result
    };

    if let Err(e) = outcome {
        error!("Probe failed: {}", e);
        process::exit(1);
    }
}
