//! CLI entry point for hostlink.

mod cli;

use clap::Parser;
use hostlink::batch::{parse_batch_lines, run_batch, BatchOptions};
use hostlink::config::{config_template, load_config_with_diagnostics, Config};
use hostlink::error::RemoteError;
use hostlink::logging;
use hostlink::remote::RemoteExecutor;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Exit status used when a termination signal interrupts work.
const SIGNAL_EXIT: u8 = 130;
/// Probe used by `hostlink check`.
const CHECK_PROBE: &str = "uname -a";

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    logging::init(args.verbose);

    if let cli::Command::Config { template: true } = args.command {
        print!("{}", config_template());
        return ExitCode::SUCCESS;
    }

    let loaded = match load_config_with_diagnostics(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    for notice in &loaded.diagnostics.notices {
        tracing::warn!("{notice}");
    }
    tracing::debug!(source = %loaded.source, "configuration loaded");

    let mut config = loaded.config;
    if let Err(msg) = apply_cli_overrides(&mut config, &args) {
        eprintln!("error: {msg}");
        return ExitCode::FAILURE;
    }

    if let cli::Command::Config { template: false } = args.command {
        println!("# source: {}", loaded.source);
        println!("{config:#?}");
        return ExitCode::SUCCESS;
    }

    // Configuration problems are fatal here, before anything touches the
    // network.
    let executor = match RemoteExecutor::ssh(&config) {
        Ok(executor) => Arc::new(executor),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(destination = %executor.summary(), "executor ready");

    let work = run_command(Arc::clone(&executor), args.command);
    let code = tokio::select! {
        code = work => code,
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
            SIGNAL_EXIT
        }
    };
    executor.disconnect().await;
    ExitCode::from(code)
}

fn apply_cli_overrides(config: &mut Config, args: &cli::Args) -> Result<(), String> {
    let connection = &mut config.connection;
    if let Some(host) = &args.host {
        connection.host = host.trim().to_string();
    }
    if let Some(port) = args.port {
        connection.port = port;
    }
    if let Some(user) = &args.user {
        connection.username = user.trim().to_string();
    }
    if let Some(key) = &args.key {
        connection.private_key_path = Some(key.clone());
    }
    if args.ask_password {
        let prompt = format!("password for {}@{}: ", connection.username, connection.host);
        let password =
            rpassword::prompt_password(prompt).map_err(|e| format!("failed to read password: {e}"))?;
        connection.private_key_path = None;
        connection.password = Some(password);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.execution.command_timeout_ms = timeout_ms.max(1);
    }
    Ok(())
}

async fn run_command(executor: Arc<RemoteExecutor>, command: cli::Command) -> u8 {
    match command {
        cli::Command::Exec { json, command } => run_exec(&executor, &command.join(" "), json).await,
        cli::Command::Check => run_check(&executor).await,
        cli::Command::Batch { jobs, reconnect } => {
            run_batch_from_stdin(executor, BatchOptions { jobs, reconnect }).await
        }
        cli::Command::Config { .. } => 0,
    }
}

async fn run_exec(executor: &RemoteExecutor, command: &str, json: bool) -> u8 {
    match executor.execute(command).await {
        Ok(output) => {
            if json {
                match serde_json::to_string_pretty(&output) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("error: failed to encode result: {e}");
                        return 1;
                    }
                }
            } else {
                print!("{}", output.stdout);
                eprint!("{}", output.stderr);
                let _ = std::io::stdout().flush();
            }
            exit_status_byte(output.exit_code)
        }
        Err(err) => {
            eprintln!("error: {err}");
            match err {
                RemoteError::CommandFailed { exit_code, .. } => exit_status_byte(exit_code),
                _ => 1,
            }
        }
    }
}

async fn run_check(executor: &RemoteExecutor) -> u8 {
    if let Err(err) = executor.connect().await {
        eprintln!("error: {err}");
        return 1;
    }
    match executor.execute(CHECK_PROBE).await {
        Ok(output) => {
            println!("connected: {}", executor.summary());
            println!("remote: {}", output.stdout.trim());
            println!(
                "command timeout: {}",
                hostlink::remote::format_duration(executor.command_timeout())
            );
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

async fn run_batch_from_stdin(executor: Arc<RemoteExecutor>, options: BatchOptions) -> u8 {
    let mut input = String::new();
    if let Err(e) = tokio::io::stdin().read_to_string(&mut input).await {
        eprintln!("error: failed to read stdin: {e}");
        return 1;
    }
    let commands = parse_batch_lines(&input);
    if commands.is_empty() {
        eprintln!("error: no commands on stdin");
        return 1;
    }

    let summary = run_batch(executor, commands, options, |entry| {
        println!("$ {}", entry.command);
        match &entry.result {
            Ok(output) => {
                print!("{}", output.stdout);
                if !output.stdout.is_empty() && !output.stdout.ends_with('\n') {
                    println!();
                }
            }
            Err(err) => println!("error: {err}"),
        }
        let _ = std::io::stdout().flush();
    })
    .await;
    eprintln!(
        "{} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    if summary.failed == 0 {
        0
    } else {
        1
    }
}

fn exit_status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
