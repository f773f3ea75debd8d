// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Skiff Control CLI
//!
//! CLI tool for operating skiff workspaces.
//!
//! Usage:
//!   skiff-ctl <command> [options]
//!
//! Commands:
//!   resolve --user <id> --session <id>   Resolve (or provision) the session's machine
//!   status <machine_id>                  Show a machine's state
//!   sessions --user <id>                 List a user's session mappings
//!   machines                             List machines in the app
//!   volumes                              List volumes in the app
//!   token --user <id> --machine <id>     Mint a capability token

use std::process::ExitCode;
use std::sync::Arc;

use skiff_broker::{
    AffinityResolver, CapabilityTokenIssuer, Config, PostgresSessionStore, migrations,
};
use skiff_machines::MachinesClient;

fn print_usage() {
    eprintln!(
        r#"Usage: skiff-ctl <command> [options]

Operate skiff workspaces.

COMMANDS:
    resolve                         Resolve (or provision) a session's machine
    status <machine_id>             Show a machine's state
    sessions                        List a user's session mappings
    machines                        List machines in the app
    volumes                         List volumes in the app
    token                           Mint a capability token

RESOLVE OPTIONS:
    --user <id>                     User ID (required)
    --session <id>                  Session ID (required)

SESSIONS OPTIONS:
    --user <id>                     User ID (required)

TOKEN OPTIONS:
    --user <id>                     User ID (required)
    --machine <id>                  Machine ID (required)

ENVIRONMENT:
    SKIFF_DATABASE_URL              PostgreSQL connection string
    FLY_API_TOKEN                   Machines control plane token
    SKIFF_TOKEN_SECRET              HS256 secret for capability tokens
    SKIFF_FLY_APP                   Fly app name (default: skiff-runtime)

EXAMPLES:
    # Resolve the machine for a session (provisions on first call)
    skiff-ctl resolve --user u_42 --session s_bf91

    # Inspect a machine
    skiff-ctl status d891234f5678

    # Mint a callback token for a machine
    skiff-ctl token --user u_42 --machine d891234f5678
"#
    );
}

#[derive(Debug)]
enum Command {
    Resolve { user_id: String, session_id: String },
    Status { machine_id: String },
    Sessions { user_id: String },
    Machines,
    Volumes,
    Token { user_id: String, machine_id: String },
}

fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from_vec(&args)
}

fn parse_args_from_vec(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        "resolve" => {
            let (user_id, session_id) = parse_user_session(&args[2..])?;
            Ok(Command::Resolve {
                user_id,
                session_id: session_id.ok_or("--session is required")?,
            })
        }
        "status" => {
            let machine_id = args.get(2).ok_or("Machine ID required")?.clone();
            Ok(Command::Status { machine_id })
        }
        "sessions" => {
            let (user_id, _) = parse_user_session(&args[2..])?;
            Ok(Command::Sessions { user_id })
        }
        "machines" => Ok(Command::Machines),
        "volumes" => Ok(Command::Volumes),
        "token" => {
            let mut user_id: Option<String> = None;
            let mut machine_id: Option<String> = None;

            let mut i = 0;
            let rest = &args[2..];
            while i < rest.len() {
                match rest[i].as_str() {
                    "--user" => {
                        i += 1;
                        user_id = Some(rest.get(i).ok_or("--user requires an ID")?.clone());
                    }
                    "--machine" => {
                        i += 1;
                        machine_id = Some(rest.get(i).ok_or("--machine requires an ID")?.clone());
                    }
                    arg => return Err(format!("Unknown argument: {}", arg)),
                }
                i += 1;
            }

            Ok(Command::Token {
                user_id: user_id.ok_or("--user is required")?,
                machine_id: machine_id.ok_or("--machine is required")?,
            })
        }
        cmd => Err(format!("Unknown command: {}", cmd)),
    }
}

/// Parse `--user <id>` (required) and `--session <id>` (optional).
fn parse_user_session(rest: &[String]) -> Result<(String, Option<String>), String> {
    let mut user_id: Option<String> = None;
    let mut session_id: Option<String> = None;

    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--user" => {
                i += 1;
                user_id = Some(rest.get(i).ok_or("--user requires an ID")?.clone());
            }
            "--session" => {
                i += 1;
                session_id = Some(rest.get(i).ok_or("--session requires an ID")?.clone());
            }
            arg => return Err(format!("Unknown argument: {}", arg)),
        }
        i += 1;
    }

    Ok((user_id.ok_or("--user is required")?, session_id))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skiff_broker=warn".into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let cmd = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let machines = match MachinesClient::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Machines client error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match execute_command(config, machines, cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Connect to the session store database and apply the schema.
async fn connect_store(config: &Config) -> Result<Arc<PostgresSessionStore>, String> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;

    migrations::run(&pool)
        .await
        .map_err(|e| format!("Failed to apply schema: {}", e))?;

    Ok(Arc::new(PostgresSessionStore::new(pool)))
}

async fn execute_command(
    config: Config,
    machines: Arc<MachinesClient>,
    cmd: Command,
) -> Result<(), String> {
    match cmd {
        Command::Resolve {
            user_id,
            session_id,
        } => {
            let store = connect_store(&config).await?;
            let resolver = AffinityResolver::new(store, machines, config);

            let resolved = resolver
                .resolve(&user_id, &session_id)
                .await
                .map_err(|e| e.to_string())?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "machine_id": resolved.machine_id,
                    "url": resolved.url,
                    "state": resolved.state.as_str(),
                }))
                .map_err(|e| e.to_string())?
            );
        }

        Command::Status { machine_id } => {
            let machine = machines
                .get_machine(&machine_id)
                .await
                .map_err(|e| e.to_string())?;
            match machine {
                Some(m) => println!(
                    "{}",
                    serde_json::to_string_pretty(&m).map_err(|e| e.to_string())?
                ),
                None => return Err(format!("Machine not found: {}", machine_id)),
            }
        }

        Command::Sessions { user_id } => {
            use skiff_broker::SessionStore;

            let store = connect_store(&config).await?;
            let records = store
                .list_by_user(&user_id)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&records).map_err(|e| e.to_string())?
            );
        }

        Command::Machines => {
            let list = machines.list_machines().await.map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&list).map_err(|e| e.to_string())?
            );
        }

        Command::Volumes => {
            let list = machines.list_volumes().await.map_err(|e| e.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&list).map_err(|e| e.to_string())?
            );
        }

        Command::Token {
            user_id,
            machine_id,
        } => {
            let issuer = CapabilityTokenIssuer::new(&config.token_secret);
            let token = issuer
                .issue(&user_id, &machine_id)
                .map_err(|e| e.to_string())?;
            println!("{}", token);
        }
    }

    Ok(())
}
