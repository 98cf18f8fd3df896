use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slaq::{create_router, load_file};
use slaq_core::{parse, OutputFormat, QueryExecutor};

#[derive(Parser, Debug)]
#[command(name = "slaq")]
#[command(about = "SLAQ - SQL-like analytics over web server access logs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a query against a log file and print the result
    Query {
        /// Path to the access log file (Combined Log Format)
        #[arg(short, long)]
        file: PathBuf,

        /// Output format: table, csv or json
        #[arg(short = 'o', long, default_value = "table")]
        format: String,

        /// Abort on the first evaluation error instead of skipping records
        #[arg(long)]
        strict: bool,

        /// The SLAQ query text
        #[arg(short, long)]
        query: String,
    },
    /// Start the HTTP query server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 7451)]
        port: u16,

        /// Directory the server may read log files from
        #[arg(long, default_value = "./logs")]
        log_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slaq=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match args.command {
        Command::Query {
            file,
            format,
            strict,
            query,
        } => run_query(&file, &format, strict, &query),
        Command::Serve { port, log_dir } => serve(port, log_dir).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_query(file: &PathBuf, format: &str, strict: bool, query: &str) -> anyhow::Result<()> {
    let format: OutputFormat = format.parse()?;
    let records = load_file(file)?;
    let stmt = parse(query)?;
    let result = QueryExecutor::new(&records)
        .with_strict(strict)
        .execute(&stmt)?;
    print!("{}", result.render(format)?);
    Ok(())
}

async fn serve(port: u16, log_dir: PathBuf) -> anyhow::Result<()> {
    if !log_dir.is_dir() {
        anyhow::bail!("log directory {} does not exist", log_dir.display());
    }
    let app = create_router(log_dir.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {} (logs from {})", addr, log_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
