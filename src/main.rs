use clap::{Parser, Subcommand};

use swift_shuttle::config::AppConfig;
use swift_shuttle::database::{self, schema};
use swift_shuttle::handlers;
use swift_shuttle::state::AppState;

#[derive(Parser)]
#[command(name = "swift-shuttle", about = "School shuttle coordination API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Create the schema and the default admin account (idempotent)
    Provision,
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Provision => {
            let pool = database::connect(&config.database).await?;
            schema::provision(&pool, &config.provisioning).await?;
        }
        Command::Serve => {
            let pool = database::connect(&config.database).await?;
            let port = config.server.port;
            let app = handlers::router(AppState::new(pool, config));

            let bind_addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            tracing::info!("swift-shuttle listening on http://{}", bind_addr);
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
