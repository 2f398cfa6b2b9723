//! Guildhall backend server.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use guildhall_database::{FriendRepository, GuildRepository, UserRepository};
use guildhall_gateway::{create_router, GatewayState};
use guildhall_runtime::{shutdown_signal, Services};

#[derive(Parser)]
#[command(name = "guildhall-server", about = "Guildhall backend server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP/WebSocket server (default).
    Serve,
    /// Populate the database with local development fixtures.
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    guildhall_runtime::telemetry::init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::SeedData => seed_data().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let services = Services::initialise().await?;

    let state = GatewayState::new(services.pool.clone(), &services.config.chat);
    let router = create_router(state);

    let address = format!(
        "{}:{}",
        services.config.http.address, services.config.http.port
    );
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!(%address, "guildhall listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    let services = Services::initialise().await?;
    let pool = services.pool;

    let users = UserRepository::new(pool.clone());
    let mut ids = Vec::new();
    for name in ["ayla", "bren", "cole", "dara"] {
        let user = users.create(name).await?;
        ids.push(user.id);
    }

    let guilds = GuildRepository::new(pool.clone());
    let guild = guilds.create("night watch", "keeps the walls", ids[0]).await?;
    guilds.join(guild.id, ids[1]).await?;
    guilds.join(guild.id, ids[2]).await?;

    let friends = FriendRepository::new(pool);
    let request = friends.create_request(ids[0], ids[1]).await?;
    friends.accept(request.id, ids[1]).await?;

    info!(
        users = ids.len(),
        guild_id = guild.id,
        "seeded development fixtures"
    );
    Ok(())
}
