use bookcity_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. dotenv + logging
    setup_environment()?;

    print_banner();

    tracing::info!("BookCity server starting...");

    // 2. Configuration
    let config = Config::from_env()?;

    // 3. Database, migrations, admin seed
    let state = ServerState::initialize(&config).await?;

    // 4. Serve until Ctrl-C
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
