use anyhow::{Context, Result};
use tracing::{error, info};

use risk_register::auth::password::{generate_password, hash_password};
use risk_register::config::{Command, Config};
use risk_register::health::HealthServer;
use risk_register::storage::Database;
use risk_register::{forms, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args();

    // Handle version subcommand
    if let Some(Command::Version) = &config.command {
        println!(
            "risk-register {}, commit: {}, build_date: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_SHA"),
            env!("VERGEN_BUILD_TIMESTAMP"),
        );
        return Ok(());
    }

    // Initialize logging
    logging::init(&config.log_format, &config.log_level);

    if let Some(Command::CreateUser { username, password }) = &config.command {
        return create_user(&config, username, password.as_deref());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("VERGEN_GIT_SHA"),
        build_date = env!("VERGEN_BUILD_TIMESTAMP"),
        "risk-register starting"
    );

    // Validate configuration
    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration validation failed");
        std::process::exit(1);
    }

    // Start health check server
    let health_port = config.health_port;
    let health_server = HealthServer::new();
    let health_server_clone = health_server.clone();

    let (health_ready_tx, health_ready_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = health_server_clone
            .serve(health_port, health_ready_tx)
            .await
        {
            error!(error = %e, "Health check server failed");
        }
    });

    // Wait for health server to be ready
    health_ready_rx.await.ok();
    info!(port = health_port, "Health check server started");

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(web::run(config, health_server, shutdown_rx));

    let result = tokio::select! {
        result = server => result.context("Web server task failed").and_then(|r| r),
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(error = %format!("{:#}", e), "Application error");
        std::process::exit(1);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Create a login user, printing the password when one was generated
fn create_user(config: &Config, username: &str, password: Option<&str>) -> Result<()> {
    let username = match forms::username(username) {
        Ok(username) => username,
        Err(message) => anyhow::bail!("Invalid username: {}", message),
    };

    let db = Database::new(&config.get_db_path())?;
    let generated = password.is_none().then(generate_password);
    let password = password.or(generated.as_deref()).unwrap_or_default();
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    let hash = hash_password(password)?;
    let user = db
        .create_user(&username, &hash)
        .with_context(|| format!("Failed to create user '{}'", username))?;
    info!(user_id = user.id, username = %user.username, "User created");

    if let Some(generated) = &generated {
        println!("Created user '{}' with password: {}", user.username, generated);
    } else {
        println!("Created user '{}'", user.username);
    }
    Ok(())
}
