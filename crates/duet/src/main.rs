//! Duet server binary.
//!
//! Binds to `DUET_ADDR` (default `127.0.0.1:8080`) and pairs anyone who
//! connects. Log verbosity follows `RUST_LOG`.

use duet::DuetServerBuilder;
use duet_session::TrustingAuthenticator;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duet=info")),
        )
        .init();

    let addr = std::env::var("DUET_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = DuetServerBuilder::new()
        .bind(&addr)
        .build(TrustingAuthenticator)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "duet listening");

    server.run().await?;
    Ok(())
}
