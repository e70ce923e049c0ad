//! A runnable card auction server.
//!
//! One auctioneer creates a room and uploads player cards; bidders join
//! with the room code and click to raise the price by the room's fixed
//! increment until the auctioneer's third final call closes the lot.
//!
//! ```text
//! cargo run -p card-auction [bind-addr]
//! ```

use gavel::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());

    let server = GavelServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "card auction server up");

    server.run().await?;
    Ok(())
}

// =========================================================================
// End-to-end tests: a competitive auction between real clients
// =========================================================================
