use anyhow::Result;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = studiobill::run().await {
        error!("Billing worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}
