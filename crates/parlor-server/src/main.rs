use parlor_server::ServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Bind failure propagates out of main: the process exits non-zero.
    let server = ServerBuilder::new().bind("0.0.0.0:8080").build().await?;
    server.run().await?;
    Ok(())
}
