use std::{net::SocketAddr, str::FromStr};

use clap::Parser;
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{prelude::*, server::AppState};

mod fields;
mod ocr;
mod payload;
mod prelude;
mod server;

/// Serve identity-document field extraction over HTTP.
#[derive(Debug, Parser)]
#[clap(
    version,
    after_help = r#"
Environment Variables:
  - GOOGLE_VISION_API_KEY: API key for the `vision` engine.
  - GOOGLE_VISION_API_BASE (optional): Override the Vision endpoint.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    /// Address to listen on.
    #[clap(long, default_value = "0.0.0.0:5001")]
    listen: SocketAddr,

    /// OCR engine to use (`vision` or `tesseract`).
    #[clap(long, default_value = "vision")]
    engine: String,
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_filter(env_filter);

    // We can stack multiple layers here if we need to.
    tracing_subscriber::registry().with(subscriber).init();

    // Call our real `main` function now that logging is set up.
    real_main().await
}

/// Our real entry point.
async fn real_main() -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    // Build our OCR engine and the router over it.
    let ocr_engine = ocr::ocr_engine_for_name(&opts.engine)?;
    let app = server::create_router(AppState { ocr_engine });

    let listener = tokio::net::TcpListener::bind(opts.listen)
        .await
        .with_context(|| format!("cannot bind to {}", opts.listen))?;
    info!("Listening on http://{}", opts.listen);
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
