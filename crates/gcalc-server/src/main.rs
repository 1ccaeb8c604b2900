//! Binary entrypoint for the gcalc HTTP server.
//!
//! Configuration comes from `GCALC_*` environment variables; see
//! [`gcalc_server::config`].

use gcalc_server::config::ServerConfig;
use gcalc_server::router::build_router;
use gcalc_server::state::AppState;
use gcalc_session::HttpCompiler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    let compiler = HttpCompiler::new(config.compiler_url.as_str());
    let state = AppState::start(compiler, &config)?;
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        "gcalc server starting on {} (compiler {}, cascade {})",
        addr,
        config.compiler_url,
        config.cascade
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
