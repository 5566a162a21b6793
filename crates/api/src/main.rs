use stockroom_ledger::MatchPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let policy = MatchPolicy::from_env();
    tracing::info!(
        match_description = policy.match_description,
        "matching policy loaded"
    );

    let addr = std::env::var("STOCKROOM_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let app = stockroom_api::app::build_app(policy);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
