use mospolyjob_core::{
    JobBoardClient, Session, SessionProvider,
    config::{ClientConfig, Env},
    models::VacancyListParams,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Probe for a backend deployment: runs the guard and the resolver-backed
/// listings once against the configured gateway and logs what it found.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = ClientConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mospolyjob_core=debug,mospolyjob_check=debug,reqwest=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(
        "Probe starting in {:?} mode against {}",
        config.env,
        config.api_base_url
    );

    // 4. Client Assembly
    let client = JobBoardClient::connect(config)
        .expect("FATAL: Failed to build the HTTP client.");

    // 5. Optional session seed, so protected routes can be checked.
    if let Ok(token) = std::env::var("MOSPOLYJOB_TOKEN") {
        let role = std::env::var("MOSPOLYJOB_ROLE").unwrap_or_default();
        if let Err(e) = client.sessions.set(Session::new(token, role)) {
            tracing::error!(error = %e, "could not seed session");
        }
    }

    let decision = client.navigate("/vacancies");
    tracing::info!(?decision, "guard decision for /vacancies");

    // 6. Resolver calls
    match client.vacancies.list(&VacancyListParams::default()).await {
        Ok(page) => tracing::info!(
            count = page.vacancies.len(),
            pagination = ?page.pagination,
            "vacancies resolved"
        ),
        Err(e) => {
            tracing::error!(error = %e, message = %e.user_message(), "vacancy listing failed")
        }
    }

    match client.vacancies.positions().await {
        Ok(positions) => tracing::info!(count = positions.len(), "positions resolved"),
        Err(e) => {
            tracing::error!(error = %e, message = %e.user_message(), "position listing failed")
        }
    }
}
