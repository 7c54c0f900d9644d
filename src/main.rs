use rapbot::api::{create_router, AppState, PersonaRegistry};
use rapbot::domain::ports::ConfigSource;
use rapbot::infrastructure::config::DEFAULT_CONFIG_PATH;
use rapbot::infrastructure::{AppConfig, EnvConfigSource, OpenAiConnector};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api=debug,rapbot=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let env = EnvConfigSource;
    let config_path = env
        .get("APP_CONFIG")
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path)?.with_overrides(&env)?;
    info!(path = %config_path, personas = config.personas.len(), "configuration loaded");

    let mut connector = OpenAiConnector::new();
    if let Some(base) = &config.llm.api_base {
        connector = connector.with_api_base(base);
    }

    // The key offered to the service comes from the same variable it is checked against.
    let candidate = env.get(&config.llm.credential_key);
    let personas = PersonaRegistry::build(&config, &env, candidate.as_deref(), &connector);
    if !personas
        .get(personas.default_id())
        .is_some_and(|slot| slot.is_ready())
    {
        warn!(persona = personas.default_id(), "default persona unavailable, chat input disabled");
    }

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let app = create_router(AppState::new(personas, config));

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
