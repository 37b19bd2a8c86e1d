use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dinetime=info,tower_http=debug,server=debug,import_wallet_analysis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
