use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the stderr subscriber. `RUST_LOG` overrides the default filter.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,iced=warn,wgpu=warn,reqwest=warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        eprintln!("[reply-desk] logging already initialized");
    }
}
