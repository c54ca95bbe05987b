use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the JSON subscriber.
/// `RUST_LOG` wins over `default_filter` when it is set.
pub fn get_subscriber<Sink>(default_filter: &str, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer().with_writer(sink).json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
}

/// Installs `subscriber` globally. Records from the `log` crate (actix-web's
/// request logger) are forwarded into it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync + 'static) {
    subscriber.init();
}
