use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub trait ContextProvider<Config> {
    fn new(config: Config) -> impl Future<Output = Self>;
}

/// Extract a configuration from its defaults, overridden by environment
/// variables starting with `env_prefix`.
///
/// # Errors
/// If an environment variable cannot be converted into the type of the
/// field it maps to.
pub fn load_config<Config>(env_prefix: &str) -> Result<Config, figment::Error>
where
    Config: Default + Serialize + for<'de> Deserialize<'de>,
{
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(env_prefix))
        .extract()
}

/// Initialize the application context with configuration from environment
/// variables.
///
/// # Arguments
/// * `env_prefix` - Prefix of the environment variables read into `Config`
///
/// # Returns
/// The application context built from the configuration, as specified by
/// the trait.
///
/// # Errors
/// If the configuration cannot be extracted from the environment variables.
///
pub async fn create_app_context<A, Config>(
    env_prefix: &str,
) -> Result<A, figment::Error>
where
    A: ContextProvider<Config>,
    Config: Default + Serialize + for<'de> Deserialize<'de>,
{
    init_tracing();

    let config: Config = load_config(env_prefix)?;

    let context = A::new(config).await;

    Ok(context)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        // stdout belongs to the host bridge, so logs go to stderr.
        .with_writer(std::io::stderr)
        // allow log level to be overridden by RUST_LOG env var
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
