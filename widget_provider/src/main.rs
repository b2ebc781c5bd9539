use tracing::info;
use ugw_app::ContextProvider;
use widget_provider::{
    bridge::{self, StdioHost},
    config::{Config, ENV_PREFIX},
    connector::HttpConnector,
    provider::WidgetProvider,
    registry::EmptyRegistrySignal,
};

type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
struct AppContext {
    config: Config,
}

impl ContextProvider<Config> for AppContext {
    async fn new(config: Config) -> Self {
        Self { config }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let context =
        ugw_app::create_app_context::<AppContext, Config>(ENV_PREFIX).await?;

    info!(
        "Starting widget provider for UniGetUI at {}",
        context.config.api_url
    );

    let connector = HttpConnector::new(&context.config)?;
    let provider = WidgetProvider::new(
        StdioHost::new(),
        connector,
        EmptyRegistrySignal::new(),
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    bridge::run(&provider, stdin).await?;

    info!("Widget provider stopped");
    Ok(())
}
