//! Bridge to the UniGetUI background API running on localhost.
//!
//! Every request is authorized with the session token UniGetUI writes to
//! disk when it starts. Failures never leave this module: they are logged
//! and reported as unsuccessful results.

use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use types::{
    ConnectionResult, FIELD_SEPARATOR, PackageRecord, REQUIRED_FIELDS,
    UpdateCheckResult, WidgetHandle,
};

use crate::config::Config;

const ATTEMPT_CONNECTION: &str = "/widgets/attempt_connection";
const GET_UPDATES: &str = "/widgets/get_updates";
const OPEN_UNIGETUI: &str = "/widgets/open_wingetui";
const VIEW_ON_UNIGETUI: &str = "/widgets/view_on_wingetui";
const UPDATE_PACKAGE: &str = "/widgets/update_package";
const UPDATE_ALL_PACKAGES: &str = "/widgets/update_all_packages";

const RESPONSE_PREFIX: &str = "{\"packages\":\"";
const RESPONSE_SUFFIX: &str = "\",\"status\":\"success\"}";
const DEFAULT_RECORD_SEPARATOR: &str = "||";

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Failed to read session token from {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session token file {0} is empty")]
    EmptyToken(PathBuf),

    #[error("Request to UniGetUI failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("UniGetUI answered with status {0}")]
    Status(reqwest::StatusCode),
}

/// Operations the provider needs from UniGetUI.
pub trait Connector: Send + Sync + 'static {
    /// Validate the session token. Succeeds immediately once a previous
    /// attempt succeeded, until [`Connector::reset_connection`] is called.
    fn connect(
        &self,
        widget: WidgetHandle,
    ) -> impl Future<Output = ConnectionResult> + Send;

    fn fetch_updates(
        &self,
        widget: WidgetHandle,
    ) -> impl Future<Output = UpdateCheckResult> + Send;

    fn reset_connection(&self);

    fn open_unigetui(&self) -> impl Future<Output = ()> + Send;

    fn view_updates(&self) -> impl Future<Output = ()> + Send;

    fn update_package(
        &self,
        package_id: String,
    ) -> impl Future<Output = ()> + Send;

    fn update_all_packages(&self) -> impl Future<Output = ()> + Send;
}

pub struct HttpConnector {
    client: reqwest::Client,
    api_url: String,
    token_path: PathBuf,
    record_separator: String,
    session_token: Mutex<Option<String>>,
}

impl HttpConnector {
    /// # Errors
    /// If the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, ConnectorError> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let record_separator = if config.record_separator.is_empty() {
            warn!(
                "Empty record separator configured, using {DEFAULT_RECORD_SEPARATOR:?}"
            );
            DEFAULT_RECORD_SEPARATOR.to_string()
        } else {
            config.record_separator.clone()
        };

        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token_path: config.token_path(),
            record_separator,
            session_token: Mutex::new(None),
        })
    }

    fn cached_token(&self) -> Option<String> {
        self.session_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_cached_token(&self, token: Option<String>) {
        *self
            .session_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn read_token(&self) -> Result<String, ConnectorError> {
        let contents = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(|source| ConnectorError::TokenFile {
                path: self.token_path.clone(),
                source,
            })?;

        let token = contents.replace('\n', "").trim().to_string();
        if token.is_empty() {
            return Err(ConnectorError::EmptyToken(self.token_path.clone()));
        }

        debug!("Found session token in {}", self.token_path.display());
        Ok(token)
    }

    async fn token(&self) -> Result<String, ConnectorError> {
        match self.cached_token() {
            Some(token) => Ok(token),
            None => self.read_token().await,
        }
    }

    async fn get(
        &self,
        path: &str,
        token: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, ConnectorError> {
        let mut query = vec![("token", token)];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(format!("{}{path}", self.api_url))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Status(status));
        }

        Ok(response)
    }

    async fn try_connect(&self) -> Result<(), ConnectorError> {
        if self.cached_token().is_some() {
            return Ok(());
        }

        let token = self.read_token().await?;
        self.get(ATTEMPT_CONNECTION, &token, &[]).await?;
        self.set_cached_token(Some(token));

        Ok(())
    }

    async fn try_fetch_updates(
        &self,
    ) -> Result<Vec<PackageRecord>, ConnectorError> {
        let token = self.token().await?;
        let body = self.get(GET_UPDATES, &token, &[]).await?.text().await?;

        Ok(parse_update_response(&body, &self.record_separator))
    }

    async fn send_command(&self, path: &str, params: &[(&str, &str)]) {
        let result = match self.token().await {
            Ok(token) => self.get(path, &token, params).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!("Sent {path} to UniGetUI"),
            Err(e) => warn!("Failed to send {path} to UniGetUI: {e}"),
        }
    }
}

impl Connector for HttpConnector {
    async fn connect(&self, widget: WidgetHandle) -> ConnectionResult {
        let succeeded = match self.try_connect().await {
            Ok(()) => {
                info!("Connected to UniGetUI for widget {}", widget.id);
                true
            }
            Err(e) => {
                warn!("Could not connect to UniGetUI: {e}");
                false
            }
        };

        ConnectionResult { widget, succeeded }
    }

    async fn fetch_updates(&self, widget: WidgetHandle) -> UpdateCheckResult {
        match self.try_fetch_updates().await {
            Ok(packages) => {
                let invalid = packages.iter().filter(|p| !p.valid).count();
                if invalid > 0 {
                    warn!("{invalid} package record(s) could not be parsed");
                }
                info!("UniGetUI reported {} upgradable package(s)", packages.len());
                UpdateCheckResult::succeeded(widget, packages)
            }
            Err(e) => {
                warn!("Could not check for updates: {e}");
                UpdateCheckResult::failed(widget)
            }
        }
    }

    fn reset_connection(&self) {
        self.set_cached_token(None);
    }

    async fn open_unigetui(&self) {
        self.send_command(OPEN_UNIGETUI, &[]).await;
    }

    async fn view_updates(&self) {
        self.send_command(VIEW_ON_UNIGETUI, &[]).await;
    }

    async fn update_package(&self, package_id: String) {
        self.send_command(UPDATE_PACKAGE, &[("id", package_id.as_str())])
            .await;
    }

    async fn update_all_packages(&self) {
        self.send_command(UPDATE_ALL_PACKAGES, &[]).await;
    }
}

/// Split the body of an updates response into package records.
///
/// The `{"packages":"...","status":"success"}` wrapper is removed when
/// present. Records that fail to parse are kept as invalid entries so the
/// result always has one element per record in the body.
pub fn parse_update_response(body: &str, separator: &str) -> Vec<PackageRecord> {
    let unwrapped = body.replace('\n', "");
    let mut records = unwrapped.trim();
    records = records.strip_prefix(RESPONSE_PREFIX).unwrap_or(records);
    records = records.strip_suffix(RESPONSE_SUFFIX).unwrap_or(records);
    records = records.trim();

    if records.is_empty() {
        return Vec::new();
    }

    split_records(records, separator)
        .iter()
        .map(|record| PackageRecord::from(record.as_str()))
        .collect()
}

/// Split on `separator`, giving back the trailing `|` of a record with an
/// empty icon field. With a separator made of `|` that pipe would otherwise
/// end up at the start of the next record.
fn split_records(records: &str, separator: &str) -> Vec<String> {
    let mut split: Vec<String> = Vec::new();

    for chunk in records.split(separator) {
        if let Some(previous) = split.last_mut()
            && separator.ends_with(FIELD_SEPARATOR)
            && previous.split(FIELD_SEPARATOR).count() == REQUIRED_FIELDS
            && let Some(rest) = chunk.strip_prefix(FIELD_SEPARATOR)
        {
            previous.push(FIELD_SEPARATOR);
            split.push(rest.to_string());
            continue;
        }

        split.push(chunk.to_string());
    }

    split
}
