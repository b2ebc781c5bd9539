//! JSON-lines host bridge: host events arrive one per line on the input,
//! every render is written as one line to stdout.

use std::io::{Stdout, Write};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::{
    connector::Connector,
    host::{HostEvent, WidgetContext, WidgetHost, WidgetUpdateRequest},
    provider::WidgetProvider,
};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Host I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed host event: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct StdioHost {
    stdout: Mutex<Stdout>,
}

impl StdioHost {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(std::io::stdout()),
        }
    }

    fn write_line(&self, line: &str) -> Result<(), BridgeError> {
        let mut stdout = self.stdout.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
        Ok(())
    }
}

impl Default for StdioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetHost for StdioHost {
    // Running widgets are announced with a `hello` event instead.
    fn running_widgets(&self) -> Vec<WidgetContext> {
        Vec::new()
    }

    fn update_widget(&self, request: WidgetUpdateRequest) {
        let result = serde_json::to_string(&request)
            .map_err(BridgeError::from)
            .and_then(|line| self.write_line(&line));

        if let Err(e) = result {
            error!("Failed to send update for widget {}: {e}", request.widget_id);
        }
    }
}

pub fn parse_event(line: &str) -> Result<HostEvent, BridgeError> {
    Ok(serde_json::from_str(line)?)
}

/// Feed host events from `input` to the provider until the input ends or
/// the last widget is deleted.
///
/// # Errors
/// If reading from `input` fails.
pub async fn run<H, C, R>(
    provider: &WidgetProvider<H, C>,
    input: R,
) -> Result<(), BridgeError>
where
    H: WidgetHost,
    C: Connector,
    R: AsyncBufRead + Unpin,
{
    let empty_signal = provider.empty_signal();
    let mut lines = input.lines();

    loop {
        tokio::select! {
            biased;

            () = empty_signal.wait() => {
                info!("All widgets were removed");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Host closed the event stream");
                    return Ok(());
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match parse_event(line) {
                    Ok(event) => provider.handle_event(event),
                    Err(e) => warn!("Skipping host event: {e}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_reports_malformed_json() {
        let result = parse_event("{\"event\":\"create\"");

        assert!(matches!(result, Err(BridgeError::Json(_))));
    }

    #[test]
    fn test_parse_hello_without_widgets() {
        let event = parse_event(r#"{"event":"hello"}"#).unwrap();

        assert_eq!(event, HostEvent::Hello { widgets: Vec::new() });
    }
}
