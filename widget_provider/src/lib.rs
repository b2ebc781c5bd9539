//! Windows widgets provider showing the packages UniGetUI can upgrade.
//!
//! The host (the Widgets Board, or the stdio bridge in [`bridge`]) reports
//! widget lifecycle events to a [`provider::WidgetProvider`], which keeps
//! the [`registry::WidgetRegistry`] current, asks UniGetUI for updates
//! through a [`connector::Connector`] and pushes Adaptive Card data built
//! by [`templates`] back to the host.

pub mod bridge;
pub mod config;
pub mod connector;
pub mod host;
pub mod provider;
pub mod registry;
pub mod templates;
