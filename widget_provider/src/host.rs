//! The seam between the provider and whatever hosts the widgets.

use serde::{Deserialize, Serialize};
use types::WidgetSize;

/// A widget as described by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetContext {
    pub id: String,

    pub definition_id: String,

    #[serde(default)]
    pub size: WidgetSize,
}

/// A rendered widget pushed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetUpdateRequest {
    pub widget_id: String,
    pub template: String,
    pub data: String,
}

pub trait WidgetHost: Send + Sync + 'static {
    /// Widgets the host already shows when the provider starts.
    fn running_widgets(&self) -> Vec<WidgetContext>;

    fn update_widget(&self, request: WidgetUpdateRequest);
}

/// Callbacks the host delivers to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Hello {
        #[serde(default)]
        widgets: Vec<WidgetContext>,
    },
    Create {
        context: WidgetContext,
    },
    Delete {
        widget_id: String,
        #[serde(default)]
        custom_state: String,
    },
    Activate {
        context: WidgetContext,
    },
    Deactivate {
        widget_id: String,
    },
    ActionInvoked {
        widget_id: String,
        verb: String,
        #[serde(default)]
        data: String,
    },
    ContextChanged {
        context: WidgetContext,
    },
}
