use std::{collections::HashMap, sync::Arc};
use tokio::sync::watch;
use tracing::info;
use types::WidgetHandle;

/// Manual-reset signal raised once no widget is left. It is never cleared,
/// so late waiters return immediately.
#[derive(Debug, Clone)]
pub struct EmptyRegistrySignal {
    sender: Arc<watch::Sender<bool>>,
}

impl EmptyRegistrySignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn set(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.sender.borrow()
    }

    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = receiver.wait_for(|is_set| *is_set).await;
    }
}

impl Default for EmptyRegistrySignal {
    fn default() -> Self {
        Self::new()
    }
}

/// The widgets currently hosted, keyed by widget id.
#[derive(Debug)]
pub struct WidgetRegistry {
    widgets: HashMap<String, WidgetHandle>,
    empty_signal: EmptyRegistrySignal,
}

impl WidgetRegistry {
    pub fn new(empty_signal: EmptyRegistrySignal) -> Self {
        Self {
            widgets: HashMap::new(),
            empty_signal,
        }
    }

    /// Insert or replace the widget with the handle's id.
    pub fn insert(&mut self, handle: WidgetHandle) -> Option<WidgetHandle> {
        self.widgets.insert(handle.id.clone(), handle)
    }

    /// Insert the widget unless one with the same id is already known.
    /// Returns whether it was added.
    pub fn import(&mut self, handle: WidgetHandle) -> bool {
        if self.widgets.contains_key(&handle.id) {
            return false;
        }

        self.widgets.insert(handle.id.clone(), handle);
        true
    }

    pub fn get(&self, id: &str) -> Option<&WidgetHandle> {
        self.widgets.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut WidgetHandle> {
        self.widgets.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.contains_key(id)
    }

    /// Remove a widget, raising the empty-registry signal if none remain.
    pub fn remove(&mut self, id: &str) -> Option<WidgetHandle> {
        let removed = self.widgets.remove(id);

        if self.widgets.is_empty() {
            info!("No widgets left");
            self.empty_signal.set();
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub const fn empty_signal(&self) -> &EmptyRegistrySignal {
        &self.empty_signal
    }
}
