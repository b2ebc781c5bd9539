use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};
use types::{PackageRecord, UpdateCheckResult, WidgetDefinition, WidgetHandle};

use crate::{
    connector::Connector,
    host::{HostEvent, WidgetContext, WidgetHost, WidgetUpdateRequest},
    registry::{EmptyRegistrySignal, WidgetRegistry},
    templates::{
        BASE_TEMPLATE, UPDATE_CHECK_FAILED, UPDATES_TEMPLATE, WidgetState,
        updates_list_data, verbs,
    },
};

/// Routes host callbacks into registry changes and renders.
///
/// Each widget has at most one refresh task in flight. Starting a new load
/// or deleting the widget aborts the previous one.
pub struct WidgetProvider<H, C> {
    inner: Arc<Inner<H, C>>,
}

struct Inner<H, C> {
    host: H,
    connector: C,
    runtime: Handle,
    registry: Mutex<WidgetRegistry>,
    available_updates: Mutex<HashMap<String, Vec<PackageRecord>>>,
    refresh_tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl<H, C> Clone for WidgetProvider<H, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: WidgetHost, C: Connector> WidgetProvider<H, C> {
    /// Create the provider and import the widgets the host already runs.
    ///
    /// # Panics
    /// If called outside of a Tokio runtime.
    pub fn new(host: H, connector: C, empty_signal: EmptyRegistrySignal) -> Self {
        let running = host.running_widgets();

        let provider = Self {
            inner: Arc::new(Inner {
                host,
                connector,
                runtime: Handle::current(),
                registry: Mutex::new(WidgetRegistry::new(empty_signal)),
                available_updates: Mutex::new(HashMap::new()),
                refresh_tasks: Mutex::new(HashMap::new()),
            }),
        };
        provider.import_widgets(running);

        provider
    }

    pub fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::Hello { widgets } => self.import_widgets(widgets),
            HostEvent::Create { context } => self.create_widget(&context),
            HostEvent::Delete {
                widget_id,
                custom_state,
            } => self.delete_widget(&widget_id, &custom_state),
            HostEvent::Activate { context } => self.activate(&context),
            HostEvent::Deactivate { widget_id } => self.deactivate(&widget_id),
            HostEvent::ActionInvoked {
                widget_id,
                verb,
                data,
            } => self.on_action_invoked(&widget_id, &verb, &data),
            HostEvent::ContextChanged { context } => {
                self.on_context_changed(&context);
            }
        }
    }

    /// Register widgets that were already running, without loading them.
    pub fn import_widgets(&self, contexts: Vec<WidgetContext>) {
        let mut registry = self.inner.registry();

        for context in contexts {
            let mut handle = WidgetHandle::new(context.id, context.definition_id);
            handle.active = true;
            handle.size = context.size;

            let id = handle.id.clone();
            if registry.import(handle) {
                info!("Imported running widget {id}");
            }
        }
    }

    pub fn create_widget(&self, context: &WidgetContext) {
        let mut handle =
            WidgetHandle::new(context.id.clone(), context.definition_id.clone());
        handle.active = true;
        handle.size = context.size;

        info!("Created widget {} ({})", context.id, context.definition_id);
        self.inner.registry().insert(handle);
        self.inner.start_loading(&context.id);
    }

    pub fn delete_widget(&self, widget_id: &str, custom_state: &str) {
        self.inner.cancel_refresh(widget_id);

        // Registry first: a refresh task past its last await only stores
        // updates for widgets still registered.
        let removed = self.inner.registry().remove(widget_id);
        self.inner.available_updates().remove(widget_id);

        if removed.is_some() {
            info!("Deleted widget {widget_id} (custom state {custom_state:?})");
        } else {
            debug!("Delete requested for unknown widget {widget_id}");
        }
    }

    pub fn activate(&self, context: &WidgetContext) {
        let known = self.inner.update_widget(&context.id, |widget| {
            widget.active = true;
            widget.size = context.size;
        });

        if known {
            self.inner.start_loading(&context.id);
        }
    }

    pub fn deactivate(&self, widget_id: &str) {
        self.inner.update_widget(widget_id, |widget| widget.active = false);
    }

    pub fn on_context_changed(&self, context: &WidgetContext) {
        let known = self
            .inner
            .update_widget(&context.id, |widget| widget.size = context.size);

        if known {
            self.inner.start_loading(&context.id);
        }
    }

    pub fn on_action_invoked(&self, widget_id: &str, verb: &str, data: &str) {
        if !self.inner.registry().contains(widget_id) {
            debug!("Ignoring {verb} for unknown widget {widget_id}");
            return;
        }

        debug!("Widget {widget_id} invoked {verb} with data {data:?}");

        match verb {
            verbs::RELOAD => {
                self.inner
                    .update_widget(widget_id, |widget| widget.custom_state = 0);
                self.inner.connector.reset_connection();
                self.inner.start_loading(widget_id);
            }
            verbs::SOFT_RELOAD => {
                self.inner
                    .update_widget(widget_id, |widget| widget.custom_state = 0);
            }
            verbs::OPEN_UNIGETUI | verbs::SHOW_UNIGETUI => {
                self.spawn_command(|inner| async move {
                    inner.connector.open_unigetui().await;
                });
            }
            verbs::VIEW_ON_UNIGETUI | verbs::VIEW_UPDATES_ON_UNIGETUI => {
                self.spawn_command(|inner| async move {
                    inner.connector.view_updates().await;
                });
            }
            verbs::UPDATE_ALL => {
                self.inner
                    .update_widget(widget_id, |widget| widget.custom_state = 1);
                self.spawn_command(|inner| async move {
                    inner.connector.update_all_packages().await;
                });
                self.inner.render(widget_id, &WidgetState::UpdatesInCourse);
            }
            other => match other.strip_prefix(verbs::UPDATE_PACKAGE_PREFIX) {
                Some(index) => self.update_package_at(widget_id, index),
                None => {
                    warn!("Invalid verb {other} for widget {widget_id}");
                    self.inner.start_loading(widget_id);
                }
            },
        }
    }

    /// Snapshot of a registered widget.
    pub fn widget(&self, widget_id: &str) -> Option<WidgetHandle> {
        self.inner.registry().get(widget_id).cloned()
    }

    pub fn widget_count(&self) -> usize {
        self.inner.registry().len()
    }

    pub fn empty_signal(&self) -> EmptyRegistrySignal {
        self.inner.registry().empty_signal().clone()
    }

    fn update_package_at(&self, widget_id: &str, index: &str) {
        let Ok(index) = index.parse::<usize>() else {
            warn!("Invalid package index {index:?} for widget {widget_id}");
            return;
        };

        let package = {
            let mut available = self.inner.available_updates();
            match available.get_mut(widget_id) {
                Some(packages) if index < packages.len() => packages.remove(index),
                _ => {
                    warn!("Widget {widget_id} has no package at index {index}");
                    return;
                }
            }
        };

        info!("Updating {} from widget {widget_id}", package.id);
        self.spawn_command(move |inner| async move {
            inner.connector.update_package(package.id).await;
        });
        self.inner.draw_updates(widget_id);
    }

    fn spawn_command<F, Fut>(&self, command: F)
    where
        F: FnOnce(Arc<Inner<H, C>>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.runtime.spawn(command(Arc::clone(&self.inner)));
    }
}

impl<H: WidgetHost, C: Connector> Inner<H, C> {
    fn registry(&self) -> MutexGuard<'_, WidgetRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available_updates(
        &self,
    ) -> MutexGuard<'_, HashMap<String, Vec<PackageRecord>>> {
        self.available_updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_tasks(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.refresh_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to a registered widget. Returns whether it exists.
    fn update_widget(
        &self,
        widget_id: &str,
        change: impl FnOnce(&mut WidgetHandle),
    ) -> bool {
        match self.registry().get_mut(widget_id) {
            Some(widget) => {
                change(widget);
                true
            }
            None => false,
        }
    }

    fn cancel_refresh(&self, widget_id: &str) {
        if let Some(task) = self.refresh_tasks().remove(widget_id) {
            task.abort();
        }
    }

    fn start_loading(self: &Arc<Self>, widget_id: &str) {
        let Some(widget) = self.registry().get(widget_id).cloned() else {
            return;
        };

        info!("Starting load routine for widget {widget_id}");
        self.cancel_refresh(widget_id);
        self.render(widget_id, &WidgetState::Loading);

        let inner = Arc::clone(self);
        let task = self.runtime.spawn(inner.refresh(widget));
        self.refresh_tasks().insert(widget_id.to_string(), task);
    }

    async fn refresh(self: Arc<Self>, widget: WidgetHandle) {
        let connection = self.connector.connect(widget).await;
        let widget_id = connection.widget.id.clone();

        if !connection.succeeded {
            self.render(&widget_id, &WidgetState::NoConnector);
            return;
        }

        self.render(&widget_id, &WidgetState::Loading);

        let result = self.connector.fetch_updates(connection.widget).await;
        self.finish_update_check(result);
    }

    fn finish_update_check(&self, result: UpdateCheckResult) {
        let UpdateCheckResult {
            widget,
            succeeded,
            packages,
            count,
        } = result;

        if !succeeded {
            self.render(
                &widget.id,
                &WidgetState::ErrorOccurred(UPDATE_CHECK_FAILED.to_string()),
            );
            return;
        }

        let definition = WidgetDefinition::from(widget.definition_name.as_str());
        let shown: Vec<PackageRecord> = packages
            .into_iter()
            .filter(|package| package.valid && definition.accepts(package))
            .collect();

        debug!(
            "Widget {} shows {} of {count} package(s)",
            widget.id,
            shown.len()
        );

        {
            let registry = self.registry();
            if !registry.contains(&widget.id) {
                debug!("Discarding update check for removed widget {}", widget.id);
                return;
            }
            self.available_updates().insert(widget.id.clone(), shown);
        }

        self.draw_updates(&widget.id);
    }

    fn draw_updates(&self, widget_id: &str) {
        let Some(size) = self.registry().get(widget_id).map(|widget| widget.size)
        else {
            return;
        };

        let data = match self.available_updates().get(widget_id) {
            Some(packages) if !packages.is_empty() => {
                Some(updates_list_data(packages, size))
            }
            _ => None,
        };

        match data {
            Some(data) => self.push(widget_id, "UpdatesList", UPDATES_TEMPLATE, data),
            None => self.render(widget_id, &WidgetState::NoUpdatesFound),
        }
    }

    fn render(&self, widget_id: &str, state: &WidgetState) {
        self.push(widget_id, state.name(), BASE_TEMPLATE, state.data());
    }

    fn push(&self, widget_id: &str, name: &str, template: &str, data: String) {
        // Held while pushing so nothing is sent once a delete has returned.
        let registry = self.registry();
        if !registry.contains(widget_id) {
            debug!("Not rendering {name} for removed widget {widget_id}");
            return;
        }

        debug!("Rendering {name} for widget {widget_id}");
        self.host.update_widget(WidgetUpdateRequest {
            widget_id: widget_id.to_string(),
            template: template.to_string(),
            data,
        });
    }
}
