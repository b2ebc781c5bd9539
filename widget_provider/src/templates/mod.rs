pub mod package_list;

use serde_json::{Value, json};
use types::{PackageRecord, WidgetSize};

pub use package_list::{
    PackageRow, format_package_lines, hidden_summary, package_rows,
};

/// Adaptive Card holding one container per [`WidgetState`]. The host shows
/// the container whose `$root` flag is set in the data payload.
pub const BASE_TEMPLATE: &str = include_str!("../../templates/base_template.json");

/// Adaptive Card for the updates list with one table row per package, each
/// with its icon and an `updateindex<N>` action.
pub const UPDATES_TEMPLATE: &str =
    include_str!("../../templates/updates_template.json");

pub const UPDATE_CHECK_FAILED: &str = "UPDATE_CHECK_FAILED";

/// Action verbs wired into the template and understood by the provider.
pub mod verbs {
    pub const RELOAD: &str = "reload";
    pub const SOFT_RELOAD: &str = "softreload";
    pub const OPEN_UNIGETUI: &str = "openwingetui";
    pub const SHOW_UNIGETUI: &str = "showwingetui";
    pub const VIEW_ON_UNIGETUI: &str = "viewwingetui";
    pub const VIEW_UPDATES_ON_UNIGETUI: &str = "viewupdatesonwingetui";
    pub const UPDATE_ALL: &str = "updateall";

    /// Followed by the index of the package in the widget's list.
    pub const UPDATE_PACKAGE_PREFIX: &str = "updateindex";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetState {
    NoConnector,
    Loading,
    NoUpdatesFound,
    UpdatesList { count: usize, packages: String },
    ErrorOccurred(String),
    UpdatesInCourse,
}

impl WidgetState {
    /// Data payload selecting this state in [`BASE_TEMPLATE`].
    pub fn data(&self) -> String {
        self.payload().to_string()
    }

    fn payload(&self) -> Value {
        match self {
            Self::NoConnector => json!({ "NoWingetUI": true }),
            Self::Loading => json!({ "IsLoading": true }),
            Self::NoUpdatesFound => json!({ "NoUpdatesFound": true }),
            Self::UpdatesList { count, packages } => json!({
                "UpdatesList": true,
                "count": count.to_string(),
                "upgradablePackages": packages,
            }),
            Self::ErrorOccurred(code) => json!({
                "ErrorOccurred": true,
                "errorcode": code,
            }),
            Self::UpdatesInCourse => json!({ "UpdatesInCourse": true }),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoConnector => "NoConnector",
            Self::Loading => "Loading",
            Self::NoUpdatesFound => "NoUpdatesFound",
            Self::UpdatesList { .. } => "UpdatesList",
            Self::ErrorOccurred(_) => "ErrorOccurred",
            Self::UpdatesInCourse => "UpdatesInCourse",
        }
    }
}

/// Data for [`UPDATES_TEMPLATE`]: the [`WidgetState::UpdatesList`] payload
/// for `packages`, plus the table `rows` and the `summary` of packages left
/// out of the table.
pub fn updates_list_data(packages: &[PackageRecord], size: WidgetSize) -> String {
    let state = WidgetState::UpdatesList {
        count: packages.len(),
        packages: format_package_lines(packages, size),
    };

    let mut data = state.payload();
    data["rows"] = json!(package_rows(packages, size));
    data["summary"] = json!(hidden_summary(packages, size));
    data.to_string()
}
