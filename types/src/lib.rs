use serde::{Deserialize, Serialize};

mod package;

pub use package::{DEFAULT_PACKAGE_ICON, FIELD_SEPARATOR, REQUIRED_FIELDS};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    Small,

    #[default]
    Medium,

    Large,
}

/// Per-widget state tracked by the provider for as long as the host keeps
/// the widget alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetHandle {
    pub id: String,

    pub definition_name: String,

    pub size: WidgetSize,

    pub active: bool,

    /// `0` while idle, `1` once the user asked to update everything.
    pub custom_state: i32,
}

impl WidgetHandle {
    pub fn new(id: impl Into<String>, definition_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            definition_name: definition_name.into(),
            size: WidgetSize::default(),
            active: false,
            custom_state: 0,
        }
    }
}

/// One upgradable package as reported by the companion process.
///
/// Records that could not be parsed are kept with `valid = false` and empty text
/// fields, so the number of records always matches the number of
/// entries in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,

    pub id: String,

    pub version: String,

    pub new_version: String,

    pub source: String,

    pub manager: String,

    pub icon: String,

    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionResult {
    pub widget: WidgetHandle,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheckResult {
    pub widget: WidgetHandle,
    pub succeeded: bool,
    pub packages: Vec<PackageRecord>,
    pub count: usize,
}

impl UpdateCheckResult {
    pub fn succeeded(widget: WidgetHandle, packages: Vec<PackageRecord>) -> Self {
        Self {
            widget,
            succeeded: true,
            count: packages.len(),
            packages,
        }
    }

    pub const fn failed(widget: WidgetHandle) -> Self {
        Self {
            widget,
            succeeded: false,
            packages: Vec::new(),
            count: 0,
        }
    }
}

/// The widget definitions registered with the host. Each one limits the
/// list to a single package manager, except `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetDefinition {
    All,
    Winget,
    Scoop,
    Chocolatey,
    Dotnet,
    Npm,
    Pip,
}

impl WidgetDefinition {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "updates_all",
            Self::Winget => "updates_winget",
            Self::Scoop => "updates_scoop",
            Self::Chocolatey => "updates_chocolatey",
            Self::Dotnet => "updates_dotnet",
            Self::Npm => "updates_npm",
            Self::Pip => "updates_pip",
        }
    }

    /// Manager name as it appears in the sixth field of a package record.
    pub const fn manager_name(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Winget => Some("Winget"),
            Self::Scoop => Some("Scoop"),
            Self::Chocolatey => Some("Chocolatey"),
            Self::Dotnet => Some(".NET Tool"),
            Self::Npm => Some("Npm"),
            Self::Pip => Some("Pip"),
        }
    }

    pub fn accepts(&self, package: &PackageRecord) -> bool {
        self.manager_name()
            .is_none_or(|manager| package.manager == manager)
    }
}

impl From<&str> for WidgetDefinition {
    fn from(definition_name: &str) -> Self {
        match definition_name {
            "updates_winget" => Self::Winget,
            "updates_scoop" => Self::Scoop,
            "updates_chocolatey" => Self::Chocolatey,
            "updates_dotnet" => Self::Dotnet,
            "updates_npm" => Self::Npm,
            "updates_pip" => Self::Pip,
            _ => Self::All,
        }
    }
}
