//! Application descriptors: where each supported application keeps its stores.
//!
//! The catalog is built once at startup and only read afterwards. Two layouts
//! exist. `Rooted` descriptors list candidate roots per OS and take the first
//! one that exists. `Family` descriptors scan a set of base directories for any
//! product-like directory, because VS Code forks install under many names.

use crate::core::store::{Operation, StoreFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsClass {
    Windows,
    MacOs,
    Linux,
}

impl OsClass {
    pub fn current() -> Self {
        if cfg!(windows) {
            OsClass::Windows
        } else if cfg!(target_os = "macos") {
            OsClass::MacOs
        } else {
            OsClass::Linux
        }
    }
}

/// Well-known per-user directories that candidate roots are relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseDir {
    Home,
    /// `%APPDATA%`
    RoamingAppData,
    /// `%LOCALAPPDATA%`
    LocalAppData,
    /// `~/Library/Application Support`
    AppSupport,
    /// `~/.config`
    XdgConfig,
    /// `~/.local/share`
    XdgData,
}

/// Base directories resolved for one OS class.
#[derive(Debug, Clone)]
pub struct PlatformDirs {
    pub os: OsClass,
    home: Option<PathBuf>,
    roaming_app_data: Option<PathBuf>,
    local_app_data: Option<PathBuf>,
    app_support: Option<PathBuf>,
    xdg_config: Option<PathBuf>,
    xdg_data: Option<PathBuf>,
}

impl PlatformDirs {
    /// Resolve the current user's directories for the running OS.
    pub fn detect() -> Self {
        let os = OsClass::current();
        let mut dirs = Self {
            os,
            home: dirs::home_dir(),
            roaming_app_data: None,
            local_app_data: None,
            app_support: None,
            xdg_config: None,
            xdg_data: None,
        };
        match os {
            OsClass::Windows => {
                dirs.roaming_app_data = dirs::config_dir();
                dirs.local_app_data = dirs::data_local_dir();
            }
            OsClass::MacOs => {
                dirs.app_support = dirs::config_dir();
            }
            OsClass::Linux => {
                dirs.xdg_config = dirs::config_dir();
                dirs.xdg_data = dirs::data_dir();
            }
        }
        dirs
    }

    /// Lay out every base directory under `home` using the conventions of `os`.
    pub fn under_home(os: OsClass, home: &Path) -> Self {
        Self {
            os,
            home: Some(home.to_path_buf()),
            roaming_app_data: Some(home.join("AppData").join("Roaming")),
            local_app_data: Some(home.join("AppData").join("Local")),
            app_support: Some(home.join("Library").join("Application Support")),
            xdg_config: Some(home.join(".config")),
            xdg_data: Some(home.join(".local").join("share")),
        }
    }

    pub fn resolve(&self, base: BaseDir) -> Option<&Path> {
        let dir = match base {
            BaseDir::Home => &self.home,
            BaseDir::RoamingAppData => &self.roaming_app_data,
            BaseDir::LocalAppData => &self.local_app_data,
            BaseDir::AppSupport => &self.app_support,
            BaseDir::XdgConfig => &self.xdg_config,
            BaseDir::XdgData => &self.xdg_data,
        };
        dir.as_deref()
    }

    /// Base directories searched by family scans, in search order.
    pub fn family_bases(&self) -> Vec<PathBuf> {
        let order: &[BaseDir] = match self.os {
            OsClass::Windows => &[BaseDir::RoamingAppData, BaseDir::LocalAppData, BaseDir::Home],
            OsClass::MacOs => &[BaseDir::AppSupport, BaseDir::Home],
            OsClass::Linux => &[BaseDir::XdgConfig, BaseDir::XdgData, BaseDir::Home],
        };
        order
            .iter()
            .filter_map(|b| self.resolve(*b).map(Path::to_path_buf))
            .collect()
    }
}

/// One candidate root: a path relative to a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSpec {
    pub base: BaseDir,
    pub rel: PathBuf,
}

impl RootSpec {
    pub fn new(base: BaseDir, rel: impl Into<PathBuf>) -> Self {
        Self {
            base,
            rel: rel.into(),
        }
    }

    pub fn resolve(&self, dirs: &PlatformDirs) -> Option<PathBuf> {
        dirs.resolve(self.base).map(|b| b.join(&self.rel))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformRoots {
    pub windows: Vec<RootSpec>,
    pub macos: Vec<RootSpec>,
    pub linux: Vec<RootSpec>,
}

impl PlatformRoots {
    pub fn for_os(&self, os: OsClass) -> &[RootSpec] {
        match os {
            OsClass::Windows => &self.windows,
            OsClass::MacOs => &self.macos,
            OsClass::Linux => &self.linux,
        }
    }
}

/// A store file relative to an application base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSpec {
    pub rel: PathBuf,
    pub format: StoreFormat,
}

impl StoreSpec {
    pub fn new(rel: impl Into<PathBuf>, format: StoreFormat) -> Self {
        Self {
            rel: rel.into(),
            format,
        }
    }
}

/// Scan definition for the VS Code-like family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyScan {
    /// Matched case-insensitively as substrings of directory names.
    pub products: Vec<String>,
    /// Global storage layouts relative to a product directory, tried in order.
    pub storage_dirs: Vec<PathBuf>,
    /// Directories whose every child is an independent per-workspace store dir.
    pub workspace_dirs: Vec<PathBuf>,
    /// Files looked for inside each storage or workspace directory.
    pub stores: Vec<StoreSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Rooted {
        roots: PlatformRoots,
        stores: Vec<StoreSpec>,
    },
    Family(FamilyScan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDescriptor {
    pub key: String,
    pub name: String,
    pub layout: Layout,
    pub operations: Vec<Operation>,
}

impl ApplicationDescriptor {
    pub fn supports(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn is_family(&self) -> bool {
        matches!(self.layout, Layout::Family(_))
    }
}

const VSCODE_PRODUCTS: &[(&str, &str, &str)] = &[
    ("vscode", "Visual Studio Code", "Code"),
    ("vscode-insiders", "Visual Studio Code Insiders", "Code - Insiders"),
    ("cursor", "Cursor", "Cursor"),
    ("codium", "VSCodium", "VSCodium"),
];

const JETBRAINS_PRODUCTS: &[(&str, &str, &str)] = &[
    ("intellij", "IntelliJ IDEA", "IntelliJIdea"),
    ("pycharm", "PyCharm", "PyCharm"),
    ("webstorm", "WebStorm", "WebStorm"),
    ("phpstorm", "PhpStorm", "PhpStorm"),
];

const JETBRAINS_RELEASES: &[&str] = &["2024.3", "2024.2", "2024.1"];

const FAMILY_PRODUCTS: &[&str] = &[
    "Code",
    "Code - Insiders",
    "VSCodium",
    "code-server",
    "Cursor",
    "Windsurf",
    "Zed",
];

fn vscode_stores() -> Vec<StoreSpec> {
    vec![
        StoreSpec::new("globalStorage/state.vscdb", StoreFormat::Tabular),
        StoreSpec::new("globalStorage/storage.json", StoreFormat::Document),
    ]
}

fn vscode_descriptor(key: &str, name: &str, product: &str) -> ApplicationDescriptor {
    let user = PathBuf::from(product).join("User");
    ApplicationDescriptor {
        key: key.to_string(),
        name: name.to_string(),
        layout: Layout::Rooted {
            roots: PlatformRoots {
                windows: vec![RootSpec::new(BaseDir::RoamingAppData, user.clone())],
                macos: vec![RootSpec::new(BaseDir::AppSupport, user.clone())],
                linux: vec![RootSpec::new(BaseDir::XdgConfig, user)],
            },
            stores: vscode_stores(),
        },
        operations: vec![Operation::Purge, Operation::Regenerate],
    }
}

fn jetbrains_descriptor(key: &str, name: &str, product: &str) -> ApplicationDescriptor {
    let candidates = |base: BaseDir| -> Vec<RootSpec> {
        JETBRAINS_RELEASES
            .iter()
            .map(|rel| RootSpec::new(base, PathBuf::from("JetBrains").join(format!("{}{}", product, rel))))
            .collect()
    };
    ApplicationDescriptor {
        key: key.to_string(),
        name: name.to_string(),
        layout: Layout::Rooted {
            roots: PlatformRoots {
                windows: candidates(BaseDir::RoamingAppData),
                macos: candidates(BaseDir::AppSupport),
                linux: candidates(BaseDir::XdgConfig),
            },
            stores: vec![
                StoreSpec::new("options/other.xml", StoreFormat::Tree),
                StoreSpec::new("options/ide.general.xml", StoreFormat::Tree),
            ],
        },
        operations: vec![Operation::Purge],
    }
}

/// VS Code-like editors found by scanning instead of by fixed roots.
pub fn family_descriptor() -> ApplicationDescriptor {
    ApplicationDescriptor {
        key: "vscode-family".to_string(),
        name: "VS Code-like editors".to_string(),
        layout: Layout::Family(FamilyScan {
            products: FAMILY_PRODUCTS.iter().map(|p| p.to_string()).collect(),
            storage_dirs: vec![
                PathBuf::from("User/globalStorage"),
                PathBuf::from("data/User/globalStorage"),
            ],
            workspace_dirs: vec![
                PathBuf::from("User/workspaceStorage"),
                PathBuf::from("data/User/workspaceStorage"),
            ],
            stores: vec![
                StoreSpec::new("state.vscdb", StoreFormat::Tabular),
                StoreSpec::new("storage.json", StoreFormat::Document),
            ],
        }),
        operations: vec![Operation::Purge, Operation::Regenerate],
    }
}

/// Every built-in descriptor, fixed-root applications first, family scan last.
pub fn builtin() -> Vec<ApplicationDescriptor> {
    let mut all: Vec<ApplicationDescriptor> = VSCODE_PRODUCTS
        .iter()
        .map(|(k, n, p)| vscode_descriptor(k, n, p))
        .collect();
    all.extend(
        JETBRAINS_PRODUCTS
            .iter()
            .map(|(k, n, p)| jetbrains_descriptor(k, n, p)),
    );
    all.push(family_descriptor());
    all
}

/// Keep descriptors whose key is listed; an empty filter keeps everything.
pub fn select(catalog: Vec<ApplicationDescriptor>, keys: &[String], family_scan: bool) -> Vec<ApplicationDescriptor> {
    catalog
        .into_iter()
        .filter(|d| family_scan || !d.is_family())
        .filter(|d| keys.is_empty() || keys.iter().any(|k| k.eq_ignore_ascii_case(&d.key)))
        .collect()
}
