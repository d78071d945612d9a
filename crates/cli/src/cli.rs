use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "henthub", version, about = "Publish applications and widgets to the HentHub store")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Show debug output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[clap(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Package a source folder and publish it
    Publish {
        #[clap(flatten)]
        form: FormArgs,
        #[clap(flatten)]
        target: TargetArgs,
        /// Print the publish result as JSON
        #[clap(long)]
        json: bool,
    },
    /// Check a package without publishing it
    Validate {
        #[clap(flatten)]
        form: FormArgs,
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Remove a package from the store listing
    Delete {
        /// Identity of the package (case-insensitive)
        app_id: String,
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Wipe every package from a local store
    Reset {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// List published packages
    List {
        /// Filter by name or identity
        #[clap(long)]
        search: Option<String>,
        /// Print the matching index entries as JSON
        #[clap(long)]
        json: bool,
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Run the local store emulator
    Serve {
        #[clap(long)]
        port: Option<u16>,
        /// Directory the store is kept in
        #[clap(long)]
        root: Option<PathBuf>,
        /// Store website served under /store
        #[clap(long)]
        web_root: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    /// The local emulator, or a store directory with --store-dir
    Local,
    /// A GitHub repository
    Github,
}

/// Where to publish to. Unset values come from the configuration file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    #[clap(long, value_enum)]
    pub backend: Option<BackendChoice>,

    /// GitHub token
    #[clap(long, env = "HENTHUB_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// URL of the local emulator
    #[clap(long)]
    pub url: Option<String>,

    /// Write into this store directory instead of going through the emulator
    #[clap(long)]
    pub store_dir: Option<PathBuf>,
}

/// The publish form, as command line flags.
///
/// Fields read from the source folder's `manifest.json` are overridden by any
/// flag given here.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FormArgs {
    /// Package source folder
    pub source: Option<PathBuf>,

    /// Read fields from this manifest instead of the one inside the source folder
    #[clap(long)]
    pub manifest: Option<PathBuf>,

    /// Package icon
    #[clap(long)]
    pub icon: Option<PathBuf>,

    /// Screenshot, in display order (repeatable)
    #[clap(long = "screenshot")]
    pub screenshots: Vec<PathBuf>,

    /// Edit an already published package
    #[clap(long, value_name = "APP_ID")]
    pub edit: Option<String>,

    #[clap(long)]
    pub app_id: Option<String>,
    #[clap(long)]
    pub name: Option<String>,
    #[clap(long = "app-version")]
    pub version: Option<String>,
    #[clap(long)]
    pub author: Option<String>,
    #[clap(long)]
    pub description: Option<String>,
    /// application or widget
    #[clap(long = "type", value_name = "TYPE")]
    pub extension_type: Option<String>,
    #[clap(long = "min-os")]
    pub min_os_version: Option<String>,
    #[clap(long)]
    pub terminal_only: Option<bool>,
    #[clap(long)]
    pub single_instance: Option<bool>,
    #[clap(long, value_delimiter = ',')]
    pub permissions: Vec<String>,
    /// Identities of packages this one depends on
    #[clap(long = "dependency", value_delimiter = ',')]
    pub dependencies: Vec<String>,

    #[clap(long)]
    pub entry_point: Option<String>,
    #[clap(long)]
    pub entry_class: Option<String>,
    #[clap(long)]
    pub entry_method: Option<String>,

    #[clap(long)]
    pub widget_class: Option<String>,
    #[clap(long)]
    pub width: Option<f64>,
    #[clap(long)]
    pub height: Option<f64>,
    #[clap(long)]
    pub resizable: Option<bool>,
    /// Manual, Interval or OnEvent
    #[clap(long)]
    pub refresh_policy: Option<String>,
    #[clap(long)]
    pub interval_ms: Option<u64>,
    #[clap(long = "subscription", value_delimiter = ',')]
    pub subscriptions: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get a configuration value
    Get { key: String },
    /// Show the configuration, or one section of it
    Show {
        /// backend, github, emulator or publish
        section: Option<String>,
    },
    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}
