use directories::ProjectDirs;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Top-level sections of the config file, in display order.
pub const SECTIONS: [&str; 4] = ["backend", "github", "emulator", "publish"];

const NOT_SET: &str = "(not set)";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub emulator: EmulatorSettings,
    #[serde(default)]
    pub publish: PublishSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackendSettings {
    /// `local` or `github`
    pub mode: String,
    pub local_url: String,
    /// Publish straight into this directory instead of through the emulator.
    #[serde(default)]
    pub store_dir: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GitHubSettings {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub pages_base: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmulatorSettings {
    pub port: u16,
    pub root: String,
    #[serde(default)]
    pub web_root: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PublishSettings {
    /// PNG used for terminal-only packages published without an icon.
    #[serde(default)]
    pub default_icon: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            mode: "local".to_string(),
            local_url: "http://localhost:3000".to_string(),
            store_dir: None,
        }
    }
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            port: henthub_emulator::DEFAULT_PORT,
            root: henthub_emulator::DEFAULT_ROOT.to_string(),
            web_root: None,
        }
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()).await
    }

    /// Loads `path`, writing the defaults there first if it does not exist.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["backend", "mode"] => {
                if !matches!(value, "local" | "github") {
                    return Err(eyre::eyre!(
                        "Invalid backend mode: {} (expected local or github)",
                        value
                    ));
                }
                self.backend.mode = value.to_string();
            }
            ["backend", "local_url"] => self.backend.local_url = value.to_string(),
            ["backend", "store_dir"] => self.backend.store_dir = optional(value),
            ["github", "owner"] => self.github.owner = value.to_string(),
            ["github", "repo"] => self.github.repo = value.to_string(),
            ["github", "token"] => self.github.token = optional(value),
            ["github", "branch"] => self.github.branch = optional(value),
            ["github", "pages_base"] => self.github.pages_base = optional(value),
            ["emulator", "port"] => {
                self.emulator.port = value
                    .parse::<u16>()
                    .map_err(|_| eyre::eyre!("Invalid port: {}", value))?;
            }
            ["emulator", "root"] => self.emulator.root = value.to_string(),
            ["emulator", "web_root"] => self.emulator.web_root = optional(value),
            ["publish", "default_icon"] => self.publish.default_icon = optional(value),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    /// Current value of a dotted key, the token masked.
    pub fn get_value(&self, key: &str) -> Result<String> {
        self.settings()
            .into_iter()
            .find(|(section, name, _)| key.split_once('.') == Some((section, name)))
            .map(|(_, _, value)| value)
            .ok_or_else(|| eyre::eyre!("Unknown configuration key: {}", key))
    }

    /// Every setting as `(section, key, shown value)`, in file order.
    fn settings(&self) -> Vec<(&'static str, &'static str, String)> {
        let shown = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_SET.to_string());
        vec![
            ("backend", "mode", self.backend.mode.clone()),
            ("backend", "local_url", self.backend.local_url.clone()),
            ("backend", "store_dir", shown(&self.backend.store_dir)),
            ("github", "owner", self.github.owner.clone()),
            ("github", "repo", self.github.repo.clone()),
            ("github", "token", mask(self.github.token.as_deref())),
            ("github", "branch", shown(&self.github.branch)),
            ("github", "pages_base", shown(&self.github.pages_base)),
            ("emulator", "port", self.emulator.port.to_string()),
            ("emulator", "root", self.emulator.root.clone()),
            ("emulator", "web_root", shown(&self.emulator.web_root)),
            ("publish", "default_icon", shown(&self.publish.default_icon)),
        ]
    }

    /// Renders one section, or all of them, as a tree.
    pub fn show(&self, section: Option<&str>) -> Result<String> {
        if let Some(section) = section
            && !SECTIONS.contains(&section)
        {
            return Err(eyre::eyre!(
                "Unknown configuration section: {} (expected one of {})",
                section,
                SECTIONS.join(", ")
            ));
        }

        let settings = self.settings();
        let mut out = String::from("Configuration:");
        for current in SECTIONS.iter().filter(|s| section.is_none_or(|wanted| wanted == **s)) {
            out.push_str(&format!("\n{}:", current));
            let rows: Vec<_> = settings.iter().filter(|(s, _, _)| s == current).collect();
            for (i, (_, key, value)) in rows.iter().enumerate() {
                let branch = if i + 1 == rows.len() { "└─" } else { "├─" };
                out.push_str(&format!("\n{} {}: {}", branch, key, value));
            }
        }
        Ok(out)
    }

    /// Settings the `github` backend mode still lacks.
    pub fn missing_github_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.github.owner.is_empty() {
            missing.push("github.owner");
        }
        if self.github.repo.is_empty() {
            missing.push("github.repo");
        }
        if self.github.token.is_none() {
            missing.push("github.token");
        }
        missing
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn mask(token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => "********".to_string(),
        _ => NOT_SET.to_string(),
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "henthub", "henthub") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        PathBuf::from(".henthub").join("config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_load_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.json");

        let config = Config::load_from(&path).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(config.backend.mode, "local");
        assert_eq!(config.emulator.port, 3000);
        assert_eq!(config.emulator.root, "mock_github");
    }

    #[tokio::test]
    async fn test_set_then_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        let mut config = Config::default();
        config.set_value("github.owner", "octo").unwrap();
        config.set_value("github.token", "ghp_secret").unwrap();
        config.set_value("emulator.port", "8080").unwrap();
        config.save_to(&path).await.unwrap();

        let loaded = Config::load_from(&path).await.unwrap();
        assert_eq!(loaded.get_value("github.owner").unwrap(), "octo");
        assert_eq!(loaded.get_value("emulator.port").unwrap(), "8080");
        assert_eq!(loaded.github.token.as_deref(), Some("ghp_secret"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set_value("backend.mode", "ftp").is_err());
        assert!(config.set_value("emulator.port", "huge").is_err());
        assert!(config.set_value("nope", "x").is_err());
        assert!(config.get_value("backend.nope").is_err());
    }

    #[test]
    fn test_show_one_section() {
        let mut config = Config::default();
        config.set_value("github.owner", "octo").unwrap();

        let github = config.show(Some("github")).unwrap();
        assert_eq!(
            github,
            "Configuration:\ngithub:\n├─ owner: octo\n├─ repo: \n├─ token: (not set)\n\
             ├─ branch: (not set)\n└─ pages_base: (not set)"
        );
        assert!(!github.contains("emulator"));
        assert!(config.show(None).unwrap().ends_with("publish:\n└─ default_icon: (not set)"));
        assert!(config.show(Some("proxy")).is_err());
        assert_eq!(config.get_value("backend.store_dir").unwrap(), "(not set)");
    }

    #[test]
    fn test_missing_github_settings() {
        let mut config = Config::default();
        assert_eq!(
            config.missing_github_settings(),
            vec!["github.owner", "github.repo", "github.token"]
        );
        config.set_value("github.owner", "octo").unwrap();
        config.set_value("github.token", "ghp_secret").unwrap();
        assert_eq!(config.missing_github_settings(), vec!["github.repo"]);
    }

    #[test]
    fn test_token_is_never_shown() {
        let mut config = Config::default();
        config.set_value("github.token", "ghp_secret").unwrap();
        assert!(!config.show(None).unwrap().contains("ghp_secret"));
        assert_eq!(config.get_value("github.token").unwrap(), "********");

        config.set_value("github.token", "").unwrap();
        assert_eq!(config.github.token, None);
    }
}
