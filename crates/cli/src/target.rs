//! Resolving which store a command talks to.

use std::path::PathBuf;

use eyre::{Result, WrapErr};
use henthub_store::stores::GitHubConfig;
use henthub_store::{BackendConfig, BackendKind, StoreBackend};

use crate::cli::{BackendChoice, TargetArgs};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Target {
    pub kind: BackendKind,
    /// Token handed to the validation gate; only set for GitHub.
    pub credential: Option<String>,
    backend: BackendConfig,
}

impl Target {
    /// Flags win over the configuration file. `--token` also reads `HENTHUB_GITHUB_TOKEN`.
    pub fn resolve(config: &Config, args: &TargetArgs) -> Result<Self> {
        let choice = match args.backend {
            Some(choice) => choice,
            None => match config.backend.mode.as_str() {
                "local" => BackendChoice::Local,
                "github" => BackendChoice::Github,
                other => return Err(eyre::eyre!("Invalid backend mode in config: {}", other)),
            },
        };

        match choice {
            BackendChoice::Local => {
                let url = args
                    .url
                    .clone()
                    .unwrap_or_else(|| config.backend.local_url.clone());
                let store_dir = args
                    .store_dir
                    .clone()
                    .or_else(|| config.backend.store_dir.as_ref().map(PathBuf::from));

                let backend = match store_dir {
                    Some(root) => BackendConfig::Filesystem {
                        root,
                        public_base: Some(url),
                    },
                    None => BackendConfig::Emulator { url },
                };
                Ok(Self {
                    kind: BackendKind::Local,
                    credential: None,
                    backend,
                })
            }
            BackendChoice::Github => {
                let settings = &config.github;
                if settings.owner.trim().is_empty() || settings.repo.trim().is_empty() {
                    return Err(eyre::eyre!(
                        "GitHub repository not configured; run `henthub config set github.owner <owner>` and `henthub config set github.repo <repo>`"
                    ));
                }

                let credential = args
                    .token
                    .clone()
                    .or_else(|| settings.token.clone())
                    .filter(|token| !token.trim().is_empty());

                let mut github = GitHubConfig::new(
                    &settings.owner,
                    &settings.repo,
                    credential.clone().unwrap_or_default(),
                );
                github.branch = settings.branch.clone();
                github.pages_base = settings.pages_base.clone();

                Ok(Self {
                    kind: BackendKind::Remote,
                    credential,
                    backend: BackendConfig::Github(github),
                })
            }
        }
    }

    pub fn open(&self) -> Result<Box<dyn StoreBackend>> {
        if self.kind == BackendKind::Remote && self.credential.is_none() {
            return Err(eyre::eyre!(
                "A GitHub token is required: pass --token, set HENTHUB_GITHUB_TOKEN or run `henthub config set github.token <token>`"
            ));
        }
        self.backend
            .clone()
            .create()
            .wrap_err("Failed to open the store backend")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_emulator() {
        let target = Target::resolve(&Config::default(), &TargetArgs::default()).unwrap();
        assert_eq!(target.kind, BackendKind::Local);
        assert!(matches!(
            target.backend,
            BackendConfig::Emulator { ref url } if url == "http://localhost:3000"
        ));
    }

    #[test]
    fn test_store_dir_selects_filesystem() {
        let args = TargetArgs {
            store_dir: Some("./store".into()),
            ..Default::default()
        };
        let target = Target::resolve(&Config::default(), &args).unwrap();
        assert!(matches!(target.backend, BackendConfig::Filesystem { .. }));
        assert!(target.open().is_ok());
    }

    #[test]
    fn test_github_needs_repository_and_token() {
        let args = TargetArgs {
            backend: Some(BackendChoice::Github),
            ..Default::default()
        };
        assert!(Target::resolve(&Config::default(), &args).is_err());

        let mut config = Config::default();
        config.github.owner = "octo".to_string();
        config.github.repo = "store".to_string();
        let target = Target::resolve(&config, &args).unwrap();
        assert_eq!(target.kind, BackendKind::Remote);
        assert!(target.credential.is_none());
        assert!(target.open().is_err());

        let args = TargetArgs {
            token: Some("ghp_x".to_string()),
            ..args
        };
        let target = Target::resolve(&config, &args).unwrap();
        assert_eq!(target.credential.as_deref(), Some("ghp_x"));
        assert!(target.open().is_ok());
    }
}
