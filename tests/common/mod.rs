//! Common test utilities and fixtures

use gitea_settings::git::FixedGitVersion;
use gitea_settings::{load, load_core, LoadOptions, Result, Services, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GIT_VERSION: &str = "2.20.1";

/// A throwaway installation: a work directory with an optional custom config.
pub struct TestInstance {
    pub dir: TempDir,
}

impl TestInstance {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Creates the instance with `custom/conf/app.ini` holding `ini`.
    pub fn with_config(ini: &str) -> Self {
        let instance = Self::new();
        instance.write_config(ini);
        instance
    }

    pub fn work_path(&self) -> &Path {
        self.dir.path()
    }

    pub fn custom_conf(&self) -> PathBuf {
        self.dir.path().join("custom/conf/app.ini")
    }

    pub fn write_config(&self, ini: &str) {
        let conf = self.custom_conf();
        fs::create_dir_all(conf.parent().expect("config dir")).expect("create config dir");
        fs::write(conf, ini).expect("write config");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.custom_conf()).expect("read config")
    }

    /// Hermetic options: nothing is taken from the real environment.
    pub fn options(&self) -> LoadOptions {
        LoadOptions::new()
            .with_app_path(self.dir.path().join("gitea"))
            .with_work_path(self.dir.path())
            .with_custom_path(self.dir.path().join("custom"))
            .with_home_dir(self.dir.path().join("home"))
            .with_temp_dir(self.dir.path().join("tmp"))
            .with_current_user("git")
    }

    pub fn load_core(&self) -> Result<Settings> {
        load_core(&self.options(), &FixedGitVersion(GIT_VERSION.into()))
    }

    pub fn load(&self) -> Result<(Settings, Services)> {
        load(&self.options(), &FixedGitVersion(GIT_VERSION.into()))
    }
}

impl Default for TestInstance {
    fn default() -> Self {
        Self::new()
    }
}
