// src/config/picture.rs

use crate::config::environment::resolve_against;
use crate::config::server::url_authority;
use crate::config::source::ConfigSource;
use crate::config::validation::ConfigValidator;
use crate::error::{ConfigError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::Url;

const GRAVATAR_PRESETS: &[(&str, &str)] = &[
    ("duoshuo", "http://gravatar.duoshuo.com/avatar/"),
    ("gravatar", "https://secure.gravatar.com/avatar/"),
    ("libravatar", "https://seccdn.libravatar.org/avatar/"),
];

/// Federated avatar lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibravatarSettings {
    pub use_https: bool,
    /// Host (with port, if any) of the gravatar source, used when the lookup fails.
    pub fallback_host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureSettings {
    pub avatar_upload_path: PathBuf,
    pub avatar_max_width: u32,
    pub avatar_max_height: u32,
    pub gravatar_source: String,
    pub disable_gravatar: bool,
    pub enable_federated_avatar: bool,
    pub libravatar: Option<LibravatarSettings>,
}

/// Validates the source as leniently as a browser would resolve it: absolute
/// URLs, scheme-relative `//host/path` values and plain paths pass. Returns
/// whether the source is an https URL and its `host[:port]`.
fn inspect_gravatar_source(source: &str) -> Result<(bool, String)> {
    let invalid = |e: url::ParseError| {
        ConfigError::invalid_value("picture", "GRAVATAR_SOURCE", source, e.to_string())
    };
    match Url::parse(source) {
        Ok(parsed) => Ok((parsed.scheme() == "https", url_authority(source).to_string())),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse("http://localhost/").map_err(invalid)?;
            base.join(source).map_err(invalid)?;
            Ok((false, url_authority(source).to_string()))
        }
        Err(e) => Err(invalid(e)),
    }
}

/// Expands a preset name into its avatar URL; anything else is taken literally.
pub fn gravatar_source_url(source: &str) -> String {
    GRAVATAR_PRESETS
        .iter()
        .find(|(name, _)| *name == source)
        .map(|(_, url)| url.to_string())
        .unwrap_or_else(|| source.to_string())
}

impl PictureSettings {
    pub fn from_source(
        source: &ConfigSource,
        app_data_path: &Path,
        work_path: &Path,
        offline_mode: bool,
        install_lock: bool,
    ) -> Result<Self> {
        let sec = source.section("picture");

        let upload_path = sec
            .key("AVATAR_UPLOAD_PATH")
            .must_string(&app_data_path.join("avatars").to_string_lossy());
        ConfigValidator::force_path_separator(&upload_path)?;

        let gravatar_source = gravatar_source_url(&sec.key("GRAVATAR_SOURCE").must_string("gravatar"));
        let mut disable_gravatar = sec.key("DISABLE_GRAVATAR").must_bool(false);
        let mut enable_federated_avatar = sec.key("ENABLE_FEDERATED_AVATAR").must_bool(!install_lock);
        if offline_mode {
            disable_gravatar = true;
            enable_federated_avatar = false;
        }
        if disable_gravatar {
            enable_federated_avatar = false;
        }

        let mut libravatar = None;
        if enable_federated_avatar || !disable_gravatar {
            let (use_https, fallback_host) = inspect_gravatar_source(&gravatar_source)?;
            if enable_federated_avatar {
                libravatar = Some(LibravatarSettings {
                    use_https,
                    fallback_host,
                });
            }
        }

        Ok(Self {
            avatar_upload_path: resolve_against(work_path, &upload_path),
            avatar_max_width: sec.key("AVATAR_MAX_WIDTH").must_int(4096),
            avatar_max_height: sec.key("AVATAR_MAX_HEIGHT").must_int(3072),
            gravatar_source,
            disable_gravatar,
            enable_federated_avatar,
            libravatar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str, offline: bool, install_lock: bool) -> Result<PictureSettings> {
        let source: ConfigSource = text.parse().unwrap();
        PictureSettings::from_source(&source, Path::new("/data"), Path::new("/work"), offline, install_lock)
    }

    #[test]
    fn test_defaults_before_install() {
        let picture = load("", false, false).unwrap();
        assert_eq!(picture.avatar_upload_path, PathBuf::from("/data/avatars"));
        assert_eq!(picture.gravatar_source, "https://secure.gravatar.com/avatar/");
        assert!(picture.enable_federated_avatar);
        assert_eq!(
            picture.libravatar,
            Some(LibravatarSettings {
                use_https: true,
                fallback_host: "secure.gravatar.com".to_string(),
            })
        );
    }

    #[test]
    fn test_offline_mode_disables_avatars() {
        let picture = load("[picture]\nENABLE_FEDERATED_AVATAR = true\n", true, true).unwrap();
        assert!(picture.disable_gravatar);
        assert!(!picture.enable_federated_avatar);
        assert!(picture.libravatar.is_none());
    }

    #[test]
    fn test_presets_and_literal_sources() {
        let picture = load("[picture]\nGRAVATAR_SOURCE = duoshuo\n", false, false).unwrap();
        assert_eq!(picture.libravatar.map(|l| l.use_https), Some(false));

        let picture = load("[picture]\nGRAVATAR_SOURCE = http://avatars.local:8080/a/\n", false, true).unwrap();
        assert_eq!(picture.gravatar_source, "http://avatars.local:8080/a/");
        assert!(!picture.enable_federated_avatar);
    }

    #[test]
    fn test_unparsable_source_is_rejected() {
        assert!(load("[picture]\nGRAVATAR_SOURCE = https://[broken/avatar/\n", false, true).is_err());
        assert!(load(
            "[picture]\nGRAVATAR_SOURCE = https://[broken/avatar/\nDISABLE_GRAVATAR = true\n",
            false,
            true
        )
        .is_ok());
    }

    #[test]
    fn test_relative_sources_accepted() {
        let picture = load("[picture]\nGRAVATAR_SOURCE = //cdn.example.com/avatar/\n", false, false).unwrap();
        assert_eq!(picture.gravatar_source, "//cdn.example.com/avatar/");
        assert_eq!(
            picture.libravatar,
            Some(LibravatarSettings {
                use_https: false,
                fallback_host: "cdn.example.com".to_string(),
            })
        );

        let picture = load("[picture]\nGRAVATAR_SOURCE = /avatars/\n", false, true).unwrap();
        assert_eq!(picture.gravatar_source, "/avatars/");
    }
}
