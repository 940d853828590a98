//! `[repository]` with its editor, upload, local and pull-request
//! sub-sections, plus `[attachment]`.

use crate::config::environment::resolve_against;
use crate::config::source::ConfigSource;
use crate::config::validation::ConfigValidator;
use crate::error::Result;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

pub const REPO_CREATING_LAST_USER_VISIBILITY: &str = "last";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSettings {
    pub line_wrap_extensions: Vec<String>,
    pub previewable_file_modes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSettings {
    pub enabled: bool,
    pub temp_path: PathBuf,
    pub allowed_types: Vec<String>,
    /// Megabytes.
    pub file_max_size: u64,
    pub max_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalSettings {
    pub local_copy_path: String,
    pub local_wiki_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestSettings {
    pub work_in_progress_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySettings {
    pub root_path: PathBuf,
    pub script_type: String,
    pub ansi_charset: String,
    pub force_private: bool,
    pub default_private: String,
    /// `-1` means unlimited.
    pub max_creation_limit: i64,
    pub mirror_queue_length: usize,
    pub pull_request_queue_length: usize,
    pub preferred_licenses: Vec<String>,
    pub disable_http_git: bool,
    pub access_control_allow_origin: String,
    pub use_compat_ssh_uri: bool,
    pub editor: EditorSettings,
    pub upload: UploadSettings,
    pub local: LocalSettings,
    pub pull_request: PullRequestSettings,
}

/// Lexical path cleaning: drops `.` segments and duplicate separators and
/// folds `..` into the preceding segment. `..` directly under the root is
/// dropped; leading `..` of a relative path is kept.
fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

impl RepositorySettings {
    pub fn from_source(source: &ConfigSource, home_dir: &Path, work_path: &Path) -> Result<Self> {
        let sec = source.section("repository");
        let editor = source.section("repository.editor");
        let upload = source.section("repository.upload");
        let local = source.section("repository.local");
        let pull_request = source.section("repository.pull-request");

        let root = sec
            .key("ROOT")
            .must_string(&home_dir.join("gitea-repositories").to_string_lossy());
        ConfigValidator::force_path_separator(&root)?;
        let root_path = clean(&resolve_against(work_path, &root));

        Ok(Self {
            root_path,
            script_type: sec.key("SCRIPT_TYPE").must_string("bash"),
            ansi_charset: sec.key("ANSI_CHARSET").string(),
            force_private: sec.key("FORCE_PRIVATE").must_bool(false),
            default_private: sec
                .key("DEFAULT_PRIVATE")
                .must_string(REPO_CREATING_LAST_USER_VISIBILITY),
            max_creation_limit: sec.key("MAX_CREATION_LIMIT").must_int(-1),
            mirror_queue_length: sec.key("MIRROR_QUEUE_LENGTH").must_int(1000),
            pull_request_queue_length: sec.key("PULL_REQUEST_QUEUE_LENGTH").must_int(1000),
            preferred_licenses: sec
                .key("PREFERRED_LICENSES")
                .must_strings(',', &["Apache License 2.0", "MIT License"]),
            disable_http_git: sec.key("DISABLE_HTTP_GIT").must_bool(false),
            access_control_allow_origin: sec.key("ACCESS_CONTROL_ALLOW_ORIGIN").string(),
            use_compat_ssh_uri: sec.key("USE_COMPAT_SSH_URI").must_bool(false),
            editor: EditorSettings {
                line_wrap_extensions: editor
                    .key("LINE_WRAP_EXTENSIONS")
                    .must_strings(',', &[".txt", ".md", ".markdown", ".mdown", ".mkd", ""]),
                previewable_file_modes: editor
                    .key("PREVIEWABLE_FILE_MODES")
                    .must_strings(',', &["markdown"]),
            },
            upload: UploadSettings {
                enabled: upload.key("ENABLED").must_bool(true),
                temp_path: resolve_against(work_path, upload.key("TEMP_PATH").must_string("data/tmp/uploads")),
                allowed_types: upload.key("ALLOWED_TYPES").strings('|'),
                file_max_size: upload.key("FILE_MAX_SIZE").must_int(3),
                max_files: upload.key("MAX_FILES").must_int(5),
            },
            local: LocalSettings {
                local_copy_path: local.key("LOCAL_COPY_PATH").must_string("tmp/local-repo"),
                local_wiki_path: local.key("LOCAL_WIKI_PATH").must_string("tmp/local-wiki"),
            },
            pull_request: PullRequestSettings {
                work_in_progress_prefixes: pull_request
                    .key("WORK_IN_PROGRESS_PREFIXES")
                    .must_strings(',', &["WIP:", "[WIP]"]),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSettings {
    pub enabled: bool,
    pub path: PathBuf,
    /// Comma separated MIME types.
    pub allowed_types: String,
    /// Megabytes.
    pub max_size: u64,
    pub max_files: usize,
}

impl AttachmentSettings {
    pub fn from_source(source: &ConfigSource, app_data_path: &Path, work_path: &Path) -> Self {
        let sec = source.section("attachment");
        Self {
            enabled: sec.key("ENABLED").must_bool(true),
            path: resolve_against(
                work_path,
                sec.key("PATH")
                    .must_string(&app_data_path.join("attachments").to_string_lossy()),
            ),
            allowed_types: sec
                .key("ALLOWED_TYPES")
                .must_string("image/jpeg,image/png,application/zip,application/gzip")
                .replace('|', ","),
            max_size: sec.key("MAX_SIZE").must_int(4),
            max_files: sec.key("MAX_FILES").must_int(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_repository_defaults() {
        let repo = RepositorySettings::from_source(&ConfigSource::new(), Path::new("/home/git"), Path::new("/opt/gitea"))
            .unwrap();
        assert_eq!(repo.root_path, PathBuf::from("/home/git/gitea-repositories"));
        assert_eq!(repo.upload.temp_path, PathBuf::from("/opt/gitea/data/tmp/uploads"));
        assert_eq!(repo.default_private, REPO_CREATING_LAST_USER_VISIBILITY);
        assert_eq!(repo.max_creation_limit, -1);
        assert_eq!(repo.preferred_licenses, vec!["Apache License 2.0", "MIT License"]);
        assert_eq!(repo.editor.line_wrap_extensions.last().map(String::as_str), Some(""));
        assert_eq!(repo.pull_request.work_in_progress_prefixes, vec!["WIP:", "[WIP]"]);
    }

    #[test]
    fn test_repository_root_resolution() {
        let source: ConfigSource = "[repository]\nROOT = repos/./main\n[repository.upload]\nALLOWED_TYPES = image/png|text/plain\n"
            .parse()
            .unwrap();
        let repo = RepositorySettings::from_source(&source, Path::new("/home/git"), Path::new("/opt/gitea")).unwrap();
        assert_eq!(repo.root_path, PathBuf::from("/opt/gitea/repos/main"));
        assert_eq!(repo.upload.allowed_types, vec!["image/png", "text/plain"]);
    }

    #[test]
    fn test_clean_folds_parent_segments() {
        assert_eq!(clean(Path::new("/srv/repos/../git")), PathBuf::from("/srv/git"));
        assert_eq!(clean(Path::new("/srv/./a/b/../../c")), PathBuf::from("/srv/c"));
        assert_eq!(clean(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(clean(Path::new("../x/..")), PathBuf::from(".."));
        assert_eq!(clean(Path::new("a/..")), PathBuf::from("."));

        let source: ConfigSource = "[repository]\nROOT = repos/../git\n".parse().unwrap();
        let repo = RepositorySettings::from_source(&source, Path::new("/home/git"), Path::new("/opt/gitea")).unwrap();
        assert_eq!(repo.root_path, PathBuf::from("/opt/gitea/git"));
    }

    #[test]
    fn test_repository_root_rejects_backslash() {
        let source: ConfigSource = "[repository]\nROOT = D:\\repos\n".parse().unwrap();
        let result = RepositorySettings::from_source(&source, Path::new("/home/git"), Path::new("/opt/gitea"));
        assert!(matches!(result, Err(ConfigError::PathSeparator { .. })));
    }

    #[test]
    fn test_attachment_types_normalized() {
        let source: ConfigSource = "[attachment]\nALLOWED_TYPES = image/png|image/gif\nPATH = files\n"
            .parse()
            .unwrap();
        let attachment = AttachmentSettings::from_source(&source, Path::new("/data"), Path::new("/opt/gitea"));
        assert_eq!(attachment.allowed_types, "image/png,image/gif");
        assert_eq!(attachment.path, PathBuf::from("/opt/gitea/files"));
        assert_eq!(attachment.max_size, 4);
    }
}
