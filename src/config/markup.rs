//! External renderers declared as `[markup.<name>]` sections.

use crate::config::app::ConfigWarning;
use crate::config::source::ConfigSource;
use crate::config::validation::ConfigValidator;
use serde::Serialize;
use tracing::debug;

const MARKUP_SECTION: &str = "markup";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkupParser {
    pub enabled: bool,
    pub name: String,
    pub command: String,
    pub file_extensions: Vec<String>,
    /// Pass the content as a file path instead of on stdin.
    pub is_input_file: bool,
}

/// Collects every valid renderer in section order. Entries without a name,
/// without a valid extension or without a command are dropped with a warning.
pub fn load_markup_parsers(source: &ConfigSource, warnings: &mut Vec<ConfigWarning>) -> Vec<MarkupParser> {
    let mut parsers = Vec::new();

    for sec in source.child_sections(MARKUP_SECTION) {
        let section = sec.name();
        let name = &section[MARKUP_SECTION.len() + 1..];
        if name.is_empty() {
            ConfigWarning::MarkupEmptyName {
                section: section.to_string(),
            }
            .emit(warnings);
            continue;
        }

        let mut file_extensions = Vec::new();
        for extension in sec.key("FILE_EXTENSIONS").strings(',') {
            if ConfigValidator::is_valid_markup_extension(&extension) {
                file_extensions.push(extension);
            } else {
                ConfigWarning::MarkupInvalidExtension {
                    section: section.to_string(),
                    extension,
                }
                .emit(warnings);
            }
        }
        if file_extensions.is_empty() {
            ConfigWarning::MarkupNoExtensions { name: name.to_string() }.emit(warnings);
            continue;
        }

        let command = sec.key("RENDER_COMMAND").must_string("");
        if command.is_empty() {
            ConfigWarning::MarkupNoRenderCommand { name: name.to_string() }.emit(warnings);
            continue;
        }

        debug!(markup.name = name, markup.extensions = ?file_extensions, "Registered external renderer");
        parsers.push(MarkupParser {
            enabled: sec.key("ENABLED").must_bool(false),
            name: name.to_string(),
            command,
            file_extensions,
            is_input_file: sec.key("IS_INPUT_FILE").must_bool(false),
        });
    }

    parsers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_and_invalid_parsers() {
        let source: ConfigSource = r#"
[markup.asciidoc]
ENABLED = true
FILE_EXTENSIONS = .adoc,.asciidoc, bad
RENDER_COMMAND = "asciidoc --out-file=- -"

[markup.foo]
FILE_EXTENSIONS = .foo

[markup.noext]
FILE_EXTENSIONS = txt
RENDER_COMMAND = cat
"#
        .parse()
        .unwrap();
        let mut warnings = Vec::new();

        let parsers = load_markup_parsers(&source, &mut warnings);
        assert_eq!(parsers.len(), 1);
        assert_eq!(parsers[0].name, "asciidoc");
        assert_eq!(parsers[0].file_extensions, vec![".adoc", ".asciidoc"]);
        assert!(parsers[0].enabled);
        assert!(!parsers[0].is_input_file);

        assert!(warnings.contains(&ConfigWarning::MarkupNoRenderCommand { name: "foo".into() }));
        assert!(warnings.contains(&ConfigWarning::MarkupNoExtensions { name: "noext".into() }));
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::MarkupInvalidExtension { extension, .. } if extension == "bad")));
    }
}
