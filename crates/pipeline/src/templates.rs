//! Workflow template registry.
//!
//! Workflow graphs are opaque JSON documents shipped as files, one per
//! stage, with `{{placeholder}}` markers inside string values. The
//! registry loads every `*.json` in a directory at startup and renders
//! a graph by deep-cloning the template and substituting parameters.
//! A graph with an unresolved placeholder is never submitted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory store of named workflow templates.
#[derive(Debug)]
pub struct TemplateRegistry {
    templates: HashMap<String, serde_json::Value>,
}

/// Errors from template loading and rendering.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Reading the template directory or a file failed.
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file is not valid JSON.
    #[error("Template {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No template with the requested name is loaded.
    #[error("Unknown template: {0}")]
    Unknown(String),

    /// A placeholder survived rendering, so the graph is incomplete.
    #[error("Template {template} has unresolved placeholder {{{{{placeholder}}}}}")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },
}

impl TemplateRegistry {
    /// Load every `*.json` file in `dir`. The template name is the file
    /// stem (`text_to_image.json` -> `text_to_image`).
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let entries = std::fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut templates = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| TemplateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            let graph: serde_json::Value =
                serde_json::from_str(&text).map_err(|source| TemplateError::Parse {
                    path: path.clone(),
                    source,
                })?;

            tracing::debug!(template = name, path = %path.display(), "Loaded workflow template");
            templates.insert(name.to_string(), graph);
        }

        tracing::info!(count = templates.len(), dir = %dir.display(), "Workflow templates loaded");

        Ok(Self { templates })
    }

    /// Names of all loaded templates, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render a template by substituting `{{key}}` markers with values
    /// from `params`. Fails if the name is unknown or any placeholder
    /// is left unresolved.
    pub fn render(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<serde_json::Value, TemplateError> {
        let mut graph = self
            .templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))?;

        substitute(&mut graph, params);

        if let Some(placeholder) = find_placeholder(&graph) {
            return Err(TemplateError::UnresolvedPlaceholder {
                template: name.to_string(),
                placeholder,
            });
        }

        Ok(graph)
    }
}

/// Replace every `{{key}}` occurrence inside string values, recursively.
fn substitute(value: &mut serde_json::Value, params: &HashMap<String, String>) {
    match value {
        serde_json::Value::String(text) => {
            if text.contains("{{") {
                for (key, replacement) in params {
                    let marker = format!("{{{{{key}}}}}");
                    if text.contains(&marker) {
                        *text = text.replace(&marker, replacement);
                    }
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                substitute(item, params);
            }
        }
        serde_json::Value::Object(fields) => {
            for field in fields.values_mut() {
                substitute(field, params);
            }
        }
        _ => {}
    }
}

/// Find the first remaining `{{name}}` marker, if any.
fn find_placeholder(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => {
            let start = text.find("{{")?;
            let end = text[start..].find("}}")?;
            Some(text[start + 2..start + end].to_string())
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_placeholder),
        serde_json::Value::Object(fields) => fields.values().find_map(find_placeholder),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn registry_with(files: &[(&str, &str)]) -> TemplateRegistry {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(format!("{name}.json")), content).unwrap();
        }
        TemplateRegistry::load(dir.path()).unwrap()
    }

    #[test]
    fn loads_templates_by_file_stem() {
        let registry = registry_with(&[("a", "{}"), ("b", "{}")]);
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn non_json_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("graph.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        let registry = TemplateRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["graph"]);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        let error = TemplateRegistry::load(dir.path()).unwrap_err();
        assert_matches!(error, TemplateError::Parse { .. });
    }

    #[test]
    fn render_substitutes_nested_placeholders() {
        let registry = registry_with(&[(
            "graph",
            r#"{"6":{"inputs":{"text":"{{prompt}}, best quality"}}}"#,
        )]);
        let graph = registry
            .render("graph", &params(&[("prompt", "a red pepper")]))
            .unwrap();
        assert_eq!(graph["6"]["inputs"]["text"], "a red pepper, best quality");
    }

    #[test]
    fn render_replaces_repeated_markers() {
        let registry = registry_with(&[(
            "graph",
            r#"{"a":"{{name}}","b":["{{name}}"]}"#,
        )]);
        let graph = registry
            .render("graph", &params(&[("name", "x")]))
            .unwrap();
        assert_eq!(graph["a"], "x");
        assert_eq!(graph["b"][0], "x");
    }

    #[test]
    fn render_unknown_template_fails() {
        let registry = registry_with(&[]);
        let error = registry.render("missing", &params(&[])).unwrap_err();
        assert_matches!(error, TemplateError::Unknown(name) => assert_eq!(name, "missing"));
    }

    #[test]
    fn render_fails_on_unresolved_placeholder() {
        let registry = registry_with(&[("graph", r#"{"a":"{{left_over}}"}"#)]);
        let error = registry.render("graph", &params(&[])).unwrap_err();
        assert_matches!(error, TemplateError::UnresolvedPlaceholder { placeholder, .. } => {
            assert_eq!(placeholder, "left_over");
        });
    }

    #[test]
    fn render_does_not_mutate_the_stored_template() {
        let registry = registry_with(&[("graph", r#"{"a":"{{v}}"}"#)]);
        registry.render("graph", &params(&[("v", "1")])).unwrap();
        let again = registry.render("graph", &params(&[("v", "2")])).unwrap();
        assert_eq!(again["a"], "2");
    }

    #[test]
    fn shipped_templates_parse_and_render() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let registry = TemplateRegistry::load(&dir).unwrap();
        assert_eq!(registry.names(), vec!["mesh", "multiview", "text_to_image"]);

        registry
            .render(
                "text_to_image",
                &params(&[("prompt", "a pepper"), ("negative_prompt", "shadow")]),
            )
            .unwrap();
        registry
            .render(
                "multiview",
                &params(&[("reference_image", "/out/ref.png"), ("prompt", "a pepper")]),
            )
            .unwrap();
        registry
            .render(
                "mesh",
                &params(&[
                    ("front_image", "/tmp/f.png"),
                    ("back_image", "/tmp/b.png"),
                    ("left_image", "/tmp/l.png"),
                ]),
            )
            .unwrap();
    }
}
