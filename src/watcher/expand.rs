//! Expansion of the declarative configuration into concrete monitors.

use std::collections::BTreeMap;

use crate::config::{MonitorConfig, MonitorFields};
use crate::{Error, Result};

/// Branch used when no layer sets one.
pub const DEFAULT_BRANCH: &str = "main";

/// One fully resolved monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSpec {
    pub repo: String,
    pub branch: String,
    pub name: String,
    pub paths: Vec<String>,
    pub paths_glob: Vec<String>,
    pub paths_regex: Vec<String>,
    pub enabled: bool,
}

impl MonitorSpec {
    /// Resolve merged fields, applying defaults for unset values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `repo` is missing or blank.
    pub fn from_fields(fields: MonitorFields) -> Result<Self> {
        let repo = fields
            .repo
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::config("monitor is missing 'repo'"))?;

        let name = fields
            .name
            .unwrap_or_else(|| repo_short_name(&repo).to_string());

        Ok(Self {
            branch: fields.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            name,
            paths: fields.paths.unwrap_or_default(),
            paths_glob: fields.paths_glob.unwrap_or_default(),
            paths_regex: fields.paths_regex.unwrap_or_default(),
            enabled: fields.enabled.unwrap_or(true),
            repo,
        })
    }

    /// Whether any glob or regex needs the repository tree.
    #[must_use]
    pub fn needs_tree(&self) -> bool {
        !self.paths_glob.is_empty() || !self.paths_regex.is_empty()
    }
}

/// Last path segment of an `owner/name` identifier.
#[must_use]
pub fn repo_short_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}

/// Replace every `{key}` placeholder with its value; unknown placeholders stay verbatim.
///
/// Substituted values are inserted as-is and never expanded again.
#[must_use]
pub fn substitute_vars(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| vars.get(&after[..close]).map(|v| (v, close)));

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Expand `batch` and `monitors` into a flat list, batch first.
///
/// Entries without a repository are logged and skipped.
#[must_use]
pub fn expand_monitors(config: &MonitorConfig) -> Vec<MonitorSpec> {
    let mut expanded = Vec::new();
    let defaults = &config.defaults.fields;

    for (batch_index, batch) in config.batch.iter().enumerate() {
        for repo in &batch.repos {
            let per_repo = MonitorFields {
                repo: Some(repo.clone()),
                ..Default::default()
            };
            let merged = MonitorFields::layered([defaults, &batch.fields, &per_repo]);
            push_resolved(&mut expanded, merged, "batch", batch_index);
        }
    }

    for (index, entry) in config.monitors.iter().enumerate() {
        let template_name = entry
            .template
            .as_ref()
            .or(config.defaults.template.as_ref());

        let template = template_name.and_then(|name| {
            let found = config.templates.get(name);
            if found.is_none() {
                tracing::warn!(template = %name, index, "Unknown template, ignoring");
            }
            found
        });

        let mut merged = match template {
            Some(template) => MonitorFields::layered([template, defaults, &entry.fields]),
            None => MonitorFields::layered([defaults, &entry.fields]),
        };

        if let (Some(vars), Some(paths)) = (&merged.vars, &merged.paths) {
            let rewritten = paths.iter().map(|p| substitute_vars(p, vars)).collect();
            merged.paths = Some(rewritten);
        }

        push_resolved(&mut expanded, merged, "monitors", index);
    }

    expanded
}

fn push_resolved(out: &mut Vec<MonitorSpec>, fields: MonitorFields, section: &str, index: usize) {
    match MonitorSpec::from_fields(fields) {
        Ok(spec) => out.push(spec),
        Err(e) => tracing::warn!(section, index, error = %e, "Skipping invalid monitor"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(json: &str) -> MonitorConfig {
        MonitorConfig::from_json(json).unwrap()
    }

    #[test]
    fn test_literal_monitor_defaults() {
        let specs = expand_monitors(&config(r#"{"monitors": [{"repo": "o/r", "paths": ["f.txt"]}]}"#));
        assert_eq!(
            specs,
            vec![MonitorSpec {
                repo: "o/r".to_string(),
                branch: "main".to_string(),
                name: "r".to_string(),
                paths: vec!["f.txt".to_string()],
                paths_glob: vec![],
                paths_regex: vec![],
                enabled: true,
            }]
        );
    }

    #[test]
    fn test_entry_wins_over_template() {
        let specs = expand_monitors(&config(
            r#"{
                "templates": {"t": {"branch": "main", "paths_glob": ["locales/*.json"]}},
                "monitors": [{"repo": "o/r", "template": "t", "branch": "dev"}]
            }"#,
        ));
        assert_eq!(specs[0].branch, "dev");
        assert_eq!(specs[0].paths_glob, vec!["locales/*.json"]);
    }

    #[test]
    fn test_defaults_win_over_template() {
        let specs = expand_monitors(&config(
            r#"{
                "templates": {"t": {"branch": "main"}},
                "defaults": {"branch": "stable"},
                "monitors": [{"repo": "o/r", "template": "t"}]
            }"#,
        ));
        assert_eq!(specs[0].branch, "stable");
    }

    #[test]
    fn test_template_from_defaults() {
        let specs = expand_monitors(&config(
            r#"{
                "templates": {"t": {"paths": ["README.md"]}},
                "defaults": {"template": "t"},
                "monitors": [{"repo": "o/r"}]
            }"#,
        ));
        assert_eq!(specs[0].paths, vec!["README.md"]);
    }

    #[test]
    fn test_unknown_template_ignored() {
        let specs = expand_monitors(&config(
            r#"{"monitors": [{"repo": "o/r", "template": "nope", "paths": ["a"]}]}"#,
        ));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].paths, vec!["a"]);
    }

    #[test]
    fn test_path_templating() {
        let specs = expand_monitors(&config(
            r#"{"monitors": [{"repo": "o/r", "vars": {"lang": "fr"}, "paths": ["locales/{lang}/app.json", "{missing}/x"]}]}"#,
        ));
        assert_eq!(specs[0].paths, vec!["locales/fr/app.json", "{missing}/x"]);
    }

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_vars() {
        let vars = vars(&[("lang", "fr"), ("app", "web")]);
        assert_eq!(
            substitute_vars("{app}/locales/{lang}/{lang}.json", &vars),
            "web/locales/fr/fr.json"
        );
        assert_eq!(substitute_vars("{missing}/{lang}", &vars), "{missing}/fr");
        assert_eq!(substitute_vars("{{lang}} {", &vars), "{fr} {");
        assert_eq!(substitute_vars("plain.json", &vars), "plain.json");
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let vars = vars(&[("a", "x"), ("b", "{a}")]);
        assert_eq!(substitute_vars("{b}", &vars), "{a}");
        assert_eq!(substitute_vars("{a}-{b}", &vars), "x-{a}");
    }

    #[test]
    fn test_vars_from_template_apply_to_entry_paths() {
        let specs = expand_monitors(&config(
            r#"{
                "templates": {"t": {"vars": {"lang": "de"}}},
                "monitors": [{"repo": "o/r", "template": "t", "paths": ["{lang}.json"]}]
            }"#,
        ));
        assert_eq!(specs[0].paths, vec!["de.json"]);
    }

    #[test]
    fn test_batch_expansion() {
        let specs = expand_monitors(&config(
            r#"{
                "defaults": {"branch": "develop", "enabled": true},
                "batch": [{"repos": ["o/a", "team/b"], "paths": ["lang/en.json"], "branch": "main"}]
            }"#,
        ));
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].repo, "o/a");
        assert_eq!(specs[0].name, "a");
        assert_eq!(specs[0].branch, "main");
        assert_eq!(specs[1].repo, "team/b");
        assert_eq!(specs[1].name, "b");
        assert_eq!(specs[1].paths, vec!["lang/en.json"]);
    }

    #[test]
    fn test_batch_shared_name_is_kept() {
        let specs = expand_monitors(&config(
            r#"{"batch": [{"repos": ["o/a", "o/b"], "name": "Shared"}]}"#,
        ));
        assert!(specs.iter().all(|s| s.name == "Shared"));
    }

    #[test]
    fn test_batch_before_monitors_preserving_order() {
        let specs = expand_monitors(&config(
            r#"{
                "monitors": [{"repo": "o/m1"}, {"repo": "o/m2"}],
                "batch": [{"repos": ["o/b1", "o/b2"]}]
            }"#,
        ));
        let repos: Vec<_> = specs.iter().map(|s| s.repo.as_str()).collect();
        assert_eq!(repos, vec!["o/b1", "o/b2", "o/m1", "o/m2"]);
    }

    #[test]
    fn test_missing_repo_skipped() {
        let specs = expand_monitors(&config(
            r#"{"monitors": [{"paths": ["a"]}, {"repo": "  "}, {"repo": "o/ok"}]}"#,
        ));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].repo, "o/ok");
    }

    #[test]
    fn test_disabled_kept_for_detector() {
        let specs = expand_monitors(&config(r#"{"monitors": [{"repo": "o/r", "enabled": false}]}"#));
        assert!(!specs[0].enabled);
    }

    #[test]
    fn test_repo_short_name() {
        assert_eq!(repo_short_name("owner/name"), "name");
        assert_eq!(repo_short_name("plain"), "plain");
    }

    #[test]
    fn test_needs_tree() {
        let mut spec = MonitorSpec::from_fields(MonitorFields {
            repo: Some("o/r".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(!spec.needs_tree());
        spec.paths_regex.push("x".to_string());
        assert!(spec.needs_tree());
    }

    #[test]
    fn test_sample_configuration() {
        let specs = expand_monitors(&config(include_str!("../../config/monitors.json")));

        let summary: Vec<(&str, &str, &str)> = specs
            .iter()
            .map(|s| (s.name.as_str(), s.repo.as_str(), s.branch.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("website", "example-org/website", "main"),
                ("docs", "example-org/docs", "main"),
                ("app-french", "example-org/app", "main"),
                ("app-readme", "example-org/app", "dev"),
            ]
        );
        assert_eq!(specs[0].paths_glob, vec!["i18n/*.json"]);
        assert_eq!(specs[2].paths, vec!["locales/fr/messages.json"]);
        assert_eq!(specs[3].paths_regex, vec!["^docs/.*\\.md$"]);
    }
}
