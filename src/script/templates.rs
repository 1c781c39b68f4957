//! Embedded shell templates and placeholder rendering

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const BUILD_ENTRY: &str = include_str!("templates/build-entry.sh");
pub const INSTALL_KEYSTORE: &str = include_str!("templates/install-keystore.sh");
pub const INSTALL_PACKAGE: &str = include_str!("templates/install-package.sh");
pub const MAVEN_SETTINGS: &str = include_str!("templates/maven-settings.sh");
pub const MAVEN_BUILD: &str = include_str!("templates/maven-build.sh");
pub const GRADLE_BUILD: &str = include_str!("templates/gradle-build.sh");
pub const SBT_BUILD: &str = include_str!("templates/sbt-build.sh");
pub const ANT_BUILD: &str = include_str!("templates/ant-build.sh");
pub const ENFORCE_VERSION: &str = include_str!("templates/enforce-version.sh");
pub const DOCKERFILE_ENTRY: &str = include_str!("templates/dockerfile-entry-script.sh");
pub const START_CACHE: &str = include_str!("templates/start-cache.sh");

/// Placeholder syntax used by a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `{{NAME}}`
    Double,
    /// `{NAME}`
    Single,
}

impl Placeholder {
    fn pattern(self) -> &'static Regex {
        static DOUBLE: OnceLock<Regex> = OnceLock::new();
        static SINGLE: OnceLock<Regex> = OnceLock::new();
        match self {
            Self::Double => DOUBLE.get_or_init(|| {
                Regex::new(r"\{\{([A-Z0-9_]+)\}\}").expect("valid regex")
            }),
            Self::Single => {
                SINGLE.get_or_init(|| Regex::new(r"\{([A-Z0-9_]+)\}").expect("valid regex"))
            }
        }
    }
}

/// Replaces each known placeholder in one pass.
///
/// Inserted values are never rescanned, so a recipe script that happens to
/// contain `{{BUILD}}` is emitted as written. Unknown names are left alone,
/// which keeps shell `${VAR}` expansions intact.
pub fn render(template: &str, style: Placeholder, values: &HashMap<&str, &str>) -> String {
    style
        .pattern()
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match values.get(name) {
                Some(value) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_double_braces() {
        let values = HashMap::from([("BUILD", "mvn install"), ("PRE_BUILD_SCRIPT", "")]);
        let out = render("a\n{{PRE_BUILD_SCRIPT}}\n{{BUILD}}\n", Placeholder::Double, &values);
        assert_eq!(out, "a\n\nmvn install\n");
    }

    #[test]
    fn test_render_is_single_pass() {
        let values = HashMap::from([("PRE_BUILD_SCRIPT", "echo {{BUILD}}"), ("BUILD", "x")]);
        let out = render("{{PRE_BUILD_SCRIPT}} {{BUILD}}", Placeholder::Double, &values);
        assert_eq!(out, "echo {{BUILD}} x");
    }

    #[test]
    fn test_render_single_keeps_shell_expansions() {
        let values = HashMap::from([("URI", "https://example.com/a.tgz")]);
        let out = render("curl {URI} ${PATH} {OTHER}", Placeholder::Single, &values);
        assert_eq!(out, "curl https://example.com/a.tgz ${PATH} {OTHER}");
    }

    #[test]
    fn test_build_templates_reference_cache_url() {
        for template in [MAVEN_SETTINGS, SBT_BUILD, ANT_BUILD] {
            assert!(template.contains("$(params.CACHE_URL)"));
        }
        assert!(BUILD_ENTRY.contains("{{BUILD}}"));
        assert!(ENFORCE_VERSION.contains("{{VERSION_COMMAND}}"));
        assert!(INSTALL_PACKAGE.contains("{SHA256}"));
    }
}
