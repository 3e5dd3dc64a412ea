//! Scope-based package filtering.

use glob::Pattern;

use crate::error::{Error, Result};
use crate::package::Package;

/// Parses a comma-separated scope string into patterns, e.g. `"core,*-lib"`.
pub fn parse_scope(scope: &str) -> Result<Vec<Pattern>> {
    scope
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| Error::Config(format!("invalid scope pattern '{}': {}", p, e)))
        })
        .collect()
}

/// Filters packages by scope. `None` or an empty scope matches everything.
pub fn filter_by_scope<'a>(
    packages: Vec<&'a Package>,
    scope: Option<&str>,
) -> Result<Vec<&'a Package>> {
    let Some(scope) = scope else {
        return Ok(packages);
    };
    let patterns = parse_scope(scope)?;
    if patterns.is_empty() {
        return Ok(packages);
    }

    Ok(packages
        .into_iter()
        .filter(|pkg| patterns.iter().any(|p| p.matches(&pkg.name)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;

    fn pkg(name: &str) -> Package {
        Package::new(
            name.to_string(),
            "1.0.0".to_string(),
            name.into(),
            vec![],
            vec![],
        )
    }

    #[test]
    fn exact_and_glob_patterns() {
        let packages = vec![pkg("core"), pkg("api"), pkg("ui-lib"), pkg("data-lib")];
        let refs: Vec<&Package> = packages.iter().collect();

        let filtered = filter_by_scope(refs.clone(), Some("core,*-lib")).unwrap();
        let names: Vec<&str> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["core", "ui-lib", "data-lib"]);
    }

    #[test]
    fn empty_scope_matches_all() {
        let packages = vec![pkg("a"), pkg("b")];
        let refs: Vec<&Package> = packages.iter().collect();
        assert_eq!(filter_by_scope(refs.clone(), None).unwrap().len(), 2);
        assert_eq!(filter_by_scope(refs, Some("  ")).unwrap().len(), 2);
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let packages = vec![pkg("a")];
        let refs: Vec<&Package> = packages.iter().collect();
        assert!(filter_by_scope(refs, Some("[")).is_err());
    }
}
