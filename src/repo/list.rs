//! The list of repositories to refresh.

use crate::error::Result;
use crate::models::RepositoryRef;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

const DEFAULT_REPOSITORIES: &[&str] = &[
    "https://github.com/veggiemonk/awesome-docker",
    "https://github.com/kubernetes/kubernetes",
    "https://github.com/weaveworks/weave",
    "https://github.com/sindresorhus/awesome",
    "https://github.com/ashmckenzie/percheron",
];

lazy_static! {
    static ref GITHUB_LINK_RE: Regex =
        Regex::new(r"https://github\.com/([a-zA-Z0-9\-._]+)/([a-zA-Z0-9\-._]+)").unwrap();
}

/// Repository URLs used when no list is configured.
pub fn default_repository_urls() -> Vec<String> {
    DEFAULT_REPOSITORIES.iter().map(|s| s.to_string()).collect()
}

/// Collect the unique GitHub repository links of a markdown document.
///
/// Links keep the order of their first occurrence. Two links naming the same
/// `owner/name` (e.g. with and without `.git`) count once.
pub fn extract_repository_urls(markdown: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for m in GITHUB_LINK_RE.find_iter(markdown) {
        // `[repo](https://github.com/a/b.)` style punctuation is not part of the name
        let url = m.as_str().trim_end_matches('.');
        let key = RepositoryRef::from_url(url)
            .map(|repo| repo.as_str().to_string())
            .unwrap_or_else(|_| url.to_string());
        if seen.insert(key) {
            urls.push(url.to_string());
        }
    }

    debug!("Extracted {} repository links", urls.len());
    urls
}

/// Normalize every URL, failing on the first one that is not a repository.
pub fn normalize_all(urls: &[String]) -> Result<Vec<RepositoryRef>> {
    urls.iter().map(|u| RepositoryRef::from_url(u)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_normalizes() {
        let refs = normalize_all(&default_repository_urls()).unwrap();
        assert_eq!(refs.len(), 5);
        assert_eq!(refs[0].as_str(), "veggiemonk/awesome-docker");
        assert_eq!(refs[4].as_str(), "ashmckenzie/percheron");
    }

    #[test]
    fn test_extract_dedups_in_order() {
        let md = r#"
# Awesome
- [Weave](https://github.com/weaveworks/weave) networking
- [Docker](https://github.com/docker/docker). Runtime
- Again: https://github.com/weaveworks/weave
- Not a repo: https://docs.docker.com/engine/
"#;
        let urls = extract_repository_urls(md);
        assert_eq!(
            urls,
            vec![
                "https://github.com/weaveworks/weave".to_string(),
                "https://github.com/docker/docker".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_dedups_same_repository() {
        let md = "\
- https://github.com/docker/compose
- [compose](https://github.com/docker/compose.git)
- https://github.com/docker/compose.
- https://github.com/docker/machine
";
        let urls = extract_repository_urls(md);
        assert_eq!(
            urls,
            vec![
                "https://github.com/docker/compose".to_string(),
                "https://github.com/docker/machine".to_string(),
            ]
        );
        assert_eq!(normalize_all(&urls).unwrap().len(), 2);
    }

    #[test]
    fn test_normalize_all_reports_bad_entry() {
        let urls = vec![
            "https://github.com/a/b".to_string(),
            "https://example.com/nope".to_string(),
        ];
        let err = normalize_all(&urls).unwrap_err();
        assert!(err.to_string().contains("example.com"));
    }
}
