//! Gitignore-style exclude rules
//!
//! An [`ExcludeFilter`] is compiled once per sync run from the job's
//! colon-delimited pattern list and consulted by the storage adapter while it
//! lists a tree, so excluded entries never reach a [`FileTree`].
//!
//! Pattern grammar:
//!
//! - blank entries and entries starting with `#` are ignored; `\#` and `\!`
//!   escape a literal leading character
//! - `!pattern` re-includes paths matched by an earlier rule; the last
//!   matching rule wins
//! - a trailing `/` restricts the rule to directories
//! - a `/` at the start or in the middle anchors the rule to the listing
//!   root; otherwise the rule matches at any depth
//! - `*` and `?` never match `/`, `**` does
//!
//! A path is excluded when the path itself or any of its ancestor
//! directories is excluded, so a negated rule cannot re-include a file whose
//! parent directory is excluded.
//!
//! [`FileTree`]: super::file_tree::FileTree

use globset::{GlobBuilder, GlobMatcher};

use super::errors::DomainError;

#[derive(Debug, Clone)]
struct ExcludeRule {
    pattern: String,
    matcher: GlobMatcher,
    negated: bool,
    dir_only: bool,
}

impl ExcludeRule {
    /// Compiles one raw pattern; returns `None` for blanks and comments
    fn compile(raw: &str) -> Result<Option<Self>, DomainError> {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = if let Some(escaped) = text.strip_prefix('\\') {
            (false, escaped)
        } else if let Some(rest) = text.strip_prefix('!') {
            (true, rest)
        } else {
            (false, text)
        };

        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Ok(None);
        }

        let glob = if anchored {
            body.to_string()
        } else {
            format!("**/{body}")
        };

        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .build()
            .map_err(|e| DomainError::InvalidExcludePattern {
                pattern: raw.to_string(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();

        Ok(Some(Self {
            pattern: text.to_string(),
            matcher,
            negated,
            dir_only,
        }))
    }
}

/// Compiled, ordered exclude rules
///
/// The default filter has no rules and excludes nothing.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    rules: Vec<ExcludeRule>,
}

impl ExcludeFilter {
    /// Builds a filter from a colon-delimited pattern list
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidExcludePattern`] for the first pattern
    /// that is not a valid glob.
    pub fn parse(patterns: &str) -> Result<Self, DomainError> {
        Self::from_patterns(patterns.split(':'))
    }

    /// Builds a filter from individual patterns, in priority order
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidExcludePattern`] for the first pattern
    /// that is not a valid glob.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for pattern in patterns {
            if let Some(rule) = ExcludeRule::compile(pattern.as_ref())? {
                rules.push(rule);
            }
        }
        Ok(Self { rules })
    }

    /// Returns true if the filter has no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The effective patterns, in evaluation order
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.pattern.as_str())
    }

    /// Returns true if `path` must be left out of a listing
    ///
    /// `path` is relative to the listing root and uses `/` separators;
    /// leading and trailing separators are ignored. `is_dir` tells whether
    /// the final component is a directory.
    #[must_use]
    pub fn is_excluded(&self, path: &str, is_dir: bool) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let mut prefix = String::with_capacity(path.len());

        for (index, component) in components.iter().enumerate() {
            if index > 0 {
                prefix.push('/');
            }
            prefix.push_str(component);

            let is_last = index + 1 == components.len();
            if self.matches(&prefix, !is_last || is_dir) {
                return true;
            }
        }
        false
    }

    /// Last-match-wins evaluation of a single path
    fn matches(&self, path: &str, is_dir: bool) -> bool {
        let mut excluded = false;
        for rule in &self.rules {
            if rule.dir_only && !is_dir {
                continue;
            }
            if rule.matcher.is_match(path) {
                excluded = !rule.negated;
            }
        }
        excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(patterns: &str) -> ExcludeFilter {
        ExcludeFilter::parse(patterns).expect("patterns compile")
    }

    #[test]
    fn test_empty_filter_excludes_nothing() {
        let f = ExcludeFilter::default();
        assert!(f.is_empty());
        assert!(!f.is_excluded("anything/at/all.txt", false));

        let f = filter("");
        assert!(f.is_empty());
        assert!(!f.is_excluded("a.txt", false));
    }

    #[test]
    fn test_unanchored_pattern_matches_at_any_depth() {
        let f = filter("*.tmp");
        assert!(f.is_excluded("a.tmp", false));
        assert!(f.is_excluded("sub/deep/b.tmp", false));
        assert!(!f.is_excluded("a.txt", false));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let f = filter("docs/*.md");
        assert!(f.is_excluded("docs/readme.md", false));
        assert!(!f.is_excluded("docs/sub/readme.md", false));
        assert!(!f.is_excluded("other/docs/readme.md", false));
    }

    #[test]
    fn test_double_star_crosses_separator() {
        let f = filter("docs/**/*.md");
        assert!(f.is_excluded("docs/a/b/readme.md", false));
    }

    #[test]
    fn test_leading_slash_anchors_to_root() {
        let f = filter("/build");
        assert!(f.is_excluded("build", true));
        assert!(f.is_excluded("build/out.o", false));
        assert!(!f.is_excluded("src/build", true));
    }

    #[test]
    fn test_directory_only_rule() {
        let f = filter("cache/");
        assert!(f.is_excluded("cache", true));
        assert!(f.is_excluded("a/cache/entry.bin", false));
        assert!(!f.is_excluded("cache", false));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let f = filter("*.log:!keep.log");
        assert!(f.is_excluded("debug.log", false));
        assert!(!f.is_excluded("keep.log", false));
        assert!(!f.is_excluded("sub/keep.log", false));
    }

    #[test]
    fn test_negation_cannot_reinclude_inside_excluded_dir() {
        let f = filter("private/:!private/public.txt");
        assert!(f.is_excluded("private/public.txt", false));
    }

    #[test]
    fn test_comments_blanks_and_escapes() {
        let f = filter("# comment::\\#literal:\\!bang");
        assert_eq!(f.patterns().collect::<Vec<_>>(), vec!["\\#literal", "\\!bang"]);
        assert!(f.is_excluded("#literal", false));
        assert!(f.is_excluded("!bang", false));
    }

    #[test]
    fn test_leading_and_trailing_separators_in_path_ignored() {
        let f = filter("*.tmp");
        assert!(f.is_excluded("/x/a.tmp/", false));
    }

    #[test]
    fn test_invalid_pattern_reports_error() {
        let err = ExcludeFilter::parse("ok:[unclosed").unwrap_err();
        match err {
            DomainError::InvalidExcludePattern { pattern, .. } => {
                assert_eq!(pattern, "[unclosed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
