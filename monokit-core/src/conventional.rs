//! Conventional commit parsing and bump classification.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Matches `type(scope)!: description` subject lines, e.g. `feat: add x`,
/// `fix(core): y`, `refactor(api)!: z`.
static CONVENTIONAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<type>feat|fix|docs|style|refactor|perf|test|chore|ci|build|revert)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<subject>.+)$",
    )
    .expect("conventional commit pattern is valid")
});

/// Semantic version increment category, ordered so that `max` picks the
/// strongest bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    None,
    Patch,
    Minor,
    Major,
}

impl Bump {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bump::None => "none",
            Bump::Patch => "patch",
            Bump::Minor => "minor",
            Bump::Major => "major",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Bump::None),
            "patch" => Some(Bump::Patch),
            "minor" => Some(Bump::Minor),
            "major" => Some(Bump::Major),
            _ => None,
        }
    }
}

/// A parsed conventional commit. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub sha: String,
    pub commit_type: String,
    pub scope: Option<String>,
    pub breaking: bool,
    pub subject: String,
}

impl CommitRecord {
    /// Parses a raw commit message. Returns `None` when the subject line does
    /// not follow the conventional format; such commits never drive a bump.
    ///
    /// Breaking changes are flagged by `!` after the type/scope or by a
    /// `BREAKING CHANGE:` / `BREAKING-CHANGE:` footer in the body.
    pub fn parse(message: &str, sha: &str) -> Option<Self> {
        let mut lines = message.trim().lines();
        let first_line = lines.next()?;
        let captures = CONVENTIONAL_PATTERN.captures(first_line)?;

        let body: String = lines.collect::<Vec<_>>().join("\n");
        let breaking = captures.name("breaking").is_some()
            || body.contains("BREAKING CHANGE:")
            || body.contains("BREAKING-CHANGE:");

        Some(Self {
            sha: sha.to_string(),
            commit_type: captures["type"].to_lowercase(),
            scope: captures.name("scope").map(|m| m.as_str().to_string()),
            breaking,
            subject: captures["subject"].to_string(),
        })
    }

    /// Fixed precedence: breaking beats feat beats fix. Types without release
    /// semantics map to `None`.
    pub fn bump(&self) -> Bump {
        if self.breaking {
            return Bump::Major;
        }
        match self.commit_type.as_str() {
            "feat" => Bump::Minor,
            "fix" | "perf" | "revert" => Bump::Patch,
            _ => Bump::None,
        }
    }

    /// Human-readable changelog section for this commit's type.
    pub fn section_label(&self) -> &'static str {
        match self.commit_type.as_str() {
            "feat" => "Features",
            "fix" => "Bug Fixes",
            "perf" => "Performance",
            "refactor" => "Refactoring",
            "docs" => "Documentation",
            "style" => "Style",
            "test" => "Tests",
            "chore" => "Chores",
            "ci" => "CI",
            "build" => "Build",
            "revert" => "Reverts",
            _ => "Other",
        }
    }
}

/// The strongest bump across a set of commits, or `None` for an empty set.
pub fn determine_bump(commits: &[CommitRecord]) -> Bump {
    commits
        .iter()
        .map(CommitRecord::bump)
        .max()
        .unwrap_or(Bump::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_feat() {
        let commit = CommitRecord::parse("feat: add graph export", "abc123").unwrap();
        assert_eq!(commit.commit_type, "feat");
        assert_eq!(commit.scope, None);
        assert!(!commit.breaking);
        assert_eq!(commit.subject, "add graph export");
        assert_eq!(commit.bump(), Bump::Minor);
    }

    #[test]
    fn parses_scoped_breaking() {
        let commit = CommitRecord::parse("refactor(api)!: drop legacy flags", "def").unwrap();
        assert_eq!(commit.scope.as_deref(), Some("api"));
        assert!(commit.breaking);
        assert_eq!(commit.bump(), Bump::Major);
    }

    #[test]
    fn breaking_footer_in_body() {
        let commit = CommitRecord::parse(
            "fix: tighten validation\n\nBREAKING CHANGE: empty names rejected",
            "123",
        )
        .unwrap();
        assert!(commit.breaking);
        assert_eq!(commit.bump(), Bump::Major);
    }

    #[test]
    fn non_conventional_is_none() {
        assert!(CommitRecord::parse("update stuff", "a").is_none());
        assert!(CommitRecord::parse("feat add thing without colon", "b").is_none());
    }

    #[test]
    fn chore_maps_to_no_bump() {
        let commit = CommitRecord::parse("chore: bump deps", "c").unwrap();
        assert_eq!(commit.bump(), Bump::None);
    }

    #[test]
    fn strongest_bump_wins() {
        let commits = vec![
            CommitRecord::parse("fix: one", "1").unwrap(),
            CommitRecord::parse("feat: two", "2").unwrap(),
            CommitRecord::parse("docs: three", "3").unwrap(),
        ];
        assert_eq!(determine_bump(&commits), Bump::Minor);
    }

    #[test]
    fn empty_commits_mean_no_bump() {
        assert_eq!(determine_bump(&[]), Bump::None);
    }
}
