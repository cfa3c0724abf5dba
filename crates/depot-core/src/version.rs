//! Maven-style version ordering and version constraints.
//!
//! Versions are split on `.` into primary segments and each primary segment
//! on `-` into sub-segments. Sub-segments further split wherever digits meet
//! letters, so `b1` is the qualifier `b` followed by the number `1`.
//!
//! - Numeric tokens compare as numbers and beat any qualifier
//! - Known qualifiers are ranked:
//!   `alpha` < `beta` < `milestone` < `rc` < `snapshot` < `""` (release) < `sp`
//! - Unknown qualifiers sort between `snapshot` and release,
//!   lexicographically among themselves, so `32.0-jre` < `32.0.1-jre`
//! - Missing tokens compare like `0` or the release qualifier, so
//!   `2` == `2.0` and `2.2-` == `2.2`
//!
//! Tokens that are neither numbers nor letters (`1_0`, `r+2`) are kept as
//! unknown qualifiers, which keeps the order total for malformed input.

use std::cmp::Ordering;
use std::fmt;

use depot_util::glob::{self, Glob};

/// A parsed version with comparable segments.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    pub original: String,
    segments: Vec<Vec<Token>>,
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Token {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.to_ascii_uppercase().ends_with("SNAPSHOT")
    }

    /// The base version without the `-SNAPSHOT` suffix.
    pub fn base_version(&self) -> &str {
        self.original
            .strip_suffix("-SNAPSHOT")
            .unwrap_or(&self.original)
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let a = self.segments.get(i).map(Vec::as_slice).unwrap_or(&[]);
            let b = other.segments.get(i).map(Vec::as_slice).unwrap_or(&[]);
            let ord = compare_primary(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings, returning `-1`, `0`, or `1`.
pub fn compare(a: &str, b: &str) -> i32 {
    match MavenVersion::parse(a).cmp(&MavenVersion::parse(b)) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Sort version strings ascending by version order. Stable for equal versions.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by_cached_key(|v| MavenVersion::parse(v));
}

fn compare_primary(a: &[Token], b: &[Token]) -> Ordering {
    let max_len = a.len().max(b.len());
    for i in 0..max_len {
        let ord = match (a.get(i), b.get(i)) {
            (None, None) => Ordering::Equal,
            (Some(t), None) => compare_token_to_empty(t),
            (None, Some(t)) => compare_token_to_empty(t).reverse(),
            (Some(x), Some(y)) => compare_tokens(x, y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_token_to_empty(token: &Token) -> Ordering {
    match token {
        Token::Numeric(n) => n.cmp(&0),
        Token::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Token::Text(_) => Ordering::Less,
    }
}

fn compare_tokens(a: &Token, b: &Token) -> Ordering {
    match (a, b) {
        (Token::Numeric(a), Token::Numeric(b)) => a.cmp(b),
        (Token::Numeric(_), _) => Ordering::Greater,
        (_, Token::Numeric(_)) => Ordering::Less,
        (Token::Qualifier(a), Token::Qualifier(b)) => a.cmp(b),
        (Token::Qualifier(q), Token::Text(_)) => qualifier_to_text(*q),
        (Token::Text(_), Token::Qualifier(q)) => qualifier_to_text(*q).reverse(),
        (Token::Text(a), Token::Text(b)) => a.cmp(b),
    }
}

/// Text tokens rank above every pre-release qualifier and below release.
fn qualifier_to_text(q: QualifierKind) -> Ordering {
    if q >= QualifierKind::Release {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

fn parse_segments(version: &str) -> Vec<Vec<Token>> {
    let mut segments: Vec<Vec<Token>> = version
        .trim()
        .split('.')
        .map(|primary| {
            let mut tokens: Vec<Token> = primary
                .split('-')
                .flat_map(split_alphanumeric)
                .map(|t| classify(&t))
                .collect();
            while tokens.last().is_some_and(is_null) {
                tokens.pop();
            }
            tokens
        })
        .collect();
    while segments.last().is_some_and(Vec::is_empty) {
        segments.pop();
    }
    segments
}

/// `0` and the release qualifier are indistinguishable from absence.
fn is_null(token: &Token) -> bool {
    matches!(
        token,
        Token::Numeric(0) | Token::Qualifier(QualifierKind::Release)
    )
}

/// Split `alpha2` into `alpha`, `2` and `2rc` into `2`, `rc`.
fn split_alphanumeric(sub: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = None;
    for ch in sub.chars() {
        let is_digit = ch.is_ascii_digit();
        if current_is_digit.is_some_and(|d| d != is_digit) {
            parts.push(std::mem::take(&mut current));
        }
        current_is_digit = Some(is_digit);
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn classify(token: &str) -> Token {
    if let Ok(n) = token.parse::<u64>() {
        return Token::Numeric(n);
    }
    let lower = token.to_lowercase();
    match lower.as_str() {
        "alpha" | "a" => Token::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Token::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Token::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Token::Qualifier(QualifierKind::Rc),
        "snapshot" => Token::Qualifier(QualifierKind::Snapshot),
        "ga" | "final" | "release" => Token::Qualifier(QualifierKind::Release),
        "sp" => Token::Qualifier(QualifierKind::Sp),
        // Digits too large for u64 still compare, as text
        _ => Token::Text(lower),
    }
}

/// A Maven version range expression.
///
/// Supports: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, `[1.5]` (exact).
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a Maven version range string.
    ///
    /// Returns `None` for bare versions and unterminated brackets.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        if !(s.starts_with('[') || s.starts_with('(')) || !(s.ends_with(']') || s.ends_with(')'))
        {
            return None;
        }
        if s.len() < 2 {
            return None;
        }

        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        let inner = &s[1..s.len() - 1];

        if let Some((lower, upper)) = inner.split_once(',') {
            let lower = lower.trim();
            let upper = upper.trim();
            Some(VersionRange {
                lower: (!lower.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(lower),
                    inclusive: open_inclusive,
                }),
                upper: (!upper.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(upper),
                    inclusive: close_inclusive,
                }),
            })
        } else {
            // [1.0] means exactly 1.0
            let v = MavenVersion::parse(inner.trim());
            Some(VersionRange {
                lower: Some(Bound {
                    version: v.clone(),
                    inclusive: true,
                }),
                upper: Some(Bound {
                    version: v,
                    inclusive: true,
                }),
            })
        }
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &MavenVersion) -> bool {
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }
}

/// A constraint over the versions of one module.
#[derive(Debug, Clone)]
pub enum VersionConstraint {
    /// No constraint; the highest available version is selected.
    Any,
    /// Exactly this version string.
    Exact(String),
    /// `1.35+`: this version or any greater; the lowest satisfying wins.
    AtLeast(MavenVersion),
    /// `1.+`: any version starting with the prefix; the highest wins.
    Prefix(String),
    /// `[1.0,2.0)`: highest version inside the range.
    Range(VersionRange),
    /// `1.*`: highest version matching the wildcard pattern.
    Pattern(Glob),
    /// `latest.release`: highest non-snapshot version.
    LatestRelease,
}

impl VersionConstraint {
    pub fn parse(constraint: &str) -> Self {
        let s = constraint.trim();
        if s.is_empty() || s == "latest.integration" {
            return Self::Any;
        }
        if s == "latest.release" {
            return Self::LatestRelease;
        }
        if let Some(range) = VersionRange::parse(s) {
            return Self::Range(range);
        }
        if let Some(base) = s.strip_suffix('+') {
            if base.is_empty() {
                return Self::Any;
            }
            if base.ends_with('.') || base.ends_with('-') {
                return Self::Prefix(base.to_string());
            }
            return Self::AtLeast(MavenVersion::parse(base));
        }
        if glob::has_wildcards(s) {
            return Self::Pattern(Glob::new(s));
        }
        Self::Exact(s.to_string())
    }

    /// The exact version this constraint pins, if any.
    pub fn exact(&self) -> Option<&str> {
        match self {
            Self::Exact(v) => Some(v),
            _ => None,
        }
    }

    pub fn allows(&self, version: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(v) => v == version,
            Self::AtLeast(bound) => MavenVersion::parse(version) >= *bound,
            Self::Prefix(prefix) => version.starts_with(prefix.as_str()),
            Self::Range(range) => range.contains(&MavenVersion::parse(version)),
            Self::Pattern(glob) => glob.matches(version),
            Self::LatestRelease => !MavenVersion::parse(version).is_snapshot(),
        }
    }

    /// Pick the best version from `available` that satisfies this constraint.
    ///
    /// Lower-bound constraints pick the lowest satisfying version; everything
    /// else picks the highest.
    pub fn select<'a>(&self, available: &'a [String]) -> Option<&'a str> {
        let candidates = available
            .iter()
            .filter(|v| self.allows(v))
            .map(|v| (MavenVersion::parse(v), v.as_str()));
        let chosen = match self {
            Self::AtLeast(_) => candidates.min_by(|a, b| a.0.cmp(&b.0)),
            _ => candidates.max_by(|a, b| a.0.cmp(&b.0)),
        };
        chosen.map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_comparison_table() {
        let table = [
            ("", "", 0),
            ("2", "", 1),
            ("2", "1", 1),
            ("1", "2", -1),
            ("2.2", "2", 1),
            ("2.2", "2.1", 1),
            ("2.2", "2.2-b1", 1),
            ("2.2-b1", "2.2-b2", -1),
            ("2.2-alpha2", "2.2-beta1", -1),
            ("2.2-2", "2.2-1", 1),
            ("2.2-", "2.2", 0),
        ];
        for (a, b, expected) in table {
            assert_eq!(compare(a, b), expected, "compare({a:?}, {b:?})");
            assert_eq!(compare(b, a), -expected, "compare({b:?}, {a:?})");
        }
    }

    #[test]
    fn basic_ordering() {
        let v1 = MavenVersion::parse("1.0");
        let v2 = MavenVersion::parse("2.0");
        assert!(v1 < v2);
    }

    #[test]
    fn three_part_ordering() {
        let v1 = MavenVersion::parse("1.0.0");
        let v2 = MavenVersion::parse("1.0.1");
        let v3 = MavenVersion::parse("1.1.0");
        assert!(v1 < v2);
        assert!(v2 < v3);
    }

    #[test]
    fn qualifier_ordering() {
        let alpha = MavenVersion::parse("1.0-alpha");
        let beta = MavenVersion::parse("1.0-beta");
        let milestone = MavenVersion::parse("1.0-m1");
        let rc = MavenVersion::parse("1.0-rc");
        let snapshot = MavenVersion::parse("1.0-SNAPSHOT");
        let release = MavenVersion::parse("1.0");
        let sp = MavenVersion::parse("1.0-sp");

        assert!(alpha < beta);
        assert!(beta < milestone);
        assert!(milestone < rc);
        assert!(rc < snapshot);
        assert!(snapshot < release);
        assert!(release < sp);
    }

    #[test]
    fn cr_ranks_with_rc() {
        assert_eq!(compare("1.0-cr1", "1.0-rc1"), 0);
    }

    #[test]
    fn unknown_qualifiers_sort_between_snapshot_and_release() {
        assert_eq!(compare("1.0-jre", "1.0-SNAPSHOT"), 1);
        assert_eq!(compare("1.0-jre", "1.0-rc1"), 1);
        assert_eq!(compare("1.0-jre", "1.0"), -1);
        assert_eq!(compare("1.0-jre", "1.0-sp"), -1);
        assert_eq!(compare("1.0-jre", "1.0-android"), 1);
        assert_eq!(compare("1.0-jre", "1.1"), -1);
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(MavenVersion::parse("1.0"), MavenVersion::parse("1.0.0"));
        assert_eq!(compare("2", "2.0"), 0);
        assert_eq!(compare("1-ga", "1"), 0);
    }

    #[test]
    fn guava_style_versions() {
        let v1 = MavenVersion::parse("31.0-jre");
        let v2 = MavenVersion::parse("32.0-jre");
        assert!(v1 < v2);
        assert_eq!(compare("32.0-jre", "32.0.1-jre"), -1);
        assert_eq!(compare("32.0.1-jre", "32.0.1-android"), 1);
    }

    #[test]
    fn malformed_versions_still_ordered() {
        let mut versions: Vec<String> = ["1_0", "1", "r+2", "", "1.0-b1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_versions(&mut versions);
        let mut again = versions.clone();
        again.reverse();
        sort_versions(&mut again);
        assert_eq!(versions, again);
    }

    #[test]
    fn is_snapshot() {
        let v = MavenVersion::parse("1.0-SNAPSHOT");
        assert!(v.is_snapshot());
        assert_eq!(v.base_version(), "1.0");
        assert!(!MavenVersion::parse("1.0.0").is_snapshot());
    }

    #[test]
    fn version_range_inclusive() {
        let range = VersionRange::parse("[1.0,2.0]").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.0")));
        assert!(range.contains(&MavenVersion::parse("1.5")));
        assert!(range.contains(&MavenVersion::parse("2.0")));
        assert!(!range.contains(&MavenVersion::parse("0.9")));
        assert!(!range.contains(&MavenVersion::parse("2.1")));
    }

    #[test]
    fn version_range_exclusive_upper() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.0")));
        assert!(range.contains(&MavenVersion::parse("1.9.9")));
        assert!(!range.contains(&MavenVersion::parse("2.0")));
    }

    #[test]
    fn version_range_open_lower() {
        let range = VersionRange::parse("(,2.0)").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.0")));
        assert!(!range.contains(&MavenVersion::parse("2.0")));
    }

    #[test]
    fn version_range_exact() {
        let range = VersionRange::parse("[1.5]").unwrap();
        assert!(range.contains(&MavenVersion::parse("1.5")));
        assert!(!range.contains(&MavenVersion::parse("1.4")));
        assert!(!range.contains(&MavenVersion::parse("1.6")));
    }

    #[test]
    fn bare_version_not_a_range() {
        assert!(VersionRange::parse("1.0").is_none());
        assert!(VersionRange::parse("[1.0").is_none());
    }

    fn catalog() -> Vec<String> {
        ["1.30", "1.32", "1.35", "1.48", "1.72", "2.0-SNAPSHOT"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn at_least_picks_lowest_satisfying() {
        let c = VersionConstraint::parse("1.35+");
        assert_eq!(c.select(&catalog()), Some("1.35"));
        let c = VersionConstraint::parse("1.33+");
        assert_eq!(c.select(&catalog()), Some("1.35"));
        let c = VersionConstraint::parse("3.0+");
        assert_eq!(c.select(&catalog()), None);
    }

    #[test]
    fn bare_plus_and_prefix_pick_highest() {
        assert_eq!(
            VersionConstraint::parse("+").select(&catalog()),
            Some("2.0-SNAPSHOT")
        );
        assert_eq!(
            VersionConstraint::parse("1.+").select(&catalog()),
            Some("1.72")
        );
    }

    #[test]
    fn any_and_latest_release() {
        assert_eq!(
            VersionConstraint::parse("").select(&catalog()),
            Some("2.0-SNAPSHOT")
        );
        assert_eq!(
            VersionConstraint::parse("latest.release").select(&catalog()),
            Some("1.72")
        );
    }

    #[test]
    fn range_and_pattern_pick_highest() {
        assert_eq!(
            VersionConstraint::parse("[1.30,1.48)").select(&catalog()),
            Some("1.35")
        );
        assert_eq!(
            VersionConstraint::parse("1.3?").select(&catalog()),
            Some("1.35")
        );
    }

    #[test]
    fn exact_constraint() {
        let c = VersionConstraint::parse("1.8.1");
        assert_eq!(c.exact(), Some("1.8.1"));
        assert!(c.allows("1.8.1"));
        assert!(!c.allows("1.8.2"));
        assert!(VersionConstraint::parse("1.8+").exact().is_none());
    }
}
