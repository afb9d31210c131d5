use semver::Version;

/// Parse a release tag into a version.
///
/// Tags conventionally carry one leading marker character (`v1.2.3`, `r1.2.3`).
/// A single leading character that is neither a digit nor `.` is stripped, then
/// the remainder is read as strict semver or as a dotted numeric version with
/// two to four components. Anything else yields `None`. Only the
/// `major.minor.patch` triple is kept, so pre-release and build suffixes never
/// make two releases of the same triple differ.
pub fn parse_tag(tag: &str) -> Option<Version> {
    let tag = tag.trim();
    let cleaned = match tag.chars().next() {
        Some(c) if !c.is_ascii_digit() && c != '.' => &tag[c.len_utf8()..],
        _ => tag,
    };

    if let Ok(v) = Version::parse(cleaned) {
        return Some(Version::new(v.major, v.minor, v.patch));
    }
    parse_dotted(cleaned)
}

/// `major.minor[.patch[.revision]]`, revision dropped
fn parse_dotted(s: &str) -> Option<Version> {
    let parts = s
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [major, minor] => Some(Version::new(*major, *minor, 0)),
        [major, minor, patch] | [major, minor, patch, _] => {
            Some(Version::new(*major, *minor, *patch))
        }
        _ => None,
    }
}

/// Build a version from the two 32-bit halves of a Windows fixed file version.
///
/// The four 16-bit fields are major, minor, build and revision; build becomes
/// the patch component and revision is ignored.
pub fn from_file_version(ms: u32, ls: u32) -> Version {
    Version::new(u64::from(ms >> 16), u64::from(ms & 0xFFFF), u64::from(ls >> 16))
}

/// Render an optional version for display
pub fn display(version: Option<&Version>) -> String {
    version.map_or_else(|| "none".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("1.0.0"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_tag("v1.3.0"), Some(Version::new(1, 3, 0)));
        assert_eq!(parse_tag("V2.0.1"), Some(Version::new(2, 0, 1)));
        assert_eq!(parse_tag(" v0.1.0 "), Some(Version::new(0, 1, 0)));
        assert!(parse_tag("invalid").is_none());
        assert!(parse_tag("").is_none());
    }

    #[test]
    fn test_parse_tag_keeps_only_the_triple() {
        assert_eq!(parse_tag("v1.2.0+build.5"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_tag("v1.3.0-rc.1"), Some(Version::new(1, 3, 0)));
    }

    #[test]
    fn test_parse_tag_strips_only_one_prefix_char() {
        assert!(parse_tag("vv1.2.3").is_none());
        assert!(parse_tag("release-1.2.3").is_none());
    }

    #[test]
    fn test_parse_tag_dotted_forms() {
        assert_eq!(parse_tag("v1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_tag("1.2.3.4"), Some(Version::new(1, 2, 3)));
        assert!(parse_tag("1").is_none());
        assert!(parse_tag("1.2.3.4.5").is_none());
        assert!(parse_tag("1..2").is_none());
    }

    #[test]
    fn test_equal_triples_from_different_sources() {
        assert_eq!(parse_tag("v1.2.0"), parse_tag("1.2.0.7"));
        assert_eq!(parse_tag("1.2"), Some(from_file_version(0x0001_0002, 0)));
    }

    #[test]
    fn test_from_file_version() {
        let v = from_file_version((3 << 16) | 14, (15 << 16) | 92);
        assert_eq!(v, Version::new(3, 14, 15));
    }

    #[test]
    fn test_ordering_is_total() {
        let versions = [
            Version::new(0, 9, 9),
            Version::new(1, 0, 0),
            Version::new(1, 2, 0),
            Version::new(1, 10, 0),
            Version::new(2, 0, 0),
        ];
        for (i, a) in versions.iter().enumerate() {
            assert_eq!(a, a);
            for (j, b) in versions.iter().enumerate() {
                let relations = [a < b, a == b, a > b];
                assert_eq!(relations.iter().filter(|r| **r).count(), 1);
                assert_eq!(a < b, i < j);
            }
        }
    }

    #[test]
    fn test_absent_ranks_below_any_version() {
        let absent: Option<Version> = None;
        assert!(absent < Some(Version::new(0, 0, 0)));
        assert_eq!(absent, None);
    }

    #[test]
    fn test_display() {
        assert_eq!(display(None), "none");
        assert_eq!(display(Some(&Version::new(1, 2, 3))), "1.2.3");
    }
}
