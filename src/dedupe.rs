// src/dedupe.rs
use crate::types::ProgramRecord;
use std::collections::HashSet;
use url::Url;

/// Canonical dedupe key for a program link.
///
/// Links that parse as absolute URLs use their normalized serialization with a
/// single trailing slash removed; anything else falls back to the raw string.
pub fn canonical_key(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => {
            let normalized = url.as_str();
            normalized
                .strip_suffix('/')
                .unwrap_or(normalized)
                .to_string()
        }
        Err(_) => link.to_string(),
    }
}

/// Tracks canonical keys already emitted for one lookup
#[derive(Debug, Default)]
pub struct Dedupe {
    seen: HashSet<String>,
}

impl Dedupe {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Returns true if this record's link has not been seen before (and records it)
    pub fn should_emit(&mut self, record: &ProgramRecord) -> bool {
        self.seen.insert(canonical_key(&record.link))
    }
}

/// Keep the first record per canonical key, preserving first-occurrence order
pub fn merge_programs<I>(records: I) -> Vec<ProgramRecord>
where
    I: IntoIterator<Item = ProgramRecord>,
{
    let mut dedupe = Dedupe::new();
    records
        .into_iter()
        .filter(|record| dedupe.should_emit(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn record(platform: Source, link: &str) -> ProgramRecord {
        ProgramRecord::new(platform, link, "example.com")
    }

    #[test]
    fn test_canonical_key_strips_trailing_slash() {
        assert_eq!(
            canonical_key("https://hackerone.com/example/"),
            "https://hackerone.com/example"
        );
        assert_eq!(
            canonical_key("https://hackerone.com/example"),
            "https://hackerone.com/example"
        );
    }

    #[test]
    fn test_canonical_key_normalizes_host() {
        assert_eq!(canonical_key("HTTPS://Example.COM"), "https://example.com");
        assert_eq!(canonical_key("https://example.com/"), "https://example.com");
    }

    #[test]
    fn test_canonical_key_only_one_slash_removed() {
        assert_eq!(
            canonical_key("https://example.com/a//"),
            "https://example.com/a/"
        );
    }

    #[test]
    fn test_canonical_key_malformed_falls_back_to_raw() {
        assert_eq!(canonical_key("not a url/"), "not a url/");
        assert_eq!(canonical_key("/relative/path"), "/relative/path");
    }

    #[test]
    fn test_first_record_wins_regardless_of_platform() {
        let merged = merge_programs(vec![
            record(Source::SecurityTxt, "https://hackerone.com/example"),
            record(Source::Platform, "https://hackerone.com/example/"),
            record(Source::Manual, "https://hackerone.com/example"),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].platform, Source::SecurityTxt);
    }

    #[test]
    fn test_merge_preserves_first_occurrence_order() {
        let merged = merge_programs(vec![
            record(Source::SecurityTxt, "https://a.example/"),
            record(Source::Website, "https://b.example/"),
            record(Source::Platform, "https://a.example"),
            record(Source::Manual, "https://c.example/"),
        ]);

        let links: Vec<&str> = merged.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://a.example/", "https://b.example/", "https://c.example/"]
        );
    }

    #[test]
    fn test_merge_never_yields_duplicate_keys() {
        let links = [
            "https://example.com",
            "https://example.com/",
            "HTTPS://EXAMPLE.COM/",
            "https://example.com/bounty",
            "https://example.com/bounty/",
            "garbage",
            "garbage",
            "garbage/",
        ];
        let merged = merge_programs(links.iter().map(|l| record(Source::Manual, l)));

        let mut keys = HashSet::new();
        for r in &merged {
            assert!(keys.insert(canonical_key(&r.link)), "duplicate key for {}", r.link);
        }
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_programs(Vec::new()).is_empty());
    }
}
