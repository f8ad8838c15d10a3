//! Sectioned store report, Redis `INFO` style

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Section that receives fields appearing before any header
#[cfg(any(test, feature = "testing"))]
const DEFAULT_SECTION: &str = "server";

/// Fields grouped under named sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoReport {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl InfoReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, creating the section if needed
    pub fn insert(&mut self, section: &str, field: &str, value: impl ToString) {
        self.sections
            .entry(section.to_lowercase())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(name)
    }

    pub fn field(&self, section: &str, field: &str) -> Option<&str> {
        self.sections.get(section)?.get(field).map(String::as_str)
    }

    pub fn sections(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.sections
    }

    /// Parse the text form produced by [`fmt::Display`]
    ///
    /// Header lines start with `#`; section names are lower-cased. Field lines
    /// are split at the first `:`. Blank lines and lines without a
    /// `field:value` shape are skipped.
    #[cfg(any(test, feature = "testing"))]
    pub fn parse(text: &str) -> Self {
        let mut report = InfoReport::new();
        let mut current = DEFAULT_SECTION.to_string();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('#') {
                current = header.trim().to_lowercase();
                report.sections.entry(current.clone()).or_default();
                continue;
            }

            if let Some((field, value)) = line.split_once(':') {
                let (field, value) = (field.trim(), value.trim());
                if !field.is_empty() && !value.is_empty() {
                    report.insert(&current, field, value);
                }
            }
        }

        report
    }
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, fields) in &self.sections {
            write!(f, "# {}\r\n", capitalize(name))?;
            for (field, value) in fields {
                write!(f, "{}:{}\r\n", field, value)?;
            }
        }
        Ok(())
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render a byte count the way `used_memory_human` does (`0B`, `1.50K`, `2.00M`)
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];

    if bytes < 1024 {
        return format!("{}B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.2}{}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_redis_text() {
        let text = "# Server\r\nredis_version:mock\r\nredis_mode:standalone\r\n# Memory\r\nused_memory_human:0B\r\n";
        let report = InfoReport::parse(text);

        assert_eq!(report.field("server", "redis_version"), Some("mock"));
        assert_eq!(report.field("server", "redis_mode"), Some("standalone"));
        assert_eq!(report.field("memory", "used_memory_human"), Some("0B"));
    }

    #[test]
    fn test_parse_fields_before_header_go_to_server() {
        let report = InfoReport::parse("uptime_in_seconds:5\n# Stats\nkeyspace_hits:3\n");

        assert_eq!(report.field("server", "uptime_in_seconds"), Some("5"));
        assert_eq!(report.field("stats", "keyspace_hits"), Some("3"));
    }

    #[test]
    fn test_parse_keeps_colons_in_values() {
        let report = InfoReport::parse("# Server\nexecutable:/usr/bin:local\n");
        assert_eq!(report.field("server", "executable"), Some("/usr/bin:local"));
    }

    #[test]
    fn test_display_parses_back() {
        let mut report = InfoReport::new();
        report.insert("server", "kvs_mode", "standalone");
        report.insert("memory", "used_memory", 1024);

        let text = report.to_string();
        assert!(text.contains("# Memory\r\nused_memory:1024\r\n"));
        assert_eq!(InfoReport::parse(&text), report);
    }

    #[test]
    fn test_empty_header_section_is_kept() {
        let report = InfoReport::parse("# Keyspace\n");
        assert!(report.section("keyspace").is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(1023), "1023B");
        assert_eq!(format_bytes(1536), "1.50K");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.00M");
    }
}
