//! Parsing for the `- key: value` request format used by bot commands:
//!
//! ```text
//! - url: https://…
//! - icp: insurance leaders
//! - dream: real time loss updates
//! - category: nurture
//! - format: how to
//! ```

use regex::Regex;

/// Structured fields extracted from a free-text request. Unknown keys are
/// ignored; absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ContentInstruction {
    pub icp: Option<String>,
    pub dream: Option<String>,
    pub category: Option<String>,
    pub format: Option<String>,
}

impl ContentInstruction {
    pub fn is_empty(&self) -> bool {
        self.icp.is_none()
            && self.dream.is_none()
            && self.category.is_none()
            && self.format.is_none()
    }
}

pub fn parse_instruction(text: &str) -> ContentInstruction {
    // Line-based scan (no look-ahead in the regex crate): a `- key:` line
    // starts a value, continuation lines extend it until the next key.
    let line_re = Regex::new(r"^\s*-\s*(\w+):\s*(.*)$").unwrap();
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;
    for line in text.lines() {
        if let Some(cap) = line_re.captures(line) {
            if let Some(done) = current.take() {
                pairs.push(done);
            }
            current = Some((cap[1].to_lowercase(), cap[2].trim().to_string()));
        } else if let Some((_, value)) = current.as_mut() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(trimmed);
            }
        }
    }
    if let Some(done) = current.take() {
        pairs.push(done);
    }

    let mut out = ContentInstruction::default();
    for (key, value) in pairs {
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "icp" => out.icp = Some(value),
            "dream" => out.dream = Some(value),
            "category" => out.category = Some(value),
            "format" => out.format = Some(value),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_known_keys() {
        let text = "- url: https://read.readwise.io/new/read/01abc\n\
                    - icp: insurance leaders\n\
                    - dream: real time losses updates\n\
                    - category: nurture\n\
                    - format: how to";
        let parsed = parse_instruction(text);
        assert_eq!(parsed.icp.as_deref(), Some("insurance leaders"));
        assert_eq!(parsed.dream.as_deref(), Some("real time losses updates"));
        assert_eq!(parsed.category.as_deref(), Some("nurture"));
        assert_eq!(parsed.format.as_deref(), Some("how to"));
    }

    #[test]
    fn tolerates_missing_keys_and_plain_text() {
        let parsed = parse_instruction("just write something about remote work");
        assert!(parsed.is_empty());

        let parsed = parse_instruction("- icp: data leaders");
        assert_eq!(parsed.icp.as_deref(), Some("data leaders"));
        assert!(parsed.category.is_none());
    }

    #[test]
    fn ignores_unknown_keys() {
        let parsed = parse_instruction("- auto_categorize: true\n- icp: executives");
        assert_eq!(parsed.icp.as_deref(), Some("executives"));
    }

    #[test]
    fn continuation_lines_extend_the_previous_value() {
        let parsed = parse_instruction(
            "- dream: real time losses updates\n  across every region\n- category: convert",
        );
        assert_eq!(
            parsed.dream.as_deref(),
            Some("real time losses updates across every region")
        );
        assert_eq!(parsed.category.as_deref(), Some("convert"));
    }
}
