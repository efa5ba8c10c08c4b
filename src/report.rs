//! CLI output formatting for processed notifications.
//!
//! Each outcome renders as a header line naming the key, followed by
//! indented detail lines:
//!
//! ```text
//! vacation/full/sunset.jpg → 2 derivatives
//!     thumb: vacation/thumb/sunset.jpg (256x192, 10422 bytes)
//!     small: vacation/small/sunset.jpg (512x384, 30981 bytes)
//! vacation/full/old.jpg → deleted 2 derivatives
//!     thumb: vacation/thumb/old.jpg
//!     small: vacation/small/old.jpg (already absent)
//! vacation/full/sunset.jpg → 3 EXIF tags
//!     Make: "Acme"
//! vacation/thumb/sunset.jpg → ignored by derivatives (variant "thumb" is not an original)
//! ```
//!
//! [`format_outcomes`] is pure for testability; [`print_outcomes`] writes to
//! stdout.

use crate::pipeline::Outcome;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

pub fn format_outcome(outcome: &Outcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome {
        Outcome::Ignored { path, key, reason } => {
            lines.push(format!("{key} → ignored by {path} ({reason})"));
        }
        Outcome::Generated {
            source,
            derivatives,
        } => {
            lines.push(format!(
                "{source} → {}",
                plural(derivatives.len(), "derivative")
            ));
            for d in derivatives {
                lines.push(format!(
                    "{}{}: {} ({}x{}, {} bytes)",
                    indent(1),
                    d.size,
                    d.key,
                    d.width,
                    d.height,
                    d.bytes
                ));
            }
        }
        Outcome::Deleted {
            source,
            derivatives,
        } => {
            lines.push(format!(
                "{source} → deleted {}",
                plural(derivatives.len(), "derivative")
            ));
            for d in derivatives {
                let note = if d.already_absent {
                    " (already absent)"
                } else {
                    ""
                };
                lines.push(format!("{}{}: {}{note}", indent(1), d.size, d.key));
            }
        }
        Outcome::Metadata { key, tags } => {
            if tags.is_empty() {
                lines.push(format!("{key} → no EXIF tags"));
            } else {
                lines.push(format!("{key} → {}", plural(tags.len(), "EXIF tag")));
                for (name, value) in tags {
                    lines.push(format!("{}{name}: {value}", indent(1)));
                }
            }
        }
    }
    lines
}

pub fn format_outcomes(outcomes: &[Outcome]) -> Vec<String> {
    if outcomes.is_empty() {
        return vec!["No records in event".to_string()];
    }
    outcomes.iter().flat_map(format_outcome).collect()
}

pub fn print_outcomes(outcomes: &[Outcome]) {
    for line in format_outcomes(outcomes) {
        println!("{line}");
    }
}
