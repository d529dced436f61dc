//! CSV export.

use std::io::Write;

use crate::layout::ColumnLayout;
use crate::types::{JointParameters, LinkParameters};
use crate::{ResultsError, ResultsResult};

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Write one line per sample: time, every joint row, then (if `links` is
/// given) every link row at the same time. Undefined values are written as
/// `NaN`.
pub fn write_csv<W: Write>(
    out: &mut W,
    layout: &ColumnLayout,
    joints: &JointParameters,
    links: Option<&LinkParameters>,
) -> ResultsResult<()> {
    let headings: Vec<String> = layout
        .headings(links.is_some())
        .iter()
        .map(|h| csv_field(h))
        .collect();
    writeln!(out, "{}", headings.join(","))?;

    for (time, rows) in joints.iter() {
        let mut line = format!("{time}");
        for row in rows {
            for v in row {
                line.push(',');
                line.push_str(&v.to_string());
            }
        }
        if let Some(links) = links {
            let link_rows = links.at_time(time).ok_or(ResultsError::ShapeMismatch {
                time,
                expected: layout.links.len(),
                found: 0,
            })?;
            for row in link_rows {
                for v in row {
                    line.push(',');
                    line.push_str(&v.to_string());
                }
            }
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_awkward_names() {
        assert_eq!(csv_field("crank"), "crank");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
