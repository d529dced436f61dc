//! Column headings for tabular output.

const JOINT_FIELDS: [&str; 6] = ["x", "y", "vx", "vy", "ax", "ay"];
const LINK_FIELDS: [&str; 3] = ["angle", "omega", "alpha"];

/// Labels of the joints and links, in the order their rows are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub joints: Vec<String>,
    pub links: Vec<String>,
}

impl ColumnLayout {
    /// Joints labelled `J1..Jn`, links by name.
    pub fn numbered<S: AsRef<str>>(joint_count: usize, link_names: &[S]) -> Self {
        Self {
            joints: (1..=joint_count).map(|i| format!("J{i}")).collect(),
            links: link_names.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn joint_headings(&self) -> Vec<String> {
        self.joints
            .iter()
            .flat_map(|j| JOINT_FIELDS.iter().map(move |f| format!("{j} {f}")))
            .collect()
    }

    pub fn link_headings(&self) -> Vec<String> {
        self.links
            .iter()
            .flat_map(|l| LINK_FIELDS.iter().map(move |f| format!("{l} {f}")))
            .collect()
    }

    /// `time` followed by every joint column, then (optionally) every link column.
    pub fn headings(&self, with_links: bool) -> Vec<String> {
        let mut out = vec!["time".to_string()];
        out.extend(self.joint_headings());
        if with_links {
            out.extend(self.link_headings());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_follow_row_layout() {
        let layout = ColumnLayout::numbered(2, &["ground", "crank"]);
        let h = layout.headings(true);
        assert_eq!(h.len(), 1 + 2 * 6 + 2 * 3);
        assert_eq!(h[0], "time");
        assert_eq!(h[1], "J1 x");
        assert_eq!(h[12], "J2 ay");
        assert_eq!(h[13], "ground angle");
        assert_eq!(h[18], "crank alpha");
        assert_eq!(layout.headings(false).len(), 13);
    }
}
