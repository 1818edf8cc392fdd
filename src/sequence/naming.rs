/// Where the single-character group label sits in a file name.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    /// The `n`-th character counting back from the end of the stem (1 = last character).
    FromStemEnd(usize),
    /// The character right after a delimiter, counting delimiter occurrences back from the end
    /// of the stem (1 = last occurrence).
    AfterDelimiter {
        /// Delimiter character, usually `_`.
        delimiter: char,
        /// Which occurrence, counted from the end.
        occurrence: usize,
    },
}

impl Default for LabelPosition {
    fn default() -> Self {
        // `<plate>_<well>_w<n>.tif`: the well row letter.
        Self::FromStemEnd(6)
    }
}

/// File-name conventions used to group images and name outputs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NamingRule {
    /// Label location.
    pub label: LabelPosition,
    /// Stem-final character marking the first member of a group.
    pub first_ordinal: char,
    /// Characters dropped from the end of the stem when naming a grid output.
    pub suffix_trim: usize,
    /// Appended to grid output names.
    pub grid_tag: String,
    /// Appended to stack output names.
    pub stack_tag: String,
}

impl Default for NamingRule {
    fn default() -> Self {
        Self {
            label: LabelPosition::default(),
            first_ordinal: '1',
            suffix_trim: 3,
            grid_tag: "_grid".to_string(),
            stack_tag: "_stack".to_string(),
        }
    }
}

/// `name` without its final extension.
pub fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

impl NamingRule {
    /// Extract the group label, or `None` when the name is too short or lacks the delimiter.
    pub fn label(&self, name: &str) -> Option<char> {
        let stem = stem(name);
        match self.label {
            LabelPosition::FromStemEnd(n) => {
                let n = n.checked_sub(1)?;
                stem.chars().rev().nth(n)
            }
            LabelPosition::AfterDelimiter {
                delimiter,
                occurrence,
            } => {
                let n = occurrence.checked_sub(1)?;
                let (idx, _) = stem.rmatch_indices(delimiter).nth(n)?;
                stem[idx + delimiter.len_utf8()..].chars().next()
            }
        }
    }

    /// Return `true` when `name` looks like the first member of a group.
    pub fn starts_group(&self, name: &str) -> bool {
        stem(name).ends_with(self.first_ordinal)
    }

    /// Grid output file stem derived from a group member's name.
    pub fn grid_output_name(&self, name: &str) -> String {
        let stem = stem(name);
        let keep = stem.chars().count().saturating_sub(self.suffix_trim);
        let prefix: String = stem.chars().take(keep).collect();
        format!("{prefix}{}", self.grid_tag)
    }

    /// Stack output file stem derived from a frame key.
    pub fn stack_output_name(&self, frame: &str) -> String {
        format!("{}{}", stem(frame), self.stack_tag)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/naming.rs"]
mod tests;
