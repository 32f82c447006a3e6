//! Label set

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::LabelSetError;

/// Ordered class labels; position `i` names model output `i`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    /// Build a label set, rejecting empty, blank and duplicate labels
    pub fn new<I, S>(labels: I) -> Result<Self, LabelSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(LabelSetError::Empty);
        }

        {
            let mut seen = HashSet::with_capacity(labels.len());
            for (i, label) in labels.iter().enumerate() {
                if label.trim().is_empty() {
                    return Err(LabelSetError::Blank(i));
                }
                if !seen.insert(label.as_str()) {
                    return Err(LabelSetError::Duplicate(label.clone()));
                }
            }
        }

        Ok(Self {
            labels: labels.into(),
        })
    }

    /// Parse one label per line; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Result<Self, LabelSetError> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Read a label file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LabelSetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LabelSetError::Io(format!("{}: {}", path.display(), e)))?;
        let labels = Self::parse(&text)?;
        info!("Loaded {} labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at model output index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Whether `label` is a member
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Labels in model output order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_preserved() {
        let labels = LabelSet::new(["Beagle", "Boxer", "Bulldog"]).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("Beagle"));
        assert_eq!(labels.get(2), Some("Bulldog"));
        assert_eq!(labels.get(3), None);
        assert!(labels.contains("Boxer"));
    }

    #[test]
    fn test_empty_rejected() {
        let result = LabelSet::new(Vec::<String>::new());
        assert!(matches!(result, Err(LabelSetError::Empty)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = LabelSet::new(["Poodle", "Boxer", "Poodle"]);
        assert!(matches!(result, Err(LabelSetError::Duplicate(l)) if l == "Poodle"));
    }

    #[test]
    fn test_blank_rejected() {
        let result = LabelSet::new(["Poodle", "  "]);
        assert!(matches!(result, Err(LabelSetError::Blank(1))));
    }

    #[test]
    fn test_parse_skips_comments() {
        let text = "# breeds\nBeagle\n\n  Boxer  \n# trailing\nPoodle\n";
        let labels = LabelSet::parse(text).unwrap();
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["Beagle", "Boxer", "Poodle"]);
    }

    #[test]
    fn test_missing_file() {
        let result = LabelSet::from_path("no/such/labels.txt");
        assert!(matches!(result, Err(LabelSetError::Io(_))));
    }
}
