use std::collections::HashMap;

/// Bidirectional mapping from observed string labels to dense ids in `[0, N)`.
///
/// Fitted once over the training rows and frozen afterwards: encoding a label
/// that was never seen returns `None`, it is never assigned a new id. Labels
/// are sorted before id assignment so ids are stable across fits on the same
/// label set.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    to_id: HashMap<String, usize>,
    labels: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uniq: Vec<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        uniq.sort();
        uniq.dedup();

        let to_id = uniq
            .iter()
            .enumerate()
            .map(|(id, label)| (label.clone(), id))
            .collect();
        Self {
            to_id,
            labels: uniq,
        }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.to_id.get(label).copied()
    }

    pub fn decode(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(|s| s.as_str())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
