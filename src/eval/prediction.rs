//! Per-example predictions

use super::confusion::ConfusionMatrix;
use serde::{Deserialize, Serialize};

/// Model output for one evaluation prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Gold class index
    pub label: usize,
    /// Argmax over `label_logits`
    pub predicted: usize,
    /// Logit of each label token, in class order
    pub label_logits: Vec<f32>,
}

impl Prediction {
    /// Build from label logits
    ///
    /// Ties resolve to the lowest class index and NaN logits never win.
    pub fn from_logits(label: usize, label_logits: Vec<f32>) -> Self {
        let mut predicted = 0;
        let mut best = f32::NEG_INFINITY;
        for (i, &v) in label_logits.iter().enumerate() {
            if v > best {
                best = v;
                predicted = i;
            }
        }
        Self { label, predicted, label_logits }
    }

    /// Whether the prediction matches the gold label
    pub fn is_correct(&self) -> bool {
        self.label == self.predicted
    }
}

/// Predictions of one pass over the evaluation sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionSet {
    predictions: Vec<Prediction>,
}

impl PredictionSet {
    /// Wrap predictions
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self { predictions }
    }

    /// Predictions in evaluation-sample order
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Number of predictions
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// True if there are no predictions
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Fraction predicted correctly (0 when empty)
    pub fn accuracy(&self) -> f64 {
        if self.predictions.is_empty() {
            return 0.0;
        }
        self.predictions.iter().filter(|p| p.is_correct()).count() as f64 / self.predictions.len() as f64
    }

    /// Confusion matrix over `n_classes` classes
    pub fn confusion_matrix(&self, n_classes: usize) -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::new(n_classes);
        for p in &self.predictions {
            cm.record(p.label, p.predicted);
        }
        cm
    }

    /// Number of examples whose predicted class differs from `other`'s
    pub fn disagreements(&self, other: &PredictionSet) -> usize {
        self.predictions.iter().zip(&other.predictions).filter(|(a, b)| a.predicted != b.predicted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(Prediction::from_logits(0, vec![1.0, 3.0, 3.0]).predicted, 1);
        assert_eq!(Prediction::from_logits(0, vec![2.0, 2.0]).predicted, 0);
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(Prediction::from_logits(0, vec![f32::NAN, -1.0, -2.0]).predicted, 1);
    }

    #[test]
    fn test_accuracy_and_confusion() {
        let set = PredictionSet::new(vec![
            Prediction::from_logits(0, vec![2.0, 1.0]),
            Prediction::from_logits(1, vec![2.0, 1.0]),
            Prediction::from_logits(1, vec![0.0, 1.0]),
        ]);
        assert!((set.accuracy() - 2.0 / 3.0).abs() < 1e-12);
        let cm = set.confusion_matrix(2);
        assert_eq!(cm.get(1, 0), 1);
        assert_eq!(cm.get(1, 1), 1);
        assert_eq!(PredictionSet::default().accuracy(), 0.0);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let set = PredictionSet::new(vec![Prediction::from_logits(1, vec![0.0, 1.0])]);
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["predicted"], 1);
    }
}
