// ============================================================
// Layer 3: Training History
// ============================================================
// Per-epoch accuracy sequences for the train and validation
// phases, in epoch order. On disk this is the JSON pair
//
//   [[train_acc_epoch0, ...], [val_acc_epoch0, ...]]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Vec<f64>, Vec<f64>)", into = "(Vec<f64>, Vec<f64>)")]
pub struct TrainingHistory {
    pub train_acc: Vec<f64>,
    pub val_acc: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(&self) -> usize {
        self.val_acc.len()
    }

    /// Highest validation accuracy and the first epoch it was reached.
    pub fn best_val(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (epoch, &acc) in self.val_acc.iter().enumerate() {
            match best {
                Some((_, b)) if acc <= b => {}
                _ => best = Some((epoch, acc)),
            }
        }
        best
    }
}

impl From<(Vec<f64>, Vec<f64>)> for TrainingHistory {
    fn from((train_acc, val_acc): (Vec<f64>, Vec<f64>)) -> Self {
        Self { train_acc, val_acc }
    }
}

impl From<TrainingHistory> for (Vec<f64>, Vec<f64>) {
    fn from(h: TrainingHistory) -> Self {
        (h.train_acc, h.val_acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialises_as_pair() {
        let h = TrainingHistory { train_acc: vec![0.5, 0.75], val_acc: vec![0.25, 0.5] };
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, "[[0.5,0.75],[0.25,0.5]]");
    }

    #[test]
    fn test_best_val_keeps_first_maximum() {
        let h = TrainingHistory { train_acc: vec![0.0; 4], val_acc: vec![0.2, 0.6, 0.6, 0.4] };
        assert_eq!(h.best_val(), Some((1, 0.6)));
    }

    #[test]
    fn test_best_val_empty() {
        assert_eq!(TrainingHistory::new().best_val(), None);
    }
}
