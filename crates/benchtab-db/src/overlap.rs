//! Label × label co-occurrence over shared models.
//!
//! Given rows of `(label, model)`, builds the crosstab `X[label][model]`
//! (row counts) and the symmetric product `C = X · Xᵀ`. `C[a][b]` is the
//! number of model overlaps between labels `a` and `b`; the diagonal holds
//! each label's own model count.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoOccurrence {
    labels: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl CoOccurrence {
    /// Build from `(label, model)` pairs. Labels keep first-appearance order.
    pub fn from_pairs<L, M>(pairs: impl IntoIterator<Item = (L, M)>) -> Self
    where
        L: AsRef<str>,
        M: AsRef<str>,
    {
        let mut labels: Vec<String> = Vec::new();
        let mut label_index: HashMap<String, usize> = HashMap::new();
        // model → (label index → row count)
        let mut by_model: HashMap<String, HashMap<usize, u64>> = HashMap::new();

        for (label, model) in pairs {
            let label = label.as_ref();
            let li = match label_index.get(label) {
                Some(&i) => i,
                None => {
                    labels.push(label.to_string());
                    label_index.insert(label.to_string(), labels.len() - 1);
                    labels.len() - 1
                }
            };
            *by_model
                .entry(model.as_ref().to_string())
                .or_default()
                .entry(li)
                .or_insert(0) += 1;
        }

        let n = labels.len();
        let mut counts = vec![vec![0u64; n]; n];
        for per_label in by_model.values() {
            for (&a, &xa) in per_label {
                for (&b, &xb) in per_label {
                    counts[a][b] += xa * xb;
                }
            }
        }

        Self { labels, counts }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Shared-model weight between two labels; 0 for unknown labels.
    pub fn get(&self, a: &str, b: &str) -> u64 {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Row sums of the matrix, diagonal included.
    pub fn row_sums(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn row_sum(&self, label: &str) -> Option<u64> {
        self.index_of(label).map(|i| self.counts[i].iter().sum())
    }

    /// Reorder rows and columns by descending row sum (stable).
    pub fn sorted_by_row_sum(self) -> Self {
        let sums = self.row_sums();
        let mut order: Vec<usize> = (0..self.labels.len()).collect();
        order.sort_by(|&a, &b| sums[b].cmp(&sums[a]));

        let labels = order.iter().map(|&i| self.labels[i].clone()).collect();
        let counts = order
            .iter()
            .map(|&i| order.iter().map(|&j| self.counts[i][j]).collect())
            .collect();
        Self { labels, counts }
    }
}
