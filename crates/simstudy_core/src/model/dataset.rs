//! Trial datasets and the ground truth they are generated from

use serde::{Deserialize, Serialize};

/// One observation of a generated (or real) sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Group or treatment arm, 0-based
    pub group: usize,
    /// Cluster (site) membership, when the design is clustered
    pub cluster: Option<usize>,
    pub value: f64,
}

/// Ordered collection of observations with a fixed schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    #[must_use]
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Single-group sample
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            observations: values
                .into_iter()
                .map(|value| Observation {
                    group: 0,
                    cluster: None,
                    value,
                })
                .collect(),
        }
    }

    /// Multi-group sample, one vector per group
    #[must_use]
    pub fn from_groups(groups: Vec<Vec<f64>>) -> Self {
        let observations = groups
            .into_iter()
            .enumerate()
            .flat_map(|(group, values)| {
                values.into_iter().map(move |value| Observation {
                    group,
                    cluster: None,
                    value,
                })
            })
            .collect();
        Self { observations }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    /// Number of groups, i.e. the largest group id plus one
    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.observations
            .iter()
            .map(|o| o.group + 1)
            .max()
            .unwrap_or(0)
    }

    /// Values split by group id. Groups with no observations are empty.
    #[must_use]
    pub fn group_values(&self) -> Vec<Vec<f64>> {
        let mut groups = vec![Vec::new(); self.num_groups()];
        for obs in &self.observations {
            groups[obs.group].push(obs.value);
        }
        groups
    }

    /// Per-cluster means as `(group, mean)` pairs, ordered by cluster id.
    ///
    /// Observations without a cluster are ignored. A cluster takes the group
    /// of its first observation.
    #[must_use]
    pub fn cluster_means(&self) -> Vec<(usize, f64)> {
        let num_clusters = self
            .observations
            .iter()
            .filter_map(|o| o.cluster)
            .map(|c| c + 1)
            .max()
            .unwrap_or(0);

        let mut sums = vec![(None::<usize>, 0.0, 0usize); num_clusters];
        for obs in &self.observations {
            if let Some(c) = obs.cluster {
                let entry = &mut sums[c];
                entry.0.get_or_insert(obs.group);
                entry.1 += obs.value;
                entry.2 += 1;
            }
        }

        sums.into_iter()
            .filter_map(|(group, sum, count)| group.map(|g| (g, sum / count as f64)))
            .collect()
    }
}

/// The known truth a generator encodes, against which analyzers are judged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// True value of the estimand (used for coverage, bias and RMSE)
    pub value: Option<f64>,
    /// Whether the null hypothesis holds by construction
    pub null_true: Option<bool>,
}

impl GroundTruth {
    #[must_use]
    pub fn value(value: f64) -> Self {
        Self {
            value: Some(value),
            null_true: None,
        }
    }

    #[must_use]
    pub fn with_null(mut self, null_true: bool) -> Self {
        self.null_true = Some(null_true);
        self
    }
}
