//! Scenario designs: full factorial grids and explicit scenario lists

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::{ParamValue, ScenarioParams};
use crate::table::ColumnType;

/// One design dimension with its ordered levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub levels: Vec<ParamValue>,
}

impl Factor {
    pub fn new<V: Into<ParamValue>>(
        name: impl Into<String>,
        levels: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }
}

/// How the varying parameters of a design are laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Every combination of factor levels
    Factorial(Vec<Factor>),
    /// A hand-picked list of combinations; all must set the same parameters
    Explicit(Vec<ScenarioParams>),
}

/// Fixed parameters shared by every scenario, plus the varying ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    #[serde(default)]
    pub fixed: ScenarioParams,
    pub layout: Layout,
}

/// One scenario of a design
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPoint {
    /// Position in design order; also selects the scenario's random stream
    pub index: usize,
    /// Values of the varying parameters, in `Design::factor_names` order
    pub levels: Vec<ParamValue>,
    /// Fixed and varying parameters merged
    pub params: ScenarioParams,
}

impl Design {
    #[must_use]
    pub fn full_factorial(factors: Vec<Factor>) -> Self {
        Self {
            fixed: ScenarioParams::new(),
            layout: Layout::Factorial(factors),
        }
    }

    #[must_use]
    pub fn explicit(scenarios: Vec<ScenarioParams>) -> Self {
        Self {
            fixed: ScenarioParams::new(),
            layout: Layout::Explicit(scenarios),
        }
    }

    #[must_use]
    pub fn with_fixed(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fixed = self.fixed.with(name, value);
        self
    }

    /// Names of the varying parameters, in table column order
    #[must_use]
    pub fn factor_names(&self) -> Vec<String> {
        match &self.layout {
            Layout::Factorial(factors) => factors.iter().map(|f| f.name.clone()).collect(),
            Layout::Explicit(scenarios) => scenarios
                .first()
                .map(|s| s.iter().map(|(name, _)| name.to_string()).collect())
                .unwrap_or_default(),
        }
    }

    /// Number of scenarios the design expands to
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.layout {
            Layout::Factorial(factors) => factors.iter().map(|f| f.levels.len()).product(),
            Layout::Explicit(scenarios) => scenarios.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = self.factor_names();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ConfigError::Design(format!("factor `{name}` appears twice")));
            }
            if self.fixed.contains(name) {
                return Err(ConfigError::Design(format!(
                    "`{name}` is both fixed and varied"
                )));
            }
        }

        match &self.layout {
            Layout::Factorial(factors) => {
                if let Some(f) = factors.iter().find(|f| f.levels.is_empty()) {
                    return Err(ConfigError::Design(format!("factor `{}` has no levels", f.name)));
                }
            }
            Layout::Explicit(scenarios) => {
                if scenarios.is_empty() {
                    return Err(ConfigError::Design("explicit design lists no scenarios".to_string()));
                }
                for (idx, scenario) in scenarios.iter().enumerate() {
                    let keys: Vec<&str> = scenario.iter().map(|(k, _)| k).collect();
                    if keys != names.iter().map(String::as_str).collect::<Vec<_>>() {
                        return Err(ConfigError::Design(format!(
                            "scenario {idx} sets {keys:?}, expected {names:?}"
                        )));
                    }
                }
            }
        }

        for (name, levels) in names.iter().zip(self.varying_levels()) {
            if ColumnType::of_levels(levels).is_none() {
                return Err(ConfigError::Design(format!(
                    "factor `{name}` mixes numeric and text levels"
                )));
            }
        }
        Ok(())
    }

    /// Levels of each varying parameter, in `factor_names` order
    fn varying_levels(&self) -> Vec<Vec<&ParamValue>> {
        match &self.layout {
            Layout::Factorial(factors) => {
                factors.iter().map(|f| f.levels.iter().collect()).collect()
            }
            Layout::Explicit(scenarios) => self
                .factor_names()
                .iter()
                .map(|name| scenarios.iter().filter_map(|s| s.get(name)).collect())
                .collect(),
        }
    }

    /// Expand the design into its scenarios, in design order.
    ///
    /// Factorial designs are row-major: the last factor varies fastest.
    pub fn scenarios(&self) -> Result<Vec<ScenarioPoint>, ConfigError> {
        self.validate()?;
        let points = match &self.layout {
            Layout::Factorial(factors) => {
                let shape: Vec<usize> = factors.iter().map(|f| f.levels.len()).collect();
                GridIndices::new(&shape)
                    .enumerate()
                    .map(|(index, indices)| {
                        let mut params = self.fixed.clone();
                        let mut levels = Vec::with_capacity(factors.len());
                        for (factor, &level) in factors.iter().zip(&indices) {
                            let value = factor.levels[level].clone();
                            params = params.with(factor.name.clone(), value.clone());
                            levels.push(value);
                        }
                        ScenarioPoint {
                            index,
                            levels,
                            params,
                        }
                    })
                    .collect()
            }
            Layout::Explicit(scenarios) => scenarios
                .iter()
                .enumerate()
                .map(|(index, scenario)| ScenarioPoint {
                    index,
                    levels: scenario.iter().map(|(_, v)| v.clone()).collect(),
                    params: self.fixed.merged(scenario),
                })
                .collect(),
        };
        Ok(points)
    }
}

/// Row-major strides for a grid shape
fn compute_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return Vec::new();
    }
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len() - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Flat position of a multi-index in a row-major grid
#[must_use]
pub fn flat_index(shape: &[usize], indices: &[usize]) -> usize {
    compute_strides(shape)
        .iter()
        .zip(indices)
        .map(|(stride, idx)| stride * idx)
        .sum()
}

/// Iterator over all multi-indices of a grid, last dimension fastest.
/// A zero-dimensional grid has exactly one (empty) index.
pub struct GridIndices {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl GridIndices {
    #[must_use]
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            current: vec![0; shape.len()],
            done: shape.contains(&0),
        }
    }
}

impl Iterator for GridIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current.clone();

        if self.shape.is_empty() {
            self.done = true;
        }
        for i in (0..self.shape.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.shape[i] {
                break;
            }
            self.current[i] = 0;
            if i == 0 {
                self.done = true;
            }
        }

        Some(result)
    }
}
