//! Tracer definitions as supplied by the input deck.

use crate::tracer::depth_table::DepthTable;

/// Transport phase a tracer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Water,
    Oil,
    Gas,
}

/// Concrete phase indices of the host simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseIndices {
    pub gas: usize,
    pub oil: usize,
    pub water: usize,
}

impl PhaseIndices {
    pub fn new(gas: usize, oil: usize, water: usize) -> Self {
        Self { gas, oil, water }
    }

    pub fn resolve(&self, phase: Phase) -> usize {
        match phase {
            Phase::Gas => self.gas,
            Phase::Oil => self.oil,
            Phase::Water => self.water,
        }
    }
}

/// Source of a tracer's initial concentration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialValue {
    /// One value per cartesian cell, indexed by cartesian id.
    Cartesian(Vec<f64>),
    /// Concentration versus depth, evaluated at cell centroids.
    DepthTable(DepthTable),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TracerDefinition {
    pub name: String,
    pub phase: Phase,
    #[cfg_attr(feature = "serde", serde(default))]
    pub output_tag: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial: Option<InitialValue>,
}

impl TracerDefinition {
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        Self { name: name.into(), phase, output_tag: None, initial: None }
    }

    pub fn with_cartesian_values(mut self, values: Vec<f64>) -> Self {
        self.initial = Some(InitialValue::Cartesian(values));
        self
    }

    pub fn with_depth_table(mut self, table: DepthTable) -> Self {
        self.initial = Some(InitialValue::DepthTable(table));
        self
    }

    pub fn with_output_tag(mut self, tag: impl Into<String>) -> Self {
        self.output_tag = Some(tag.into());
        self
    }

    /// Tag used for output keywords; the name followed by `F` unless set.
    pub fn output_file_tag(&self) -> String {
        match &self.output_tag {
            Some(tag) => tag.clone(),
            None => format!("{}F", self.name),
        }
    }
}
