//! The engine's output type.

use std::fmt;

/// Exposition type of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one exported series.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// Label names, in exposition order.
    pub labels: &'static [&'static str],
}

/// One labeled sample. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    desc: &'static MetricDesc,
    value: f64,
    label_values: Vec<String>,
}

impl Measurement {
    /// Build a measurement. `label_values` pairs positionally with `desc.labels`.
    pub fn new(desc: &'static MetricDesc, value: f64, label_values: Vec<String>) -> Self {
        debug_assert_eq!(
            desc.labels.len(),
            label_values.len(),
            "label count mismatch for {}",
            desc.name
        );
        Self { desc, value, label_values }
    }

    pub fn desc(&self) -> &'static MetricDesc {
        self.desc
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    pub fn kind(&self) -> MetricKind {
        self.desc.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// `(name, value)` label pairs in exposition order.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.desc.labels.iter().copied().zip(self.label_values.iter().map(String::as_str))
    }

    /// Value of the label `key`, if the series has it.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}
