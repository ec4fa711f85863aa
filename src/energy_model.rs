//! EAS energy model generation
//!
//! Renders per-cluster busy costs as a device-tree `energy-costs` fragment
//! that can be dropped into a kernel tree. Keys are either frequencies or
//! capacities; values are either raw power or efficiency-derived costs.

use crate::sample::FreqProfile;

/// Key column of a cost table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Frequency in kHz
    Freq,
    /// Capacity relative to the fastest entry, scaled to `capacity_scale`
    Cap,
}

impl KeyType {
    pub const ALL: [KeyType; 2] = [KeyType::Freq, KeyType::Cap];

    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Freq => "freq",
            KeyType::Cap => "cap",
        }
    }

    fn width(self) -> usize {
        match self {
            KeyType::Freq => 7,
            KeyType::Cap => 4,
        }
    }
}

/// Value column of a cost table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Power usage in mW
    Power,
    /// Inverse efficiency scaled to `capacity_scale`
    Eff,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Power => "power",
            ValueType::Eff => "eff",
        }
    }
}

/// Old core cost range to fit generated costs into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

/// Generator parameters shared by every model variant
#[derive(Debug, Clone)]
pub struct EnergyModelParams {
    /// SCHED_CAPACITY_SCALE of the target kernel
    pub capacity_scale: u32,
    /// CPU nodes to emit `capacity-dmips-mhz` for
    pub cpus: u32,
    pub normalize: Option<CostRange>,
}

impl Default for EnergyModelParams {
    fn default() -> Self {
        Self {
            capacity_scale: 1024,
            cpus: 8,
            normalize: None,
        }
    }
}

/// Energy model over all clusters, in cluster order
#[derive(Debug)]
pub struct EnergyModel<'a> {
    clusters: &'a [Vec<FreqProfile>],
    params: &'a EnergyModelParams,
}

impl<'a> EnergyModel<'a> {
    pub fn new(clusters: &'a [Vec<FreqProfile>], params: &'a EnergyModelParams) -> Self {
        Self { clusters, params }
    }

    pub fn file_name(key: KeyType, value: ValueType) -> String {
        format!("eas_energy_model_{}-{}.dtsi", key.as_str(), value.as_str())
    }

    fn entries(&self) -> impl Iterator<Item = &FreqProfile> {
        self.clusters.iter().flatten()
    }

    /// Cost table rows `(key, value)` per cluster, before normalization
    pub fn costs(&self, key: KeyType, value: ValueType) -> Vec<Vec<(u64, f64)>> {
        let scale = self.params.capacity_scale as f64;
        let best_time_us = self
            .entries()
            .map(|p| p.time_us)
            .min_by(f64::total_cmp)
            .unwrap_or(1.0);
        let max_mw_perf = self
            .entries()
            .map(|p| p.mw_per_perf(best_time_us))
            .max_by(f64::total_cmp)
            .unwrap_or(0.0);

        self.clusters
            .iter()
            .map(|profiles| {
                profiles
                    .iter()
                    .map(|p| {
                        let k = match key {
                            KeyType::Freq => p.freq_khz,
                            KeyType::Cap => (best_time_us * scale / p.time_us) as u64,
                        };
                        let v = match value {
                            ValueType::Power => p.power_mw,
                            ValueType::Eff => max_mw_perf * scale / p.mw_per_perf(best_time_us),
                        };
                        (k, v)
                    })
                    .collect()
            })
            .collect()
    }

    /// `(factor, base)` mapping generated costs onto the old range
    ///
    /// The source range is taken from the values being written, so
    /// efficiency tables are scaled by their own spread rather than by power.
    fn normalization(&self, costs: &[Vec<(u64, f64)>]) -> (f64, f64) {
        let Some(old) = self.params.normalize else {
            return (1.0, 0.0);
        };

        let values = || costs.iter().flatten().map(|&(_, v)| v);
        let (Some(new_min), Some(new_max)) = (
            values().min_by(f64::total_cmp),
            values().max_by(f64::total_cmp),
        ) else {
            return (1.0, 0.0);
        };

        if new_max <= new_min {
            tracing::warn!("cannot normalize a flat cost range; writing raw costs");
            return (1.0, 0.0);
        }

        let factor = (old.max - old.min) / (new_max - new_min);
        (factor, old.min - factor * new_min)
    }

    /// Render the device-tree fragment
    pub fn to_dtsi(&self, key: KeyType, value: ValueType) -> String {
        let costs = self.costs(key, value);
        let (factor, base) = self.normalization(&costs);
        let mut output = String::new();

        for cpu in 0..self.params.cpus {
            output.push_str(&format!(
                "\n&CPU{} {{\n\tcapacity-dmips-mhz = <{}>;\n}};\n",
                cpu, self.params.capacity_scale
            ));
        }

        output.push_str("\n/ {\n");
        output.push_str("\tenergy_costs: energy-costs {\n");
        output.push_str("\t\tcompatible = \"sched-energy\";\n");

        for (cluster, rows) in costs.iter().enumerate() {
            output.push_str(&cost_node_header("CPU", "core", cluster));
            for &(k, v) in rows {
                output.push_str(&format!(
                    "\t\t\t\t{:>width$} {:4.0}\n",
                    k,
                    v * factor + base,
                    width = key.width()
                ));
            }
            output.push_str(COST_NODE_FOOTER);
        }

        // Cluster-level costs are not measured; leave empty nodes to fill in
        for cluster in 0..costs.len() {
            output.push_str(&cost_node_header("CLUSTER", "cluster", cluster));
            output.push_str(COST_NODE_FOOTER);
        }

        output.push_str("\t}; /* energy-costs */\n");
        output.push_str("};\n");
        output
    }
}

const COST_NODE_FOOTER: &str = "\t\t\t>;\n\
\t\t\tidle-cost-data = <\n\
\t\t\t\t\n\
\t\t\t>;\n\
\t\t};\n";

fn cost_node_header(label: &str, node: &str, cluster: usize) -> String {
    format!(
        "\n\t\t{}_COST_{}: {}-cost{} {{\n\t\t\tbusy-cost-data = <\n",
        label, cluster, node, cluster
    )
}
