use crate::registry::RegionRegistry;
use crate::selection::RenderCommand;
use std::collections::HashMap;

/// Upper-exclusive rate thresholds between the six purple buckets.
pub const THRESHOLDS: [f64; 5] = [0.0, 0.028, 0.033, 0.041, 0.049];

pub const COLORS: [&str; 6] = [
    "#f2f0f7", "#dadaeb", "#bcbddc", "#9e9ac8", "#756bb1", "#54278f",
];

/// Districts with no published rate.
pub const NO_DATA_COLOR: &str = "#cccccc";

/// Bucket color for an unemployment rate: the number of thresholds `<= rate`
/// picks the color.
pub fn fill(rate: Option<f64>) -> &'static str {
    match rate {
        Some(rate) if !rate.is_nan() => {
            let bucket = THRESHOLDS.partition_point(|&t| t <= rate);
            COLORS[bucket]
        }
        _ => NO_DATA_COLOR,
    }
}

/// One fill command per district, in registry order.
pub fn fill_commands(registry: &RegionRegistry, rates: &HashMap<String, f64>) -> Vec<RenderCommand> {
    registry
        .iter()
        .map(|region| RenderCommand::Fill {
            code: region.code.clone(),
            color: fill(rates.get(&region.code).copied()).to_string(),
        })
        .collect()
}
