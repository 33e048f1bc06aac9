//! Tool composites.
//!
//! Each practice tool is read three ways from its supplementary items:
//! usage at baseline, access under pressure, and distortion from the
//! reverse-keyed under-pressure items. A reading is withheld unless enough
//! of its items were answered.

use tracing::debug;

use crate::config::ToolsConfig;
use crate::intake::ResponseSet;
use crate::types::ToolComposite;
use instrument::{Polarity, PressureMode, Tool};

#[derive(Default)]
struct Bucket {
    total: usize,
    values: Vec<f64>,
}

impl Bucket {
    fn reading(&self, config: &ToolsConfig) -> Option<f64> {
        let answered = self.values.len();
        if answered == 0 || (answered as f64) < config.threshold(self.total) {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / answered as f64)
    }
}

/// Compose usage, access and distortion for every tool, in catalog order.
pub fn compose_tools(set: &ResponseSet<'_>, config: &ToolsConfig) -> Vec<ToolComposite> {
    let manifest = set.manifest();

    let composites: Vec<ToolComposite> = Tool::ALL
        .iter()
        .map(|tool| {
            let (mut usage, mut access, mut distortion) =
                (Bucket::default(), Bucket::default(), Bucket::default());
            let mut item_count = 0;
            let mut answered = 0;

            for item in manifest.tool_items(*tool) {
                // Distortion reads the misuse itself, so its keying is undone.
                let (bucket, misuse) = match (item.pressure_mode, item.polarity) {
                    (PressureMode::Baseline, _) => (&mut usage, false),
                    (PressureMode::UnderPressure, Polarity::Normal) => (&mut access, false),
                    (PressureMode::UnderPressure, Polarity::Reverse) => (&mut distortion, true),
                };
                bucket.total += 1;
                item_count += 1;

                if let Some(value) = set.value(&item.id) {
                    let reading = item.reading(value);
                    let level = if misuse { 1.0 - reading } else { reading };
                    bucket.values.push(level * 4.0);
                    answered += 1;
                }
            }

            ToolComposite {
                tool_id: tool.id(),
                name: tool.name().to_string(),
                usage: usage.reading(config),
                access: access.reading(config),
                distortion: distortion.reading(config),
                item_count,
                coverage: if item_count == 0 {
                    0.0
                } else {
                    answered as f64 / item_count as f64
                },
            }
        })
        .collect();

    debug!(
        run_id = %set.run_id,
        scored = composites.iter().filter(|c| c.usage.is_some() || c.access.is_some()).count(),
        "Composed tool readings"
    );

    composites
}
