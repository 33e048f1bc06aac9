//! Longitudinal trend analysis over completed runs.
//!
//! Net energy per ray is tracked across retakes so a decline can be flagged
//! while it is still shallow. Warnings are tiered: one ray sliding is worth
//! watching, several sliding together call for caution, and a steep or
//! deep slide is urgent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::{Result, ScoringError};
use crate::output::AssessmentOutputV1;
use instrument::RayId;

/// Average change per run above which a ray is improving.
const IMPROVING_VELOCITY: f64 = 2.0;
/// Average change per run below which a ray is declining.
const DECLINING_VELOCITY: f64 = -2.0;
/// Average change per run below which a sustained decline is critical.
const CRITICAL_VELOCITY: f64 = -4.0;
/// Same-direction changes needed for a sustained decline.
const SUSTAINED_STREAK: usize = 2;
/// Any downward drift below this net energy is critical.
const CRITICAL_FLOOR: f64 = 35.0;
/// Runs projected ahead.
const PROJECTION_RUNS: f64 = 2.0;

/// Net energy of every ray at the end of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: String,
    pub completed_at: DateTime<Utc>,
    pub net_energy: BTreeMap<RayId, f64>,
}

impl RunSnapshot {
    pub fn new(
        run_id: impl Into<String>,
        completed_at: DateTime<Utc>,
        net_energy: BTreeMap<RayId, f64>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            completed_at,
            net_energy,
        }
    }

    /// Snapshot a scored output, dated by its computation time.
    pub fn from_output(output: &AssessmentOutputV1) -> Self {
        Self {
            run_id: output.assessment_run.run_id.clone(),
            completed_at: output.assessment_run.computed_at,
            net_energy: output
                .rays
                .iter()
                .map(|(id, ray)| (*id, ray.net_energy))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    Critical,
}

/// Trend of one ray across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RayTrend {
    pub ray_id: RayId,
    pub ray_name: String,
    pub direction: TrendDirection,
    /// Consecutive changes in the direction of the latest one
    pub streak: usize,
    /// Average change in net energy per run
    pub velocity: f64,
    /// Latest net energy
    pub current: f64,
    /// Net energy two runs ahead at the current velocity (0-100)
    pub predicted_2w: f64,
}

/// Warning tier, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    Watch,
    Caution,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EclipseWarning {
    pub level: WarningLevel,
    pub affected_rays: Vec<RayId>,
    pub message: String,
    pub intervention: String,
}

/// Trends and warnings for a series of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TrendReport {
    pub trends: Vec<RayTrend>,
    pub warnings: Vec<EclipseWarning>,
    /// Worst direction across rays
    pub overall_direction: TrendDirection,
}

/// One daily rep that interrupts a slide in `ray`.
pub fn intervention(ray: RayId) -> &'static str {
    match ray {
        RayId::R1 => "Set one clear intention each morning. Write it down and review it at noon.",
        RayId::R2 => "One micro-joy per day. Notice something good and say it out loud.",
        RayId::R3 => "Three breaths before your next meeting. Name what you feel.",
        RayId::R4 => "Do one small action you have been avoiding before noon.",
        RayId::R5 => "Once a day, ask whether this serves your values or someone else's expectations.",
        RayId::R6 => "Say one true thing today that you would normally hold back.",
        RayId::R7 => "Ask one real question in your next conversation and listen to the whole answer.",
        RayId::R8 => "Name one possibility you have dismissed and sit with it for 60 seconds.",
        RayId::R9 => "Hold space for one person today without trying to fix anything.",
    }
}

fn ray_trend(ray: RayId, series: &[f64]) -> RayTrend {
    let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let velocity = deltas.iter().sum::<f64>() / deltas.len() as f64;

    let last = deltas[deltas.len() - 1];
    let streak = 1 + deltas[..deltas.len() - 1]
        .iter()
        .rev()
        .take_while(|d| (**d > 0.0 && last > 0.0) || (**d < 0.0 && last < 0.0))
        .count();

    let current = series[series.len() - 1];
    let direction = if current < CRITICAL_FLOOR && velocity < 0.0 {
        TrendDirection::Critical
    } else if velocity > IMPROVING_VELOCITY {
        TrendDirection::Improving
    } else if velocity < CRITICAL_VELOCITY && streak >= SUSTAINED_STREAK {
        TrendDirection::Critical
    } else if velocity < DECLINING_VELOCITY {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    RayTrend {
        ray_id: ray,
        ray_name: ray.name().to_string(),
        direction,
        streak,
        velocity,
        current,
        predicted_2w: (current + velocity * PROJECTION_RUNS).clamp(0.0, 100.0),
    }
}

fn names(trends: &[&RayTrend]) -> String {
    trends
        .iter()
        .map(|t| t.ray_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tiered warnings for a set of ray trends.
pub fn warnings(trends: &[RayTrend]) -> Vec<EclipseWarning> {
    let critical: Vec<&RayTrend> = trends
        .iter()
        .filter(|t| t.direction == TrendDirection::Critical)
        .collect();
    let declining: Vec<&RayTrend> = trends
        .iter()
        .filter(|t| matches!(t.direction, TrendDirection::Declining | TrendDirection::Critical))
        .collect();
    let sustained: Vec<&RayTrend> = trends
        .iter()
        .filter(|t| t.direction == TrendDirection::Declining && t.streak >= SUSTAINED_STREAK)
        .collect();

    let mut out = Vec::new();

    if let Some(first) = critical.first() {
        out.push(EclipseWarning {
            level: WarningLevel::Urgent,
            affected_rays: critical.iter().map(|t| t.ray_id).collect(),
            message: format!(
                "{} {} been declining for {} consecutive runs. Eclipse is building.",
                names(&critical),
                if critical.len() == 1 { "has" } else { "have" },
                first.streak
            ),
            intervention: intervention(first.ray_id).to_string(),
        });
    } else if declining.len() >= 2 {
        out.push(EclipseWarning {
            level: WarningLevel::Caution,
            affected_rays: declining.iter().map(|t| t.ray_id).collect(),
            message: format!(
                "{} rays are declining together: {}. This pattern often precedes deeper eclipse.",
                declining.len(),
                names(&declining)
            ),
            intervention: intervention(declining[0].ray_id).to_string(),
        });
    }

    if declining.len() < 2 {
        if let Some(first) = sustained.first() {
            out.push(EclipseWarning {
                level: WarningLevel::Watch,
                affected_rays: sustained.iter().map(|t| t.ray_id).collect(),
                message: format!(
                    "{} has dropped for {} consecutive runs. Worth watching.",
                    first.ray_name, first.streak
                ),
                intervention: format!(
                    "Focus this week's practice on {}. One targeted rep per day is enough to interrupt the pattern.",
                    first.ray_name
                ),
            });
        }
    }

    out
}

fn overall(trends: &[RayTrend]) -> TrendDirection {
    let any = |d: TrendDirection| trends.iter().any(|t| t.direction == d);
    if any(TrendDirection::Critical) {
        TrendDirection::Critical
    } else if any(TrendDirection::Declining) {
        TrendDirection::Declining
    } else if !trends.is_empty()
        && trends.iter().all(|t| t.direction == TrendDirection::Improving)
    {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    }
}

/// Analyze trends across runs in any order.
///
/// Runs are ordered by completion time. A ray needs net energy in at least
/// two runs to get a trend, so fewer than two runs yields an empty, stable
/// report.
pub fn analyze_trends(runs: &[RunSnapshot]) -> Result<TrendReport> {
    if let Some((run, ray)) = runs.iter().find_map(|run| {
        run.net_energy
            .iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(id, _)| (run, *id))
    }) {
        return Err(ScoringError::ComputationInvariant(format!(
            "run {} has non-finite net energy for {}",
            run.run_id, ray
        )));
    }

    let mut ordered: Vec<&RunSnapshot> = runs.iter().collect();
    ordered.sort_by_key(|run| run.completed_at);

    let trends: Vec<RayTrend> = RayId::ALL
        .iter()
        .filter_map(|ray| {
            let series: Vec<f64> = ordered
                .iter()
                .filter_map(|run| run.net_energy.get(ray).copied())
                .collect();
            (series.len() >= 2).then(|| ray_trend(*ray, &series))
        })
        .collect();

    let warnings = warnings(&trends);
    let overall_direction = overall(&trends);

    debug!(
        runs = runs.len(),
        rays = trends.len(),
        overall = ?overall_direction,
        "Analyzed trends"
    );
    if let Some(worst) = warnings.iter().map(|w| w.level).max() {
        warn!(level = ?worst, warnings = warnings.len(), "Eclipse trend warning raised");
    }

    Ok(TrendReport {
        trends,
        warnings,
        overall_direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    /// One snapshot per week, every ray at 70 unless overridden.
    fn runs(overrides: &[(RayId, &[f64])], count: usize) -> Vec<RunSnapshot> {
        (0..count)
            .map(|week| {
                let net_energy = RayId::ALL
                    .iter()
                    .map(|id| {
                        let value = overrides
                            .iter()
                            .find(|(r, _)| r == id)
                            .map(|(_, series)| series[week])
                            .unwrap_or(70.0);
                        (*id, value)
                    })
                    .collect();
                RunSnapshot::new(
                    format!("run-{}", week),
                    start() + Duration::weeks(week as i64),
                    net_energy,
                )
            })
            .collect()
    }

    fn trend(report: &TrendReport, ray: RayId) -> &RayTrend {
        report.trends.iter().find(|t| t.ray_id == ray).unwrap()
    }

    #[test]
    fn test_single_run_is_empty() {
        let report = analyze_trends(&runs(&[], 1)).unwrap();
        assert!(report.trends.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.overall_direction, TrendDirection::Stable);
    }

    #[test]
    fn test_steep_decline_is_urgent() {
        let report = analyze_trends(&runs(&[(RayId::R3, &[60.0, 50.0, 40.0])], 3)).unwrap();

        let presence = trend(&report, RayId::R3);
        assert_eq!(presence.direction, TrendDirection::Critical);
        assert_eq!(presence.streak, 2);
        assert_eq!(presence.velocity, -10.0);
        assert_eq!(presence.predicted_2w, 20.0);
        assert_eq!(trend(&report, RayId::R1).direction, TrendDirection::Stable);

        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings[0];
        assert_eq!(warning.level, WarningLevel::Urgent);
        assert_eq!(warning.affected_rays, vec![RayId::R3]);
        assert!(warning.message.starts_with("Ray of Presence has been declining for 2"));
        assert!(warning.intervention.contains("Three breaths"));
        assert_eq!(report.overall_direction, TrendDirection::Critical);
    }

    #[test]
    fn test_parallel_declines_are_caution() {
        let slide: &[f64] = &[70.0, 67.0, 64.0];
        let report = analyze_trends(&runs(&[(RayId::R2, slide), (RayId::R4, slide)], 3)).unwrap();

        assert_eq!(trend(&report, RayId::R2).direction, TrendDirection::Declining);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].level, WarningLevel::Caution);
        assert_eq!(report.warnings[0].affected_rays, vec![RayId::R2, RayId::R4]);
        assert_eq!(report.overall_direction, TrendDirection::Declining);
    }

    #[test]
    fn test_single_sustained_decline_is_watch() {
        let report = analyze_trends(&runs(&[(RayId::R8, &[70.0, 67.0, 64.0])], 3)).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].level, WarningLevel::Watch);
        assert!(report.warnings[0].intervention.contains("Ray of Possibility"));
    }

    #[test]
    fn test_low_floor_escalates() {
        let report = analyze_trends(&runs(&[(RayId::R9, &[36.0, 34.0])], 2)).unwrap();
        let light = trend(&report, RayId::R9);
        assert_eq!(light.streak, 1);
        assert_eq!(light.direction, TrendDirection::Critical);
    }

    #[test]
    fn test_improvement_and_projection_clamp() {
        let report = analyze_trends(&runs(&[(RayId::R1, &[10.0, 90.0])], 2)).unwrap();
        let intention = trend(&report, RayId::R1);
        assert_eq!(intention.direction, TrendDirection::Improving);
        assert_eq!(intention.predicted_2w, 100.0);
        assert!(report.warnings.is_empty());
        assert_eq!(report.overall_direction, TrendDirection::Stable);
    }

    #[test]
    fn test_runs_are_ordered_by_completion() {
        let mut series = runs(&[(RayId::R5, &[40.0, 50.0, 60.0])], 3);
        series.reverse();
        let report = analyze_trends(&series).unwrap();
        assert_eq!(trend(&report, RayId::R5).direction, TrendDirection::Improving);
        assert_eq!(trend(&report, RayId::R5).current, 60.0);
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let mut series = runs(&[], 2);
        series[1].net_energy.insert(RayId::R6, f64::NAN);
        let err = analyze_trends(&series).unwrap_err();
        assert!(err.to_string().contains("run-1"));
    }
}
