//! Summary figures for a finished (or partial) trajectory.

use crate::model::{YearMetrics, YearlyProgress};

/// Per-metric mean over `results`, rounded to the nearest integer.
/// `None` when there is nothing to average.
pub fn average_metrics(results: &[YearlyProgress]) -> Option<YearMetrics> {
    if results.is_empty() {
        return None;
    }
    let n = results.len() as f64;
    let mean = |pick: fn(&YearMetrics) -> u8| -> u8 {
        let total: f64 = results.iter().map(|p| f64::from(pick(&p.metrics))).sum();
        (total / n).round() as u8
    };
    Some(YearMetrics::new(
        mean(|m| m.feasibility),
        mean(|m| m.desirability),
        mean(|m| m.viability),
    ))
}

/// Mean of the three averaged metrics.
pub fn overall_score(results: &[YearlyProgress]) -> Option<u8> {
    let average = average_metrics(results)?;
    let sum = u16::from(average.feasibility)
        + u16::from(average.desirability)
        + u16::from(average.viability);
    Some((f64::from(sum) / 3.0).round() as u8)
}

pub fn format_currency(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("${:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

/// Percent change from `previous` to `current`; zero when `previous` is zero.
pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Revenue growth between the first and the last year received.
pub fn revenue_growth(results: &[YearlyProgress]) -> Option<f64> {
    match (results.first(), results.last()) {
        (Some(first), Some(last)) if results.len() > 1 => Some(growth_rate(
            last.analysis.revenue,
            first.analysis.revenue,
        )),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    Strong,
    Moderate,
    Weak,
}

impl StatusTier {
    pub fn for_value(value: u8) -> Self {
        match value {
            80.. => StatusTier::Strong,
            60..=79 => StatusTier::Moderate,
            _ => StatusTier::Weak,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Strong => "strong",
            StatusTier::Moderate => "moderate",
            StatusTier::Weak => "weak",
        }
    }
}
