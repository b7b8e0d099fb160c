pub mod cluster;
pub mod configuration;
pub mod index;
pub mod node;
pub mod performance;

use diaglens_types::{Bounds, Severity};

/// Resolve severity for a "too high" metric: the critical bound is tested
/// first and is inclusive, so a value equal to the critical bound is
/// critical, not warning.
pub(crate) fn resolve_high(value: f64, bounds: Bounds) -> Option<(Severity, f64)> {
    if let Some(critical) = bounds.critical {
        if value >= critical {
            return Some((Severity::Critical, critical));
        }
    }
    if let Some(warning) = bounds.warning {
        if value >= warning {
            return Some((Severity::Warning, warning));
        }
    }
    None
}

/// Resolve severity for a "too low" metric (active shard percentage):
/// critical first, breach when the value falls below the bound.
pub(crate) fn resolve_low(value: f64, bounds: Bounds) -> Option<(Severity, f64)> {
    if let Some(critical) = bounds.critical {
        if value < critical {
            return Some((Severity::Critical, critical));
        }
    }
    if let Some(warning) = bounds.warning {
        if value < warning {
            return Some((Severity::Warning, warning));
        }
    }
    None
}
