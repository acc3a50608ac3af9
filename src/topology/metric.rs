//! OSPF-style link and route metric.

use crate::constants::{DEFAULT_WIFI_RANGE, OSPF_REFERENCE_BANDWIDTH};

/// Cost of traversing a single physical link: `max(1, REF_BW/bw) +
/// distance/range + delay`. An infinite-bandwidth link costs 0 (used for
/// the degenerate self-link).
pub fn link_metric(bandwidth: f64, distance: f64, delay: f64) -> f64 {
    if bandwidth.is_infinite() {
        return 0.0;
    }
    (OSPF_REFERENCE_BANDWIDTH / bandwidth).max(1.0) + distance / DEFAULT_WIFI_RANGE + delay
}

/// Combine the metrics of two concatenated path segments. Metric is
/// additive along a path.
pub fn combine_metric(a: f64, b: f64) -> f64 {
    a + b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_link_is_free() {
        assert_eq!(link_metric(f64::INFINITY, 0.0, 0.0), 0.0);
    }

    #[test]
    fn metric_floors_bandwidth_term_at_one() {
        // bandwidth far above reference: the bandwidth term floors at 1.
        let m = link_metric(1_000_000.0, 0.0, 5.0);
        assert_eq!(m, 1.0 + 5.0);
    }

    #[test]
    fn metric_scales_with_low_bandwidth() {
        let m = link_metric(100.0, 0.0, 0.0);
        assert_eq!(m, OSPF_REFERENCE_BANDWIDTH / 100.0);
    }

    #[test]
    fn combine_is_additive() {
        assert_eq!(combine_metric(1.5, 2.5), 4.0);
    }
}
