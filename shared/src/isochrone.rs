use crate::model::{Profile, RangeType};
use crate::url_state::parse_float;

const DEFAULT_RANGE_SECONDS: f64 = 600.0;

/// Isochrone panel settings. Ranges are stored in service units
/// (seconds or meters) and edited in user units (minutes or km).
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneOptions {
    pub profile: Profile,
    range_type: RangeType,
    ranges: Vec<f64>,
}

impl Default for IsochroneOptions {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            range_type: RangeType::Time,
            ranges: vec![DEFAULT_RANGE_SECONDS],
        }
    }
}

impl IsochroneOptions {
    pub fn range_type(&self) -> RangeType {
        self.range_type
    }

    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }

    /// Applies a comma separated list typed by the user.
    ///
    /// Returns `false` and keeps the previous ranges when nothing usable was typed.
    pub fn set_range_input(&mut self, input: &str) -> bool {
        let parsed = parse_range_input(input, self.range_type);
        if parsed.is_empty() {
            return false;
        }
        self.ranges = parsed;
        true
    }

    /// Switches between time and distance, carrying the typed numbers over
    /// (10 minutes becomes 10 km and back).
    pub fn set_range_type(&mut self, range_type: RangeType) {
        if range_type == self.range_type {
            return;
        }
        let typed: Vec<f64> = self
            .ranges
            .iter()
            .map(|range| to_user_units(*range, self.range_type))
            .collect();
        self.range_type = range_type;
        self.ranges = typed
            .into_iter()
            .map(|value| to_service_units(value, range_type))
            .collect();
    }

    /// Current ranges as the user would type them, e.g. `"10, 20"`.
    pub fn range_input_text(&self) -> String {
        self.ranges
            .iter()
            .map(|range| format!("{:.0}", to_user_units(*range, self.range_type)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn unit_label(&self) -> &'static str {
        match self.range_type {
            RangeType::Time => "Time (minutes)",
            RangeType::Distance => "Distance (km)",
        }
    }
}

/// Parses `"10, 20, 30"` into service units; non-positive or unparseable entries are dropped.
pub fn parse_range_input(input: &str, range_type: RangeType) -> Vec<f64> {
    input
        .split(',')
        .filter_map(parse_float)
        .map(|value| to_service_units(value, range_type))
        .filter(|value| value.is_finite() && *value > 0.0)
        .collect()
}

fn to_service_units(value: f64, range_type: RangeType) -> f64 {
    match range_type {
        RangeType::Time => value * 60.0,
        RangeType::Distance => value * 1000.0,
    }
}

fn to_user_units(value: f64, range_type: RangeType) -> f64 {
    match range_type {
        RangeType::Time => value / 60.0,
        RangeType::Distance => value / 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ten_minutes() {
        let options = IsochroneOptions::default();
        assert_eq!(options.ranges(), &[600.0]);
        assert_eq!(options.range_input_text(), "10");
    }

    #[test]
    fn test_parse_range_input() {
        assert_eq!(
            parse_range_input("10, 20min,abc, -5, 0,30", RangeType::Time),
            vec![600.0, 1200.0, 1800.0]
        );
        assert_eq!(parse_range_input("2.5", RangeType::Distance), vec![2500.0]);
        assert!(parse_range_input("", RangeType::Time).is_empty());
    }

    #[test]
    fn test_invalid_input_keeps_previous_ranges() {
        let mut options = IsochroneOptions::default();
        assert!(options.set_range_input("5, 15"));
        assert_eq!(options.ranges(), &[300.0, 900.0]);

        assert!(!options.set_range_input("nope"));
        assert_eq!(options.ranges(), &[300.0, 900.0]);
    }

    #[test]
    fn test_switching_range_type_carries_numbers() {
        let mut options = IsochroneOptions::default();
        options.set_range_input("10, 20");

        options.set_range_type(RangeType::Distance);
        assert_eq!(options.ranges(), &[10_000.0, 20_000.0]);
        assert_eq!(options.range_input_text(), "10, 20");
        assert_eq!(options.unit_label(), "Distance (km)");

        options.set_range_type(RangeType::Time);
        assert_eq!(options.ranges(), &[600.0, 1200.0]);
    }
}
