//! Remote climate settings and temperature handling
//!
//! The USA-region service takes temperatures in whole degrees Fahrenheit
//! within a fixed band, and reports the cabin target back as a string.

use serde::{Deserialize, Serialize};

/// Lowest accepted cabin target temperature (°F)
pub const TEMPERATURE_MIN_F: i32 = 62;

/// Highest accepted cabin target temperature (°F)
pub const TEMPERATURE_MAX_F: i32 = 82;

/// Target temperature used before the driver has picked one (°F)
pub const DEFAULT_TARGET_TEMPERATURE_F: i32 = 72;

/// Clamp a requested cabin target temperature to the accepted band
pub fn clamp_target_temperature(value: i32) -> i32 {
    value.clamp(TEMPERATURE_MIN_F, TEMPERATURE_MAX_F)
}

/// Parse the temperature value the service reports as a string
///
/// The wire value is usually a plain integer ("72") but the service also
/// reports the band endpoints as words ("LOW", "HIGH"). Anything that does
/// not parse as a whole number yields None.
pub fn parse_temperature_value(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

/// Heated/cooled seat level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatSettings {
    #[default]
    Off,
    HeatLow,
    HeatMedium,
    HeatHigh,
    CoolLow,
    CoolMedium,
    CoolHigh,
}

/// Parameters for a remote climate start
///
/// Carries the driver's intent at the time the command is issued; none of
/// this is validated against the vehicle's installed options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSettings {
    /// Cabin target in whole °F, clamped to the accepted band
    pub target_temperature_f: i32,

    /// Run the windshield defroster
    pub defrost: bool,

    /// Run the cabin air conditioning/heating
    pub climate: bool,

    /// Heated accessories (steering wheel, rear window, side mirrors)
    pub heating_accessories: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_seat: Option<SeatSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_seat: Option<SeatSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_rear_seat: Option<SeatSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_rear_seat: Option<SeatSettings>,
}

impl ClimateSettings {
    /// Create settings for a climate start at the given target temperature
    pub fn new(target_temperature_f: i32) -> Self {
        Self {
            target_temperature_f: clamp_target_temperature(target_temperature_f),
            defrost: false,
            climate: true,
            heating_accessories: false,
            driver_seat: None,
            passenger_seat: None,
            left_rear_seat: None,
            right_rear_seat: None,
        }
    }

    /// Set the defroster flag
    pub fn with_defrost(mut self, defrost: bool) -> Self {
        self.defrost = defrost;
        self
    }

    /// Set the heated-accessories flag
    pub fn with_heating_accessories(mut self, heating_accessories: bool) -> Self {
        self.heating_accessories = heating_accessories;
        self
    }
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_TEMPERATURE_F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_target_temperature() {
        assert_eq!(clamp_target_temperature(72), 72);
        assert_eq!(clamp_target_temperature(40), TEMPERATURE_MIN_F);
        assert_eq!(clamp_target_temperature(100), TEMPERATURE_MAX_F);
    }

    #[test]
    fn test_parse_temperature_value() {
        assert_eq!(parse_temperature_value("72"), Some(72));
        assert_eq!(parse_temperature_value(" 68 "), Some(68));
        assert_eq!(parse_temperature_value("LOW"), None);
        assert_eq!(parse_temperature_value("HIGH"), None);
        assert_eq!(parse_temperature_value(""), None);
    }

    #[test]
    fn test_new_clamps_target() {
        let settings = ClimateSettings::new(55);
        assert_eq!(settings.target_temperature_f, TEMPERATURE_MIN_F);
        assert!(settings.climate);
        assert!(!settings.defrost);
    }

    #[test]
    fn test_builder_flags() {
        let settings = ClimateSettings::new(72)
            .with_defrost(true)
            .with_heating_accessories(true);
        assert!(settings.defrost);
        assert!(settings.heating_accessories);
    }

    #[test]
    fn test_seat_settings_serde() {
        let json = serde_json::to_string(&SeatSettings::HeatMedium).unwrap();
        assert_eq!(json, "\"heat_medium\"");
        let parsed: SeatSettings = serde_json::from_str("\"cool_high\"").unwrap();
        assert_eq!(parsed, SeatSettings::CoolHigh);
    }
}
