//! Live telemetry fields as display strings.

use serde::Serialize;

use crate::protocol::payloads::{GpsUpdate, PowerUpdate, Text, WeatherReport};

pub const PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub icon: &'static str,
    pub temperature: String,
    pub condition: String,
    pub min_max: String,
    pub humidity: String,
}

impl Default for WeatherView {
    fn default() -> Self {
        Self {
            icon: "fa-cloud",
            temperature: "--°C".to_string(),
            condition: PLACEHOLDER.to_string(),
            min_max: "-- / --".to_string(),
            humidity: "-- %".to_string(),
        }
    }
}

impl WeatherView {
    fn from_report(report: &WeatherReport) -> Self {
        let field = |value: &Option<Text>| {
            value
                .as_ref()
                .map(|text| text.as_str().trim())
                .filter(|text| !text.is_empty())
                .unwrap_or("--")
                .to_string()
        };

        let condition = report
            .condition
            .as_ref()
            .map(|text| text.as_str().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        Self {
            icon: weather_icon(&condition),
            temperature: format!("{}°C", field(&report.temp_c)),
            min_max: format!("{}°C / {}°C", field(&report.min_temp_c), field(&report.max_temp_c)),
            humidity: format!("{}%", field(&report.humidity)),
            condition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    pub date: String,
    pub time: String,
    pub sunrise: String,
    pub sunset: String,
    pub satellites: String,
    pub location: String,
    pub weather: WeatherView,
    pub battery: String,
    pub water: String,
    pub solar: String,
    pub load: String,
    pub phase: String,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            date: PLACEHOLDER.to_string(),
            time: PLACEHOLDER.to_string(),
            sunrise: PLACEHOLDER.to_string(),
            sunset: PLACEHOLDER.to_string(),
            satellites: PLACEHOLDER.to_string(),
            location: PLACEHOLDER.to_string(),
            weather: WeatherView::default(),
            battery: PLACEHOLDER.to_string(),
            water: PLACEHOLDER.to_string(),
            solar: PLACEHOLDER.to_string(),
            load: PLACEHOLDER.to_string(),
            phase: PLACEHOLDER.to_string(),
        }
    }
}

impl Telemetry {
    /// Connection lost: every field back to its placeholder.
    pub fn blank(&mut self) {
        *self = Self::default();
    }

    pub fn apply_gps(&mut self, update: &GpsUpdate) {
        let fields = [
            (&mut self.date, &update.date),
            (&mut self.time, &update.time),
            (&mut self.sunrise, &update.sunrise),
            (&mut self.sunset, &update.sunset),
            (&mut self.satellites, &update.satellites),
            (&mut self.location, &update.location),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = text_or_placeholder(value.as_ref());
            }
        }

        if let Some(weather) = &update.weather {
            self.weather = weather
                .as_ref()
                .map(WeatherView::from_report)
                .unwrap_or_default();
        }
    }

    pub fn apply_power(&mut self, update: &PowerUpdate) {
        if let Some(battery) = update.battery {
            self.battery = format_battery(battery, update.battery_pct);
        }
        if let Some(water) = update.water {
            self.water = water.map(|pct| format!("{}%", pct)).unwrap_or_else(placeholder);
        }
        if let Some(solar) = update.solar {
            self.solar = format_amps(solar);
        }
        if let Some(load) = update.load {
            self.load = format_amps(load);
        }
        if let Some(phase) = &update.phase {
            self.apply_phase(phase.as_deref());
        }
    }

    pub fn apply_phase(&mut self, phase: Option<&str>) {
        self.phase = phase
            .filter(|phase| !phase.is_empty())
            .map(capitalize)
            .unwrap_or_else(placeholder);
    }
}

fn placeholder() -> String {
    PLACEHOLDER.to_string()
}

fn text_or_placeholder(value: Option<&Text>) -> String {
    value
        .map(|text| text.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(placeholder)
}

/// `12.3V / 85%`, or `---` without a voltage reading.
pub fn format_battery(volts: Option<f64>, pct: Option<f64>) -> String {
    match volts {
        Some(volts) => {
            let pct = pct.map(|pct| pct.to_string()).unwrap_or_else(|| "--".to_string());
            format!("{:.1}V / {}%", volts, pct)
        }
        None => placeholder(),
    }
}

pub fn format_amps(amps: Option<f64>) -> String {
    amps.map(|amps| format!("{:.1}A", amps)).unwrap_or_else(placeholder)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Font Awesome icon for a weather description. Later keywords win, so
/// "thunder showers" maps to the bolt.
pub fn weather_icon(condition: &str) -> &'static str {
    const RULES: &[(&[&str], &str)] = &[
        (&["sunny", "clear"], "fa-sun"),
        (&["cloud", "overcast"], "fa-cloud"),
        (&["rain", "shower"], "fa-cloud-rain"),
        (&["snow"], "fa-snowflake"),
        (&["fog"], "fa-smog"),
        (&["thunder"], "fa-cloud-bolt"),
    ];

    let condition = condition.to_lowercase();
    RULES
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|keyword| condition.contains(keyword)))
        .last()
        .map(|(_, icon)| *icon)
        .unwrap_or("fa-cloud")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn power(value: serde_json::Value) -> PowerUpdate {
        serde_json::from_value(value).unwrap()
    }

    fn gps(value: serde_json::Value) -> GpsUpdate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn battery_reads_volts_and_percent() {
        let mut telemetry = Telemetry::default();
        telemetry.apply_power(&power(json!({"battery": 12.3, "battery_pct": 85})));
        assert_eq!(telemetry.battery, "12.3V / 85%");

        telemetry.apply_power(&power(json!({"battery": null, "battery_pct": 85})));
        assert_eq!(telemetry.battery, "---");
    }

    #[test]
    fn missing_power_keys_leave_fields_alone() {
        let mut telemetry = Telemetry::default();
        telemetry.apply_power(&power(json!({
            "battery": 12.74, "battery_pct": 91, "water": 40, "solar": 3.25, "load": 0.0, "phase": "evening"
        })));
        telemetry.apply_power(&power(json!({"solar": null})));

        assert_eq!(telemetry.battery, "12.7V / 91%");
        assert_eq!(telemetry.water, "40%");
        assert_eq!(telemetry.solar, "---");
        assert_eq!(telemetry.load, "0.0A");
        assert_eq!(telemetry.phase, "Evening");
    }

    #[test]
    fn gps_fields_and_weather() {
        let mut telemetry = Telemetry::default();
        telemetry.apply_gps(&gps(json!({
            "date": "2024-06-01",
            "time": "21:14",
            "satellites": "7 Satellites",
            "location": "",
            "weather": {
                "temp_C": "14.2",
                "condition": "Patchy light rain with thunder",
                "min_temp_C": "9",
                "max_temp_C": "17",
                "humidity": 88
            }
        })));

        assert_eq!(telemetry.date, "2024-06-01");
        assert_eq!(telemetry.satellites, "7 Satellites");
        assert_eq!(telemetry.location, "---");
        assert_eq!(telemetry.sunrise, "---");
        assert_eq!(telemetry.weather.temperature, "14.2°C");
        assert_eq!(telemetry.weather.min_max, "9°C / 17°C");
        assert_eq!(telemetry.weather.humidity, "88%");
        assert_eq!(telemetry.weather.icon, "fa-cloud-bolt");

        telemetry.apply_gps(&gps(json!({"weather": null})));
        assert_eq!(telemetry.weather, WeatherView::default());
        assert_eq!(telemetry.date, "2024-06-01");
    }

    #[test]
    fn weather_icon_rules() {
        assert_eq!(weather_icon("Sunny"), "fa-sun");
        assert_eq!(weather_icon("Partly cloudy"), "fa-cloud");
        assert_eq!(weather_icon("Light snow showers"), "fa-snowflake");
        assert_eq!(weather_icon("Freezing fog"), "fa-smog");
        assert_eq!(weather_icon("Unknown"), "fa-cloud");
    }

    #[test]
    fn blank_restores_placeholders() {
        let mut telemetry = Telemetry::default();
        telemetry.apply_power(&power(json!({"battery": 12.3, "battery_pct": 85})));
        telemetry.blank();
        assert_eq!(telemetry, Telemetry::default());
    }
}
