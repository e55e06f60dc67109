//! Translation from user-facing weather attribute names to Open-Meteo codes.

use std::collections::HashMap;

/// Read-only lookup table, built once and shared between the fetcher and
/// the formatter.
#[derive(Debug, Clone)]
pub struct ParameterMap {
    entries: HashMap<String, String>,
}

impl ParameterMap {
    /// The Open-Meteo `current` variables the service knows by name.
    pub fn open_meteo() -> Self {
        Self::from_pairs([
            ("temperature", "temperature_2m"),
            ("humidity", "relative_humidity_2m"),
            ("precipitation", "precipitation"),
            ("wind_speed", "wind_speed_10m"),
            ("wind", "wind_speed_10m"),
            ("weather", "weather_code"),
            ("pressure", "pressure_msl"),
            ("cloud_cover", "cloud_cover"),
            ("clouds", "cloud_cover"),
        ])
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(name, code)| (name.to_lowercase(), code.to_string()))
            .collect();
        Self { entries }
    }

    /// Provider code for `name`; unknown names are returned as given.
    pub fn map<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .get(&name.to_lowercase())
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Codes for all `names`, in order, without duplicates.
    pub fn codes<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut codes: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let code = self.map(name.as_ref());
            if !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }
        codes
    }
}

impl Default for ParameterMap {
    fn default() -> Self {
        Self::open_meteo()
    }
}
