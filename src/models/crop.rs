use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub type CropId = i64;

/// A crop definition from the remote catalog, optionally enriched with the
/// irrigation window saved for it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: CropId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_temperature: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_temperature: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_soil_moisture: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_soil_moisture: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min_humidity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_humidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

// Browsers serialize NaN as null, and saved snapshots may be partial.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Crop {
    #[cfg(test)]
    pub fn new(id: CropId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            min_temperature: 0.0,
            max_temperature: 0.0,
            min_soil_moisture: 0.0,
            max_soil_moisture: 0.0,
            min_humidity: 0.0,
            max_humidity: 0.0,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_threshold(mut self, field: ThresholdField, value: f64) -> Self {
        field.set(&mut self, value);
        self
    }

    /// Shallow merge: every field present in the override replaces the
    /// crop's value, everything else is kept.
    pub fn with_override(mut self, over: &CropOverride) -> Self {
        for field in ThresholdField::all() {
            if let Some(value) = over.get(*field) {
                field.set(&mut self, value);
            }
        }
        self
    }

    /// Copy of this crop carrying the given irrigation window. A missing
    /// window yields empty start/end strings.
    pub fn with_irrigation_window(mut self, window: Option<&IrrigationWindow>) -> Self {
        self.start_time = Some(window.map(|w| w.start_time.clone()).unwrap_or_default());
        self.end_time = Some(window.map(|w| w.end_time.clone()).unwrap_or_default());
        self
    }

    /// Ranges whose minimum exceeds their maximum.
    pub fn inverted_ranges(&self) -> Vec<ThresholdRange> {
        ThresholdRange::all()
            .iter()
            .copied()
            .filter(|range| {
                let (min, max) = range.bounds();
                min.get(self) > max.get(self)
            })
            .collect()
    }
}

impl std::fmt::Display for Crop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// The six user-editable numeric thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdField {
    MinTemperature,
    MaxTemperature,
    MinSoilMoisture,
    MaxSoilMoisture,
    MinHumidity,
    MaxHumidity,
}

impl ThresholdField {
    pub fn all() -> &'static [ThresholdField] {
        &[
            ThresholdField::MinTemperature,
            ThresholdField::MaxTemperature,
            ThresholdField::MinSoilMoisture,
            ThresholdField::MaxSoilMoisture,
            ThresholdField::MinHumidity,
            ThresholdField::MaxHumidity,
        ]
    }

    /// Name used on the wire and in local storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdField::MinTemperature => "minTemperature",
            ThresholdField::MaxTemperature => "maxTemperature",
            ThresholdField::MinSoilMoisture => "minSoilMoisture",
            ThresholdField::MaxSoilMoisture => "maxSoilMoisture",
            ThresholdField::MinHumidity => "minHumidity",
            ThresholdField::MaxHumidity => "maxHumidity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThresholdField::MinTemperature => "Min Temperature (°C)",
            ThresholdField::MaxTemperature => "Max Temperature (°C)",
            ThresholdField::MinSoilMoisture => "Min Soil Moisture (%)",
            ThresholdField::MaxSoilMoisture => "Max Soil Moisture (%)",
            ThresholdField::MinHumidity => "Min Humidity (%)",
            ThresholdField::MaxHumidity => "Max Humidity (%)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ThresholdField::MinTemperature | ThresholdField::MaxTemperature => "°C",
            _ => "%",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "mintemperature" | "mintemp" => Some(ThresholdField::MinTemperature),
            "maxtemperature" | "maxtemp" => Some(ThresholdField::MaxTemperature),
            "minsoilmoisture" => Some(ThresholdField::MinSoilMoisture),
            "maxsoilmoisture" => Some(ThresholdField::MaxSoilMoisture),
            "minhumidity" => Some(ThresholdField::MinHumidity),
            "maxhumidity" => Some(ThresholdField::MaxHumidity),
            _ => None,
        }
    }

    pub fn get(&self, crop: &Crop) -> f64 {
        match self {
            ThresholdField::MinTemperature => crop.min_temperature,
            ThresholdField::MaxTemperature => crop.max_temperature,
            ThresholdField::MinSoilMoisture => crop.min_soil_moisture,
            ThresholdField::MaxSoilMoisture => crop.max_soil_moisture,
            ThresholdField::MinHumidity => crop.min_humidity,
            ThresholdField::MaxHumidity => crop.max_humidity,
        }
    }

    pub fn set(&self, crop: &mut Crop, value: f64) {
        match self {
            ThresholdField::MinTemperature => crop.min_temperature = value,
            ThresholdField::MaxTemperature => crop.max_temperature = value,
            ThresholdField::MinSoilMoisture => crop.min_soil_moisture = value,
            ThresholdField::MaxSoilMoisture => crop.max_soil_moisture = value,
            ThresholdField::MinHumidity => crop.min_humidity = value,
            ThresholdField::MaxHumidity => crop.max_humidity = value,
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|f| f == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|f| f == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl std::fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdRange {
    Temperature,
    SoilMoisture,
    Humidity,
}

impl ThresholdRange {
    pub fn all() -> &'static [ThresholdRange] {
        &[
            ThresholdRange::Temperature,
            ThresholdRange::SoilMoisture,
            ThresholdRange::Humidity,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdRange::Temperature => "Temperature",
            ThresholdRange::SoilMoisture => "Soil Moisture",
            ThresholdRange::Humidity => "Humidity",
        }
    }

    pub fn bounds(&self) -> (ThresholdField, ThresholdField) {
        match self {
            ThresholdRange::Temperature => {
                (ThresholdField::MinTemperature, ThresholdField::MaxTemperature)
            }
            ThresholdRange::SoilMoisture => {
                (ThresholdField::MinSoilMoisture, ThresholdField::MaxSoilMoisture)
            }
            ThresholdRange::Humidity => (ThresholdField::MinHumidity, ThresholdField::MaxHumidity),
        }
    }
}

/// Partial record of locally overridden threshold fields for one crop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_soil_moisture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_soil_moisture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_humidity: Option<f64>,
}

impl CropOverride {
    pub fn get(&self, field: ThresholdField) -> Option<f64> {
        match field {
            ThresholdField::MinTemperature => self.min_temperature,
            ThresholdField::MaxTemperature => self.max_temperature,
            ThresholdField::MinSoilMoisture => self.min_soil_moisture,
            ThresholdField::MaxSoilMoisture => self.max_soil_moisture,
            ThresholdField::MinHumidity => self.min_humidity,
            ThresholdField::MaxHumidity => self.max_humidity,
        }
    }

    pub fn set(&mut self, field: ThresholdField, value: f64) {
        let slot = match field {
            ThresholdField::MinTemperature => &mut self.min_temperature,
            ThresholdField::MaxTemperature => &mut self.max_temperature,
            ThresholdField::MinSoilMoisture => &mut self.min_soil_moisture,
            ThresholdField::MaxSoilMoisture => &mut self.max_soil_moisture,
            ThresholdField::MinHumidity => &mut self.min_humidity,
            ThresholdField::MaxHumidity => &mut self.max_humidity,
        };
        *slot = Some(value);
    }
}

/// Saved irrigation schedule for a crop, as `HH:MM` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationWindow {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl IrrigationWindow {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

pub type OverlayMap = BTreeMap<CropId, CropOverride>;
pub type IrrigationTimes = BTreeMap<CropId, IrrigationWindow>;
