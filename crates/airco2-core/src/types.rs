use crate::constants::{
    FUNCTION_CO2, FUNCTION_HUMIDITY, FUNCTION_TEMPERATURE, HUMIDITY_DIVISOR, KELVIN_OFFSET,
    TEMPERATURE_DIVISOR,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One decoded report: the function code and its big-endian 16-bit payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedSample {
    pub function: u8,
    pub value: u16,
}

impl DecodedSample {
    /// Build a sample from the function byte and the two payload bytes.
    #[must_use]
    pub fn from_bytes(function: u8, msb: u8, lsb: u8) -> Self {
        Self {
            function,
            value: u16::from_be_bytes([msb, lsb]),
        }
    }

    /// The measurement kind carried by this sample, if it is one we track.
    #[must_use]
    pub fn kind(&self) -> Option<MeasurementKind> {
        MeasurementKind::from_function(self.function)
    }

    /// Convert the raw payload into a physical reading.
    ///
    /// Returns `None` for function codes that are not tracked.
    #[must_use]
    pub fn to_measurement(&self) -> Option<Measurement> {
        let raw = f64::from(self.value);
        match self.kind()? {
            MeasurementKind::CarbonDioxide => Some(Measurement::CarbonDioxide(self.value)),
            MeasurementKind::Temperature => Some(Measurement::Temperature(
                raw / TEMPERATURE_DIVISOR - KELVIN_OFFSET,
            )),
            MeasurementKind::Humidity => Some(Measurement::Humidity(raw / HUMIDITY_DIVISOR)),
        }
    }
}

impl fmt::Display for DecodedSample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#04x}={}", self.function, self.value)
    }
}

/// Frame dialect spoken by a device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    /// Not probed yet, or probing found no valid frame.
    #[default]
    Undetected,
    /// 5-byte frames without obfuscation.
    Clear,
    /// 8-byte frames passed through the vendor cipher.
    Obfuscated,
}

impl PollMode {
    /// Whether the dialect has been settled.
    #[must_use]
    pub fn is_detected(&self) -> bool {
        !matches!(self, Self::Undetected)
    }
}

impl fmt::Display for PollMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Undetected => write!(f, "undetected"),
            Self::Clear => write!(f, "clear"),
            Self::Obfuscated => write!(f, "obfuscated"),
        }
    }
}

/// The three physical quantities reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    CarbonDioxide,
    Temperature,
    Humidity,
}

impl MeasurementKind {
    /// All kinds, in reporting order.
    pub const ALL: [MeasurementKind; 3] = [Self::CarbonDioxide, Self::Temperature, Self::Humidity];

    /// Classify a function code.
    #[must_use]
    pub fn from_function(function: u8) -> Option<Self> {
        match function {
            FUNCTION_CO2 => Some(Self::CarbonDioxide),
            FUNCTION_TEMPERATURE => Some(Self::Temperature),
            FUNCTION_HUMIDITY => Some(Self::Humidity),
            _ => None,
        }
    }

    /// Function code identifying this kind on the wire.
    #[must_use]
    pub fn function(&self) -> u8 {
        match self {
            Self::CarbonDioxide => FUNCTION_CO2,
            Self::Temperature => FUNCTION_TEMPERATURE,
            Self::Humidity => FUNCTION_HUMIDITY,
        }
    }

    /// Short key used in snapshots and entity ids.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::CarbonDioxide => "co2",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }

    /// Human-readable sensor name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CarbonDioxide => "AirCO2ntrol Carbon Dioxide",
            Self::Temperature => "AirCO2ntrol Temperature",
            Self::Humidity => "AirCO2ntrol Humidity",
        }
    }

    /// Unit of measurement.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::CarbonDioxide => "ppm",
            Self::Temperature => "°C",
            Self::Humidity => "%",
        }
    }

    /// Material Design icon name.
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Self::CarbonDioxide => "mdi:molecule-co2",
            Self::Temperature => "mdi:thermometer",
            Self::Humidity => "mdi:water-percent",
        }
    }

    /// Stable per-device entity id, e.g. `04d9:a052-co2`.
    #[must_use]
    pub fn entity_id(&self, device_unique_id: &str) -> String {
        format!("{}-{}", device_unique_id, self.key())
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A converted reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    /// CO2 concentration in ppm.
    CarbonDioxide(u16),
    /// Temperature in degrees Celsius.
    Temperature(f64),
    /// Relative humidity in percent.
    Humidity(f64),
}

impl Measurement {
    #[must_use]
    pub fn kind(&self) -> MeasurementKind {
        match self {
            Self::CarbonDioxide(_) => MeasurementKind::CarbonDioxide,
            Self::Temperature(_) => MeasurementKind::Temperature,
            Self::Humidity(_) => MeasurementKind::Humidity,
        }
    }
}

/// Set of measurement kinds refreshed during a polling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefreshSet {
    pub co2: bool,
    pub temperature: bool,
    pub humidity: bool,
}

impl RefreshSet {
    pub fn insert(&mut self, kind: MeasurementKind) {
        match kind {
            MeasurementKind::CarbonDioxide => self.co2 = true,
            MeasurementKind::Temperature => self.temperature = true,
            MeasurementKind::Humidity => self.humidity = true,
        }
    }

    #[must_use]
    pub fn contains(&self, kind: MeasurementKind) -> bool {
        match kind {
            MeasurementKind::CarbonDioxide => self.co2,
            MeasurementKind::Temperature => self.temperature,
            MeasurementKind::Humidity => self.humidity,
        }
    }

    /// All three kinds have been seen.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.co2 && self.temperature && self.humidity
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.co2 || self.temperature || self.humidity)
    }
}

/// Latest known value for each measurement kind.
///
/// Values are sticky: a field is only overwritten when a new plausible
/// reading of that kind arrives, never cleared. `available` tells whether a
/// device handle is currently open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    /// CO2 concentration in ppm.
    pub co2: Option<u16>,

    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,

    /// Relative humidity in percent.
    pub humidity: Option<f64>,

    /// Whether a device handle is currently open.
    pub available: bool,

    /// When any field was last refreshed.
    pub last_updated: Option<DateTime<Utc>>,
}

impl MeasurementSnapshot {
    /// Store a reading, overwriting the previous value of the same kind.
    pub fn apply(&mut self, measurement: Measurement) {
        match measurement {
            Measurement::CarbonDioxide(ppm) => self.co2 = Some(ppm),
            Measurement::Temperature(celsius) => self.temperature = Some(celsius),
            Measurement::Humidity(percent) => self.humidity = Some(percent),
        }
        self.last_updated = Some(Utc::now());
    }

    /// Current value of a kind as a float, for uniform presentation.
    #[must_use]
    pub fn value(&self, kind: MeasurementKind) -> Option<f64> {
        match kind {
            MeasurementKind::CarbonDioxide => self.co2.map(f64::from),
            MeasurementKind::Temperature => self.temperature,
            MeasurementKind::Humidity => self.humidity,
        }
    }

    /// Whether no reading has ever been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.co2.is_none() && self.temperature.is_none() && self.humidity.is_none()
    }
}

impl fmt::Display for MeasurementSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn field<T: fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "co2={} ppm temperature={} °C humidity={} % available={}",
            field(self.co2),
            field(self.temperature.map(|t| format!("{t:.2}"))),
            field(self.humidity.map(|h| format!("{h:.1}"))),
            self.available
        )
    }
}
