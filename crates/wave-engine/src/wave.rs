use serde::{Deserialize, Serialize};
use std::time::Duration;
use wave_core::{WaveError, WaveResult};

pub const MIN_WARMING_METERS: f64 = 10.0;
pub const MAX_WARMING_METERS: f64 = 5_000.0;
pub const MAX_SPLITS: u8 = 16;
const MAX_SPEED_MPS: f64 = 1_000.0;
const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    East,
    West,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::East => 1.0,
            Self::West => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaveKind {
    Linear { direction: Direction },
    Deep,
    LinearSplit { direction: Direction, splits: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmingRule {
    Longitude(f64),
    Meters(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWaveDefinition", into = "RawWaveDefinition")]
pub struct WaveDefinition {
    kind: WaveKind,
    speed_mps: f64,
    approx_duration: Duration,
    warming: WarmingRule,
}

/// On-disk shape: the two warming configurations are separate optional
/// fields and exactly one of them must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawWaveDefinition {
    kind: WaveKind,
    speed_mps: f64,
    approx_duration_s: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warming_longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    warming_meters: Option<f64>,
}

impl TryFrom<RawWaveDefinition> for WaveDefinition {
    type Error = WaveError;

    fn try_from(raw: RawWaveDefinition) -> Result<Self, Self::Error> {
        let warming = match (raw.warming_longitude, raw.warming_meters) {
            (Some(longitude), None) => WarmingRule::Longitude(longitude),
            (None, Some(meters)) => WarmingRule::Meters(meters),
            (Some(_), Some(_)) => {
                return Err(WaveError::Validation(vec![
                    "warming_longitude and warming_meters are mutually exclusive".to_string(),
                ]));
            }
            (None, None) => {
                return Err(WaveError::Validation(vec![
                    "one of warming_longitude or warming_meters is required".to_string(),
                ]));
            }
        };
        Self::new(
            raw.kind,
            raw.speed_mps,
            Duration::from_secs(raw.approx_duration_s),
            warming,
        )
    }
}

impl From<WaveDefinition> for RawWaveDefinition {
    fn from(value: WaveDefinition) -> Self {
        let (warming_longitude, warming_meters) = match value.warming {
            WarmingRule::Longitude(longitude) => (Some(longitude), None),
            WarmingRule::Meters(meters) => (None, Some(meters)),
        };
        Self {
            kind: value.kind,
            speed_mps: value.speed_mps,
            approx_duration_s: value.approx_duration.as_secs(),
            warming_longitude,
            warming_meters,
        }
    }
}

impl WaveDefinition {
    pub fn new(
        kind: WaveKind,
        speed_mps: f64,
        approx_duration: Duration,
        warming: WarmingRule,
    ) -> WaveResult<Self> {
        let definition = Self {
            kind,
            speed_mps,
            approx_duration,
            warming,
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn kind(&self) -> WaveKind {
        self.kind
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn approx_duration(&self) -> Duration {
        self.approx_duration
    }

    pub fn warming(&self) -> WarmingRule {
        self.warming
    }

    fn validate(&self) -> WaveResult<()> {
        let mut problems = Vec::new();

        if !self.speed_mps.is_finite() || self.speed_mps <= 0.0 || self.speed_mps > MAX_SPEED_MPS {
            problems.push(format!(
                "speed_mps must be in (0, {MAX_SPEED_MPS}], got {}",
                self.speed_mps
            ));
        }
        if self.approx_duration.is_zero() || self.approx_duration > MAX_DURATION {
            problems.push(format!(
                "approx_duration must be between 1s and 24h, got {:?}",
                self.approx_duration
            ));
        }
        if let WaveKind::LinearSplit { splits, .. } = self.kind {
            if !(2..=MAX_SPLITS).contains(&splits) {
                problems.push(format!("splits must be in [2, {MAX_SPLITS}], got {splits}"));
            }
        }
        match self.warming {
            WarmingRule::Longitude(longitude) => {
                if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
                    problems.push(format!(
                        "warming longitude must be in [-180, 180], got {longitude}"
                    ));
                }
                if matches!(self.kind, WaveKind::Deep) {
                    problems.push("longitude warming requires a meridian front".to_string());
                }
            }
            WarmingRule::Meters(meters) => {
                if !meters.is_finite() || !(MIN_WARMING_METERS..=MAX_WARMING_METERS).contains(&meters)
                {
                    problems.push(format!(
                        "warming meters must be in [{MIN_WARMING_METERS}, {MAX_WARMING_METERS}], got {meters}"
                    ));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(WaveError::Validation(problems))
        }
    }
}
