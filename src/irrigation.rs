//! Irrigation decision rule.
//!
//! A forecast day whose precipitation probability exceeds the rain threshold
//! always switches irrigation off, even under manual control. Without such a
//! day the soil humidity decides, unless manual control is active, in which
//! case the state is left to the operator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::open_meteo::{date_label, Forecast};

pub const RAIN_PROBABILITY_THRESHOLD: u8 = 60;
pub const SOIL_HUMIDITY_THRESHOLD: u8 = 76;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Thresholds {
    /// Irrigation is suppressed when any day's probability is above this.
    pub rain_probability: u8,
    /// Irrigation runs while soil humidity is below this.
    pub soil_humidity: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rain_probability: RAIN_PROBABILITY_THRESHOLD,
            soil_humidity: SOIL_HUMIDITY_THRESHOLD,
        }
    }
}

/// Soil humidity in percent, always within 0..=100.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(from = "u8")]
pub struct Humidity(u8);

impl Humidity {
    pub const MAX: u8 = 100;

    pub fn new(percent: u8) -> Self {
        Self(percent.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn adjust(self, delta: i16) -> Self {
        let v = (self.0 as i16)
            .saturating_add(delta)
            .clamp(0, Self::MAX as i16);
        Self(v as u8)
    }
}

impl From<u8> for Humidity {
    fn from(percent: u8) -> Self {
        Self::new(percent)
    }
}

impl Default for Humidity {
    fn default() -> Self {
        Self(50)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IrrigationState {
    On,
    Off,
}

impl fmt::Display for IrrigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrrigationState::On => write!(f, "ON"),
            IrrigationState::Off => write!(f, "OFF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    HighPrecipitation { date: String },
    LowPrecipitation,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::HighPrecipitation { date } => {
                write!(f, "High probability of precipitation expected on {date}")
            }
            Reason::LowPrecipitation => {
                write!(f, "Low probability of precipitation in the next 7 days.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrrigationDecision {
    pub state: IrrigationState,
    pub reason: Reason,
    /// Index of the forecast day that triggered the rain rule.
    pub trigger_index: Option<usize>,
}

/// Index of the first day whose probability exceeds the rain threshold.
pub fn rain_trigger_day(forecast: &Forecast, thresholds: &Thresholds) -> Option<usize> {
    forecast.days.iter().position(|day| {
        day.precipitation_probability
            .is_some_and(|p| p > thresholds.rain_probability)
    })
}

/// Decide the irrigation state. `None` means no automatic change.
pub fn evaluate(
    forecast: &Forecast,
    humidity: Humidity,
    manual_override: bool,
    thresholds: &Thresholds,
) -> Option<IrrigationDecision> {
    if let Some(i) = rain_trigger_day(forecast, thresholds) {
        return Some(IrrigationDecision {
            state: IrrigationState::Off,
            reason: Reason::HighPrecipitation {
                date: date_label(&forecast.days[i].date),
            },
            trigger_index: Some(i),
        });
    }

    if manual_override {
        return None;
    }

    let state = if humidity.value() < thresholds.soil_humidity {
        IrrigationState::On
    } else {
        IrrigationState::Off
    };
    Some(IrrigationDecision {
        state,
        reason: Reason::LowPrecipitation,
        trigger_index: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn forecast(probabilities: &[u8]) -> Forecast {
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| (start + Days::new(i as u64), Some(*p)))
            .collect()
    }

    fn run(probabilities: &[u8], humidity: u8, manual: bool) -> Option<IrrigationDecision> {
        evaluate(
            &forecast(probabilities),
            Humidity::new(humidity),
            manual,
            &Thresholds::default(),
        )
    }

    #[test]
    fn sixty_percent_is_not_rain() {
        let decision = run(&[10, 20, 30, 40, 50, 60, 10], 50, false).unwrap();
        assert_eq!(decision.state, IrrigationState::On);
        assert_eq!(decision.reason, Reason::LowPrecipitation);
        assert_eq!(
            decision.reason.to_string(),
            "Low probability of precipitation in the next 7 days."
        );
        assert_eq!(decision.trigger_index, None);
    }

    #[test]
    fn rain_day_switches_off() {
        let decision = run(&[10, 70, 30], 90, false).unwrap();
        assert_eq!(decision.state, IrrigationState::Off);
        assert_eq!(decision.trigger_index, Some(1));
        assert_eq!(
            decision.reason.to_string(),
            "High probability of precipitation expected on 02.05."
        );
    }

    #[test]
    fn first_rain_day_wins() {
        let decision = run(&[10, 61, 95, 80], 10, false).unwrap();
        assert_eq!(decision.trigger_index, Some(1));
    }

    #[test]
    fn rain_day_regardless_of_humidity_or_override() {
        for humidity in [0, 50, 75, 76, 100] {
            for manual in [false, true] {
                let decision = run(&[0, 0, 99], humidity, manual).unwrap();
                assert_eq!(decision.state, IrrigationState::Off);
                assert_eq!(decision.trigger_index, Some(2));
            }
        }
    }

    #[test]
    fn rain_overrides_manual_control() {
        let decision = run(&[65], 10, true).unwrap();
        assert_eq!(decision.state, IrrigationState::Off);
        assert_eq!(decision.trigger_index, Some(0));
    }

    #[test]
    fn empty_forecast_uses_humidity() {
        let decision = run(&[], 80, false).unwrap();
        assert_eq!(decision.state, IrrigationState::Off);
        assert_eq!(decision.reason, Reason::LowPrecipitation);

        let decision = run(&[], 20, false).unwrap();
        assert_eq!(decision.state, IrrigationState::On);
    }

    #[test]
    fn humidity_boundary() {
        assert_eq!(run(&[30], 75, false).unwrap().state, IrrigationState::On);
        assert_eq!(run(&[30], 76, false).unwrap().state, IrrigationState::Off);
    }

    #[test]
    fn manual_without_rain_leaves_state_alone() {
        assert_eq!(run(&[10, 20], 10, true), None);
        assert_eq!(run(&[], 90, true), None);
    }

    #[test]
    fn missing_probability_never_triggers() {
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let forecast: Forecast = vec![(start, None), (start + Days::new(1), Some(20))]
            .into_iter()
            .collect();
        let decision =
            evaluate(&forecast, Humidity::new(10), false, &Thresholds::default()).unwrap();
        assert_eq!(decision.state, IrrigationState::On);
    }

    #[test]
    fn custom_thresholds() {
        let thresholds = Thresholds {
            rain_probability: 30,
            soil_humidity: 40,
        };
        let decision = evaluate(&forecast(&[31]), Humidity::new(10), false, &thresholds).unwrap();
        assert_eq!(decision.trigger_index, Some(0));

        let decision = evaluate(&forecast(&[30]), Humidity::new(45), false, &thresholds).unwrap();
        assert_eq!(decision.state, IrrigationState::Off);
    }

    #[test]
    fn humidity_is_clamped() {
        assert_eq!(Humidity::new(150).value(), 100);
        assert_eq!(Humidity::new(95).adjust(10).value(), 100);
        assert_eq!(Humidity::new(5).adjust(-10).value(), 0);
        assert_eq!(Humidity::new(50).adjust(i16::MAX).value(), 100);
        assert_eq!(Humidity::new(50).adjust(i16::MIN).value(), 0);
    }
}
