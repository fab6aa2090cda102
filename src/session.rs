use tracing::{debug, info, warn};

use crate::irrigation::{evaluate, Humidity, IrrigationDecision, IrrigationState, Thresholds};
use crate::locations::Location;
use crate::open_meteo::{Forecast, ForecastSource};

/// Operator and widget events handled by a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectLocation(usize),
    NextLocation,
    PreviousLocation,
    Refresh,
    SetHumidity(u8),
    AdjustHumidity(i16),
    ToggleManual,
    TurnOn,
    TurnOff,
}

/// All state for one run: the selected location, its forecast, the
/// simulated soil humidity and the irrigation output.
pub struct Session<S> {
    source: S,
    locations: Vec<Location>,
    selected: usize,
    forecast: Forecast,
    humidity: Humidity,
    manual: bool,
    irrigation: IrrigationState,
    message: String,
    trigger_index: Option<usize>,
    thresholds: Thresholds,
}

impl<S: ForecastSource> Session<S> {
    /// A session on the first location, with no forecast loaded yet.
    pub fn new(
        source: S,
        locations: Vec<Location>,
        humidity: Humidity,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            source,
            locations,
            selected: 0,
            forecast: Forecast::default(),
            humidity,
            manual: false,
            irrigation: IrrigationState::Off,
            message: String::new(),
            trigger_index: None,
            thresholds,
        }
    }

    pub fn handle(&mut self, command: Command) {
        debug!(?command, "handling command");
        match command {
            Command::SelectLocation(i) => {
                if i < self.locations.len() {
                    self.selected = i;
                    self.load_location();
                } else {
                    warn!(index = i, "no such location");
                }
            }
            Command::NextLocation => {
                if !self.locations.is_empty() {
                    self.selected = (self.selected + 1) % self.locations.len();
                    self.load_location();
                }
            }
            Command::PreviousLocation => {
                if !self.locations.is_empty() {
                    let n = self.locations.len();
                    self.selected = (self.selected + n - 1) % n;
                    self.load_location();
                }
            }
            Command::Refresh => self.load_location(),
            Command::SetHumidity(v) => {
                self.humidity = Humidity::new(v);
                self.check_irrigation();
            }
            Command::AdjustHumidity(delta) => {
                self.humidity = self.humidity.adjust(delta);
                self.check_irrigation();
            }
            Command::ToggleManual => {
                self.manual = !self.manual;
                info!(manual = self.manual, "manual control toggled");
            }
            Command::TurnOn => self.operator_command(IrrigationState::On),
            Command::TurnOff => self.operator_command(IrrigationState::Off),
        }
    }

    /// Fetch the forecast for the selected location, replacing the current
    /// one, and re-evaluate. A failed fetch leaves an empty forecast.
    pub fn load_location(&mut self) {
        let Some(location) = self.locations.get(self.selected) else {
            return;
        };
        self.forecast = match self.source.fetch(location) {
            Ok(forecast) => forecast,
            Err(err) => {
                warn!(location = %location.name, error = %err, "forecast unavailable");
                Forecast::default()
            }
        };
        self.check_irrigation();
    }

    fn check_irrigation(&mut self) {
        match evaluate(&self.forecast, self.humidity, self.manual, &self.thresholds) {
            Some(decision) => self.apply(decision),
            None => debug!("manual control active, irrigation left unchanged"),
        }
    }

    fn apply(&mut self, decision: IrrigationDecision) {
        if decision.state != self.irrigation {
            info!(state = %decision.state, reason = %decision.reason, "irrigation switched");
        }
        self.irrigation = decision.state;
        self.message = decision.reason.to_string();
        self.trigger_index = decision.trigger_index;
    }

    fn operator_command(&mut self, state: IrrigationState) {
        if !self.manual {
            debug!(%state, "ignoring operator command outside manual control");
            return;
        }
        info!(%state, "irrigation set by operator");
        self.irrigation = state;
    }

    pub fn location(&self) -> Option<&Location> {
        self.locations.get(self.selected)
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    pub fn humidity(&self) -> Humidity {
        self.humidity
    }

    pub fn manual(&self) -> bool {
        self.manual
    }

    pub fn irrigation(&self) -> IrrigationState {
        self.irrigation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trigger_index(&self) -> Option<usize> {
        self.trigger_index
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{IrrigatorError, Result};
    use crate::locations::default_locations;
    use chrono::{Days, NaiveDate};
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Canned forecasts by location name; unknown names fail like a network error.
    #[derive(Default)]
    pub(crate) struct Canned {
        pub forecasts: HashMap<String, Vec<u8>>,
        pub fetches: Cell<usize>,
    }

    impl Canned {
        pub fn with(mut self, name: &str, probabilities: &[u8]) -> Self {
            self.forecasts.insert(name.to_string(), probabilities.to_vec());
            self
        }
    }

    impl ForecastSource for Canned {
        fn fetch(&self, location: &Location) -> Result<Forecast> {
            self.fetches.set(self.fetches.get() + 1);
            let probabilities = self
                .forecasts
                .get(&location.name)
                .ok_or_else(|| IrrigatorError::UnknownLocation(location.name.clone()))?;
            let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
            Ok(probabilities
                .iter()
                .enumerate()
                .map(|(i, p)| (start + Days::new(i as u64), Some(*p)))
                .collect())
        }
    }

    fn session(source: Canned, humidity: u8) -> Session<Canned> {
        Session::new(
            source,
            default_locations(),
            Humidity::new(humidity),
            Thresholds::default(),
        )
    }

    #[test]
    fn loading_dry_location_turns_irrigation_on() {
        let mut s = session(Canned::default().with("Zagreb", &[10, 20, 30]), 50);
        s.load_location();
        assert_eq!(s.irrigation(), IrrigationState::On);
        assert_eq!(s.forecast().len(), 3);
        assert_eq!(
            s.message(),
            "Low probability of precipitation in the next 7 days."
        );
    }

    #[test]
    fn location_change_replaces_forecast() {
        let source = Canned::default()
            .with("Zagreb", &[10, 20])
            .with("Buenaventura", &[90, 95, 99, 80]);
        let mut s = session(source, 50);
        s.load_location();
        assert_eq!(s.irrigation(), IrrigationState::On);

        s.handle(Command::NextLocation);
        assert_eq!(s.location().unwrap().name, "Buenaventura");
        assert_eq!(s.forecast().len(), 4);
        assert_eq!(s.irrigation(), IrrigationState::Off);
        assert_eq!(s.trigger_index(), Some(0));
        assert_eq!(
            s.message(),
            "High probability of precipitation expected on 01.05."
        );
    }

    #[test]
    fn previous_location_wraps() {
        let mut s = session(Canned::default().with("London", &[5]), 50);
        s.handle(Command::PreviousLocation);
        assert_eq!(s.location().unwrap().name, "London");
    }

    #[test]
    fn failed_fetch_falls_back_to_humidity() {
        let mut s = session(Canned::default(), 80);
        s.load_location();
        assert!(s.forecast().is_empty());
        assert_eq!(s.irrigation(), IrrigationState::Off);

        s.handle(Command::SetHumidity(30));
        assert_eq!(s.irrigation(), IrrigationState::On);
    }

    #[test]
    fn humidity_change_reuses_forecast() {
        let mut s = session(Canned::default().with("Zagreb", &[10]), 50);
        s.load_location();
        s.handle(Command::AdjustHumidity(40));
        assert_eq!(s.humidity().value(), 90);
        assert_eq!(s.irrigation(), IrrigationState::Off);
        assert_eq!(s.source.fetches.get(), 1);
    }

    #[test]
    fn operator_commands_need_manual_control() {
        let mut s = session(Canned::default().with("Zagreb", &[10]), 90);
        s.load_location();
        s.handle(Command::TurnOn);
        assert_eq!(s.irrigation(), IrrigationState::Off);

        s.handle(Command::ToggleManual);
        s.handle(Command::TurnOn);
        assert_eq!(s.irrigation(), IrrigationState::On);

        // no rain in the forecast, so humidity changes leave the operator's choice alone
        s.handle(Command::SetHumidity(95));
        assert_eq!(s.irrigation(), IrrigationState::On);
    }

    #[test]
    fn rain_overrides_operator() {
        let mut s = session(Canned::default().with("Zagreb", &[65]), 10);
        s.handle(Command::ToggleManual);
        s.load_location();
        s.handle(Command::TurnOn);
        assert_eq!(s.irrigation(), IrrigationState::On);

        s.handle(Command::AdjustHumidity(1));
        assert_eq!(s.irrigation(), IrrigationState::Off);
        assert_eq!(s.trigger_index(), Some(0));
    }

    #[test]
    fn refresh_refetches_selected_location() {
        let mut s = session(Canned::default().with("Zagreb", &[10]), 50);
        s.load_location();
        s.source.forecasts.insert("Zagreb".to_string(), vec![10, 90]);
        s.handle(Command::Refresh);
        assert_eq!(s.source.fetches.get(), 2);
        assert_eq!(s.forecast().len(), 2);
        assert_eq!(s.irrigation(), IrrigationState::Off);
        assert_eq!(s.trigger_index(), Some(1));
    }

    #[test]
    fn toggling_manual_keeps_state_and_message() {
        let mut s = session(Canned::default().with("Zagreb", &[10]), 50);
        s.load_location();
        let message = s.message().to_string();
        s.handle(Command::ToggleManual);
        assert!(s.manual());
        assert_eq!(s.irrigation(), IrrigationState::On);
        assert_eq!(s.message(), message);

        s.handle(Command::ToggleManual);
        assert!(!s.manual());
        assert_eq!(s.irrigation(), IrrigationState::On);
        assert_eq!(s.message(), message);
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut s = session(Canned::default().with("Zagreb", &[10]), 50);
        s.handle(Command::SelectLocation(7));
        assert_eq!(s.location().unwrap().name, "Zagreb");
        assert_eq!(s.source.fetches.get(), 0);
    }
}
