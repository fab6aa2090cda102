use chrono::NaiveDate;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IrrigatorError, Result};
use crate::locations::Location;

const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Something that can produce a forecast for a location.
pub trait ForecastSource {
    fn fetch(&self, location: &Location) -> Result<Forecast>;
}

/// Forecasts from the Open-Meteo HTTP API.
#[derive(Debug, Default)]
pub struct OpenMeteo;

impl ForecastSource for OpenMeteo {
    fn fetch(&self, location: &Location) -> Result<Forecast> {
        Forecast::from_open_meteo(location)
    }
}

pub fn forecast_url(location: &Location) -> String {
    format!(
        "{BASE_URL}?latitude={}&longitude={}&timezone={}&daily=precipitation_probability_max",
        location.latitude, location.longitude, location.timezone
    )
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,

    /// Maximum precipitation probability in percent, `None` when the API has no value.
    pub precipitation_probability: Option<u8>,
}

impl DailyForecast {
    pub fn label(&self) -> String {
        date_label(&self.date)
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    pub days: Vec<DailyForecast>,
}

impl Forecast {
    pub fn from_open_meteo(location: &Location) -> Result<Self> {
        let url = forecast_url(location);
        debug!(%url, "requesting forecast");
        let response: response::Response = get_web_json(&url)?.error_for_status()?.json()?;
        let forecast = Self::from_response(response)?;
        info!(location = %location.name, days = forecast.len(), "forecast loaded");
        Ok(forecast)
    }

    pub fn from_response(response: response::Response) -> Result<Self> {
        let daily = response.daily;
        if daily.time.len() != daily.precipitation_probability_max.len() {
            return Err(IrrigatorError::ForecastShape {
                dates: daily.time.len(),
                probabilities: daily.precipitation_probability_max.len(),
            });
        }

        let days = daily
            .time
            .into_iter()
            .zip(daily.precipitation_probability_max)
            .map(|(date, p)| DailyForecast {
                date,
                precipitation_probability: p.map(|v| v.round().clamp(0.0, 100.0) as u8),
            })
            .collect();
        Ok(Self { days })
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl FromIterator<(NaiveDate, Option<u8>)> for Forecast {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Option<u8>)>>(iter: I) -> Self {
        Self {
            days: iter
                .into_iter()
                .map(|(date, precipitation_probability)| DailyForecast {
                    date,
                    precipitation_probability,
                })
                .collect(),
        }
    }
}

/// Short day label, e.g. `07.03.`
pub fn date_label(date: &NaiveDate) -> String {
    date.format("%d.%m.").to_string()
}

pub mod response {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Response {
        pub daily: Daily,
    }

    #[derive(Deserialize, Debug)]
    pub struct Daily {
        pub time: Vec<NaiveDate>,

        pub precipitation_probability_max: Vec<Option<f32>>,
    }
}

fn get_web_json(url: &str) -> std::result::Result<Response, reqwest::Error> {
    let client = Client::builder().user_agent("irrigator").build()?;
    client.get(url).send()
}
