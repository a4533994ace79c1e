//! Weather snapshots, forecast days, and forecast aggregation.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ForecastId, LocationId, SnapshotId};

/// Maximum number of forecast days kept per location.
pub const MAX_FORECAST_DAYS: usize = 7;

/// A single current-conditions reading, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: Option<i32>,
    /// Visibility in kilometres.
    pub visibility: Option<f64>,
    pub description: String,
    pub icon: String,
    pub cloudiness: Option<i32>,
    pub uv_index: Option<f64>,
}

/// The live reading for a location.
///
/// At most one snapshot exists per location. Recording a new one replaces it
/// and allocates a fresh id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub id: SnapshotId,
    pub location_id: LocationId,
    #[serde(flatten)]
    pub reading: WeatherReading,
    pub timestamp: DateTime<Utc>,
}

/// One provider sample from a fixed-interval forecast feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: i32,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    /// Probability of precipitation in `0.0..=1.0`.
    pub pop: f64,
    /// Rain volume for the sample interval, in mm.
    pub rain: Option<f64>,
    /// Snow volume for the sample interval, in mm.
    pub snow: Option<f64>,
}

/// One aggregated forecast day, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_high: f64,
    pub temp_low: f64,
    pub description: String,
    pub icon: String,
    pub humidity: i32,
    pub wind_speed: f64,
    /// Total rain and snow for the day, in mm.
    pub precipitation: f64,
    /// Chance of precipitation as a whole percentage.
    pub precipitation_chance: i32,
}

/// A forecast day as stored for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredForecastDay {
    pub id: ForecastId,
    pub location_id: LocationId,
    #[serde(flatten)]
    pub day: ForecastDay,
}

/// Collapse fixed-interval samples into at most [`MAX_FORECAST_DAYS`] days.
///
/// Samples are grouped by calendar date in `offset`, the location's UTC
/// offset. Within a day:
///
/// - `temp_high` is the max of the sample maxima and `temp_low` the min of the
///   sample minima
/// - description, icon, humidity and wind speed come from the earliest sample
/// - precipitation is the sum of every sample's rain and snow
/// - precipitation chance is the earliest sample's `pop` as a rounded percentage
///
/// Days come back in chronological order regardless of input order.
#[must_use]
pub fn aggregate_forecast(samples: &[ForecastSample], offset: FixedOffset) -> Vec<ForecastDay> {
    let mut ordered: Vec<&ForecastSample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.timestamp);

    let mut days: Vec<ForecastDay> = Vec::new();
    for sample in ordered {
        let date = sample.timestamp.with_timezone(&offset).date_naive();
        let precipitation = sample.rain.unwrap_or(0.0) + sample.snow.unwrap_or(0.0);

        match days.last_mut() {
            Some(day) if day.date == date => {
                day.temp_high = day.temp_high.max(sample.temp_max);
                day.temp_low = day.temp_low.min(sample.temp_min);
                day.precipitation += precipitation;
            }
            _ => {
                if days.len() == MAX_FORECAST_DAYS {
                    break;
                }
                days.push(ForecastDay {
                    date,
                    temp_high: sample.temp_max,
                    temp_low: sample.temp_min,
                    description: sample.description.clone(),
                    icon: sample.icon.clone(),
                    humidity: sample.humidity,
                    wind_speed: sample.wind_speed,
                    precipitation,
                    precipitation_chance: precipitation_percent(sample.pop),
                });
            }
        }
    }
    days
}

#[allow(clippy::cast_possible_truncation)]
fn precipitation_percent(pop: f64) -> i32 {
    // Half-way values round away from zero: 0.485 -> 49.
    (pop.clamp(0.0, 1.0) * 100.0).round() as i32
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn sample(timestamp: DateTime<Utc>, temp_min: f64, temp_max: f64) -> ForecastSample {
        ForecastSample {
            timestamp,
            temp_min,
            temp_max,
            humidity: 60,
            wind_speed: 3.5,
            description: "clear sky".to_owned(),
            icon: "01d".to_owned(),
            pop: 0.2,
            rain: None,
            snow: None,
        }
    }

    fn three_hourly(start: DateTime<Utc>, count: i64) -> Vec<ForecastSample> {
        (0..count)
            .map(|i| sample(start + chrono::Duration::hours(3 * i), 10.0, 20.0))
            .collect()
    }

    #[test]
    fn test_high_and_low_over_one_day() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let maxes = [18.0, 22.0, 25.0, 24.0, 23.0, 20.0, 19.0, 17.0];
        let mins = [15.0, 16.0, 18.0, 19.0, 18.0, 17.0, 16.0, 15.0];
        let samples: Vec<_> = maxes
            .iter()
            .zip(mins)
            .enumerate()
            .map(|(i, (&max, min))| {
                sample(start + chrono::Duration::hours(3 * i as i64), min, max)
            })
            .collect();

        let days = aggregate_forecast(&samples, utc());
        assert_eq!(days.len(), 1);
        assert!((days[0].temp_high - 25.0).abs() < f64::EPSILON);
        assert!((days[0].temp_low - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_sample_supplies_day_fields() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let mut first = sample(start, 10.0, 12.0);
        first.description = "light rain".to_owned();
        first.icon = "10d".to_owned();
        first.humidity = 91;
        first.wind_speed = 7.25;
        first.pop = 0.4;
        let mut second = sample(start + chrono::Duration::hours(3), 9.0, 14.0);
        second.description = "clear sky".to_owned();
        second.pop = 0.9;

        // Out of order on purpose.
        let days = aggregate_forecast(&[second, first], utc());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].description, "light rain");
        assert_eq!(days[0].icon, "10d");
        assert_eq!(days[0].humidity, 91);
        assert!((days[0].wind_speed - 7.25).abs() < f64::EPSILON);
        assert_eq!(days[0].precipitation_chance, 40);
    }

    #[test]
    fn test_precipitation_accumulates_rain_and_snow() {
        let start = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        let mut samples = three_hourly(start, 3);
        samples[0].rain = Some(1.5);
        samples[1].snow = Some(0.5);
        samples[2].rain = Some(0.25);
        samples[2].snow = Some(0.75);

        let days = aggregate_forecast(&samples, utc());
        assert!((days[0].precipitation - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_precipitation_chance_rounds_half_up() {
        let start = Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap();
        let mut s = sample(start, 1.0, 2.0);
        s.pop = 0.485;
        let days = aggregate_forecast(&[s], utc());
        assert_eq!(days[0].precipitation_chance, 49);
    }

    #[test]
    fn test_keeps_first_seven_days_in_order() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        // Ten days of three-hourly samples.
        let samples = three_hourly(start, 80);

        let days = aggregate_forecast(&samples, utc());
        assert_eq!(days.len(), MAX_FORECAST_DAYS);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2026, 6, 7).unwrap());
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_groups_by_local_calendar_day() {
        // 22:00 and 02:00 UTC fall on the same day at UTC-5.
        let late = Utc.with_ymd_and_hms(2026, 2, 1, 22, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 2, 2, 2, 0, 0).unwrap();
        let samples = [sample(late, 5.0, 8.0), sample(early, 3.0, 6.0)];

        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let local = aggregate_forecast(&samples, new_york);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());

        assert_eq!(aggregate_forecast(&samples, utc()).len(), 2);
    }

    #[test]
    fn test_empty_feed() {
        assert!(aggregate_forecast(&[], utc()).is_empty());
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let snapshot = WeatherSnapshot {
            id: SnapshotId::new(9),
            location_id: LocationId::new(3),
            reading: WeatherReading {
                temperature: 21.5,
                feels_like: 20.0,
                humidity: 55,
                pressure: 1013.0,
                wind_speed: 4.2,
                wind_direction: Some(180),
                visibility: Some(10.0),
                description: "few clouds".to_owned(),
                icon: "02d".to_owned(),
                cloudiness: Some(20),
                uv_index: None,
            },
            timestamp: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["locationId"], 3);
        assert_eq!(json["feelsLike"], 20.0);
        assert_eq!(json["visibility"], 10.0);

        let back: WeatherSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}
