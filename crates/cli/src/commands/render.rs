//! Plain-text rendering for terminal output.

use std::fmt::Write;

use chrono::NaiveDate;

use nimbus_client::{ClientError, FavoriteView};
use nimbus_core::api::{CityMatch, CurrentWeatherResponse, ForecastResponse};

const MPH_PER_MPS: f64 = 2.237;
const INHG_PER_HPA: f64 = 0.029_53;

/// Current conditions block.
pub fn current(response: &CurrentWeatherResponse) -> String {
    let location = &response.location;
    let weather = &response.weather.reading;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}, {}",
        place_name(&location.name, location.lat, location.lon),
        location.country
    );
    let _ = writeln!(
        out,
        "  {}°  {} (feels like {}°)",
        weather.temperature.round(),
        weather.description,
        weather.feels_like.round()
    );
    let visibility = weather
        .visibility
        .map_or_else(|| "N/A".to_string(), |km| format!("{km:.1} km"));
    let _ = writeln!(
        out,
        "  Visibility {visibility} | Humidity {}% | Wind {:.1} mph | Pressure {:.2} in",
        weather.humidity,
        weather.wind_speed * MPH_PER_MPS,
        weather.pressure * INHG_PER_HPA
    );
    let _ = write!(
        out,
        "  Updated {}",
        response.weather.timestamp.format("%H:%M UTC")
    );
    out
}

/// Forecast table, one line per day.
pub fn forecast(response: &ForecastResponse) -> String {
    let mut out = String::from("7-Day Forecast");
    if response.forecasts.is_empty() {
        out.push_str("\n  (no forecast data)");
        return out;
    }
    let today = response.forecasts.first().map(|f| f.day.date);
    for stored in &response.forecasts {
        let day = &stored.day;
        let _ = write!(
            out,
            "\n  {:<6} {:<20} {:>3}% rain  {}° / {}°",
            day_label(day.date, today),
            day.description,
            day.precipitation_chance,
            day.temp_high.round(),
            day.temp_low.round()
        );
    }
    out
}

/// Favorites list with handles for `favorites remove`.
pub fn favorites(views: &[FavoriteView], kind: &str) -> String {
    let mut out = format!("Favorites ({kind})");
    if views.is_empty() {
        out.push_str("\n  (none)");
        return out;
    }
    for view in views {
        let detail = view.weather.as_ref().map_or_else(
            || format!("{:.2}, {:.2}", view.lat, view.lon),
            |w| format!("{}° • {}", w.reading.temperature.round(), w.reading.description),
        );
        let _ = write!(
            out,
            "\n  [{}] {}, {}  {detail}",
            view.handle, view.name, view.country
        );
    }
    out
}

/// Search results.
pub fn search(results: &[CityMatch]) -> String {
    if results.is_empty() {
        return "No matching cities".to_string();
    }
    results
        .iter()
        .map(|c| format!("{}, {}  ({:.2}, {:.2})", c.name, c.country, c.lat, c.lon))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line error for a failed section.
pub fn failure(what: &str, error: &ClientError) -> String {
    match error {
        ClientError::Api { message, .. } => format!("{what} unavailable: {message}"),
        other => format!("{what} unavailable: {other}"),
    }
}

fn place_name(name: &str, lat: f64, lon: f64) -> String {
    if name.is_empty() {
        format!("{lat:.2}, {lon:.2}")
    } else {
        name.to_string()
    }
}

fn day_label(date: NaiveDate, first: Option<NaiveDate>) -> String {
    if Some(date) == first {
        "Today".to_string()
    } else {
        date.format("%a").to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use nimbus_client::FavoriteHandle;
    use nimbus_core::{
        ForecastDay, ForecastId, Location, LocationId, SnapshotId, StoredForecastDay,
        WeatherReading, WeatherSnapshot,
    };

    fn location() -> Location {
        Location {
            id: LocationId::new(3),
            user_id: None,
            name: "London".to_string(),
            country: "GB".to_string(),
            lat: 51.5074,
            lon: -0.1278,
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            id: SnapshotId::new(9),
            location_id: LocationId::new(3),
            reading: WeatherReading {
                temperature: 14.6,
                feels_like: 13.2,
                humidity: 72,
                pressure: 1013.0,
                wind_speed: 4.0,
                wind_direction: Some(200),
                visibility: None,
                description: "light rain".to_string(),
                icon: "10d".to_string(),
                cloudiness: Some(90),
                uv_index: None,
            },
            timestamp: Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap(),
        }
    }

    fn day(date: (i32, u32, u32), high: f64, low: f64) -> StoredForecastDay {
        StoredForecastDay {
            id: ForecastId::new(1),
            location_id: LocationId::new(3),
            day: ForecastDay {
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                temp_high: high,
                temp_low: low,
                description: "overcast clouds".to_string(),
                icon: "04d".to_string(),
                humidity: 70,
                wind_speed: 3.0,
                precipitation: 0.0,
                precipitation_chance: 40,
            },
        }
    }

    #[test]
    fn test_current_uses_display_units() {
        let text = current(&CurrentWeatherResponse {
            location: location(),
            weather: snapshot(),
        });
        assert!(text.starts_with("London, GB"));
        assert!(text.contains("15°  light rain (feels like 13°)"));
        assert!(text.contains("Visibility N/A"));
        assert!(text.contains("Wind 8.9 mph"));
        assert!(text.contains("Pressure 29.91 in"));
        assert!(text.contains("Updated 09:30 UTC"));
    }

    #[test]
    fn test_forecast_labels_first_day_today() {
        let text = forecast(&ForecastResponse {
            location: location(),
            forecasts: vec![day((2026, 10, 15), 18.4, 9.6), day((2026, 10, 16), 17.0, 8.0)],
        });
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Today"));
        assert!(lines[1].ends_with("18° / 10°"));
        assert!(lines[2].contains("Fri"));
    }

    #[test]
    fn test_favorites_show_weather_or_coordinates() {
        let views = vec![
            FavoriteView {
                handle: FavoriteHandle::Remote(LocationId::new(3)),
                name: "London".to_string(),
                country: "GB".to_string(),
                lat: 51.5074,
                lon: -0.1278,
                weather: Some(snapshot()),
            },
            FavoriteView {
                handle: FavoriteHandle::Local(0),
                name: "Oslo".to_string(),
                country: "NO".to_string(),
                lat: 59.9139,
                lon: 10.7522,
                weather: None,
            },
        ];
        let text = favorites(&views, "account");
        assert!(text.contains("[3] London, GB  15° • light rain"));
        assert!(text.contains("[#0] Oslo, NO  59.91, 10.75"));
        assert_eq!(favorites(&[], "local"), "Favorites (local)\n  (none)");
    }

    #[test]
    fn test_search_and_failure() {
        assert_eq!(search(&[]), "No matching cities");
        let text = search(&[CityMatch {
            name: "Tokyo".to_string(),
            country: "JP".to_string(),
            lat: 35.6762,
            lon: 139.6503,
        }]);
        assert_eq!(text, "Tokyo, JP  (35.68, 139.65)");

        let err = ClientError::Api {
            status: 500,
            message: "Failed to fetch weather data".to_string(),
        };
        assert_eq!(
            failure("Current weather", &err),
            "Current weather unavailable: Failed to fetch weather data"
        );
    }
}
