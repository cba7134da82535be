//! Advisory rule engine
//!
//! Turns a weather snapshot into a short travel advisory. Rules are evaluated in
//! a fixed order and every rule that fires contributes one sentence:
//! temperature band, humidity, wind, description keywords, then daylight.

use chrono::NaiveTime;

use crate::models::WeatherSnapshot;

const TIME_OF_DAY_FORMAT: &str = "%I:%M %p";

const HUMID_ABOVE_PERCENT: u8 = 70;
const WINDY_ABOVE: f64 = 8.0;
const SHORT_DAYLIGHT_HOURS: i64 = 10;

/// Builds the advisory sentence for a snapshot. Pure and total.
#[must_use]
pub fn build(weather: &WeatherSnapshot) -> String {
    let mut fragments: Vec<&'static str> = Vec::new();

    fragments.push(temperature_fragment(weather.temperature));

    if weather.humidity > HUMID_ABOVE_PERCENT {
        fragments.push("High humidity may feel uncomfortable.");
    }

    if weather.wind_speed > WINDY_ABOVE {
        fragments.push("Windy conditions. Secure loose items.");
    }

    fragments.extend(description_fragments(&weather.description));

    if is_short_daylight(&weather.sunrise, &weather.sunset) {
        fragments.push("Short daylight hours — plan activities early.");
    }

    fragments.join(" ").trim().to_string()
}

fn temperature_fragment(temperature: f64) -> &'static str {
    if temperature < 5.0 {
        "Very cold weather. Winter gear required."
    } else if temperature < 15.0 {
        "Cold conditions. Wear warm clothing."
    } else if temperature < 25.0 {
        "Pleasant temperature. Ideal for travel."
    } else if temperature < 32.0 {
        "Warm weather. Stay hydrated."
    } else {
        "Very hot weather. Avoid prolonged sun exposure."
    }
}

fn description_fragments(description: &str) -> impl Iterator<Item = &'static str> {
    const KEYWORDS: [(&str, &str); 4] = [
        ("rain", "Carry an umbrella."),
        ("snow", "Snow conditions. Travel carefully."),
        ("storm", "Severe weather warning. Limit outdoor activity."),
        ("clear", "Clear skies — great for sightseeing."),
    ];

    let description = description.to_lowercase();
    KEYWORDS
        .into_iter()
        .filter(move |(keyword, _)| description.contains(keyword))
        .map(|(_, fragment)| fragment)
}

/// Unparseable times never count as short daylight.
fn is_short_daylight(sunrise: &str, sunset: &str) -> bool {
    let (Some(sunrise), Some(sunset)) = (parse_time_of_day(sunrise), parse_time_of_day(sunset))
    else {
        return false;
    };

    (sunset - sunrise).num_hours() < SHORT_DAYLIGHT_HOURS
}

fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FORMAT).ok()
}
