//! Human-readable rendering of weather records.

use std::fmt::Write;

use weather_core::WeatherRecord;

pub fn format_current(record: &WeatherRecord) -> String {
    let mut out = format!("Current weather in {}, {}\n", record.city, record.country);
    push_readings(&mut out, record, "");
    let _ = writeln!(
        out,
        "Observed at: {}",
        record.timestamp.format("%Y-%m-%d %H:%M (UTC%:z)")
    );
    out
}

pub fn format_forecast(records: &[WeatherRecord]) -> String {
    let Some(first) = records.first() else {
        return "No forecast data available.\n".to_string();
    };

    let mut out = format!(
        "{}-day forecast for {}, {}\n",
        records.len(),
        first.city,
        first.country
    );
    // Dates are read in the offset each day was bucketed in.
    for record in records {
        let _ = writeln!(out, "\n{}", record.timestamp.format("%Y-%m-%d (%a)"));
        push_readings(&mut out, record, "  ");
    }
    out
}

fn push_readings(out: &mut String, r: &WeatherRecord, indent: &str) {
    let _ = writeln!(out, "{indent}Conditions:  {}", r.description);
    let _ = writeln!(
        out,
        "{indent}Temperature: {}°C (feels like {}°C)",
        r.temperature, r.feels_like
    );
    let _ = writeln!(out, "{indent}Humidity:    {}%", r.humidity);
    let _ = writeln!(out, "{indent}Wind:        {:.1} m/s", r.wind_speed);
    let _ = writeln!(out, "{indent}Visibility:  {:.1} km", r.visibility);
    let _ = writeln!(out, "{indent}Pressure:    {} hPa", r.pressure);
}
