//! Plain-text rendering of the dashboard state.

use std::fmt::Write;

use crate::state::DashboardState;

/// Number of upcoming observations listed under the forecast heading
const FORECAST_ROWS: usize = 8;

pub fn render(state: &DashboardState) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_dashboard(&mut out, state);
    out
}

fn write_dashboard(out: &mut String, state: &DashboardState) -> std::fmt::Result {
    match state.now {
        Some(now) => writeln!(out, "WeatherCatch  {}", now.format("%H:%M  %d %b %Y"))?,
        None => writeln!(out, "WeatherCatch")?,
    }
    writeln!(
        out,
        "Location: {}",
        state.location_name().unwrap_or("Locating...")
    )?;

    if let Some(banner) = &state.error {
        writeln!(out, "[!] {}", banner.message)?;
    }

    match state.current_reading() {
        Some(reading) if !state.loading => writeln!(
            out,
            "Temperature: {}   Precipitation: {}",
            reading.temperature_label(),
            reading.rainfall_label()
        )?,
        _ => writeln!(
            out,
            "Temperature: --°{}   Precipitation: -- mm",
            state.unit.symbol()
        )?,
    }

    let readings = state.readings();
    if !readings.is_empty() {
        writeln!(out, "Forecast:")?;
        for reading in readings.iter().take(FORECAST_ROWS) {
            writeln!(
                out,
                "  {}  {:>8}  {}",
                reading.time.format("%H:%M"),
                reading.temperature_label(),
                reading.rainfall_label()
            )?;
        }
    }

    writeln!(out, "Insight:")?;
    match &state.insight {
        Some(text) => {
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                writeln!(out, "  {}", line.trim())?;
            }
        }
        None => writeln!(out, "  Generating insight...")?,
    }

    writeln!(out, "Movies:")?;
    match &state.movies {
        Some(movies) => {
            for movie in movies {
                writeln!(
                    out,
                    "  - {} [{}, {}]: {}",
                    movie.title, movie.genre, movie.mood, movie.description
                )?;
            }
        }
        None => writeln!(out, "  Finding movies...")?,
    }

    if !state.suggestions.is_empty() {
        writeln!(out, "Suggestions for {:?}:", state.search_query)?;
        for (index, suggestion) in state.suggestions.iter().enumerate() {
            writeln!(out, "  {}. {}", index + 1, suggestion.display_name)?;
        }
    }

    Ok(())
}
