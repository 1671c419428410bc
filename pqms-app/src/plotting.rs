//! Charts for the reports: IPQC sample trends, the stability matrix and the
//! activity log timeline.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use pqms_core::logger::LogEntry;
use pqms_core::progress::StabilityMatrix;
use pqms_core::status::SampleStatus;
use pqms_schemas::ipqc::IpqcCheck;
use plotters::prelude::*;
use std::collections::BTreeMap;

fn status_color(status: SampleStatus) -> RGBColor {
    match status {
        SampleStatus::Pending => RGBColor(200, 200, 200),
        SampleStatus::Scheduled => RGBColor(120, 170, 220),
        SampleStatus::InProgress => RGBColor(240, 190, 60),
        SampleStatus::Completed => RGBColor(80, 170, 90),
        SampleStatus::Fail => RGBColor(210, 60, 60),
        SampleStatus::Oos => RGBColor(150, 40, 140),
    }
}

/// Line chart of the raw samples of every check recorded against a batch,
/// one series per check. Returns the path of the image written.
pub fn plot_ipqc_samples(output_dir: &str, batch_number: &str, checks: &[&IpqcCheck]) -> Result<Option<String>> {
    let plotted: Vec<&&IpqcCheck> = checks.iter().filter(|c| !c.samples.is_empty()).collect();
    if plotted.is_empty() {
        println!("[Plotting] Warning: No samples recorded for batch {}.", batch_number);
        return Ok(None);
    }

    let path = format!("{}/ipqc_{}.png", output_dir, batch_number);
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_len = plotted.iter().map(|c| c.samples.len()).max().unwrap_or(1);
    let max_value = plotted
        .iter()
        .flat_map(|c| c.samples.iter().copied())
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("IPQC Samples - {}", batch_number), ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(1usize..max_len.max(2), 0f64..(max_value * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .x_desc("Sample")
        .y_desc("Reading")
        .draw()?;

    let colors = [RED, GREEN, BLUE, CYAN, MAGENTA, BLACK];
    for (i, check) in plotted.iter().enumerate() {
        let color = colors[i % colors.len()];
        chart
            .draw_series(LineSeries::new(
                check.samples.iter().enumerate().map(|(n, v)| (n + 1, *v)),
                color.stroke_width(2),
            ))?
            .label(format!("{} ({})", check.check_type, check.result))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(Some(path.clone()))
}

/// Grid of the protocol's samples, conditions down and time points across,
/// each cell colored by its derived status.
pub fn plot_stability_matrix(output_dir: &str, matrix: &StabilityMatrix) -> Result<String> {
    let path = format!("{}/stability_{}.png", output_dir, matrix.protocol_number);
    let root = BitMapBackend::new(&path, (1024, 512)).into_drawing_area();
    root.fill(&WHITE)?;

    let columns = matrix.time_points.len().max(1) as i32;
    let rows = matrix.conditions.len().max(1) as i32;
    let progress = matrix.progress();

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "{} - {}/{} samples complete ({}%)",
                matrix.protocol_number, progress.completed, progress.total, progress.percent
            ),
            ("sans-serif", 30).into_font(),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0..columns, 0..rows)?;

    let time_point_label = |x: &i32| {
        matrix
            .time_points
            .get(*x as usize)
            .map(|tp| tp.label.clone())
            .unwrap_or_default()
    };
    let condition_label = |y: &i32| {
        matrix
            .conditions
            .get(*y as usize)
            .map(|c| c.condition.clone())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(columns as usize)
        .y_labels(rows as usize)
        .x_label_formatter(&time_point_label)
        .y_label_formatter(&condition_label)
        .draw()?;

    let cells: Vec<(i32, i32, SampleStatus)> = matrix
        .rows
        .iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, cell)| (x as i32, y as i32, cell.status))
        })
        .collect();

    chart.draw_series(cells.iter().map(|(x, y, status)| {
        Rectangle::new([(*x, *y), (*x + 1, *y + 1)], status_color(*status).filled())
    }))?;
    chart.draw_series(cells.iter().map(|(x, y, _)| {
        Rectangle::new([(*x, *y), (*x + 1, *y + 1)], WHITE.stroke_width(2))
    }))?;
    chart.draw_series(cells.iter().map(|(x, y, status)| {
        Text::new(status.label(), (*x, *y), ("sans-serif", 16).into_font())
    }))?;

    root.present()?;
    Ok(path.clone())
}

/// Reads the activity log back from disk.
pub fn parse_activity_log(log_path: &str) -> Result<Vec<LogEntry>> {
    let mut reader = csv::Reader::from_path(log_path)
        .with_context(|| format!("Failed to open activity log {}", log_path))?;
    let mut entries = Vec::new();
    for result in reader.deserialize() {
        let entry: LogEntry = result?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Events per calendar day, keyed by date.
pub fn events_per_day(entries: &[LogEntry]) -> Result<BTreeMap<NaiveDate, u32>> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        let day = DateTime::parse_from_rfc3339(&entry.timestamp)
            .with_context(|| format!("Bad timestamp '{}' in activity log", entry.timestamp))?
            .date_naive();
        *counts.entry(day).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Histogram of logged events per day.
pub fn plot_activity_timeline(output_dir: &str, log_path: &str) -> Result<Option<String>> {
    let counts = events_per_day(&parse_activity_log(log_path)?)?;
    let (first, last) = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            println!("[Plotting] Warning: Activity log is empty.");
            return Ok(None);
        }
    };

    let path = format!("{}/activity_timeline.png", output_dir);
    let root = BitMapBackend::new(&path, (1024, 384)).into_drawing_area();
    root.fill(&WHITE)?;

    let span = (last - first).num_days() as u32 + 1;
    let max_count = counts.values().copied().max().unwrap_or(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Activity since {}", first), ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0u32..span, 0u32..max_count + 1)?;

    chart
        .configure_mesh()
        .x_desc("Day")
        .y_desc("Events")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .data(counts.iter().map(|(day, n)| ((*day - first).num_days() as u32, *n))),
    )?;

    root.present()?;
    Ok(Some(path.clone()))
}
