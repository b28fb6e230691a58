//! Export helpers for JSON reports, CSV schedule tables and PNG map plots.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write artifact: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub mod report {
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    use serde::Serialize;
    use serde_json::to_writer_pretty;

    use super::{ExportError, ensure_parent};

    #[derive(Serialize)]
    struct Envelope<'a, T: Serialize> {
        generated_utc: String,
        generator: &'a str,
        #[serde(flatten)]
        report: &'a T,
    }

    /// Write `report` as pretty JSON with a generation timestamp alongside its fields.
    pub fn write_json<T: Serialize>(
        path: &Path,
        generator: &str,
        report: &T,
    ) -> Result<(), ExportError> {
        ensure_parent(path)?;
        let envelope = Envelope {
            generated_utc: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            generator,
            report,
        };
        to_writer_pretty(BufWriter::new(File::create(path)?), &envelope)?;
        Ok(())
    }
}

pub mod schedule {
    use std::path::Path;

    use serde::Serialize;

    use super::{ExportError, ensure_parent};

    /// One row of the schedule table.
    #[derive(Debug, Clone, Serialize)]
    pub struct ScheduleRow {
        #[serde(rename = "type")]
        pub kind: String,
        pub start_t: f64,
        pub end_t: f64,
        pub duration_s: f64,
        pub target_idx: Option<usize>,
    }

    impl ScheduleRow {
        pub fn new(kind: impl Into<String>, start_t: f64, end_t: f64, target_idx: Option<usize>) -> Self {
            Self {
                kind: kind.into(),
                start_t,
                end_t,
                duration_s: end_t - start_t,
                target_idx,
            }
        }
    }

    /// Write rows under the header `type,start_t,end_t,duration_s,target_idx`.
    pub fn write_schedule_csv(path: &Path, rows: &[ScheduleRow]) -> Result<(), ExportError> {
        ensure_parent(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        if rows.is_empty() {
            writer.write_record(["type", "start_t", "end_t", "duration_s", "target_idx"])?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub mod plot {
    use std::path::Path;

    use plotters::prelude::*;

    use super::{ExportError, ensure_parent};

    /// Longitude/latitude layers for a map plot. Points are `(lon, lat)`.
    #[derive(Debug, Clone, Default)]
    pub struct MapPlot {
        pub tracks: Vec<Vec<(f64, f64)>>,
        pub waypoints: Vec<(f64, f64)>,
        pub zones: Vec<Vec<(f64, f64)>>,
        pub markers: Vec<(f64, f64)>,
    }

    impl MapPlot {
        fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
            let points = self
                .tracks
                .iter()
                .flatten()
                .chain(&self.waypoints)
                .chain(self.zones.iter().flatten())
                .chain(&self.markers);
            let mut lon = (f64::INFINITY, f64::NEG_INFINITY);
            let mut lat = (f64::INFINITY, f64::NEG_INFINITY);
            for &(x, y) in points {
                lon = (lon.0.min(x), lon.1.max(x));
                lat = (lat.0.min(y), lat.1.max(y));
            }
            if !lon.0.is_finite() || !lat.0.is_finite() {
                return None;
            }
            let pad = |(lo, hi): (f64, f64)| {
                let margin = ((hi - lo) * 0.05).max(0.01);
                (lo - margin, hi + margin)
            };
            Some((pad(lon), pad(lat)))
        }
    }

    /// Split a `(lon, lat)` series wherever it wraps across the antimeridian.
    pub fn split_at_antimeridian(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let mut pieces: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        for &point in points {
            if let Some(&(last_lon, _)) = current.last() {
                if (point.0 - last_lon).abs() > 180.0 {
                    pieces.push(std::mem::take(&mut current));
                }
            }
            current.push(point);
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }

    /// Render `map` to a PNG. Only geometry is drawn, no text.
    pub fn write_map_png(path: &Path, map: &MapPlot, size: (u32, u32)) -> Result<(), ExportError> {
        ensure_parent(path)?;
        let ((x0, x1), (y0, y1)) = map
            .bounds()
            .ok_or_else(|| ExportError::Plot("nothing to plot".to_string()))?;
        let plot_err = |e: &dyn std::fmt::Display| ExportError::Plot(e.to_string());

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| plot_err(&e))?;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(|e| plot_err(&e))?;

        let grid = ShapeStyle::from(&BLACK.mix(0.1)).stroke_width(1);
        let lines = (0..=10).flat_map(|i| {
            let fx = x0 + (x1 - x0) * f64::from(i) / 10.0;
            let fy = y0 + (y1 - y0) * f64::from(i) / 10.0;
            [
                PathElement::new(vec![(fx, y0), (fx, y1)], grid),
                PathElement::new(vec![(x0, fy), (x1, fy)], grid),
            ]
        });
        chart.draw_series(lines).map_err(|e| plot_err(&e))?;

        for zone in &map.zones {
            chart
                .draw_series(std::iter::once(Polygon::new(zone.clone(), RED.mix(0.25).filled())))
                .map_err(|e| plot_err(&e))?;
        }
        for track in &map.tracks {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    track.clone(),
                    ShapeStyle::from(&BLUE).stroke_width(2),
                )))
                .map_err(|e| plot_err(&e))?;
        }
        chart
            .draw_series(
                map.waypoints
                    .iter()
                    .map(|&p| Circle::new(p, 5, ShapeStyle::from(&BLACK).filled())),
            )
            .map_err(|e| plot_err(&e))?;
        chart
            .draw_series(
                map.markers
                    .iter()
                    .map(|&p| Cross::new(p, 8, ShapeStyle::from(&RGBColor(210, 100, 20)).stroke_width(3))),
            )
            .map_err(|e| plot_err(&e))?;

        root.present().map_err(|e| plot_err(&e))?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wrap_splits_track() {
            let pieces = split_at_antimeridian(&[(170.0, 0.0), (179.0, 1.0), (-179.0, 2.0), (-170.0, 3.0)]);
            assert_eq!(pieces.len(), 2);
            assert_eq!(pieces[0].len(), 2);
        }
    }
}
