use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;

use super::{CHART_SIZE, ChartSpec, GRID_SIZE, Marker, Series, draw_chart, draw_grid, ensure_dir, save_png};
use crate::data::loader::{InputPolicy, load, read_numeric_table};
use crate::data::model::NumericTable;

// ---------------------------------------------------------------------------
// Trajectory – time, x, y (z ignored)
// ---------------------------------------------------------------------------

/// A particle path from a `t x y [z]` file; only the x–y projection is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Spatial dimensions of the source file (2 or 3).
    pub dims: usize,
    pub time: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Trajectory {
    pub fn from_table(table: &NumericTable, dims: usize) -> Self {
        let col = |i: usize| table.column(i).map(|c| c.to_vec()).unwrap_or_default();
        Self {
            dims,
            time: col(0),
            x: col(1),
            y: col(2),
        }
    }

    /// First and last point of the path, in file order.
    pub fn endpoints(&self) -> Option<((f64, f64), (f64, f64))> {
        let start = (*self.x.first()?, *self.y.first()?);
        let end = (*self.x.last()?, *self.y.last()?);
        Some((start, end))
    }

    fn name(&self) -> String {
        format!("{}D Particle", self.dims)
    }

    fn z_note(&self) -> &'static str {
        if self.dims > 2 { " (Z component ignored)" } else { "" }
    }

    fn position_charts(&self) -> [ChartSpec; 2] {
        let axis = |label: &str, values: &[f64], color: RGBColor| {
            let mut spec = ChartSpec::new(
                format!("{}: {label} Position vs Time{}", self.name(), self.z_note()),
                "Time (s)",
                format!("{label} Position"),
            );
            let points = self.time.iter().copied().zip(values.iter().copied()).collect();
            spec.series
                .push(Series::line(format!("{label} Position"), points, color));
            spec
        };
        [axis("X", &self.x, RED), axis("Y", &self.y, BLUE)]
    }

    /// Both coordinates against time on a single panel.
    fn combined_position_chart(&self) -> ChartSpec {
        let mut spec = ChartSpec::new(
            format!("{}: Position vs Time{}", self.name(), self.z_note()),
            "Time (s)",
            "Position",
        );
        let over_time = |values: &[f64]| -> Vec<(f64, f64)> {
            self.time.iter().copied().zip(values.iter().copied()).collect()
        };
        spec.series.push(Series::line("X position", over_time(&self.x), RED));
        spec.series.push(Series::line("Y position", over_time(&self.y), BLUE));
        spec
    }

    pub fn xy_chart(&self) -> ChartSpec {
        let mut spec = ChartSpec::new(
            format!("{} Trajectory in X-Y Plane{}", self.name(), self.z_note()),
            "X Position",
            "Y Position",
        );
        spec.equal_aspect = true;
        let color = if self.dims > 2 { RED } else { BLUE };
        let points = self.x.iter().copied().zip(self.y.iter().copied()).collect();
        spec.series
            .push(Series::line(format!("{} Trajectory", self.name()), points, color));

        if let Some((start, end)) = self.endpoints() {
            spec.markers.push(Marker {
                label: "Start".into(),
                point: start,
                color: GREEN,
            });
            spec.markers.push(Marker {
                label: "End".into(),
                point: end,
                color: RED,
            });
        }
        spec
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Render the position and x–y path charts for both trajectory files.
pub fn run(file_2d: &Path, file_3d: &Path, out_dir: &Path) -> Result<()> {
    ensure_dir(out_dir)?;

    let read = |path: &Path, dims: usize| -> Result<Trajectory> {
        let table = load(path, InputPolicy::Required, |p| read_numeric_table(p, dims + 1))?
            .with_context(|| format!("{} was not loaded", path.display()))?;
        println!(
            "{}: {} samples, {} columns",
            path.display(),
            table.n_rows(),
            table.n_columns()
        );
        Ok(Trajectory::from_table(&table, dims))
    };
    let t2 = read(file_2d, 2).context("run the trajectory simulator first")?;
    let t3 = read(file_3d, 3).context("run the trajectory simulator first")?;

    for (traj, tag) in [(&t2, "2d"), (&t3, "3d")] {
        let [x_chart, y_chart] = traj.position_charts();
        save_png(
            &out_dir.join(format!("position_vs_time_{tag}.png")),
            GRID_SIZE,
            |area| {
                let panels = area.split_evenly((2, 1));
                draw_chart(&panels[0], &x_chart)?;
                draw_chart(&panels[1], &y_chart)
            },
        )?;
    }

    for (traj, tag) in [(&t2, "2d"), (&t3, "3d")] {
        let spec = traj.xy_chart();
        save_png(
            &out_dir.join(format!("trajectory_{tag}_xy.png")),
            CHART_SIZE,
            |area| draw_chart(area, &spec),
        )?;
    }

    let overview = [
        t2.combined_position_chart(),
        t3.combined_position_chart(),
        t2.xy_chart(),
        t3.xy_chart(),
    ];
    save_png(&out_dir.join("complete_analysis.png"), GRID_SIZE, |area| {
        draw_grid(area, "Particle Trajectory Analysis", 2, &overview)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_points() -> Trajectory {
        let table = NumericTable {
            columns: vec![
                vec![0.0, 1.0, 2.0],
                vec![0.0, 1.5, 3.0],
                vec![5.0, 4.0, 2.5],
            ],
        };
        Trajectory::from_table(&table, 2)
    }

    #[test]
    fn test_endpoints_are_first_and_last() {
        let t = three_points();
        assert_eq!(t.endpoints(), Some(((0.0, 5.0), (3.0, 2.5))));
    }

    #[test]
    fn test_xy_chart_marks_start_and_end() {
        let spec = three_points().xy_chart();
        assert!(spec.equal_aspect);
        assert_eq!(spec.markers.len(), 2);
        assert_eq!(spec.markers[0].label, "Start");
        assert_eq!(spec.markers[0].point, (0.0, 5.0));
        assert_eq!(spec.markers[1].label, "End");
        assert_eq!(spec.markers[1].point, (3.0, 2.5));
    }

    #[test]
    fn test_z_column_is_ignored() {
        let table = NumericTable {
            columns: vec![vec![0.0, 1.0], vec![1.0, 2.0], vec![3.0, 4.0], vec![9.0, 9.0]],
        };
        let t = Trajectory::from_table(&table, 3);
        assert_eq!(t.y, vec![3.0, 4.0]);
        assert!(t.xy_chart().title.contains("Z component ignored"));
        let [x_chart, _] = t.position_charts();
        assert_eq!(x_chart.series[0].points, vec![(0.0, 1.0), (1.0, 2.0)]);
    }

    #[test]
    fn test_missing_input_is_required() {
        let dir = std::env::temp_dir().join("statplot-trajectory-missing");
        let err = run(&dir.join("traject_2d.txt"), &dir.join("traject_3d.txt"), &dir).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }
}
