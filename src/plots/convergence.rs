use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;

use super::{ChartSpec, GRID_SIZE, Guide, Orientation, Scale, Series, draw_grid, ensure_dir, save_png};
use crate::data::filter::group_by_function;
use crate::data::loader::{InputPolicy, load, read_convergence};
use crate::data::model::ConvergenceRow;

// ---------------------------------------------------------------------------
// Per-method iteration trace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodTrace {
    pub iterations: Vec<f64>,
    pub roots: Vec<f64>,
    pub residuals: Vec<f64>,
}

impl MethodTrace {
    fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ConvergenceRow>) -> Self {
        let mut trace = MethodTrace::default();
        for row in rows {
            trace.iterations.push(f64::from(row.iteration));
            trace.roots.push(row.root);
            trace.residuals.push(row.residual);
        }
        trace
    }

    /// Root reported at the last iteration; rows arrive in iteration order.
    pub fn final_root(&self) -> Option<f64> {
        self.roots.last().copied()
    }

    pub fn root_points(&self) -> Vec<(f64, f64)> {
        self.iterations.iter().copied().zip(self.roots.iter().copied()).collect()
    }

    /// Residual points drawable on a log axis (strictly positive only).
    pub fn residual_points(&self) -> Vec<(f64, f64)> {
        self.iterations
            .iter()
            .copied()
            .zip(self.residuals.iter().copied())
            .filter(|&(_, r)| r > 0.0)
            .collect()
    }
}

/// Newton and secant traces for one test function.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergencePanel {
    pub function: String,
    /// Floating-point type the root finder ran in, e.g. `double`.
    pub precision: String,
    pub newton: MethodTrace,
    pub secant: MethodTrace,
}

/// One panel per function, in the order functions first appear in the
/// Newton output.
pub fn panels(newton: &[ConvergenceRow], secant: &[ConvergenceRow]) -> Vec<ConvergencePanel> {
    group_by_function(newton)
        .into_iter()
        .map(|(function, rows)| {
            let secant_rows = secant.iter().filter(|r| r.function == function);
            let precision = rows.first().map(|r| r.precision.clone()).unwrap_or_default();
            ConvergencePanel {
                precision,
                newton: MethodTrace::from_rows(rows),
                secant: MethodTrace::from_rows(secant_rows),
                function,
            }
        })
        .collect()
}

const NEWTON: RGBColor = BLUE;
const SECANT: RGBColor = RED;

impl ConvergencePanel {
    pub fn root_chart(&self) -> ChartSpec {
        let mut spec = ChartSpec::new(self.function.clone(), "Iteration", "Root Value");
        for (name, trace, color) in [("Newton", &self.newton, NEWTON), ("Secant", &self.secant, SECANT)] {
            if trace.roots.is_empty() {
                continue;
            }
            spec.series
                .push(Series::line(name, trace.root_points(), color).with_markers());
            if let Some(root) = trace.final_root() {
                spec.guides.push(Guide {
                    label: None,
                    orientation: Orientation::Horizontal(root),
                    color,
                });
            }
        }
        spec
    }

    pub fn residual_chart(&self) -> ChartSpec {
        let mut spec = ChartSpec::new(
            format!("{} - Residual", self.function),
            "Iteration",
            "Residual (log scale)",
        );
        spec.y_scale = Scale::Log;
        for (name, trace, color) in [("Newton", &self.newton, NEWTON), ("Secant", &self.secant, SECANT)] {
            let points = trace.residual_points();
            if points.len() < trace.residuals.len() {
                log::debug!(
                    "{} ({name}): {} non-positive residuals left off the log plot",
                    self.function,
                    trace.residuals.len() - points.len()
                );
            }
            if !points.is_empty() {
                spec.series.push(Series::line(name, points, color).with_markers());
            }
        }
        spec
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub fn run(newton_path: &Path, secant_path: &Path, out_dir: &Path) -> Result<()> {
    let read = |path: &Path| -> Result<Vec<ConvergenceRow>> {
        load(path, InputPolicy::Required, read_convergence)?
            .with_context(|| format!("{} was not loaded", path.display()))
    };
    let newton = read(newton_path).context("run the root-finding visualizer first")?;
    let secant = read(secant_path).context("run the root-finding visualizer first")?;

    let panels = panels(&newton, &secant);
    for panel in &panels {
        let fmt = |root: Option<f64>| root.map_or("-".to_string(), |r| format!("{r:.10}"));
        println!(
            "{} ({}): Newton {} iterations, root {}; Secant {} iterations, root {}",
            panel.function,
            panel.precision,
            panel.newton.iterations.len(),
            fmt(panel.newton.final_root()),
            panel.secant.iterations.len(),
            fmt(panel.secant.final_root())
        );
    }
    ensure_dir(out_dir)?;

    let roots: Vec<ChartSpec> = panels.iter().map(|p| p.root_chart()).collect();
    save_png(&out_dir.join("root_convergence_plot.png"), GRID_SIZE, |area| {
        draw_grid(area, "Root Finding Convergence: Newton vs Secant Methods", 2, &roots)
    })?;

    let residuals: Vec<ChartSpec> = panels.iter().map(|p| p.residual_chart()).collect();
    save_png(&out_dir.join("residual_convergence_plot.png"), GRID_SIZE, |area| {
        draw_grid(area, "Residual Convergence: Newton vs Secant Methods", 2, &residuals)
    })
}
