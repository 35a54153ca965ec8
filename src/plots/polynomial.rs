use std::path::Path;

use anyhow::{Context, Result};

use super::{CHART_SIZE, ChartSpec, Series, draw_chart, ensure_dir, save_png, save_svg};
use crate::color::ColorMap;
use crate::data::loader::{InputPolicy, load, read_numeric_table};
use crate::data::model::NumericTable;

/// Column 0 is x; column k holds the (k-1)-th derivative of P.
pub fn chart(table: &NumericTable) -> ChartSpec {
    let mut spec = ChartSpec::new("Polynomial and Derivatives", "x", "Value");
    let Some(x) = table.column(0) else {
        return spec;
    };

    let labels: Vec<String> = (1..table.n_columns())
        .map(|k| format!("P^{}(x)", k - 1))
        .collect();
    let colors = ColorMap::new(&labels);

    for (k, label) in labels.iter().enumerate() {
        let Some(values) = table.column(k + 1) else {
            continue;
        };
        let points = x.iter().copied().zip(values.iter().copied()).collect();
        spec.series
            .push(Series::line(label.clone(), points, colors.color_for(label)));
    }
    spec
}

/// Plot the polynomial evaluation table as PNG plus an SVG vector copy.
pub fn run(input: &Path, out_dir: &Path) -> Result<()> {
    let table = load(input, InputPolicy::Required, |p| read_numeric_table(p, 2))?
        .with_context(|| format!("{} was not loaded", input.display()))?;
    log::info!(
        "{}: {} points, {} derivative columns",
        input.display(),
        table.n_rows(),
        table.n_columns() - 1
    );

    ensure_dir(out_dir)?;
    let spec = chart(&table);
    save_png(&out_dir.join("polynomial_plot.png"), CHART_SIZE, |area| {
        draw_chart(area, &spec)
    })?;
    save_svg(&out_dir.join("polynomial_plot.svg"), CHART_SIZE, |area| {
        draw_chart(area, &spec)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_series_per_derivative() {
        let table = NumericTable {
            columns: vec![
                vec![-1.0, 0.0, 1.0],
                vec![1.0, 0.0, 1.0],
                vec![-2.0, 0.0, 2.0],
                vec![2.0, 2.0, 2.0],
            ],
        };
        let spec = chart(&table);
        let labels: Vec<_> = spec.series.iter().filter_map(|s| s.label.clone()).collect();
        assert_eq!(labels, vec!["P^0(x)", "P^1(x)", "P^2(x)"]);
        assert_eq!(spec.series[1].points[2], (1.0, 2.0));
        assert_ne!(spec.series[0].color, spec.series[1].color);
    }
}
