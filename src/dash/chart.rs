use serde_json::json;
use serde_json::Value as JSValue;

use crate::dash::*;

pub const COUNT_AXIS_TITLE: &str = "Nombre de donneurs";

fn bar_trace(series: &Series, orientation: Orientation, color: &str) -> JSValue {
    let labels: Vec<String> = series
        .counts
        .iter()
        .map(|(c, _)| c.label().to_string())
        .collect();
    let counts: Vec<u64> = series.counts.iter().map(|(_, n)| *n).collect();
    let (x, y) = match orientation {
        Orientation::Vertical => (json!(labels), json!(counts)),
        Orientation::Horizontal => (json!(counts), json!(labels)),
    };
    json!({
        "type": "bar",
        "name": series.cohort,
        "x": x,
        "y": y,
        "orientation": orientation.as_str(),
        "marker": {"color": color}
    })
}

/// The grouped bar chart of a selection, in the Plotly figure schema.
pub fn build_figure_js(config: &DashConfig, report: &SelectionReport) -> JSValue {
    let (color_a, color_b) = config.colors();
    let agg = &report.aggregation;
    let (x_title, y_title) = match report.orientation {
        Orientation::Vertical => (agg.column.as_str(), COUNT_AXIS_TITLE),
        Orientation::Horizontal => (COUNT_AXIS_TITLE, agg.column.as_str()),
    };
    json!({
        "data": [
            bar_trace(&agg.series_a, report.orientation, &color_a),
            bar_trace(&agg.series_b, report.orientation, &color_b),
        ],
        "layout": {
            "title": {"text": format!("{}: top {}", report.selection.label, report.top_n)},
            "barmode": "group",
            "xaxis": {"title": {"text": x_title}},
            "yaxis": {"title": {"text": y_title}}
        }
    })
}

fn cohort_summary_js(total: usize, own_top: &Series) -> JSValue {
    let top: Vec<JSValue> = own_top
        .counts
        .iter()
        .map(|(c, n)| json!({"category": c.label(), "count": n}))
        .collect();
    json!({"label": own_top.cohort, "total": total, "top": top})
}

pub fn build_summary_js(config: &DashConfig, report: &SelectionReport) -> JSValue {
    json!({
        "title": config.title(),
        "column": report.selection.column,
        "label": report.selection.label,
        "cohorts": [
            cohort_summary_js(report.total_a, &report.own_top_a),
            cohort_summary_js(report.total_b, &report.own_top_b),
        ]
    })
}

/// The document written for a selection: the figure and its summary.
pub fn build_output_js(config: &DashConfig, report: &SelectionReport) -> JSValue {
    json!({
        "figure": build_figure_js(config, report),
        "summary": build_summary_js(config, report)
    })
}

/// The textual summary printed under the chart.
pub fn summary_text(config: &DashConfig, report: &SelectionReport) -> String {
    let mut lines: Vec<String> = vec![
        config.title(),
        format!("{} ({})", report.selection.label, report.selection.column),
        String::new(),
        "Résumé des profils".to_string(),
    ];
    for (total, own_top) in [
        (report.total_a, &report.own_top_a),
        (report.total_b, &report.own_top_b),
    ] {
        lines.push(format!("Nombre total ({}): {}", own_top.cohort, total));
    }
    lines.push(String::new());
    lines.push(format!("Top {} par catégorie", report.top_n));
    for own_top in [&report.own_top_a, &report.own_top_b] {
        lines.push(format!("### {}", own_top.cohort));
        let width = own_top
            .counts
            .iter()
            .map(|(c, _)| c.label().chars().count())
            .max()
            .unwrap_or(0);
        for (c, n) in own_top.counts.iter() {
            let label = c.label();
            let pad = width - label.chars().count();
            lines.push(format!("  {}{}  {}", label, " ".repeat(pad), n));
        }
    }
    lines.join("\n")
}
