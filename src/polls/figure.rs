// Conversion of chart descriptions into plotly figures.

use std::collections::HashSet;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::polls::*;

/// The largest bubble of a trend chart, in pixels.
const MAX_BUBBLE_SIZE: f64 = 40.0;

/// Vertical space between two subplots, shared among all of them.
const SUBPLOT_SPACING: f64 = 0.3;

/// Renders a chart description as a plotly figure (`data` and `layout`).
pub fn chart_to_plotly(spec: &ChartSpec) -> JSValue {
    let (data, layout) = match &spec.kind {
        ChartKind::Bar(panel) => (
            bar_traces(panel, "x", "y", &mut HashSet::new()),
            bar_layout(spec),
        ),
        ChartKind::Subplots { panels, shared_x } => subplots(spec, panels, *shared_x),
        ChartKind::Scatter(points) => (scatter_traces(spec, points), scatter_layout(spec)),
    };
    json!({
        "data": data,
        "layout": layout,
    })
}

/// The presentation settings common to all the figures.
pub fn format_figure(figure: JSValue) -> JSValue {
    let mut figure = figure;
    if let Some(layout) = figure.get_mut("layout").and_then(|l| l.as_object_mut()) {
        layout.insert("template".to_string(), json!("plotly_white"));
        layout.insert(
            "font".to_string(),
            json!({
                "family": "Roboto",
                "color": "black",
            }),
        );
        layout.insert("height".to_string(), json!(600));
        layout.insert("width".to_string(), json!(800));
    }
    figure
}

fn axis_ref(prefix: &str, idx: usize) -> String {
    if idx == 0 {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, idx + 1)
    }
}

fn axis_key(prefix: &str, idx: usize) -> String {
    format!("{}axis{}", prefix, if idx == 0 { String::new() } else { (idx + 1).to_string() })
}

fn axis_json(axis: &Axis) -> JSMap<String, JSValue> {
    let mut m = JSMap::new();
    m.insert("title".to_string(), json!({ "text": axis.title }));
    if axis.tick_format == TickFormat::Percent {
        m.insert("tickformat".to_string(), json!(".0%"));
    }
    m
}

fn legend_json(spec: &ChartSpec) -> Option<JSValue> {
    spec.encoding
        .color
        .map(|f| json!({ "title": { "text": spec.label(f) } }))
}

// ********* Bar charts *********

/// One trace per response option, stacked along the horizontal axis.
///
/// A response option is listed in the legend by its first trace only.
/// `in_legend` holds the options already listed by previous panels.
fn bar_traces(
    panel: &BarPanel,
    xaxis: &str,
    yaxis: &str,
    in_legend: &mut HashSet<String>,
) -> Vec<JSValue> {
    distinct(panel.bars.iter().map(|b| b.series.as_str()))
        .into_iter()
        .map(|series| {
            let bars: Vec<&Bar> = panel.bars.iter().filter(|b| b.series == series).collect();
            let showlegend = in_legend.insert(series.clone());
            json!({
                "type": "bar",
                "orientation": "h",
                "name": series,
                "legendgroup": series,
                "showlegend": showlegend,
                "x": bars.iter().map(|b| b.value).collect::<Vec<f64>>(),
                "y": bars.iter().map(|b| b.category.clone()).collect::<Vec<String>>(),
                "hovertext": bars.iter().map(|b| b.hover.clone()).collect::<Vec<String>>(),
                "xaxis": xaxis,
                "yaxis": yaxis,
            })
        })
        .collect()
}

fn bar_layout(spec: &ChartSpec) -> JSValue {
    let mut layout = JSMap::new();
    if let Some(title) = &spec.title {
        layout.insert("title".to_string(), json!({ "text": title }));
    }
    layout.insert("barmode".to_string(), json!("stack"));
    layout.insert("xaxis".to_string(), JSValue::Object(axis_json(&spec.x_axis)));
    layout.insert("yaxis".to_string(), JSValue::Object(axis_json(&spec.y_axis)));
    if let Some(legend) = legend_json(spec) {
        layout.insert("legend".to_string(), legend);
    }
    JSValue::Object(layout)
}

/// The panels are stacked from top to bottom. With a shared horizontal axis,
/// the axis is drawn under the last panel.
fn subplots(spec: &ChartSpec, panels: &[BarPanel], shared_x: bool) -> (Vec<JSValue>, JSValue) {
    let n = panels.len().max(1);
    let gap = SUBPLOT_SPACING / n as f64;
    let height = (1.0 - gap * (n - 1) as f64) / n as f64;

    let mut data: Vec<JSValue> = Vec::new();
    let mut in_legend: HashSet<String> = HashSet::new();
    let mut annotations: Vec<JSValue> = Vec::new();
    let mut layout = match bar_layout(spec) {
        JSValue::Object(m) => m,
        _ => JSMap::new(),
    };
    for (idx, panel) in panels.iter().enumerate() {
        let top = 1.0 - idx as f64 * (height + gap);
        let bottom = (top - height).max(0.0);
        let xref = if shared_x {
            axis_ref("x", 0)
        } else {
            axis_ref("x", idx)
        };
        let yref = axis_ref("y", idx);
        data.extend(bar_traces(panel, &xref, &yref, &mut in_legend));

        let mut yaxis = axis_json(&spec.y_axis);
        yaxis.insert("domain".to_string(), json!([bottom, top]));
        yaxis.insert("anchor".to_string(), json!(xref));
        layout.insert(axis_key("y", idx), JSValue::Object(yaxis));

        if !shared_x {
            let mut xaxis = axis_json(&spec.x_axis);
            xaxis.insert("anchor".to_string(), json!(yref));
            if idx > 0 {
                xaxis.insert("matches".to_string(), json!("x"));
            }
            layout.insert(axis_key("x", idx), JSValue::Object(xaxis));
        }

        if let Some(title) = &panel.title {
            annotations.push(json!({
                "text": title,
                "xref": "paper",
                "yref": "paper",
                "x": 0.5,
                "y": top,
                "xanchor": "center",
                "yanchor": "bottom",
                "showarrow": false,
            }));
        }
    }
    if shared_x {
        let mut xaxis = axis_json(&spec.x_axis);
        xaxis.insert("anchor".to_string(), json!(axis_ref("y", n - 1)));
        layout.insert("xaxis".to_string(), JSValue::Object(xaxis));
    }
    layout.insert("annotations".to_string(), JSValue::Array(annotations));
    (data, JSValue::Object(layout))
}

// ********* Trend charts *********

/// One trace per color. Without a color channel, all the points share a
/// single trace.
fn scatter_traces(spec: &ChartSpec, points: &[ScatterPoint]) -> Vec<JSValue> {
    let max_size = points.iter().map(|p| p.sample_size).max().unwrap_or(0);
    let sizeref = if max_size > 0 {
        2.0 * max_size as f64 / (MAX_BUBBLE_SIZE * MAX_BUBBLE_SIZE)
    } else {
        1.0
    };
    let hovertemplate = format!(
        "%{{customdata}}<br>{}: %{{x}}<br>{}: %{{y}}<br>{}: %{{marker.size}}<extra></extra>",
        spec.label(spec.x_axis.field),
        spec.label(spec.y_axis.field),
        spec.label(Field::SampleSize),
    );
    let colors: Vec<Option<String>> = if spec.encoding.color.is_some() {
        distinct(points.iter().filter_map(|p| p.color.as_deref()))
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None]
    };

    colors
        .into_iter()
        .filter_map(|color| {
            let group: Vec<&ScatterPoint> = points
                .iter()
                .filter(|p| color.is_none() || p.color == color)
                .collect();
            if group.is_empty() {
                return None;
            }
            let mut trace = JSMap::new();
            trace.insert("type".to_string(), json!("scatter"));
            trace.insert("mode".to_string(), json!("markers+text"));
            if let Some(c) = &color {
                trace.insert("name".to_string(), json!(c));
            }
            trace.insert("showlegend".to_string(), json!(color.is_some()));
            trace.insert(
                "x".to_string(),
                json!(group
                    .iter()
                    .map(|p| p.date.format("%Y-%m-%d").to_string())
                    .collect::<Vec<String>>()),
            );
            trace.insert(
                "y".to_string(),
                json!(group.iter().map(|p| p.pct_fav).collect::<Vec<f64>>()),
            );
            trace.insert(
                "text".to_string(),
                json!(group.iter().map(|p| p.text.clone()).collect::<Vec<String>>()),
            );
            trace.insert("textposition".to_string(), json!("top center"));
            trace.insert(
                "customdata".to_string(),
                json!(group.iter().map(|p| p.hover.clone()).collect::<Vec<String>>()),
            );
            trace.insert("hovertemplate".to_string(), json!(hovertemplate));
            trace.insert(
                "marker".to_string(),
                json!({
                    "size": group.iter().map(|p| p.sample_size).collect::<Vec<u64>>(),
                    "sizemode": "area",
                    "sizeref": sizeref,
                    "sizemin": 4,
                }),
            );
            Some(JSValue::Object(trace))
        })
        .collect()
}

fn scatter_layout(spec: &ChartSpec) -> JSValue {
    let mut layout = JSMap::new();
    if let Some(title) = &spec.title {
        layout.insert("title".to_string(), json!({ "text": title }));
    }
    layout.insert("xaxis".to_string(), JSValue::Object(axis_json(&spec.x_axis)));
    layout.insert("yaxis".to_string(), JSValue::Object(axis_json(&spec.y_axis)));
    if let Some(legend) = legend_json(spec) {
        layout.insert("legend".to_string(), legend);
    }
    JSValue::Object(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(category: &str, series: &str, value: f64) -> Bar {
        Bar {
            category: category.to_string(),
            value,
            series: series.to_string(),
            hover: "Q".to_string(),
        }
    }

    fn bar_spec(kind: ChartKind) -> ChartSpec {
        ChartSpec {
            title: Some("Q".to_string()),
            kind,
            x_axis: Axis {
                field: Field::PercentNorm,
                title: "Percentage".to_string(),
                tick_format: TickFormat::Percent,
            },
            y_axis: Axis {
                field: Field::Xtab1Val,
                title: "-".to_string(),
                tick_format: TickFormat::Plain,
            },
            encoding: Encoding {
                color: Some(Field::Response),
                ..Encoding::default()
            },
            labels: DisplayNames::DEFAULT.labels(),
            warnings: vec![],
        }
    }

    fn panel(title: &str) -> BarPanel {
        BarPanel {
            title: Some(title.to_string()),
            bars: vec![bar("a", "Yes", 0.5), bar("a", "No", 0.5)],
        }
    }

    #[test]
    fn stacked_bars() {
        let spec = bar_spec(ChartKind::Bar(BarPanel {
            title: None,
            bars: vec![
                bar("Male", "Yes", 0.4),
                bar("Male", "No", 0.6),
                bar("Female", "Yes", 0.7),
                bar("Female", "No", 0.3),
            ],
        }));
        let fig = chart_to_plotly(&spec);
        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0]["name"], "Yes");
        assert_eq!(traces[0]["x"], json!([0.4, 0.7]));
        assert_eq!(traces[0]["y"], json!(["Male", "Female"]));
        assert_eq!(fig["layout"]["barmode"], "stack");
        assert_eq!(fig["layout"]["xaxis"]["tickformat"], ".0%");
        assert_eq!(fig["layout"]["legend"]["title"]["text"], "Response");
    }

    #[test]
    fn subplots_are_stacked_vertically() {
        let spec = bar_spec(ChartKind::Subplots {
            panels: vec![panel("Gender"), panel("Age"), panel("Region")],
            shared_x: true,
        });
        let fig = chart_to_plotly(&spec);
        let layout = &fig["layout"];
        let top = layout["yaxis"]["domain"][1].as_f64().unwrap();
        let bottom = layout["yaxis3"]["domain"][0].as_f64().unwrap();
        assert!((top - 1.0).abs() < 1e-9);
        assert!(bottom.abs() < 1e-9);
        assert!(
            layout["yaxis"]["domain"][0].as_f64().unwrap()
                > layout["yaxis2"]["domain"][1].as_f64().unwrap()
        );
        assert_eq!(layout["xaxis"]["anchor"], "y3");
        let legends: Vec<bool> = fig["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["showlegend"].as_bool().unwrap())
            .collect();
        assert_eq!(legends, vec![true, true, false, false, false, false]);
    }

    #[test]
    fn later_panels_add_their_own_legend_entries() {
        let mut age = panel("Age");
        age.bars = vec![bar("18-34", "Yes", 0.6), bar("18-34", "Unsure", 0.4)];
        let spec = bar_spec(ChartKind::Subplots {
            panels: vec![panel("Gender"), age],
            shared_x: true,
        });
        let fig = chart_to_plotly(&spec);
        let in_legend: Vec<&str> = fig["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|t| t["showlegend"].as_bool().unwrap())
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(in_legend, vec!["Yes", "No", "Unsure"]);
    }

    #[test]
    fn subplots_without_shared_axis() {
        let spec = bar_spec(ChartKind::Subplots {
            panels: vec![panel("Gender"), panel("Age")],
            shared_x: false,
        });
        let fig = chart_to_plotly(&spec);
        assert_eq!(fig["layout"]["xaxis2"]["anchor"], "y2");
        assert_eq!(fig["data"][2]["xaxis"], "x2");
    }

    #[test]
    fn bubbles_are_sized_by_sample() {
        let point = |size: u64, color: &str| ScatterPoint {
            date: NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
            pct_fav: 0.1,
            sample_size: size,
            text: "YouGov".to_string(),
            hover: "Q".to_string(),
            color: Some(color.to_string()),
        };
        let mut spec = bar_spec(ChartKind::Scatter(vec![
            point(800, "Male"),
            point(1600, "Female"),
        ]));
        spec.encoding.color = Some(Field::Xtab1Val);
        let fig = chart_to_plotly(&spec);
        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[1]["name"], "Female");
        assert_eq!(traces[0]["x"], json!(["2021-05-01"]));
        assert_eq!(traces[0]["marker"]["sizeref"], json!(2.0 * 1600.0 / 1600.0));

        spec.encoding.color = None;
        let fig = chart_to_plotly(&spec);
        assert_eq!(fig["data"].as_array().unwrap().len(), 1);
        assert_eq!(fig["data"][0]["showlegend"], false);
    }

    #[test]
    fn presentation_settings() {
        let fig = format_figure(json!({ "data": [], "layout": {} }));
        assert_eq!(fig["layout"]["template"], "plotly_white");
        assert_eq!(fig["layout"]["font"]["family"], "Roboto");
        assert_eq!(fig["layout"]["width"], 800);
    }
}
