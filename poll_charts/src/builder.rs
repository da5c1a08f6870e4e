pub use crate::config::*;

/// Turns selected rows and aggregated points into chart descriptions.
///
/// The builder only decides the layout and the labels. Drawing is left to the
/// renderer that consumes the [`ChartSpec`].
///
/// ```
/// use poll_charts::builder::ChartSpecBuilder;
/// use poll_charts::{ChartKind, DisplayNames, TrendQuery};
///
/// let builder = ChartSpecBuilder::new(&DisplayNames::DEFAULT);
/// let spec = builder.build_trend(&[], &TrendQuery::default());
///
/// assert_eq!(spec.y_axis.title, "% favorability");
/// assert_eq!(spec.kind, ChartKind::Scatter(vec![]));
/// ```
pub struct ChartSpecBuilder<'a> {
    names: &'a DisplayNames,
}

impl<'a> ChartSpecBuilder<'a> {
    pub fn new(names: &'a DisplayNames) -> ChartSpecBuilder<'a> {
        ChartSpecBuilder { names }
    }

    /// The stacked bar chart of a question.
    ///
    /// `xtab1_var` is the requested crosstab variable, used as the title of
    /// the vertical axis.
    pub fn build_detail(&self, plan: &PanelPlan, xtab1_var: &str, question_text: &str) -> ChartSpec {
        let kind = match plan {
            PanelPlan::SinglePanel(selection) => ChartKind::Bar(bar_panel(None, selection)),
            PanelPlan::MultiPanel(groups) => ChartKind::Subplots {
                panels: groups
                    .iter()
                    .map(|g| bar_panel(Some(g.crosstab_var.clone()), &g.rows))
                    .collect(),
                shared_x: true,
            },
        };
        ChartSpec {
            title: Some(question_text.to_string()),
            kind,
            x_axis: Axis {
                field: Field::PercentNorm,
                title: self.names.label(Field::Pct).to_string(),
                tick_format: TickFormat::Percent,
            },
            y_axis: Axis {
                field: Field::Xtab1Val,
                title: xtab1_var.to_string(),
                tick_format: TickFormat::Plain,
            },
            encoding: Encoding {
                color: Some(Field::Response),
                size: None,
                text: None,
                hover: vec![Field::QuestionTextWrap],
            },
            labels: self.names.labels(),
            warnings: Vec::new(),
        }
    }

    /// The favorability bubble chart.
    ///
    /// When the query splits by crosstab value, the points are colored by
    /// value and the legend is titled with the crosstab variable.
    pub fn build_trend(&self, points: &[TrendPoint], query: &TrendQuery) -> ChartSpec {
        let split = query.split_by_value();
        let mut labels = self.names.labels();
        if split {
            labels.retain(|(f, _)| *f != Field::Xtab1Val);
            labels.push((Field::Xtab1Val, query.xtab1_var.clone()));
        }
        let scatter: Vec<ScatterPoint> = points
            .iter()
            .map(|p| ScatterPoint {
                date: p.date,
                pct_fav: p.pct_fav,
                sample_size: p.sample_size,
                text: p.pollster_wrap.clone(),
                hover: p.question_text_wrap.clone(),
                color: if split { p.xtab1_val.clone() } else { None },
            })
            .collect();
        ChartSpec {
            title: None,
            kind: ChartKind::Scatter(scatter),
            x_axis: Axis {
                field: Field::Date,
                title: self.names.label(Field::Date).to_string(),
                tick_format: TickFormat::Plain,
            },
            y_axis: Axis {
                field: Field::PctFav,
                title: self.names.label(Field::PctFav).to_string(),
                tick_format: TickFormat::Plain,
            },
            encoding: Encoding {
                color: if split { Some(Field::Xtab1Val) } else { None },
                size: Some(Field::SampleSize),
                text: Some(Field::PollsterWrap),
                hover: vec![Field::QuestionTextWrap],
            },
            labels,
            warnings: Vec::new(),
        }
    }
}

fn bar_panel(title: Option<String>, selection: &Selection) -> BarPanel {
    BarPanel {
        title,
        bars: selection
            .rows
            .iter()
            .map(|d| Bar {
                category: d.row.xtab1_val.clone(),
                value: d.percent_norm,
                series: d.row.response.clone(),
                hover: d.question_text_wrap.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{crosstab_table, response};
    use crate::{aggregate_favorability, select_responses};
    use chrono::NaiveDate;

    #[test]
    fn single_panel_bars() {
        let table = crosstab_table();
        let sel = select_responses(&table, "P1", "Q1", "Gender", &ViewOptions::DEFAULT);
        let spec = ChartSpecBuilder::new(&DisplayNames::DEFAULT).build_detail(
            &PanelPlan::SinglePanel(sel),
            "Gender",
            "Text of Q1",
        );
        assert_eq!(spec.title, Some("Text of Q1".to_string()));
        assert_eq!(spec.x_axis.title, "Percentage");
        assert_eq!(spec.x_axis.tick_format, TickFormat::Percent);
        assert_eq!(spec.y_axis.title, "Gender");
        assert_eq!(spec.encoding.color, Some(Field::Response));
        match spec.kind {
            ChartKind::Bar(panel) => {
                assert_eq!(panel.bars.len(), 4);
                assert_eq!(panel.bars[0].category, "Male");
                assert_eq!(panel.bars[0].series, "Approve");
                assert!((panel.bars[0].value - 0.4 / 0.9).abs() < 1e-9);
            }
            k => panic!("unexpected chart {:?}", k),
        }
    }

    #[test]
    fn trend_labels_follow_the_split() {
        let mut rows = crosstab_table().rows().to_vec();
        let mut later = response("P2", "Q1", ("Gender", "Male"), "Approve", 0.3);
        later.date = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        rows.push(later);
        let table = Table::new(rows).unwrap();
        let query = TrendQuery {
            xtab1_var: "Gender".to_string(),
            ..TrendQuery::default()
        };
        let points = aggregate_favorability(&table, &query, &ViewOptions::DEFAULT);
        let spec = ChartSpecBuilder::new(&DisplayNames::DEFAULT).build_trend(&points, &query);
        assert_eq!(spec.encoding.color, Some(Field::Xtab1Val));
        assert_eq!(spec.label(Field::Xtab1Val), "Gender");
        assert_eq!(spec.label(Field::PollsterWrap), "Pollster");
        assert_eq!(spec.x_axis.title, "Date");
        match spec.kind {
            ChartKind::Scatter(points) => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0].color, Some("Female".to_string()));
                assert_eq!(points[0].sample_size, 1000);
                assert_eq!(points[0].text, "YouGov");
            }
            k => panic!("unexpected chart {:?}", k),
        }

        let spec = ChartSpecBuilder::new(&DisplayNames::DEFAULT)
            .build_trend(&points, &TrendQuery::default());
        assert_eq!(spec.encoding.color, None);
        assert_eq!(spec.label(Field::Xtab1Val), "Cross-tab value 1");
    }
}
