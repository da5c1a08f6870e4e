mod config;
pub mod builder;
pub mod manual;
pub mod wrap;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

pub use crate::builder::ChartSpecBuilder;
pub use crate::config::*;

/// Distinct values, in order of first appearance.
///
/// ```
/// assert_eq!(poll_charts::distinct(["Q1", "Q2", "Q1"].into_iter()), vec!["Q1", "Q2"]);
/// ```
pub fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for v in values {
        if seen.insert(v) {
            res.push(v.to_string());
        }
    }
    res
}

/// Finds the question to display for a poll.
///
/// If a question is given, it must belong to the poll. Otherwise the poll must
/// have exactly one question.
pub fn resolve_question(
    table: &Table,
    poll_id: &str,
    question_id: Option<&str>,
) -> Result<String, PollError> {
    let candidates = distinct(table.poll_rows(poll_id).map(|r| r.question_id.as_str()));
    debug!(
        "resolve_question: poll {:?}: candidates {:?}, requested {:?}",
        poll_id, candidates, question_id
    );
    if candidates.is_empty() {
        return Err(PollError::UnknownPoll {
            poll_id: poll_id.to_string(),
        });
    }
    match question_id {
        Some(qid) if candidates.iter().any(|c| c == qid) => Ok(qid.to_string()),
        Some(qid) => Err(PollError::UnknownQuestion {
            poll_id: poll_id.to_string(),
            question_id: qid.to_string(),
        }),
        None if candidates.len() == 1 => Ok(candidates[0].clone()),
        None => Err(PollError::AmbiguousQuestion {
            poll_id: poll_id.to_string(),
            candidates,
        }),
    }
}

/// Computes the derived columns for a set of rows.
///
/// The normalized share of a row is relative to the rows of the same bar,
/// that is the rows that share both crosstab variables and values.
fn derive_rows<'a>(rows: &[&'a ResponseRow], options: &ViewOptions) -> Selection<'a> {
    let mut bar_totals: HashMap<(&str, &str, &str, &str), f64> = HashMap::new();
    for r in rows.iter() {
        *bar_totals
            .entry((
                r.xtab1_var.as_str(),
                r.xtab1_val.as_str(),
                r.xtab2_var.as_str(),
                r.xtab2_val.as_str(),
            ))
            .or_insert(0.0) += r.pct;
    }
    let derived: Vec<DerivedRow<'a>> = rows
        .iter()
        .map(|r| {
            let total = bar_totals
                .get(&(
                    r.xtab1_var.as_str(),
                    r.xtab1_val.as_str(),
                    r.xtab2_var.as_str(),
                    r.xtab2_val.as_str(),
                ))
                .copied()
                .unwrap_or(0.0);
            DerivedRow {
                row: *r,
                question_text_wrap: options
                    .wrapper
                    .wrap(&r.question_text, options.widths.question),
                pollster_wrap: options.wrapper.wrap(&r.pollster, options.widths.pollster),
                pct_fav: r.pct_fav(),
                percent_norm: if total > 0.0 { r.pct / total } else { 0.0 },
            }
        })
        .collect();
    Selection { rows: derived }
}

/// Selects the rows of a question for one crosstab variable.
///
/// The crosstab variable is matched literally: [`NO_CROSSTAB`] selects the
/// rows without a breakdown.
pub fn select_responses<'a>(
    table: &'a Table,
    poll_id: &str,
    question_id: &str,
    xtab1_var: &str,
    options: &ViewOptions,
) -> Selection<'a> {
    let rows: Vec<&ResponseRow> = table
        .rows()
        .iter()
        .filter(|r| r.poll_id == poll_id && r.question_id == question_id && r.xtab1_var == xtab1_var)
        .collect();
    debug!(
        "select_responses: poll {:?} question {:?} xtab1_var {:?}: {} rows",
        poll_id,
        question_id,
        xtab1_var,
        rows.len()
    );
    derive_rows(&rows, options)
}

/// Decides between one chart and one subplot per crosstab variable.
///
/// `question_rows` are all the rows of the question, whatever their crosstab.
/// Subplots are only used for the view without breakdown, when the question
/// has at least two crosstab variables.
pub fn plan_panels<'a>(
    question_rows: &[&'a ResponseRow],
    selection: Selection<'a>,
    xtab1_var: &str,
    options: &ViewOptions,
) -> PanelPlan<'a> {
    let crosstab_vars: Vec<String> = distinct(question_rows.iter().map(|r| r.xtab1_var.as_str()))
        .into_iter()
        .filter(|v| v != NO_CROSSTAB)
        .collect();
    let unconditioned = xtab1_var == NO_CROSSTAB;
    let has_multiple_crosstabs = crosstab_vars.len() > 1;
    debug!(
        "plan_panels: unconditioned: {} crosstab variables: {:?}",
        unconditioned, crosstab_vars
    );
    if unconditioned && has_multiple_crosstabs {
        let groups: Vec<PanelGroup<'a>> = crosstab_vars
            .into_iter()
            .map(|var| {
                let rows: Vec<&'a ResponseRow> = question_rows
                    .iter()
                    .filter(|r| r.xtab1_var == var)
                    .copied()
                    .collect();
                PanelGroup {
                    rows: derive_rows(&rows, options),
                    crosstab_var: var,
                }
            })
            .collect();
        PanelPlan::MultiPanel(groups)
    } else {
        PanelPlan::SinglePanel(selection)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, PartialOrd, Ord)]
struct TrendKey {
    poll_id: String,
    question_id: String,
    question_text_wrap: String,
    date: NaiveDate,
    pollster_wrap: String,
    sample_size: u64,
    xtab1_val: Option<String>,
}

/// Sums the favorability of each question of each poll.
///
/// The rows are restricted to the crosstab variable of the query. When the
/// query splits by crosstab value, there is one point per value, otherwise
/// the rows are restricted to the requested value. The points are sorted by
/// poll, question, text, date, pollster, sample size and crosstab value.
pub fn aggregate_favorability(
    table: &Table,
    query: &TrendQuery,
    options: &ViewOptions,
) -> Vec<TrendPoint> {
    let split = query.split_by_value();
    let mut groups: BTreeMap<TrendKey, (f64, usize)> = BTreeMap::new();
    for r in table
        .rows()
        .iter()
        .filter(|r| r.xtab1_var == query.xtab1_var)
        .filter(|r| split || r.xtab1_val == query.xtab1_val)
    {
        let key = TrendKey {
            poll_id: r.poll_id.clone(),
            question_id: r.question_id.clone(),
            question_text_wrap: options
                .wrapper
                .wrap(&r.question_text, options.widths.question),
            date: r.date,
            pollster_wrap: options.wrapper.wrap(&r.pollster, options.widths.pollster),
            sample_size: r.sample_size,
            xtab1_val: if split {
                Some(r.xtab1_val.clone())
            } else {
                None
            },
        };
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += r.pct_fav();
        entry.1 += 1;
    }
    debug!("aggregate_favorability: {} groups", groups.len());

    groups
        .into_iter()
        .filter(|(k, _)| match &query.poll_ids {
            Some(ids) => ids.contains(&k.poll_id),
            None => true,
        })
        .filter(|(k, _)| match &query.question_ids {
            Some(ids) => ids.contains(&k.question_id),
            None => true,
        })
        .map(|(k, (pct_fav, row_count))| TrendPoint {
            poll_id: k.poll_id,
            question_id: k.question_id,
            question_text_wrap: k.question_text_wrap,
            date: k.date,
            pollster_wrap: k.pollster_wrap,
            sample_size: k.sample_size,
            xtab1_val: k.xtab1_val,
            pct_fav,
            row_count,
        })
        .collect()
}

/// Builds the bar chart of one question of one poll.
///
/// Errors:
/// * the poll is unknown, or the question is missing or not part of the poll
/// * a second crosstab variable was requested
///
/// An empty selection is not an error: the chart is returned empty, with a
/// warning attached.
pub fn detail_view(
    table: &Table,
    query: &DetailQuery,
    options: &ViewOptions,
) -> Result<ChartSpec, PollError> {
    info!("detail_view: {:?}", query);
    if query.crosstab_var_2 != NO_CROSSTAB {
        return Err(PollError::UnsupportedCrosstabCombination {
            crosstab_var_2: query.crosstab_var_2.clone(),
        });
    }
    let question_id = resolve_question(table, &query.poll_id, query.question_id.as_deref())?;
    let selection = select_responses(
        table,
        &query.poll_id,
        &question_id,
        &query.crosstab_var_1,
        options,
    );
    let question_rows: Vec<&ResponseRow> =
        table.question_rows(&query.poll_id, &question_id).collect();
    let plan = plan_panels(&question_rows, selection, &query.crosstab_var_1, options);
    if let PanelPlan::MultiPanel(groups) = &plan {
        info!("detail_view: {} panels", groups.len());
    }
    // A question without overall rows may still be drawn in panels.
    let title = plan.question_text();
    let mut warnings: Vec<ChartWarning> = Vec::new();
    if plan.is_empty() {
        warn!(
            "detail_view: no response for poll {} question {} crosstab {}",
            query.poll_id, question_id, query.crosstab_var_1
        );
        warnings.push(ChartWarning::EmptySelection {
            poll_id: Some(query.poll_id.clone()),
            question_id: Some(question_id.clone()),
            xtab1_var: query.crosstab_var_1.clone(),
        });
    }

    let mut spec = ChartSpecBuilder::new(options.display_names).build_detail(
        &plan,
        &query.crosstab_var_1,
        &title,
    );
    spec.warnings = warnings;
    Ok(spec)
}

/// Builds the favorability bubble chart across polls.
pub fn trend_view(
    table: &Table,
    query: &TrendQuery,
    options: &ViewOptions,
) -> Result<ChartSpec, PollError> {
    info!("trend_view: {:?}", query);
    let points = aggregate_favorability(table, query, options);
    info!("trend_view: {} points", points.len());
    let mut spec = ChartSpecBuilder::new(options.display_names).build_trend(&points, query);
    if points.is_empty() {
        warn!(
            "trend_view: no response for crosstab {} = {}",
            query.xtab1_var, query.xtab1_val
        );
        spec.warnings.push(ChartWarning::EmptySelection {
            poll_id: None,
            question_id: None,
            xtab1_var: query.xtab1_var.clone(),
        });
    }
    Ok(spec)
}
