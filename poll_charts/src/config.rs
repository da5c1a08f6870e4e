// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

use crate::wrap::{BreakWrapper, TextWrapper};

/// The value of a crosstab variable or crosstab value when no breakdown is
/// applied. The rows carrying it describe the overall population.
pub const NO_CROSSTAB: &str = "-";

/// Title displayed when a selection does not contain any row.
pub const NO_QUESTION_TEXT: &str = "No question text";

/// The polarity of a response option.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Favorability {
    Favorable,
    Unfavorable,
    Neutral,
}

impl Favorability {
    /// The sign applied to the response share when computing `pct_fav`.
    pub fn polarity(&self) -> f64 {
        match self {
            Favorability::Favorable => 1.0,
            Favorability::Unfavorable => -1.0,
            Favorability::Neutral => 0.0,
        }
    }

    /// Reads the tags found in the response sheets: signed numbers
    /// (`1`, `-1`, `0`), signs, or the plain words. An empty tag is neutral.
    pub fn parse(tag: &str) -> Option<Favorability> {
        let t = tag.trim().to_lowercase();
        match t.as_str() {
            "1" | "1.0" | "+" | "+1" | "favorable" | "favourable" | "positive" => {
                Some(Favorability::Favorable)
            }
            "-1" | "-1.0" | "-" | "unfavorable" | "unfavourable" | "negative" => {
                Some(Favorability::Unfavorable)
            }
            "" | "0" | "0.0" | "neutral" => Some(Favorability::Neutral),
            _ => None,
        }
    }
}

/// One row of the response table.
///
/// There is one row per poll, question, crosstab and response option.
#[derive(PartialEq, Debug, Clone)]
pub struct ResponseRow {
    pub poll_id: String,
    pub question_id: String,
    pub xtab1_var: String,
    pub xtab1_val: String,
    pub xtab2_var: String,
    pub xtab2_val: String,
    pub sample_size: u64,
    pub question_text: String,
    /// Share of the respondents, between 0 and 1.
    pub pct: f64,
    pub response: String,
    pub favorability: Favorability,
    pub date: NaiveDate,
    pub pollster: String,
    pub notes: Option<String>,
}

impl ResponseRow {
    /// The signed share of this response: positive when favorable, negative
    /// when unfavorable, zero otherwise.
    pub fn pct_fav(&self) -> f64 {
        self.pct * self.favorability.polarity()
    }
}

/// All the columns, stored or derived, that a chart can refer to.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Field {
    PollId,
    QuestionId,
    Xtab1Var,
    Xtab1Val,
    Xtab2Var,
    Xtab2Val,
    SampleSize,
    QuestionText,
    Pct,
    Response,
    Favorability,
    Date,
    Pollster,
    Notes,
    // Derived fields
    QuestionTextWrap,
    PollsterWrap,
    PctFav,
    PercentNorm,
}

impl Field {
    /// The columns that a response table must provide.
    pub const REQUIRED: [Field; 13] = [
        Field::PollId,
        Field::QuestionId,
        Field::Xtab1Var,
        Field::Xtab1Val,
        Field::Xtab2Var,
        Field::Xtab2Val,
        Field::SampleSize,
        Field::QuestionText,
        Field::Pct,
        Field::Response,
        Field::Favorability,
        Field::Date,
        Field::Pollster,
    ];

    /// The internal column name.
    pub fn name(&self) -> &'static str {
        match self {
            Field::PollId => "poll_id",
            Field::QuestionId => "question_id",
            Field::Xtab1Var => "xtab1_var",
            Field::Xtab1Val => "xtab1_val",
            Field::Xtab2Var => "xtab2_var",
            Field::Xtab2Val => "xtab2_val",
            Field::SampleSize => "sample_size",
            Field::QuestionText => "question_text",
            Field::Pct => "pct",
            Field::Response => "response",
            Field::Favorability => "favorability",
            Field::Date => "date",
            Field::Pollster => "pollster",
            Field::Notes => "notes",
            Field::QuestionTextWrap => "question_text_wrap",
            Field::PollsterWrap => "pollster_wrap",
            Field::PctFav => "pct_fav",
            Field::PercentNorm => "percent_norm",
        }
    }

    /// Finds a stored column from its internal name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::REQUIRED
            .iter()
            .chain([Field::Notes].iter())
            .find(|f| f.name() == name)
            .copied()
    }
}

/// The fixed mapping between column names and the labels shown to readers.
///
/// The stored columns map both ways. The derived columns only have a label:
/// some of them share it with a stored column ("Pollster").
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct DisplayNames {
    pub stored: &'static [(Field, &'static str)],
    pub derived: &'static [(Field, &'static str)],
}

impl DisplayNames {
    pub const DEFAULT: DisplayNames = DisplayNames {
        stored: &[
            (Field::PollId, "Poll ID"),
            (Field::QuestionId, "Question ID"),
            (Field::Xtab1Var, "Cross-tab variable 1"),
            (Field::Xtab1Val, "Cross-tab value 1"),
            (Field::Xtab2Var, "Cross-tab variable 2"),
            (Field::Xtab2Val, "Cross-tab value 2"),
            (Field::SampleSize, "Sample size"),
            (Field::QuestionText, "Question text"),
            (Field::Pct, "Percentage"),
            (Field::Response, "Response"),
            (Field::Favorability, "Favorability"),
            (Field::Date, "Date"),
            (Field::Pollster, "Pollster"),
            (Field::Notes, "Notes"),
        ],
        derived: &[
            (Field::QuestionTextWrap, "Question"),
            (Field::PollsterWrap, "Pollster"),
            (Field::PctFav, "% favorability"),
        ],
    };

    /// The label of a field, or its internal name if it has none.
    pub fn label(&self, field: Field) -> &'static str {
        self.stored
            .iter()
            .chain(self.derived.iter())
            .find(|(f, _)| *f == field)
            .map(|(_, l)| *l)
            .unwrap_or_else(|| field.name())
    }

    /// The stored column shown under the given label.
    pub fn field_for_label(&self, label: &str) -> Option<Field> {
        self.stored
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(f, _)| *f)
    }

    /// All the labels, as used for the axes, legends and hover texts.
    pub fn labels(&self) -> Vec<(Field, String)> {
        self.stored
            .iter()
            .chain(self.derived.iter())
            .map(|(f, l)| (*f, l.to_string()))
            .collect()
    }
}

/// A validated, read-only collection of response rows.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    rows: Vec<ResponseRow>,
}

impl Table {
    /// Checks the rows and builds a table.
    ///
    /// Every row must have a poll and a question identifier, a positive sample
    /// size and a share between 0 and 1. All the rows of a question must carry
    /// the same question text.
    pub fn new(rows: Vec<ResponseRow>) -> Result<Table, PollError> {
        let mut texts: HashMap<(&str, &str), &str> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            let reason = if row.poll_id.is_empty() {
                Some("empty poll_id".to_string())
            } else if row.question_id.is_empty() {
                Some("empty question_id".to_string())
            } else if row.sample_size == 0 {
                Some("sample_size must be positive".to_string())
            } else if !(0.0..=1.0).contains(&row.pct) {
                Some(format!("pct must be between 0 and 1, got {}", row.pct))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(PollError::InvalidRow { index, reason });
            }
            let key = (row.poll_id.as_str(), row.question_id.as_str());
            match texts.get(&key) {
                Some(text) if *text != row.question_text => {
                    return Err(PollError::InconsistentQuestionText {
                        poll_id: row.poll_id.clone(),
                        question_id: row.question_id.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    texts.insert(key, row.question_text.as_str());
                }
            }
        }
        Ok(Table { rows })
    }

    pub fn rows(&self) -> &[ResponseRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows of one poll, in table order.
    pub fn poll_rows<'a>(&'a self, poll_id: &'a str) -> impl Iterator<Item = &'a ResponseRow> {
        self.rows.iter().filter(move |r| r.poll_id == poll_id)
    }

    /// The rows of one question of a poll, in table order.
    pub fn question_rows<'a>(
        &'a self,
        poll_id: &'a str,
        question_id: &'a str,
    ) -> impl Iterator<Item = &'a ResponseRow> {
        self.poll_rows(poll_id)
            .filter(move |r| r.question_id == question_id)
    }
}

// ******** Derived data structures *********

/// A response row with the columns computed for one request.
///
/// The source row is borrowed and never modified.
#[derive(PartialEq, Debug, Clone)]
pub struct DerivedRow<'a> {
    pub row: &'a ResponseRow,
    pub question_text_wrap: String,
    pub pollster_wrap: String,
    pub pct_fav: f64,
    /// Share of this response within its bar, so that each bar sums to 1.
    pub percent_norm: f64,
}

/// The rows selected for a poll, a question and a crosstab variable.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Selection<'a> {
    pub rows: Vec<DerivedRow<'a>>,
}

impl<'a> Selection<'a> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The wrapped question text shared by the rows, or a placeholder when
    /// nothing was selected.
    pub fn question_text(&self) -> String {
        self.rows
            .first()
            .map(|r| r.question_text_wrap.clone())
            .unwrap_or_else(|| NO_QUESTION_TEXT.to_string())
    }
}

/// The rows of one crosstab variable, drawn in their own subplot.
#[derive(PartialEq, Debug, Clone)]
pub struct PanelGroup<'a> {
    pub crosstab_var: String,
    pub rows: Selection<'a>,
}

/// How the detail view is laid out.
#[derive(PartialEq, Debug, Clone)]
pub enum PanelPlan<'a> {
    SinglePanel(Selection<'a>),
    /// One group per crosstab variable, in order of first appearance.
    MultiPanel(Vec<PanelGroup<'a>>),
}

impl<'a> PanelPlan<'a> {
    /// True when nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        match self {
            PanelPlan::SinglePanel(selection) => selection.is_empty(),
            PanelPlan::MultiPanel(groups) => groups.iter().all(|g| g.rows.is_empty()),
        }
    }

    /// The wrapped question text of the first rows drawn.
    pub fn question_text(&self) -> String {
        match self {
            PanelPlan::SinglePanel(selection) => selection.question_text(),
            PanelPlan::MultiPanel(groups) => groups
                .iter()
                .find(|g| !g.rows.is_empty())
                .map(|g| g.rows.question_text())
                .unwrap_or_else(|| NO_QUESTION_TEXT.to_string()),
        }
    }
}

/// The favorability of one question of one poll, possibly restricted to one
/// crosstab value.
#[derive(PartialEq, Debug, Clone)]
pub struct TrendPoint {
    pub poll_id: String,
    pub question_id: String,
    pub question_text_wrap: String,
    pub date: NaiveDate,
    pub pollster_wrap: String,
    pub sample_size: u64,
    /// Set only when the trend is split by crosstab value.
    pub xtab1_val: Option<String>,
    pub pct_fav: f64,
    /// The number of response rows summed into this point.
    pub row_count: usize,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TickFormat {
    Plain,
    Percent,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Axis {
    pub field: Field,
    pub title: String,
    pub tick_format: TickFormat,
}

/// One segment of a stacked bar.
#[derive(PartialEq, Debug, Clone)]
pub struct Bar {
    /// The crosstab value, on the vertical axis.
    pub category: String,
    /// The normalized share, on the horizontal axis.
    pub value: f64,
    /// The response option, which gives the color.
    pub series: String,
    pub hover: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BarPanel {
    pub title: Option<String>,
    pub bars: Vec<Bar>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScatterPoint {
    pub date: NaiveDate,
    pub pct_fav: f64,
    pub sample_size: u64,
    pub text: String,
    pub hover: String,
    pub color: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum ChartKind {
    /// Horizontal stacked bars.
    Bar(BarPanel),
    /// Stacked bar panels, one above the other.
    Subplots { panels: Vec<BarPanel>, shared_x: bool },
    /// Bubbles over time, sized by sample size.
    Scatter(Vec<ScatterPoint>),
}

/// Which fields drive the visual channels besides the axes.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Encoding {
    pub color: Option<Field>,
    pub size: Option<Field>,
    pub text: Option<Field>,
    pub hover: Vec<Field>,
}

/// Problems that do not prevent drawing the chart.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChartWarning {
    /// Nothing matched the request: the chart is drawn empty.
    EmptySelection {
        poll_id: Option<String>,
        question_id: Option<String>,
        xtab1_var: String,
    },
}

/// A declarative description of a chart, ready for a renderer.
#[derive(PartialEq, Debug, Clone)]
pub struct ChartSpec {
    pub title: Option<String>,
    pub kind: ChartKind,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub encoding: Encoding,
    pub labels: Vec<(Field, String)>,
    pub warnings: Vec<ChartWarning>,
}

impl ChartSpec {
    /// The label to display for a field.
    pub fn label(&self, field: Field) -> &str {
        self.labels
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, l)| l.as_str())
            .unwrap_or_else(|| field.name())
    }
}

/// Errors that prevent a chart from being built.
#[derive(PartialEq, Debug, Clone)]
pub enum PollError {
    UnknownPoll {
        poll_id: String,
    },
    UnknownQuestion {
        poll_id: String,
        question_id: String,
    },
    /// No question was given and the poll has several. The candidates are
    /// listed in order of first appearance.
    AmbiguousQuestion {
        poll_id: String,
        candidates: Vec<String>,
    },
    /// The second crosstab dimension is not supported yet.
    UnsupportedCrosstabCombination {
        crosstab_var_2: String,
    },
    /// `index` is the position of the row in the vector given to
    /// [`Table::new`], counted from 0.
    InvalidRow {
        index: usize,
        reason: String,
    },
    InconsistentQuestionText {
        poll_id: String,
        question_id: String,
    },
}

impl Error for PollError {}

impl Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::UnknownPoll { poll_id } => write!(f, "No response found for poll {}", poll_id),
            PollError::UnknownQuestion {
                poll_id,
                question_id,
            } => write!(f, "Poll {} has no question {}", poll_id, question_id),
            PollError::AmbiguousQuestion {
                poll_id,
                candidates,
            } => write!(
                f,
                "Poll {} has several questions, please select one of: {}",
                poll_id,
                candidates.join(", ")
            ),
            PollError::UnsupportedCrosstabCombination { crosstab_var_2 } => write!(
                f,
                "A second crosstab variable ({}) is not supported",
                crosstab_var_2
            ),
            PollError::InvalidRow { index, reason } => {
                write!(f, "Invalid response row {} (counted from 0): {}", index, reason)
            }
            PollError::InconsistentQuestionText {
                poll_id,
                question_id,
            } => write!(
                f,
                "Question {} of poll {} has several question texts",
                question_id, poll_id
            ),
        }
    }
}

// ********* Configuration **********

/// The detail view of one question of one poll.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DetailQuery {
    pub poll_id: String,
    /// May be omitted when the poll has a single question.
    pub question_id: Option<String>,
    pub crosstab_var_1: String,
    /// Accepted for forward compatibility: anything but [`NO_CROSSTAB`] is
    /// rejected.
    pub crosstab_var_2: String,
}

impl DetailQuery {
    pub fn new(poll_id: &str) -> DetailQuery {
        DetailQuery {
            poll_id: poll_id.to_string(),
            question_id: None,
            crosstab_var_1: NO_CROSSTAB.to_string(),
            crosstab_var_2: NO_CROSSTAB.to_string(),
        }
    }
}

/// The favorability trend across polls.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TrendQuery {
    /// Restricts the output to these polls. `None` keeps all of them.
    pub poll_ids: Option<Vec<String>>,
    /// Restricts the output to these questions. `None` keeps all of them.
    pub question_ids: Option<Vec<String>>,
    pub xtab1_var: String,
    pub xtab1_val: String,
}

impl TrendQuery {
    /// A crosstab variable without a specific value: every value of the
    /// variable is shown as its own series.
    pub fn split_by_value(&self) -> bool {
        self.xtab1_var != NO_CROSSTAB && self.xtab1_val == NO_CROSSTAB
    }
}

impl Default for TrendQuery {
    fn default() -> Self {
        TrendQuery {
            poll_ids: None,
            question_ids: None,
            xtab1_var: NO_CROSSTAB.to_string(),
            xtab1_val: NO_CROSSTAB.to_string(),
        }
    }
}

/// Maximum line widths of the wrapped display strings, in characters.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct WrapWidths {
    pub question: usize,
    pub pollster: usize,
}

impl WrapWidths {
    pub const DEFAULT: WrapWidths = WrapWidths {
        question: 130,
        pollster: 20,
    };
}

/// The collaborators used when building a view.
#[derive(Clone, Copy)]
pub struct ViewOptions<'a> {
    pub wrapper: &'a dyn TextWrapper,
    pub widths: WrapWidths,
    pub display_names: &'a DisplayNames,
}

impl ViewOptions<'static> {
    pub const DEFAULT: ViewOptions<'static> = ViewOptions {
        wrapper: &BreakWrapper,
        widths: WrapWidths::DEFAULT,
        display_names: &DisplayNames::DEFAULT,
    };
}

impl std::fmt::Debug for ViewOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewOptions")
            .field("widths", &self.widths)
            .finish()
    }
}
