use clap::Parser;

/// This is a program to visualize public-opinion poll responses.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the data sources and the view to draw.
    /// The command line options override the content of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference figure in JSON format. If provided, pollvis will
    /// check that the generated figure matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the figure will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the poll responses. Setting this option overrides
    /// the data sources of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default detail) The chart to draw: detail (one question of one poll) or trend
    /// (favorability across polls).
    #[clap(long, value_parser)]
    pub view: Option<String>,

    /// (detail view) The poll to display.
    #[clap(short, long, value_parser)]
    pub poll_id: Option<String>,

    /// (detail view, optional) The question to display. It may be omitted when the poll
    /// has a single question.
    #[clap(short, long, value_parser)]
    pub question_id: Option<String>,

    /// (default -) The crosstab variable to break the responses down by.
    #[clap(long = "crosstab-var-1", value_parser)]
    pub crosstab_var_1: Option<String>,

    /// (detail view, default -) A second crosstab variable. Not supported yet.
    #[clap(long = "crosstab-var-2", value_parser)]
    pub crosstab_var_2: Option<String>,

    /// (trend view, default -) The crosstab value to keep. If a crosstab variable is given
    /// without a value, every value is drawn as its own series.
    #[clap(long = "crosstab-val-1", value_parser)]
    pub crosstab_val_1: Option<String>,

    /// (trend view, list or not specified) Only show these polls.
    #[clap(long, value_parser)]
    pub poll_ids: Option<Vec<String>>,

    /// (trend view, list or not specified) Only show these questions.
    #[clap(long, value_parser)]
    pub question_ids: Option<Vec<String>>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
