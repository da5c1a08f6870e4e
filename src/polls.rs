use log::{debug, info, warn};

use poll_charts::wrap::BreakWrapper;
use poll_charts::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::polls::config_reader::*;

pub mod config_reader;
mod figure;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollvisError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Missing column {column} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno} of {path}: could not read {column} from {content:?}"))]
    InvalidCell {
        path: String,
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Invalid responses: {source}"))]
    InvalidResponses { source: PollError },
    #[snafu(display("{source}"))]
    Visualization { source: PollError },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No data source: use --input or a configuration file"))]
    NoDataSource {},
    #[snafu(display("The detail view needs a poll id (--poll-id)"))]
    MissingPollId {},
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the generated figure and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollvisResult<T> = Result<T, PollvisError>;

/// The command line options take precedence over the configuration file.
fn merge_args(config: PollvisConfig, args: &Args) -> PollvisConfig {
    let mut config = config;
    if let Some(input) = &args.input {
        let provider = match &args.input_type {
            Some(t) => t.clone(),
            None if input.ends_with(".xlsx") => "xlsx".to_string(),
            None => "csv".to_string(),
        };
        config.data_sources = vec![DataSource {
            provider,
            file_path: input.clone(),
            worksheet_name: args.excel_worksheet_name.clone(),
        }];
    }
    let view = &mut config.view;
    let overrides = [
        (&mut view.kind, &args.view),
        (&mut view.poll_id, &args.poll_id),
        (&mut view.question_id, &args.question_id),
        (&mut view.crosstab_var_1, &args.crosstab_var_1),
        (&mut view.crosstab_var_2, &args.crosstab_var_2),
        (&mut view.crosstab_val_1, &args.crosstab_val_1),
    ];
    for (field, arg) in overrides {
        if arg.is_some() {
            *field = arg.clone();
        }
    }
    if args.poll_ids.is_some() {
        view.poll_ids = args.poll_ids.clone();
    }
    if args.question_ids.is_some() {
        view.question_ids = args.question_ids.clone();
    }
    if args.out.is_some() {
        config.output_settings.output_path = args.out.clone();
    }
    config
}

fn read_responses(sources: &[DataSource]) -> PollvisResult<Table> {
    ensure!(!sources.is_empty(), NoDataSourceSnafu {});
    let mut rows: Vec<ResponseRow> = Vec::new();
    for source in sources.iter() {
        info!("Attempting to read responses file {:?}", source.file_path);
        let mut source_rows = match source.provider.as_str() {
            "csv" => io_csv::read_csv_responses(&source.file_path, &DisplayNames::DEFAULT)?,
            "xlsx" => io_excel::read_excel_responses(
                &source.file_path,
                source.worksheet_name.as_deref(),
                &DisplayNames::DEFAULT,
            )?,
            x => whatever!("Provider not implemented {:?}: expected csv or xlsx", x),
        };
        debug!(
            "read_responses: {} rows in {:?}",
            source_rows.len(),
            source.file_path
        );
        rows.append(&mut source_rows);
    }
    Table::new(rows).context(InvalidResponsesSnafu {})
}

fn build_chart(table: &Table, view: &ViewConfig, options: &ViewOptions) -> PollvisResult<ChartSpec> {
    let spec = match view.view_kind()? {
        ViewKind::Detail => detail_view(table, &view.detail_query()?, options),
        ViewKind::Trend => trend_view(table, &view.trend_query(), options),
    }
    .context(VisualizationSnafu {})?;
    for w in spec.warnings.iter() {
        warn!("{:?}", w);
    }
    Ok(spec)
}

fn write_output(content: &str, output_path: Option<&str>) -> PollvisResult<()> {
    match output_path {
        None | Some("stdout") => {
            println!("{}", content);
        }
        Some(path) => {
            info!("Writing figure to {:?}", path);
            fs::write(path, content).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

fn check_reference(pretty_js_figure: &str, reference_path: &str) -> PollvisResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_js_reference =
        serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_js_reference != pretty_js_figure {
        warn!("Found differences with the reference figure");
        print_diff(pretty_js_reference.as_str(), pretty_js_figure, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    Ok(())
}

/// Reads the configuration file, if any, and applies the command line options.
pub fn load_config(args: &Args) -> PollvisResult<PollvisConfig> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => PollvisConfig::default(),
    };
    let config = merge_args(config, args);
    info!("config: {:?}", config);
    Ok(config)
}

/// Builds the figure described by the configuration.
pub fn make_figure(config: &PollvisConfig) -> PollvisResult<JSValue> {
    let options = ViewOptions {
        wrapper: &BreakWrapper,
        widths: config.output_settings.wrap_widths(),
        display_names: &DisplayNames::DEFAULT,
    };
    let table = read_responses(&config.data_sources)?;
    info!("Read {} responses", table.len());

    let spec = build_chart(&table, &config.view, &options)?;
    Ok(figure::format_figure(figure::chart_to_plotly(&spec)))
}

pub fn run_visualization(args: &Args) -> PollvisResult<()> {
    let config = load_config(args)?;
    let figure = make_figure(&config)?;
    let pretty_js_figure = serde_json::to_string_pretty(&figure).context(ParsingJsonSnafu {})?;
    write_output(
        &pretty_js_figure,
        config.output_settings.output_path.as_deref(),
    )?;

    // The reference figure, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(&pretty_js_figure, reference_path)?;
    }
    Ok(())
}
