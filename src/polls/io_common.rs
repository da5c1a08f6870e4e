// Primitives shared by the CSV and the Excel readers.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::polls::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The position of every column in the header row.
///
/// A column may be named with its internal name (`poll_id`) or with its
/// display label (`Poll ID`).
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: Vec<(Field, usize)>,
}

impl ColumnIndex {
    pub fn from_headers(
        headers: &[String],
        names: &DisplayNames,
        path: &str,
    ) -> PollvisResult<ColumnIndex> {
        let mut positions: Vec<(Field, usize)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            let h = header.trim();
            let field_o = Field::from_name(h).or_else(|| names.field_for_label(h));
            if let Some(field) = field_o {
                if positions.iter().all(|(f, _)| *f != field) {
                    positions.push((field, idx));
                }
            }
        }
        for field in Field::REQUIRED.iter() {
            ensure!(
                positions.iter().any(|(f, _)| f == field),
                MissingColumnSnafu {
                    column: names.label(*field),
                    path: simplify_file_name(path),
                }
            );
        }
        debug!("from_headers: {:?}", positions);
        Ok(ColumnIndex { positions })
    }

    fn position(&self, field: Field) -> Option<usize> {
        self.positions
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, idx)| *idx)
    }

    /// Assembles one response row. `cell` returns the trimmed content of a
    /// column, or `None` when the line is too short.
    pub fn build_row(
        &self,
        path: &str,
        lineno: usize,
        cell: impl Fn(usize) -> Option<String>,
    ) -> PollvisResult<ResponseRow> {
        let text = |field: Field| -> String {
            self.position(field)
                .and_then(&cell)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let invalid = |field: Field, content: &str| InvalidCellSnafu {
            path: simplify_file_name(path),
            lineno,
            column: field.name(),
            content: content.to_string(),
        };
        let crosstab = |field: Field| -> String {
            let s = text(field);
            if s.is_empty() {
                NO_CROSSTAB.to_string()
            } else {
                s
            }
        };

        let poll_id = text(Field::PollId);
        ensure!(!poll_id.is_empty(), invalid(Field::PollId, &poll_id));
        let question_id = text(Field::QuestionId);
        ensure!(!question_id.is_empty(), invalid(Field::QuestionId, &question_id));
        let sample_size_s = text(Field::SampleSize);
        let sample_size = parse_count(&sample_size_s)
            .filter(|n| *n > 0)
            .context(invalid(Field::SampleSize, &sample_size_s))?;
        let pct_s = text(Field::Pct);
        let pct = parse_share(&pct_s)
            .filter(|x| (0.0..=1.0).contains(x))
            .context(invalid(Field::Pct, &pct_s))?;
        let fav_s = text(Field::Favorability);
        let favorability =
            Favorability::parse(&fav_s).context(invalid(Field::Favorability, &fav_s))?;
        let date_s = text(Field::Date);
        let date = parse_date(&date_s).context(invalid(Field::Date, &date_s))?;
        let notes = Some(text(Field::Notes)).filter(|s| !s.is_empty());

        Ok(ResponseRow {
            poll_id,
            question_id,
            xtab1_var: crosstab(Field::Xtab1Var),
            xtab1_val: crosstab(Field::Xtab1Val),
            xtab2_var: crosstab(Field::Xtab2Var),
            xtab2_val: crosstab(Field::Xtab2Val),
            sample_size,
            question_text: text(Field::QuestionText),
            pct,
            response: text(Field::Response),
            favorability,
            date,
            pollster: text(Field::Pollster),
            notes,
        })
    }
}

/// Sample sizes sometimes come out of spreadsheets as `1000.0`.
pub fn parse_count(s: &str) -> Option<u64> {
    let s = s.trim().replace(',', "");
    if let Ok(x) = s.parse::<u64>() {
        return Some(x);
    }
    let f = s.parse::<f64>().ok()?;
    if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// A share between 0 and 1. Values written as `45%` are divided by 100.
pub fn parse_share(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.strip_suffix('%') {
        Some(p) => p.trim().parse::<f64>().ok().map(|x| x / 100.0),
        None => s.parse::<f64>().ok(),
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Excel stores dates as a number of days since 1899-12-30.
pub fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    base.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const ALL: [&str; 13] = [
        "Poll ID",
        "question_id",
        "Cross-tab variable 1",
        "Cross-tab value 1",
        "xtab2_var",
        "xtab2_val",
        "Sample size",
        "Question text",
        "Percentage",
        "Response",
        "Favorability",
        "Date",
        "Pollster",
    ];

    #[test]
    fn numbers() {
        assert_eq!(parse_count("1000"), Some(1000));
        assert_eq!(parse_count("1,500"), Some(1500));
        assert_eq!(parse_count("1000.0"), Some(1000));
        assert_eq!(parse_count("10.5"), None);
        assert_eq!(parse_count("1e30"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_share("0.45"), Some(0.45));
        assert_eq!(parse_share("45%"), Some(0.45));
        assert_eq!(parse_share("abc"), None);
    }

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2021, 5, 1);
        assert_eq!(parse_date("2021-05-01"), d);
        assert_eq!(parse_date("05/01/2021"), d);
        assert_eq!(parse_date("2021/05/01"), d);
        assert_eq!(parse_date("2021-05-01 00:00:00"), d);
        assert_eq!(parse_date("May 1st"), None);
        assert_eq!(excel_serial_date(44317.0), d);
    }

    #[test]
    fn mixed_header_names() {
        let index = ColumnIndex::from_headers(&headers(&ALL), &DisplayNames::DEFAULT, "a.csv");
        assert!(index.is_ok());
    }

    #[test]
    fn missing_header_uses_the_label() {
        let res = ColumnIndex::from_headers(
            &headers(&ALL[..12]),
            &DisplayNames::DEFAULT,
            "/tmp/a.csv",
        );
        match res {
            Err(PollvisError::MissingColumn { column, path }) => {
                assert_eq!(column, "Pollster");
                assert_eq!(path, "a.csv");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn builds_rows() {
        let index =
            ColumnIndex::from_headers(&headers(&ALL), &DisplayNames::DEFAULT, "a.csv").unwrap();
        let line = [
            "P1", "Q1", "", "", "-", "-", "1000", "Approve?", "45%", "Yes", "1", "2021-05-01",
            "YouGov",
        ];
        let row = index
            .build_row("a.csv", 2, |i| line.get(i).map(|s| s.to_string()))
            .unwrap();
        assert_eq!(row.xtab1_var, NO_CROSSTAB);
        assert_eq!(row.xtab1_val, NO_CROSSTAB);
        assert_eq!(row.pct, 0.45);
        assert_eq!(row.favorability, Favorability::Favorable);
        assert_eq!(row.notes, None);

        let bad = [
            "P1", "Q1", "-", "-", "-", "-", "many", "Approve?", "0.4", "Yes", "1", "2021-05-01",
            "YouGov",
        ];
        match index.build_row("a.csv", 3, |i| bad.get(i).map(|s| s.to_string())) {
            Err(PollvisError::InvalidCell {
                lineno,
                column,
                content,
                ..
            }) => {
                assert_eq!(lineno, 3);
                assert_eq!(column, "sample_size");
                assert_eq!(content, "many");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    fn line_error(index: &ColumnIndex, line: &[&str]) -> (usize, String, String) {
        match index.build_row("a.csv", 7, |i| line.get(i).map(|s| s.to_string())) {
            Err(PollvisError::InvalidCell {
                lineno,
                column,
                content,
                ..
            }) => (lineno, column, content),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn rows_are_checked_with_their_line_number() {
        let index =
            ColumnIndex::from_headers(&headers(&ALL), &DisplayNames::DEFAULT, "a.csv").unwrap();
        let line = |sample_size: &'static str, pct: &'static str| {
            [
                "P1", "Q1", "-", "-", "-", "-", sample_size, "Approve?", pct, "Yes", "1",
                "2021-05-01", "YouGov",
            ]
        };
        assert_eq!(
            line_error(&index, &line("1e30", "0.4")),
            (7, "sample_size".to_string(), "1e30".to_string())
        );
        assert_eq!(
            line_error(&index, &line("0", "0.4")),
            (7, "sample_size".to_string(), "0".to_string())
        );
        assert_eq!(
            line_error(&index, &line("1000", "1.5")),
            (7, "pct".to_string(), "1.5".to_string())
        );
        // A truncated line has no question id.
        assert_eq!(
            line_error(&index, &["P1"]),
            (7, "question_id".to_string(), String::new())
        );
    }
}
