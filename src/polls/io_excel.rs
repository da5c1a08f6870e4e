use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::polls::{
    io_common::{excel_serial_date, ColumnIndex},
    *,
};

pub fn read_excel_responses(
    path: &str,
    worksheet_name: Option<&str>,
    names: &DisplayNames,
) -> PollvisResult<Vec<ResponseRow>> {
    let wrange = get_range(path, worksheet_name)?;
    let mut rows = wrange.rows();
    let header = rows.next().context(EmptyExcelSnafu { path })?;
    let headers: Vec<String> = header.iter().map(cell_to_string).collect();
    debug!("read_excel_responses: headers: {:?}", headers);
    let index = ColumnIndex::from_headers(&headers, names, path)?;

    let mut res: Vec<ResponseRow> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        if row.iter().all(|c| matches!(c, DataType::Empty)) {
            continue;
        }
        let r = index.build_row(path, lineno, |i| row.get(i).map(cell_to_string))?;
        res.push(r);
    }
    Ok(res)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> PollvisResult<Range<DataType>> {
    debug!(
        "read_excel_responses: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path }),
        None => {
            let first = workbook.sheet_names().first().cloned();
            let name = first.context(EmptyExcelSnafu { path })?;
            workbook
                .worksheet_range(&name)
                .context(EmptyExcelSnafu { path })?
                .context(OpeningExcelSnafu { path })
        }
    }
}

/// The text of a cell, as it would appear in a CSV export. Dates are written
/// in ISO format.
fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => excel_serial_date(*serial)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| serial.to_string()),
        DataType::Error(e) => format!("{:?}", e),
        DataType::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::String(" P1 ".to_string())), "P1");
        assert_eq!(cell_to_string(&DataType::Int(1000)), "1000");
        assert_eq!(cell_to_string(&DataType::Float(0.45)), "0.45");
        assert_eq!(cell_to_string(&DataType::Float(1000.0)), "1000");
        assert_eq!(cell_to_string(&DataType::DateTime(44317.0)), "2021-05-01");
        assert_eq!(cell_to_string(&DataType::Empty), "");
    }

    fn workbook() -> String {
        format!("{}/tests/data/responses.xlsx", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn reads_the_first_worksheet() {
        let rows = read_excel_responses(&workbook(), None, &DisplayNames::DEFAULT).unwrap();
        // The blank row between the two polls is skipped.
        assert_eq!(rows.len(), 19);
        assert_eq!(rows[0].poll_id, "P1");
        assert_eq!(rows[0].sample_size, 1000);
        assert_eq!(rows[0].pct, 0.6);
        assert_eq!(rows[1].favorability, Favorability::Unfavorable);
        assert_eq!(rows[0].date, chrono::NaiveDate::from_ymd_opt(2021, 5, 1).unwrap());
        assert_eq!(rows[0].notes, None);
        assert_eq!(rows[12].notes, Some("Online panel".to_string()));
        assert_eq!(rows[18].pollster, "Morning Consult");
    }

    #[test]
    fn reads_a_named_worksheet() {
        let rows = read_excel_responses(&workbook(), Some("Morning Consult"), &DisplayNames::DEFAULT)
            .unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.poll_id == "P2" && r.sample_size == 1500));
        assert_eq!(rows[2].xtab1_var, "Gender");
    }

    #[test]
    fn unknown_worksheet() {
        match read_excel_responses(&workbook(), Some("Summary"), &DisplayNames::DEFAULT) {
            Err(PollvisError::MissingWorksheet { name, path }) => {
                assert_eq!(name, "Summary");
                assert_eq!(path, workbook());
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn missing_workbook() {
        assert!(matches!(
            read_excel_responses("/nonexistent/polls.xlsx", None, &DisplayNames::DEFAULT),
            Err(PollvisError::OpeningExcel { .. })
        ));
    }
}
