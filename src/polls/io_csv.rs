// Primitives for reading CSV files.

use crate::polls::{io_common::ColumnIndex, *};

pub fn read_csv_responses(path: &str, names: &DisplayNames) -> PollvisResult<Vec<ResponseRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_responses: headers: {:?}", headers);
    let index = ColumnIndex::from_headers(&headers, names, path)?;

    let mut res: Vec<ResponseRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        if line.iter().all(|s| s.is_empty()) {
            debug!("read_csv_responses: skipping empty line {}", lineno);
            continue;
        }
        let row = index.build_row(path, lineno, |i| line.get(i).map(|s| s.to_string()))?;
        res.push(row);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_sample_file() {
        let path = format!("{}/tests/data/responses.csv", env!("CARGO_MANIFEST_DIR"));
        let rows = read_csv_responses(&path, &DisplayNames::DEFAULT).unwrap();
        assert_eq!(rows.len(), 19);
        assert_eq!(rows[0].poll_id, "P1");
        assert_eq!(rows[0].xtab1_var, NO_CROSSTAB);
        assert_eq!(rows[0].pct, 0.6);
        assert_eq!(rows[0].favorability, Favorability::Favorable);
        assert_eq!(rows[0].pollster, "YouGov");
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_csv_responses("/nonexistent/responses.csv", &DisplayNames::DEFAULT),
            Err(PollvisError::CsvOpen { .. })
        ));
    }
}
