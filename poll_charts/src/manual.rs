/*!

This is the long-form manual for `poll_charts` and `pollvis`.

## Input format

The responses are a table with one row per poll, question, crosstab and
response option. The columns can be named either with their internal name or
with their display name:

| internal name   | display name           | content                                   |
|-----------------|------------------------|-------------------------------------------|
| `poll_id`       | `Poll ID`              | identifier of the poll                    |
| `question_id`   | `Question ID`          | identifier of the question within the poll|
| `xtab1_var`     | `Cross-tab variable 1` | crosstab variable, `-` for none           |
| `xtab1_val`     | `Cross-tab value 1`    | crosstab value, `-` for none              |
| `xtab2_var`     | `Cross-tab variable 2` | second crosstab variable, `-` for none    |
| `xtab2_val`     | `Cross-tab value 2`    | second crosstab value, `-` for none       |
| `sample_size`   | `Sample size`          | positive integer                          |
| `question_text` | `Question text`        | the same for all the rows of a question   |
| `pct`           | `Percentage`           | share between 0 and 1 (`45%` is accepted) |
| `response`      | `Response`             | response option                           |
| `favorability`  | `Favorability`         | `1`, `-1`, `0` (or the words)             |
| `date`          | `Date`                 | `2021-05-01`, `05/01/2021` or `2021/05/01`|
| `pollster`      | `Pollster`             | name of the pollster                      |
| `notes`         | `Notes`                | optional                                  |

Both CSV files (`csv`) and Excel workbooks (`xlsx`) are supported. With Excel,
the first worksheet is read unless a worksheet name is given.

## Detail view

The detail view shows the responses to one question as horizontal stacked
bars, one bar per crosstab value, each bar summing to 100%.

```bash
pollvis -i responses.csv --view detail --poll-id P1 --question-id Q1 --crosstab-var-1 Gender
```

The question can be omitted when the poll has a single question. When a poll
has several questions, the program lists them.

Without a crosstab variable, and if the question is broken down by at least
two crosstab variables, the chart has one panel per crosstab variable.

A second crosstab variable is not supported yet and is rejected.

## Trend view

The trend view sums the favorability of the responses of each question of each
poll: favorable responses count positively, unfavorable responses negatively.
Each poll is a bubble placed at its date, sized by its sample size.

```bash
pollvis -i responses.csv --view trend --crosstab-var-1 Gender --crosstab-val-1 Female
```

Giving a crosstab variable without a value draws one colored series per
value of the variable. `--poll-ids` and `--question-ids` restrict the
polls and questions shown.

## Configuration

All the options can also be stored in a JSON configuration file, passed with
`--config`. The paths of the data sources are relative to the configuration
file. The command line options take precedence over the file.

```json
{
  "dataSources": [{ "provider": "csv", "filePath": "responses.csv" }],
  "view": { "kind": "trend", "crosstabVar1": "Gender" },
  "outputSettings": { "outputPath": "trend.json", "pollsterWrapWidth": 20 }
}
```

## Output

The output is a figure in the plotly JSON format, written to the standard
output or to the file given with `--out`. With `--reference`, the output is
compared to a reference figure and the differences are printed.

*/
