use crate::polls::*;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    pub kind: Option<String>,
    #[serde(rename = "pollId")]
    pub poll_id: Option<String>,
    #[serde(rename = "questionId")]
    pub question_id: Option<String>,
    #[serde(rename = "crosstabVar1")]
    pub crosstab_var_1: Option<String>,
    #[serde(rename = "crosstabVar2")]
    pub crosstab_var_2: Option<String>,
    #[serde(rename = "crosstabVal1")]
    pub crosstab_val_1: Option<String>,
    #[serde(rename = "pollIds")]
    pub poll_ids: Option<Vec<String>>,
    #[serde(rename = "questionIds")]
    pub question_ids: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ViewKind {
    Detail,
    Trend,
}

impl ViewConfig {
    pub fn view_kind(&self) -> PollvisResult<ViewKind> {
        match self.kind.as_deref() {
            None | Some("detail") => Ok(ViewKind::Detail),
            Some("trend") => Ok(ViewKind::Trend),
            Some(x) => whatever!("Unknown view {:?}: expected detail or trend", x),
        }
    }

    pub fn detail_query(&self) -> PollvisResult<DetailQuery> {
        let poll_id = self.poll_id.as_deref().context(MissingPollIdSnafu {})?;
        Ok(DetailQuery {
            question_id: self.question_id.clone(),
            crosstab_var_1: crosstab_or_default(&self.crosstab_var_1),
            crosstab_var_2: crosstab_or_default(&self.crosstab_var_2),
            ..DetailQuery::new(poll_id)
        })
    }

    pub fn trend_query(&self) -> TrendQuery {
        TrendQuery {
            poll_ids: self.poll_ids.clone(),
            question_ids: self.question_ids.clone(),
            xtab1_var: crosstab_or_default(&self.crosstab_var_1),
            xtab1_val: crosstab_or_default(&self.crosstab_val_1),
        }
    }
}

fn crosstab_or_default(x: &Option<String>) -> String {
    x.clone().unwrap_or_else(|| NO_CROSSTAB.to_string())
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "questionWrapWidth")]
    pub question_wrap_width: Option<usize>,
    #[serde(rename = "pollsterWrapWidth")]
    pub pollster_wrap_width: Option<usize>,
}

impl OutputSettings {
    pub fn wrap_widths(&self) -> WrapWidths {
        WrapWidths {
            question: self
                .question_wrap_width
                .unwrap_or(WrapWidths::DEFAULT.question),
            pollster: self
                .pollster_wrap_width
                .unwrap_or(WrapWidths::DEFAULT.pollster),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollvisConfig {
    #[serde(rename = "dataSources", default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
}

/// Reads a configuration file. The paths it contains are relative to the
/// directory of the file.
pub fn read_config(path: &str) -> PollvisResult<PollvisConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: PollvisConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let root = Path::new(path).parent().context(MissingParentDirSnafu {})?;
    for source in config.data_sources.iter_mut() {
        source.file_path = root.join(&source.file_path).display().to_string();
    }
    if let Some(out) = &config.output_settings.output_path {
        if out != "stdout" {
            config.output_settings.output_path = Some(root.join(out).display().to_string());
        }
    }
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_reference(path: &str) -> PollvisResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_configuration() {
        let js = r#"{
            "dataSources": [{ "provider": "xlsx", "filePath": "polls.xlsx", "worksheetName": "Responses" }],
            "view": { "kind": "trend", "crosstabVar1": "Gender", "pollIds": ["P1", "P2"] },
            "outputSettings": { "pollsterWrapWidth": 12 }
        }"#;
        let config: PollvisConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            config.data_sources[0].worksheet_name,
            Some("Responses".to_string())
        );
        assert_eq!(config.view.view_kind().unwrap(), ViewKind::Trend);
        let query = config.view.trend_query();
        assert_eq!(query.xtab1_var, "Gender");
        assert_eq!(query.xtab1_val, NO_CROSSTAB);
        assert!(query.split_by_value());
        assert_eq!(
            query.poll_ids,
            Some(vec!["P1".to_string(), "P2".to_string()])
        );
        assert_eq!(
            config.output_settings.wrap_widths(),
            WrapWidths {
                question: 130,
                pollster: 12
            }
        );
    }

    #[test]
    fn everything_is_optional() {
        let config: PollvisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PollvisConfig::default());
        assert_eq!(config.view.view_kind().unwrap(), ViewKind::Detail);
        assert!(matches!(
            config.view.detail_query(),
            Err(PollvisError::MissingPollId {})
        ));
    }

    #[test]
    fn detail_query_defaults() {
        let view = ViewConfig {
            poll_id: Some("P1".to_string()),
            ..ViewConfig::default()
        };
        assert_eq!(view.detail_query().unwrap(), DetailQuery::new("P1"));
    }

    #[test]
    fn unknown_view_kind() {
        let view = ViewConfig {
            kind: Some("pie".to_string()),
            ..ViewConfig::default()
        };
        assert!(view.view_kind().is_err());
    }
}
