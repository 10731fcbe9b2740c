use std::fs;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::prep::{
    OpeningJsonSnafu, ParsingJsonNumberSnafu, ParsingJsonSnafu, PrepResult, RosterColumns,
};

/// The optional JSON options file. Every field may be omitted; command-line
/// flags take precedence over these fields, which in turn take precedence
/// over the built-in defaults.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(rename = "matricColumn")]
    pub matric_column: Option<String>,
    #[serde(rename = "firstNameColumn")]
    pub first_name_column: Option<String>,
    #[serde(rename = "lastNameColumn")]
    pub last_name_column: Option<String>,
    #[serde(rename = "usernameColumn")]
    pub username_column: Option<String>,
    #[serde(rename = "categoryPrefix")]
    pub category_prefix: Option<String>,
    #[serde(rename = "targetCount")]
    _target_count: Option<JSValue>,
    #[serde(rename = "randomSeed")]
    _random_seed: Option<JSValue>,
    #[serde(rename = "referenceYear")]
    _reference_year: Option<JSValue>,
    #[serde(rename = "emailDomain")]
    pub email_domain: Option<String>,
}

impl RosterConfig {
    pub fn target_count(&self) -> PrepResult<Option<usize>> {
        let x = read_js_int(&self._target_count, "targetCount")?;
        Ok(x.map(|v| v as usize))
    }

    pub fn random_seed(&self) -> PrepResult<Option<u64>> {
        read_js_int(&self._random_seed, "randomSeed")
    }

    pub fn reference_year(&self) -> PrepResult<Option<i32>> {
        let x = read_js_int(&self._reference_year, "referenceYear")?;
        Ok(x.map(|v| v as i32))
    }

    /// The column names with the roster defaults filled in.
    pub fn columns(&self) -> RosterColumns {
        let d = RosterColumns::default();
        RosterColumns {
            matric: self.matric_column.clone().unwrap_or(d.matric),
            first_name: self.first_name_column.clone().unwrap_or(d.first_name),
            last_name: self.last_name_column.clone().unwrap_or(d.last_name),
            username: self.username_column.clone().unwrap_or(d.username),
        }
    }
}

pub fn read_config(path: &str) -> PrepResult<RosterConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let cfg: RosterConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", cfg);
    Ok(cfg)
}

// Numeric options may be written as JSON numbers or as numeric strings.
fn read_js_int(x: &Option<JSValue>, name: &str) -> PrepResult<Option<u64>> {
    match x {
        None => Ok(None),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(Some)
            .context(ParsingJsonNumberSnafu { name }),
        Some(JSValue::String(s)) => s
            .parse::<u64>()
            .ok()
            .map(Some)
            .context(ParsingJsonNumberSnafu { name }),
        Some(_) => None.context(ParsingJsonNumberSnafu { name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::PrepError;

    #[test]
    fn numeric_fields_accept_numbers_or_numeric_strings() {
        let cfg: RosterConfig = serde_json::from_str(
            r#"{"targetCount": "250", "randomSeed": 42, "referenceYear": 24}"#,
        )
        .unwrap();
        assert_eq!(cfg.target_count().unwrap(), Some(250));
        assert_eq!(cfg.random_seed().unwrap(), Some(42));
        assert_eq!(cfg.reference_year().unwrap(), Some(24));
    }

    #[test]
    fn absent_fields_fall_through() {
        let cfg: RosterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.target_count().unwrap(), None);
        assert_eq!(cfg.random_seed().unwrap(), None);
        let columns = cfg.columns();
        assert_eq!(columns.matric, "Matric No");
        assert_eq!(columns.username, "Username");
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        let cfg: RosterConfig =
            serde_json::from_str(r#"{"targetCount": "many"}"#).unwrap();
        assert!(matches!(
            cfg.target_count(),
            Err(PrepError::ParsingJsonNumber { .. })
        ));
    }

    #[test]
    fn column_names_can_be_overridden() {
        let cfg: RosterConfig =
            serde_json::from_str(r#"{"matricColumn": "Student ID"}"#).unwrap();
        assert_eq!(cfg.columns().matric, "Student ID");
        assert_eq!(cfg.columns().first_name, "First Name");
    }
}
