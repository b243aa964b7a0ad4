//! Pipeline configuration and its YAML/JSON loaders.

use crate::renderer::RenderOptions;
use crate::transform::{AnchorOptions, ListType, Placement, TocOptions};
use crate::types::{ACCEPTED_LEVELS, HeadingLevels};
use mdsite_core::{ConfigurationError, SiteError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

/// Every option of the rendering pipeline.
///
/// Missing keys take the site preset. Setting `toc: null` disables the
/// table-of-contents stage.
///
/// ```yaml
/// markdown:
///   allowRawHtml: true
/// anchor:
///   levels: [2, 3]
///   placement: before
/// toc:
///   listType: ol
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    /// Markdown renderer options.
    pub markdown: RenderOptions,
    /// Heading anchor options.
    pub anchor: AnchorOptions,
    /// Table-of-contents options; `None` disables the stage.
    pub toc: Option<TocOptions>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            markdown: RenderOptions::site(),
            anchor: AnchorOptions::default(),
            toc: Some(TocOptions::default()),
        }
    }
}

impl PipelineConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, SiteError> {
        if source.trim().is_empty() {
            return Self::from_value(Value::Null);
        }
        let value: Value =
            serde_yaml::from_str(source).map_err(|err| SiteError::ConfigFormat(err.to_string()))?;
        Self::from_value(value)
    }

    /// Parses a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, SiteError> {
        let value: Value =
            serde_json::from_str(source).map_err(|err| SiteError::ConfigFormat(err.to_string()))?;
        Self::from_value(value)
    }

    /// Decodes an already-parsed document.
    ///
    /// Option values are checked before the structure, so a bad value is a
    /// [`SiteError::Configuration`] naming its full path (`anchor.placement`)
    /// while unknown keys and wrong shapes are [`SiteError::ConfigFormat`].
    /// An empty document gives the defaults.
    pub fn from_value(value: Value) -> Result<Self, SiteError> {
        let value = match value {
            Value::Null => Value::Object(Default::default()),
            value => value,
        };
        check_options(&value)?;

        let config: Self =
            serde_json::from_value(value).map_err(|err| SiteError::ConfigFormat(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file; `.json` files are JSON, anything else YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::debug!("Loading pipeline config from {}", path.display());

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Checks constraints the option types cannot express.
    pub fn validate(&self) -> Result<(), SiteError> {
        if let Some(toc) = &self.toc {
            toc.validate()?;
        }
        Ok(())
    }
}

fn check_options(value: &Value) -> Result<(), ConfigurationError> {
    check_choice::<Placement>(value, "/anchor/placement")?;
    check_choice::<ListType>(value, "/toc/listType")?;
    check_levels(value, "/anchor/levels", "anchor.levels")?;
    check_levels(value, "/toc/includeLevels", "toc.includeLevels")?;
    Ok(())
}

/// Runs the value at `pointer` through the option's own parser.
fn check_choice<T>(value: &Value, pointer: &str) -> Result<(), ConfigurationError>
where
    T: FromStr<Err = ConfigurationError>,
{
    match value.pointer(pointer) {
        Some(Value::String(choice)) => choice.parse::<T>().map(drop),
        Some(other) => other.to_string().parse::<T>().map(drop),
        None => Ok(()),
    }
}

fn check_levels(value: &Value, pointer: &str, option: &str) -> Result<(), ConfigurationError> {
    let levels = match value.pointer(pointer) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(levels)) => levels,
        Some(other) => {
            return Err(ConfigurationError::new(
                option,
                other.to_string(),
                ACCEPTED_LEVELS,
            ));
        }
    };

    let levels = levels
        .iter()
        .map(|level| {
            level.as_i64().ok_or_else(|| {
                ConfigurationError::new(option, level.to_string(), ACCEPTED_LEVELS)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    HeadingLevels::from_values(option, levels).map(drop)
}
