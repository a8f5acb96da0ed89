//! Editor configuration.
//!
//! Read from TOML. A local file is layered over a global one before
//! deserializing, so a local `[highlight]` table only needs to name the keys
//! it changes:
//!
//! ```toml
//! indent-width = 2
//!
//! [highlight.colors]
//! keyword = "#c678dd"
//! ```

use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  auto_pairs::AutoPairs,
  comment::DEFAULT_COMMENT_TOKEN,
  highlight::HighlightConfig,
};

/// How many levels of nested tables are merged rather than replaced.
const MERGE_DEPTH: usize = 3;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("bad config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("failed to serialize default config: {0}")]
  Serialize(#[from] toml::ser::Error),
  #[error("invalid value for `{key}`: {reason}")]
  Invalid {
    key:    &'static str,
    reason: &'static str,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EditorConfig {
  /// Columns per indentation level.
  pub indent_width:             usize,
  pub comment_token:            String,
  pub auto_pairs:               AutoPairs,
  pub tick_interval_ms:         u64,
  /// Quiet time after the last edit before deferred work runs.
  pub idle_threshold_ms:        u64,
  /// Minimum time between two appearances of the completion popup.
  pub popup_reshow_interval_ms: u64,
  pub completion_debounce_ms:   u64,
  /// Buffers at least this large get no completion requests or tooltips.
  pub max_insight_chars:        usize,
  pub highlight:                HighlightConfig,
}

impl Default for EditorConfig {
  fn default() -> Self {
    Self {
      indent_width:             4,
      comment_token:            DEFAULT_COMMENT_TOKEN.to_owned(),
      auto_pairs:               AutoPairs::default(),
      tick_interval_ms:         300,
      idle_threshold_ms:        500,
      popup_reshow_interval_ms: 1000,
      completion_debounce_ms:   20,
      max_insight_chars:        1_200_000,
      highlight:                HighlightConfig::default(),
    }
  }
}

impl EditorConfig {
  /// Parses the global and local config files and layers them, local last,
  /// over the defaults. Either file may be missing.
  pub fn load(global: Option<&str>, local: Option<&str>) -> Result<Self> {
    let layers = [global, local]
      .into_iter()
      .flatten()
      .map(toml::from_str::<toml::Value>)
      .collect::<std::result::Result<Vec<_>, _>>()?;
    if layers.is_empty() {
      return Ok(Self::default());
    }

    let default = toml::Value::try_from(Self::default())?;
    let config: Self = layers
      .into_iter()
      .fold(default, |acc, layer| merge_toml_values(acc, layer, MERGE_DEPTH))
      .try_into()?;

    config.validate().inspect_err(|err| {
      tracing::warn!(%err, "rejecting editor config");
    })?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.indent_width == 0 {
      return Err(ConfigError::Invalid {
        key:    "indent-width",
        reason: "must be at least 1",
      });
    }
    if self.tick_interval_ms == 0 {
      return Err(ConfigError::Invalid {
        key:    "tick-interval-ms",
        reason: "must be at least 1",
      });
    }
    Ok(())
  }

  pub fn tick_interval(&self) -> Duration {
    Duration::from_millis(self.tick_interval_ms)
  }

  pub fn idle_threshold(&self) -> Duration {
    Duration::from_millis(self.idle_threshold_ms)
  }

  pub fn popup_reshow_interval(&self) -> Duration {
    Duration::from_millis(self.popup_reshow_interval_ms)
  }

  pub fn completion_debounce(&self) -> Duration {
    Duration::from_millis(self.completion_debounce_ms)
  }
}

/// Merges `right` into `left`. Tables are merged key by key and arrays of
/// tables by their `name` entry, down to `merge_depth` levels. Below that,
/// and for any other value, `right` wins.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  fn get_name(v: &Value) -> Option<&str> {
    v.get("name").and_then(Value::as_str)
  }

  match (left, right) {
    (Value::Array(mut left_items), Value::Array(right_items)) if merge_depth > 0 => {
      // Only named entries merge; plain arrays such as auto-pairs are replaced.
      if !right_items.iter().all(|item| get_name(item).is_some()) {
        return Value::Array(right_items);
      }
      for rvalue in right_items {
        let lvalue = get_name(&rvalue)
          .and_then(|rname| left_items.iter().position(|v| get_name(v) == Some(rname)))
          .map(|lpos| left_items.remove(lpos));
        let merged = match lvalue {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_items.push(merged);
      }
      Value::Array(left_items)
    },
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (key, rvalue) in right_map {
        let merged = match left_map.remove(&key) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(key, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}
