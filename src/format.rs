use std::sync::Arc;

use serde::Deserialize;

use crate::{
    error::{self, Error},
    utils::floor_step,
};

/// Turns a tick value into the text shown on the axis. Display only, plotted values
/// never go through it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formatter {
    #[default]
    AsIs,
    /// `floor(value / scale)` followed by `suffix`, e.g. seconds shown as `"2h"`.
    DivideSuffix { scale: f64, suffix: String },
    /// `1500 -> "1k"`, values under a thousand are shown as plain integers.
    Thousands,
    #[serde(skip)]
    Custom(CustomFormatter),
}

#[derive(Clone)]
pub struct CustomFormatter(Arc<dyn Fn(f64) -> String + Send + Sync>);
opaque_debug::implement!(CustomFormatter);

impl Formatter {
    pub fn divide_suffix(scale: f64, suffix: impl Into<String>) -> Self {
        Self::DivideSuffix {
            scale,
            suffix: suffix.into(),
        }
    }

    pub fn seconds_as_hours() -> Self {
        Self::divide_suffix(3600., "h")
    }

    pub fn custom(f: impl Fn(f64) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(CustomFormatter(Arc::new(f)))
    }

    pub fn validate(&self) -> error::Result<()> {
        if let Self::DivideSuffix { scale, .. } = self {
            if !scale.is_finite() || *scale <= 0. {
                return Err(Error::InvalidFormatter(format!(
                    "divide_suffix scale must be a positive number, got {scale}"
                )));
            }
        }
        Ok(())
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            Self::AsIs => value.to_string(),
            Self::DivideSuffix { scale, suffix } => {
                format!("{}{}", floor_step(value, *scale) as i64, suffix)
            }
            Self::Thousands => {
                if value >= 1000. {
                    format!("{}k", (value / 1000.) as i64)
                } else {
                    format!("{}", value as i64)
                }
            }
            Self::Custom(CustomFormatter(f)) => (**f)(value),
        }
    }
}
