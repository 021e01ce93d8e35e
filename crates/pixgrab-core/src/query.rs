//! Keyword query: what to search for and how many results to aim for.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Content filter applied by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Safe,
    R18,
    All,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Safe => "safe",
            Mode::R18 => "r18",
            Mode::All => "all",
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(Mode::Safe),
            "r18" => Ok(Mode::R18),
            "all" => Ok(Mode::All),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result ordering: by popularity (`popular_d`) or by recency (`date_d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Popular,
    #[default]
    Recent,
}

impl Order {
    /// `true` selects popularity ordering.
    pub fn from_popular(popular: bool) -> Self {
        if popular {
            Order::Popular
        } else {
            Order::Recent
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Order::Popular => "popular_d",
            Order::Recent => "date_d",
        }
    }
}

/// Immutable search request for one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordQuery {
    keyword: String,
    order: Order,
    mode: Mode,
    target_count: usize,
}

impl KeywordQuery {
    /// Validates `mode` and `target_count`; no I/O happens here.
    pub fn new(
        keyword: impl Into<String>,
        popular: bool,
        mode: &str,
        target_count: usize,
    ) -> Result<Self, ConfigError> {
        let mode = mode.parse::<Mode>()?;
        if target_count == 0 {
            return Err(ConfigError::NonPositiveTarget);
        }
        Ok(Self {
            keyword: keyword.into(),
            order: Order::from_popular(popular),
            mode,
            target_count,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }
}
