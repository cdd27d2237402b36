//! Run configuration for 1D nesting.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kerf width used when none is configured.
pub const DEFAULT_KERF_WIDTH: u64 = 2;

/// Solver time limit used when none is configured, in milliseconds.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 5000;

/// Secondary objective used to break ties between equally-valued optima.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TieBreak {
    /// Accept whichever optimum the solver finds first.
    #[default]
    None,
    /// Among optima, use as few stock pieces as possible.
    FewestPieces,
    /// Among optima, consume as little offcut length as possible so the
    /// longer offcuts stay in stock.
    KeepLongestOffcuts,
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::FewestPieces => write!(f, "fewest-pieces"),
            Self::KeepLongestOffcuts => write!(f, "keep-longest-offcuts"),
        }
    }
}

/// Input of one nesting run.
///
/// Lengths are signed so that invalid input can be represented and rejected
/// by [`Inventory::from_config`](crate::inventory::Inventory::from_config)
/// with a proper error instead of failing at parse time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NestingConfig {
    /// Required parts, id → length.
    pub parts: BTreeMap<String, i64>,

    /// Reusable offcuts, id → length.
    pub existing_offcuts: BTreeMap<String, i64>,

    /// Purchasable new stock, id → length.
    pub new_stock: BTreeMap<String, i64>,

    /// Material lost per saw cut (None = [`DEFAULT_KERF_WIDTH`]).
    pub kerf_width: Option<u64>,

    /// Solver time limit in milliseconds (None = [`DEFAULT_TIME_LIMIT_MS`], 0 = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Secondary objective among equally-valued optima.
    pub tie_break: TieBreak,

    /// Whether to order the use of interchangeable stock pieces.
    pub symmetry_breaking: bool,
}

impl Default for NestingConfig {
    fn default() -> Self {
        Self {
            parts: BTreeMap::new(),
            existing_offcuts: BTreeMap::new(),
            new_stock: BTreeMap::new(),
            kerf_width: None,
            time_limit_ms: None,
            tie_break: TieBreak::None,
            symmetry_breaking: true,
        }
    }
}

impl NestingConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// The workshop sample: four parts, three short offcuts, four new lengths.
    pub fn sample() -> Self {
        Self::new()
            .with_part("p_00001", 1050)
            .with_part("p_00002", 500)
            .with_part("p_00003", 9000)
            .with_part("p_00004", 8500)
            .with_offcut("os_00001", 450)
            .with_offcut("os_00002", 300)
            .with_offcut("os_00003", 500)
            .with_new_stock("ns_00001", 10000)
            .with_new_stock("ns_00002", 10000)
            .with_new_stock("ns_00003", 10000)
            .with_new_stock("ns_00004", 10000)
    }

    /// Adds a required part.
    pub fn with_part(mut self, id: impl Into<String>, length: i64) -> Self {
        self.parts.insert(id.into(), length);
        self
    }

    /// Adds an existing offcut.
    pub fn with_offcut(mut self, id: impl Into<String>, length: i64) -> Self {
        self.existing_offcuts.insert(id.into(), length);
        self
    }

    /// Adds a new stock length.
    pub fn with_new_stock(mut self, id: impl Into<String>, length: i64) -> Self {
        self.new_stock.insert(id.into(), length);
        self
    }

    /// Sets the kerf width.
    pub fn with_kerf_width(mut self, width: u64) -> Self {
        self.kerf_width = Some(width);
        self
    }

    /// Sets the solver time limit in milliseconds (0 = unlimited).
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the tie-break objective.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Enables or disables symmetry breaking between interchangeable stock.
    pub fn with_symmetry_breaking(mut self, enable: bool) -> Self {
        self.symmetry_breaking = enable;
        self
    }

    /// Kerf width in effect.
    pub fn effective_kerf_width(&self) -> u64 {
        self.kerf_width.unwrap_or(DEFAULT_KERF_WIDTH)
    }

    /// Time limit in effect.
    pub fn effective_time_limit_ms(&self) -> u64 {
        self.time_limit_ms.unwrap_or(DEFAULT_TIME_LIMIT_MS)
    }
}
