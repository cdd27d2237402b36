//! Parts, stock pieces and the merged inventory.
//!
//! Every [`StockPiece`] carries its [`Provenance`] explicitly, so offcuts and
//! new stock live in one collection and a colliding identifier is rejected
//! at construction instead of silently overwriting a piece.

use crate::config::NestingConfig;
use std::collections::{BTreeMap, HashSet};
use u_cutlist_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest length, kerf or length total an inventory accepts.
///
/// The model is solved in `f64`, which represents every integer up to
/// `2^53` exactly. Capacity rows sum part lengths, kerf allowances and a
/// stock length, so that whole sum has to stay within the limit too.
pub const MAX_LENGTH: u64 = 1 << 53;

/// A required linear piece.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Part {
    /// Unique identifier.
    pub id: String,
    /// Required length.
    pub length: u64,
}

impl Part {
    /// Creates a part.
    pub fn new(id: impl Into<String>, length: u64) -> Self {
        Self {
            id: id.into(),
            length,
        }
    }
}

/// Where a stock piece comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Provenance {
    /// Left over from earlier jobs, free to reuse.
    Offcut,
    /// Has to be bought.
    NewStock,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offcut => write!(f, "offcut"),
            Self::NewStock => write!(f, "new stock"),
        }
    }
}

/// A piece of raw material parts can be cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StockPiece {
    /// Unique identifier across the inventory.
    pub id: String,
    /// Available length.
    pub length: u64,
    /// Offcut or new stock.
    pub provenance: Provenance,
}

impl StockPiece {
    /// Creates an existing offcut.
    pub fn offcut(id: impl Into<String>, length: u64) -> Self {
        Self {
            id: id.into(),
            length,
            provenance: Provenance::Offcut,
        }
    }

    /// Creates a new stock length.
    pub fn new_stock(id: impl Into<String>, length: u64) -> Self {
        Self {
            id: id.into(),
            length,
            provenance: Provenance::NewStock,
        }
    }

    /// Objective weight of consuming this piece.
    ///
    /// Offcuts count for half their length (rounded down), new stock for all of it.
    pub fn cost_value(&self) -> u64 {
        match self.provenance {
            Provenance::Offcut => self.length / 2,
            Provenance::NewStock => self.length,
        }
    }

    /// Returns true if this piece is an offcut.
    pub fn is_offcut(&self) -> bool {
        self.provenance == Provenance::Offcut
    }
}

/// Validated parts and stock of one run.
///
/// Only serialisable: an inventory is always built through [`Inventory::new`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Inventory {
    parts: Vec<Part>,
    stock: Vec<StockPiece>,
    kerf_width: u64,
    total_part_length: u64,
}

impl Inventory {
    /// Builds an inventory from already-tagged pieces.
    ///
    /// Fails with [`Error::InvalidInventory`] on a zero length, a repeated id
    /// or a length total beyond [`MAX_LENGTH`].
    pub fn new(parts: Vec<Part>, stock: Vec<StockPiece>, kerf_width: u64) -> Result<Self> {
        let mut part_ids = HashSet::with_capacity(parts.len());
        for part in &parts {
            if part.length == 0 {
                return Err(Error::InvalidInventory(format!(
                    "part '{}' has non-positive length 0",
                    part.id
                )));
            }
            if !part_ids.insert(part.id.as_str()) {
                return Err(Error::InvalidInventory(format!(
                    "duplicate part id '{}'",
                    part.id
                )));
            }
        }

        let mut stock_ids = HashSet::with_capacity(stock.len());
        for piece in &stock {
            if piece.length == 0 {
                return Err(Error::InvalidInventory(format!(
                    "stock '{}' has non-positive length 0",
                    piece.id
                )));
            }
            if !stock_ids.insert(piece.id.as_str()) {
                return Err(Error::InvalidInventory(format!(
                    "duplicate stock id '{}'",
                    piece.id
                )));
            }
        }

        let total_part_length = checked_total(parts.iter().map(|p| p.length))
            .ok_or_else(|| too_long("total part length"))?;
        checked_total(stock.iter().map(|s| s.length))
            .ok_or_else(|| too_long("total stock length"))?;
        let longest_stock = stock.iter().map(|s| s.length).max().unwrap_or(0);

        // Largest magnitude a capacity row reaches: every part plus its kerf
        // allowance on the longest stock piece.
        let kerf_allowance = kerf_width
            .checked_mul(parts.len() as u64)
            .ok_or_else(|| too_long("kerf allowance"))?;
        checked_total([total_part_length, kerf_allowance, longest_stock])
            .ok_or_else(|| too_long("capacity row"))?;

        Ok(Self {
            parts,
            stock,
            kerf_width,
            total_part_length,
        })
    }

    /// Builds an inventory from the three id → length mappings.
    ///
    /// Offcuts come before new stock. Fails with [`Error::InvalidInventory`]
    /// on a non-positive length or an id present in both stock mappings.
    pub fn from_maps(
        parts: &BTreeMap<String, i64>,
        existing_offcuts: &BTreeMap<String, i64>,
        new_stock: &BTreeMap<String, i64>,
        kerf_width: u64,
    ) -> Result<Self> {
        if let Some(id) = existing_offcuts.keys().find(|id| new_stock.contains_key(*id)) {
            return Err(Error::InvalidInventory(format!(
                "stock id '{}' appears both as an offcut and as new stock",
                id
            )));
        }

        let parts = parts
            .iter()
            .map(|(id, &length)| -> Result<Part> {
                Ok(Part::new(id.clone(), positive_length("part", id, length)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let offcuts = existing_offcuts.iter().map(|(id, &length)| -> Result<StockPiece> {
            Ok(StockPiece::offcut(
                id.clone(),
                positive_length("offcut", id, length)?,
            ))
        });
        let new = new_stock.iter().map(|(id, &length)| -> Result<StockPiece> {
            Ok(StockPiece::new_stock(
                id.clone(),
                positive_length("new stock", id, length)?,
            ))
        });
        let stock = offcuts.chain(new).collect::<Result<Vec<_>>>()?;

        Self::new(parts, stock, kerf_width)
    }

    /// Builds an inventory from a run configuration.
    pub fn from_config(config: &NestingConfig) -> Result<Self> {
        Self::from_maps(
            &config.parts,
            &config.existing_offcuts,
            &config.new_stock,
            config.effective_kerf_width(),
        )
    }

    /// Required parts.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// All stock pieces, offcuts first.
    pub fn stock(&self) -> &[StockPiece] {
        &self.stock
    }

    /// Stock pieces tagged as offcuts.
    pub fn offcuts(&self) -> impl Iterator<Item = &StockPiece> {
        self.stock.iter().filter(|s| s.is_offcut())
    }

    /// Stock pieces tagged as new stock.
    pub fn new_stock(&self) -> impl Iterator<Item = &StockPiece> {
        self.stock.iter().filter(|s| !s.is_offcut())
    }

    /// Part by id.
    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Stock piece by id.
    pub fn stock_piece(&self, id: &str) -> Option<&StockPiece> {
        self.stock.iter().find(|s| s.id == id)
    }

    /// Kerf width shared by every cut.
    pub fn kerf_width(&self) -> u64 {
        self.kerf_width
    }

    /// Sum of all part lengths.
    pub fn total_part_length(&self) -> u64 {
        self.total_part_length
    }

    /// Stock id → cost value.
    pub fn cost_values(&self) -> BTreeMap<&str, u64> {
        self.stock
            .iter()
            .map(|s| (s.id.as_str(), s.cost_value()))
            .collect()
    }

    /// Length of the longest stock piece, 0 if there is none.
    pub fn longest_stock(&self) -> u64 {
        self.stock.iter().map(|s| s.length).max().unwrap_or(0)
    }
}

fn positive_length(kind: &str, id: &str, length: i64) -> Result<u64> {
    if length <= 0 {
        return Err(Error::InvalidInventory(format!(
            "{} '{}' has non-positive length {}",
            kind, id, length
        )));
    }
    let length = length as u64;
    if length > MAX_LENGTH {
        return Err(Error::InvalidInventory(format!(
            "{} '{}' has length {} above the limit of {}",
            kind, id, length, MAX_LENGTH
        )));
    }
    Ok(length)
}

/// Sums lengths, `None` once the total passes [`MAX_LENGTH`].
fn checked_total(lengths: impl IntoIterator<Item = u64>) -> Option<u64> {
    lengths
        .into_iter()
        .try_fold(0u64, |acc, len| acc.checked_add(len))
        .filter(|&total| total <= MAX_LENGTH)
}

fn too_long(what: &str) -> Error {
    Error::InvalidInventory(format!("{} exceeds the limit of {}", what, MAX_LENGTH))
}
