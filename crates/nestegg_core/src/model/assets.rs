//! The fixed five-asset universe
//!
//! Every per-asset quantity in the engine (expected returns, volatilities,
//! allocations, jump tables, floors) is keyed by [`Asset`]. Vectors and
//! matrices always use the order of [`Asset::ALL`].

use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

pub const ASSET_COUNT: usize = 5;

/// Column vector with one entry per asset, in [`Asset::ALL`] order
pub type AssetVector = SVector<f64, ASSET_COUNT>;

/// Square matrix over the asset universe, in [`Asset::ALL`] order
pub type AssetMatrix = SMatrix<f64, ASSET_COUNT, ASSET_COUNT>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Stocks,
    Bonds,
    Crypto,
    Cds,
    Cash,
}

impl Asset {
    pub const ALL: [Asset; ASSET_COUNT] = [
        Asset::Stocks,
        Asset::Bonds,
        Asset::Crypto,
        Asset::Cds,
        Asset::Cash,
    ];

    /// Position of this asset in vectors, matrices and tensor rows
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Asset::Stocks => "stocks",
            Asset::Bonds => "bonds",
            Asset::Crypto => "crypto",
            Asset::Cds => "cds",
            Asset::Cash => "cash",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per asset class.
///
/// Serialises as a mapping keyed by asset name. Every key is required and
/// unknown keys are rejected, so a deserialised map always covers exactly the
/// fixed universe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetMap<T> {
    pub stocks: T,
    pub bonds: T,
    pub crypto: T,
    pub cds: T,
    pub cash: T,
}

impl<T> AssetMap<T> {
    #[must_use]
    pub const fn new(stocks: T, bonds: T, crypto: T, cds: T, cash: T) -> Self {
        Self {
            stocks,
            bonds,
            crypto,
            cds,
            cash,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Asset) -> T) -> Self {
        Self {
            stocks: f(Asset::Stocks),
            bonds: f(Asset::Bonds),
            crypto: f(Asset::Crypto),
            cds: f(Asset::Cds),
            cash: f(Asset::Cash),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Asset, &T)> {
        Asset::ALL.into_iter().map(move |asset| (asset, &self[asset]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Asset, &T) -> U) -> AssetMap<U> {
        AssetMap::from_fn(|asset| f(asset, &self[asset]))
    }
}

impl<T> Index<Asset> for AssetMap<T> {
    type Output = T;

    fn index(&self, asset: Asset) -> &T {
        match asset {
            Asset::Stocks => &self.stocks,
            Asset::Bonds => &self.bonds,
            Asset::Crypto => &self.crypto,
            Asset::Cds => &self.cds,
            Asset::Cash => &self.cash,
        }
    }
}

impl<T> IndexMut<Asset> for AssetMap<T> {
    fn index_mut(&mut self, asset: Asset) -> &mut T {
        match asset {
            Asset::Stocks => &mut self.stocks,
            Asset::Bonds => &mut self.bonds,
            Asset::Crypto => &mut self.crypto,
            Asset::Cds => &mut self.cds,
            Asset::Cash => &mut self.cash,
        }
    }
}

impl AssetMap<f64> {
    #[must_use]
    pub fn to_vector(&self) -> AssetVector {
        AssetVector::from_fn(|i, _| self[Asset::ALL[i]])
    }

    #[must_use]
    pub fn from_vector(v: &AssetVector) -> Self {
        Self::from_fn(|asset| v[asset.index()])
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| *v).sum()
    }
}

impl AssetMap<AssetMap<f64>> {
    /// Row `i`, column `j` is `self[ALL[i]][ALL[j]]`
    #[must_use]
    pub fn to_matrix(&self) -> AssetMatrix {
        AssetMatrix::from_fn(|i, j| self[Asset::ALL[i]][Asset::ALL[j]])
    }
}
