//! Jump-parameter tables and tail toggles
//!
//! Each generator variant ships a versioned [`JumpTable`]: per-asset Kou
//! parameters, the market co-jump, return bounds and the multipliers the
//! three toggle axes apply. Tables are plain data so a recalibration shows up
//! as a diff of numbers, and [`JumpTable::adjusted`] can be tested without
//! drawing anything.

use rand::Rng;
use rand_distr::{Distribution, Exp1};
use serde::{Deserialize, Serialize};

use crate::model::{Asset, AssetMap, AssetVector, CapitalMarketAssumptions};

/// Smallest exponential scale used when sizing a jump
const MIN_JUMP_SCALE: f64 = 1e-12;

/// Double-exponential (Kou) jump process for one asset or the market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KouParams {
    /// Annual jump intensity (lambda)
    pub intensity: f64,
    /// Probability that a jump is positive
    pub p_up: f64,
    /// Mean size of a positive jump
    pub eta_up: f64,
    /// Mean size of a negative jump (applied with a minus sign)
    pub eta_down: f64,
}

impl KouParams {
    pub const NONE: KouParams = KouParams::new(0.0, 0.50, 0.0, 0.0);

    #[must_use]
    pub const fn new(intensity: f64, p_up: f64, eta_up: f64, eta_down: f64) -> Self {
        Self {
            intensity,
            p_up,
            eta_up,
            eta_down,
        }
    }

    /// Draw one signed jump size
    pub fn sample_size<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let up = rng.random::<f64>() < self.p_up;
        let e: f64 = Exp1.sample(rng);
        if up {
            e * self.eta_up.max(MIN_JUMP_SCALE)
        } else {
            -e * self.eta_down.max(MIN_JUMP_SCALE)
        }
    }
}

/// Market-wide co-jump: full loading on `affected`, `bond_beta` on bonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketJump {
    pub params: KouParams,
    pub affected: Vec<Asset>,
    pub bond_beta: f64,
}

impl MarketJump {
    /// How much of one market jump lands on each asset
    #[must_use]
    pub fn loadings(&self) -> AssetVector {
        let mut loadings = AssetVector::zeros();
        for asset in &self.affected {
            loadings[asset.index()] += 1.0;
        }
        loadings[Asset::Bonds.index()] += self.bond_beta;
        loadings
    }
}

/// Arithmetic-space return bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnBounds {
    pub floor: AssetMap<f64>,
    /// Replaces `floor` under extreme magnitude
    pub extreme_floor: AssetMap<f64>,
    pub cap: Option<AssetMap<f64>>,
}

impl ReturnBounds {
    #[must_use]
    pub fn lower(&self, magnitude: TailMagnitude) -> AssetVector {
        match magnitude {
            TailMagnitude::Standard => self.floor.to_vector(),
            TailMagnitude::Extreme => self.extreme_floor.to_vector(),
        }
    }

    #[must_use]
    pub fn upper(&self) -> Option<AssetVector> {
        self.cap.as_ref().map(AssetMap::to_vector)
    }
}

/// Multipliers the toggle axes apply to a table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToggleCalibration {
    /// Jump-size multiplier under extreme magnitude
    pub extreme_size_scale: f64,
    /// Intensity multiplier under high frequency
    pub high_intensity_scale: f64,
    /// Extra market `eta_down` multiplier under high frequency
    pub high_market_down_scale: f64,
    /// Shift of `p_up` for positive skew (negated for negative skew)
    pub skew_shift: f64,
    pub negative_skew_down_scale: f64,
    pub positive_skew_down_scale: f64,
    pub positive_skew_up_scale: f64,
    /// Market base `eta_down` ceiling while a scripted shock is active
    pub coordinated_market_down_cap: Option<f64>,
}

const P_UP_RANGE: (f64, f64) = (0.05, 0.95);

/// A versioned, self-contained jump calibration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JumpTable {
    pub version: &'static str,
    pub per_asset: AssetMap<KouParams>,
    pub market: MarketJump,
    pub bounds: ReturnBounds,
    /// Per asset, per year; `None` leaves the Poisson count uncapped
    pub max_idiosyncratic_jumps: Option<u32>,
    pub calibration: ToggleCalibration,
}

impl JumpTable {
    /// Log-return scale jumps for the log-safe generator
    #[must_use]
    pub fn kou_logsafe() -> Self {
        let floor = AssetMap::new(-0.60, -0.25, -0.85, -0.05, -0.02);
        Self {
            version: "kou-logsafe-v2",
            per_asset: AssetMap::new(
                KouParams::new(0.20, 0.40, 0.030, 0.075),
                KouParams::new(0.03, 0.50, 0.006, 0.012),
                KouParams::new(0.90, 0.45, 0.140, 0.170),
                KouParams::NONE,
                KouParams::NONE,
            ),
            market: MarketJump {
                params: KouParams::new(0.25, 0.40, 0.055, 0.075),
                affected: vec![Asset::Stocks, Asset::Crypto],
                bond_beta: 0.10,
            },
            bounds: ReturnBounds {
                floor,
                extreme_floor: AssetMap {
                    stocks: -0.70,
                    ..floor
                },
                cap: None,
            },
            max_idiosyncratic_jumps: Some(1),
            calibration: ToggleCalibration {
                extreme_size_scale: 1.30,
                high_intensity_scale: 1.50,
                high_market_down_scale: 1.10,
                skew_shift: 0.05,
                negative_skew_down_scale: 1.10,
                positive_skew_down_scale: 0.95,
                positive_skew_up_scale: 0.95,
                coordinated_market_down_cap: Some(0.070),
            },
        }
    }

    /// Arithmetic-return scale jumps for the research generator
    #[must_use]
    pub fn research() -> Self {
        let floor = AssetMap::new(-0.60, -0.25, -0.85, -0.05, -0.02);
        Self {
            version: "research-v1",
            per_asset: AssetMap::new(
                KouParams::new(0.15, 0.35, 0.04, 0.08),
                KouParams::new(0.05, 0.50, 0.01, 0.02),
                KouParams::new(0.50, 0.40, 0.15, 0.20),
                KouParams::NONE,
                KouParams::NONE,
            ),
            market: MarketJump {
                params: KouParams::new(0.25, 0.35, 0.05, 0.08),
                affected: vec![Asset::Stocks, Asset::Crypto],
                bond_beta: 0.20,
            },
            bounds: ReturnBounds {
                floor,
                extreme_floor: AssetMap {
                    stocks: -0.70,
                    ..floor
                },
                cap: Some(AssetMap::new(1.00, 0.35, 3.00, 0.10, 0.08)),
            },
            max_idiosyncratic_jumps: None,
            calibration: ToggleCalibration {
                extreme_size_scale: 1.6,
                high_intensity_scale: 2.0,
                high_market_down_scale: 1.0,
                skew_shift: 0.15,
                negative_skew_down_scale: 1.0,
                positive_skew_down_scale: 1.0,
                positive_skew_up_scale: 1.0,
                coordinated_market_down_cap: None,
            },
        }
    }

    /// Parameters in effect once the toggles are applied
    #[must_use]
    pub fn adjusted(&self, toggles: &TailToggles) -> ActiveJumps {
        let cal = &self.calibration;
        let size = match toggles.magnitude {
            TailMagnitude::Standard => 1.0,
            TailMagnitude::Extreme => cal.extreme_size_scale,
        };
        let (intensity, market_down) = match toggles.frequency {
            TailFrequency::Standard => (1.0, 1.0),
            TailFrequency::High => (cal.high_intensity_scale, cal.high_market_down_scale),
        };
        let (shift, up_scale, down_scale) = match toggles.skew {
            TailSkew::Negative => (-cal.skew_shift, 1.0, cal.negative_skew_down_scale),
            TailSkew::Neutral => (0.0, 1.0, 1.0),
            TailSkew::Positive => (
                cal.skew_shift,
                cal.positive_skew_up_scale,
                cal.positive_skew_down_scale,
            ),
        };

        let adjust = |p: &KouParams, eta_down_base: f64, extra_down: f64| KouParams {
            intensity: p.intensity * intensity,
            p_up: (p.p_up + shift).clamp(P_UP_RANGE.0, P_UP_RANGE.1),
            eta_up: p.eta_up * size * up_scale,
            eta_down: eta_down_base * size * extra_down * down_scale,
        };

        let market_down_base = match (toggles.black_swan_active, cal.coordinated_market_down_cap) {
            (true, Some(cap)) => self.market.params.eta_down.min(cap),
            _ => self.market.params.eta_down,
        };

        ActiveJumps {
            per_asset: self.per_asset.map(|_, p| adjust(p, p.eta_down, 1.0)),
            market: MarketJump {
                params: adjust(&self.market.params, market_down_base, market_down),
                affected: self.market.affected.clone(),
                bond_beta: self.market.bond_beta,
            },
            floor: self.bounds.lower(toggles.magnitude),
            cap: self.bounds.upper(),
            max_idiosyncratic_jumps: self.max_idiosyncratic_jumps,
        }
    }
}

/// A [`JumpTable`] after toggles, ready for sampling
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveJumps {
    pub per_asset: AssetMap<KouParams>,
    pub market: MarketJump,
    pub floor: AssetVector,
    pub cap: Option<AssetVector>,
    pub max_idiosyncratic_jumps: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailMagnitude {
    #[default]
    Standard,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailFrequency {
    #[default]
    Standard,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailSkew {
    Negative,
    #[default]
    Neutral,
    Positive,
}

/// The three toggle axes plus the scripted-shock coordination flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TailToggles {
    pub magnitude: TailMagnitude,
    pub frequency: TailFrequency,
    pub skew: TailSkew,
    pub black_swan_active: bool,
}

impl TailToggles {
    /// Read the toggles off the scenario's tail dials.
    ///
    /// `t_df <= 5` selects extreme magnitude, `tail_prob >= 0.04` high
    /// frequency, and `tail_boost` outside `[0.9, 1.1]` a skew.
    #[must_use]
    pub fn from_assumptions(cma: &CapitalMarketAssumptions, black_swan_active: bool) -> Self {
        let magnitude = if cma.t_df <= 5.0 {
            TailMagnitude::Extreme
        } else {
            TailMagnitude::Standard
        };
        let frequency = if cma.tail_prob >= 0.04 {
            TailFrequency::High
        } else {
            TailFrequency::Standard
        };
        let skew = if cma.tail_boost < 0.9 {
            TailSkew::Negative
        } else if cma.tail_boost > 1.1 {
            TailSkew::Positive
        } else {
            TailSkew::Neutral
        };
        Self {
            magnitude,
            frequency,
            skew,
            black_swan_active,
        }
    }
}

/// Boosted market-jump intensity for the first `years` simulated years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceRisk {
    pub years: usize,
    /// 1.0 or below disables the boost
    pub boost: f64,
    pub max_intensity: f64,
}

impl Default for SequenceRisk {
    fn default() -> Self {
        Self {
            years: 10,
            boost: 1.1,
            max_intensity: 0.35,
        }
    }
}

impl SequenceRisk {
    pub const DISABLED: SequenceRisk = SequenceRisk {
        years: 0,
        boost: 1.0,
        max_intensity: 0.35,
    };

    /// Market intensity for simulated year index `year`
    #[must_use]
    pub fn intensity(&self, base: f64, year: usize) -> f64 {
        if self.boost > 1.0 && year < self.years {
            (base * self.boost).min(self.max_intensity)
        } else {
            base
        }
    }
}
