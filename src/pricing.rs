//! Static per-model pricing table
//!
//! Pricing is selected by case-insensitive substring match on the model
//! name: "opus" maps to the premium tier, "haiku" to the economy tier, and
//! everything else (including an absent model name) to the default
//! sonnet-class tier. Rates are USD per million tokens.

use crate::types::TokenCounts;
use serde::{Deserialize, Serialize};

/// Per-million-token rates for one pricing tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    /// USD per million input tokens
    pub input_per_million: f64,
    /// USD per million output tokens
    pub output_per_million: f64,
    /// USD per million cache creation tokens
    pub cache_creation_per_million: f64,
    /// USD per million cache read tokens
    pub cache_read_per_million: f64,
}

/// Premium tier, matched by "opus"
pub const OPUS: PricingTier = PricingTier {
    input_per_million: 15.0,
    output_per_million: 75.0,
    cache_creation_per_million: 18.75,
    cache_read_per_million: 1.50,
};

/// Economy tier, matched by "haiku"
pub const HAIKU: PricingTier = PricingTier {
    input_per_million: 0.25,
    output_per_million: 1.25,
    cache_creation_per_million: 0.30,
    cache_read_per_million: 0.03,
};

/// Default tier, used for every other model and for absent model names
pub const SONNET: PricingTier = PricingTier {
    input_per_million: 3.0,
    output_per_million: 15.0,
    cache_creation_per_million: 3.75,
    cache_read_per_million: 0.30,
};

impl PricingTier {
    /// Select the pricing tier for a model name
    pub fn for_model(model: Option<&str>) -> &'static PricingTier {
        let Some(model) = model else { return &SONNET };
        let model = model.to_lowercase();

        if model.contains("opus") {
            &OPUS
        } else if model.contains("haiku") {
            &HAIKU
        } else {
            &SONNET
        }
    }

    /// Estimated cost in USD for a token breakdown at this tier
    ///
    /// Linear in every token category: doubling all counts doubles the cost.
    pub fn cost(&self, tokens: &TokenCounts) -> f64 {
        const PER_MILLION: f64 = 1_000_000.0;

        tokens.input_tokens as f64 / PER_MILLION * self.input_per_million
            + tokens.output_tokens as f64 / PER_MILLION * self.output_per_million
            + tokens.cache_creation_tokens as f64 / PER_MILLION * self.cache_creation_per_million
            + tokens.cache_read_tokens as f64 / PER_MILLION * self.cache_read_per_million
    }
}
