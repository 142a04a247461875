/// Default gas limit for a plain value transfer on account-based chains.
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// How the fee of a candidate transaction shape is computed. One model per
/// coin family, chosen when the family's operators are built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeeModel {
    /// Fee grows with the serialized size estimate:
    /// `(inputs * input_size + outputs * output_size + overhead) * rate`.
    ByteProportional {
        input_size: u64,
        output_size: u64,
        overhead: u64,
    },
    /// `gas_limit * gas_price`, for account-based chains.
    GasProportional { gas_limit: u64 },
    /// No local fee model. The node computes the real fee (burned hours)
    /// while building the transaction; locally the fee is always zero.
    NodeProvided,
}

impl FeeModel {
    /// The byte-proportional model with the conventional size estimates
    /// for legacy pay-to-pubkey-hash inputs and outputs.
    #[must_use]
    pub fn byte_proportional() -> Self {
        FeeModel::ByteProportional {
            input_size: 180,
            output_size: 34,
            overhead: 10,
        }
    }

    /// Fee in smallest units for a transaction with the given shape.
    /// `fee_per_unit` is the rate in the model's unit: smallest units per
    /// byte, or gas price in wei. Callers clamp the rate to the network
    /// minimum before calling.
    #[must_use]
    pub fn fee(&self, inputs: usize, outputs: usize, fee_per_unit: u128) -> u128 {
        match self {
            FeeModel::ByteProportional {
                input_size,
                output_size,
                overhead,
            } => {
                let size = inputs as u128 * u128::from(*input_size)
                    + outputs as u128 * u128::from(*output_size)
                    + u128::from(*overhead);
                size * fee_per_unit
            }
            FeeModel::GasProportional { gas_limit } => u128::from(*gas_limit) * fee_per_unit,
            FeeModel::NodeProvided => 0,
        }
    }

    /// Fee attributable to spending one additional input at the given
    /// rate. Drives the dust-avoidance threshold in coin selection; zero
    /// for models where input count does not change the fee.
    #[must_use]
    pub fn input_cost(&self, fee_per_unit: u128) -> u128 {
        match self {
            FeeModel::ByteProportional { input_size, .. } => {
                u128::from(*input_size) * fee_per_unit
            }
            FeeModel::GasProportional { .. } | FeeModel::NodeProvided => 0,
        }
    }
}

/// Suggested fee rates at five urgency tiers, in the family's fee unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecommendedFees {
    pub very_low: u128,
    pub low: u128,
    pub normal: u128,
    pub high: u128,
    pub very_high: u128,
}

impl RecommendedFees {
    /// Builds the tier set from four node estimates; the very-high tier is
    /// the high estimate plus 10%.
    #[must_use]
    pub fn from_tiers(very_low: u128, low: u128, normal: u128, high: u128) -> Self {
        RecommendedFees {
            very_low,
            low,
            normal,
            high,
            very_high: high + high / 10,
        }
    }

    /// A single rate for families where the node advertises one price.
    #[must_use]
    pub fn uniform(rate: u128) -> Self {
        RecommendedFees {
            very_low: rate,
            low: rate,
            normal: rate,
            high: rate,
            very_high: rate,
        }
    }
}
