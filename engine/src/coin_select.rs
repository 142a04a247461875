use crate::fees::FeeModel;
use mcw_core::errors::WalletError;
use mcw_core::output::UnspentOutput;

/// Change smaller than this many times the cost of spending one input is
/// treated as dust worth avoiding.
const DUST_CHANGE_MULTIPLIER: u128 = 10;

/// Result of a selection run. When `sufficient` is false the whole pool
/// was consumed without reaching the target and the caller must raise
/// [`WalletError::InsufficientFunds`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Vec<UnspentOutput>,
    /// Fee in smallest units for the chosen shape, assuming one change
    /// output on top of the destinations.
    pub fee: u128,
    /// Leftover returned to the sender, in smallest units.
    pub change: u128,
    pub sufficient: bool,
}

/// Greedily picks outputs from `pool` until they cover `target` plus the
/// fee for the resulting shape (destinations plus one change output).
///
/// The pool is scanned in ascending amount order. If the leftover change
/// would be nonzero but small enough to be dust, a single lookahead pass
/// adds at most one more output to lift the change above the dust
/// threshold. This is a heuristic, not an optimal solver; it prefers few
/// inputs and never picks the same output twice.
pub fn select(
    pool: &[UnspentOutput],
    target: u64,
    destination_count: usize,
    fee_per_unit: u128,
    model: &FeeModel,
) -> Result<Selection, WalletError> {
    if pool.is_empty() || target == 0 {
        return Err(WalletError::InsufficientFunds);
    }
    let mut sorted: Vec<UnspentOutput> = pool.to_vec();
    sorted.sort_by(|a, b| a.amount.cmp(&b.amount).then_with(|| a.hash.cmp(&b.hash)));

    let target = u128::from(target);
    let mut chosen: Vec<UnspentOutput> = Vec::new();
    let mut sum: u128 = 0;
    let mut fee: u128 = 0;

    for index in 0..sorted.len() {
        let output = sorted[index].clone();
        sum += u128::from(output.amount);
        chosen.push(output);
        fee = model.fee(chosen.len(), destination_count + 1, fee_per_unit);
        if sum < target + fee {
            continue;
        }

        let mut change = sum - target - fee;
        let dust_threshold = DUST_CHANGE_MULTIPLIER * model.input_cost(fee_per_unit);
        if change > 0 && change < dust_threshold {
            // One extra input may push the change clear of the dust zone.
            for extra in &sorted[index + 1..] {
                let next_fee = model.fee(chosen.len() + 1, destination_count + 1, fee_per_unit);
                let next_sum = sum + u128::from(extra.amount);
                if next_sum >= target + next_fee && next_sum - target - next_fee >= dust_threshold
                {
                    chosen.push(extra.clone());
                    sum = next_sum;
                    fee = next_fee;
                    change = sum - target - fee;
                    break;
                }
            }
        }

        return Ok(Selection {
            chosen,
            fee,
            change,
            sufficient: true,
        });
    }

    Ok(Selection {
        chosen: sorted,
        fee,
        change: 0,
        sufficient: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(hash: &str, amount: u64) -> UnspentOutput {
        UnspentOutput {
            hash: hash.to_string(),
            address: "addr".to_string(),
            amount,
            hours: None,
            source_tx: None,
            source_index: None,
        }
    }

    // 1.0, 2.0 and 5.0 coins at 8 decimals.
    fn scenario_pool() -> Vec<UnspentOutput> {
        vec![
            output("a", 100_000_000),
            output("b", 200_000_000),
            output("c", 500_000_000),
        ]
    }

    #[test]
    fn test_scenario_target_between_outputs() {
        // Target 2.5 coins, one destination, 1 unit/byte. The two smallest
        // outputs cover target plus fee; the change (~0.5 coins) is far
        // above the dust threshold so no lookahead happens.
        let model = FeeModel::byte_proportional();
        let selection = select(&scenario_pool(), 250_000_000, 1, 1, &model).expect("selection");
        assert!(selection.sufficient);
        let hashes: Vec<&str> = selection.chosen.iter().map(|o| o.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b"]);
        // fee for 2 inputs, 2 outputs (destination + change).
        assert_eq!(selection.fee, 438);
        assert_eq!(selection.change, 300_000_000 - 250_000_000 - 438);
    }

    #[test]
    fn test_covers_target_plus_fee() {
        let model = FeeModel::byte_proportional();
        let selection = select(&scenario_pool(), 290_000_000, 1, 10, &model).expect("selection");
        assert!(selection.sufficient);
        let total: u128 = selection.chosen.iter().map(|o| u128::from(o.amount)).sum();
        assert!(total >= 290_000_000 + selection.fee);
    }

    #[test]
    fn test_no_duplicates_and_bounded_by_pool() {
        let model = FeeModel::byte_proportional();
        let pool = scenario_pool();
        let selection = select(&pool, 650_000_000, 2, 5, &model).expect("selection");
        assert!(selection.chosen.len() <= pool.len());
        let mut hashes: Vec<&str> = selection.chosen.iter().map(|o| o.hash.as_str()).collect();
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), selection.chosen.len());
    }

    #[test]
    fn test_dust_lookahead_adds_one_output() {
        let model = FeeModel::byte_proportional();
        // Dust threshold at 100 units/byte is 180_000. The first output
        // alone leaves change of 74_200, inside the dust zone; the
        // lookahead must pull in exactly one more output.
        let pool = vec![output("a", 200_000), output("b", 400_000)];
        let selection = select(&pool, 100_000, 1, 100, &model).expect("selection");
        assert!(selection.sufficient);
        assert_eq!(selection.chosen.len(), 2);
        assert!(selection.change >= 100 * 1800);
    }

    #[test]
    fn test_dust_change_kept_when_pool_is_exhausted() {
        let model = FeeModel::byte_proportional();
        // Both outputs are needed to reach the target and the change is
        // still dusty, but there is nothing left to look ahead to; the
        // dusty change is kept.
        let pool = vec![output("a", 50_000), output("b", 200_000)];
        let selection = select(&pool, 150_000, 1, 100, &model).expect("selection");
        assert!(selection.sufficient);
        assert_eq!(selection.chosen.len(), 2);
        assert_eq!(selection.change, 250_000 - 150_000 - selection.fee);
        assert!(selection.change < 100 * 1800);
    }

    #[test]
    fn test_exhausted_pool_reported_insufficient() {
        let model = FeeModel::byte_proportional();
        let selection = select(&scenario_pool(), 900_000_000, 1, 1, &model).expect("selection");
        assert!(!selection.sufficient);
        assert_eq!(selection.chosen.len(), 3);
    }

    #[test]
    fn test_empty_pool_and_zero_target_rejected() {
        let model = FeeModel::byte_proportional();
        assert!(matches!(
            select(&[], 1000, 1, 1, &model),
            Err(WalletError::InsufficientFunds)
        ));
        assert!(matches!(
            select(&scenario_pool(), 0, 1, 1, &model),
            Err(WalletError::InsufficientFunds)
        ));
    }

    #[test]
    fn test_node_provided_model_ignores_fee() {
        // Hour-bearing chains have no local fee; selection reduces to
        // covering the target alone.
        let selection =
            select(&scenario_pool(), 100_000_000, 1, 0, &FeeModel::NodeProvided).expect("selection");
        assert!(selection.sufficient);
        assert_eq!(selection.chosen.len(), 1);
        assert_eq!(selection.fee, 0);
        assert_eq!(selection.change, 0);
    }
}
