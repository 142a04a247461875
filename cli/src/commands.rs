use log::info;
use mcw_core::coins::{Coin, CoinFamily};
use mcw_core::errors::WalletError;
use mcw_core::formatting::{display_amount, parse_amount};
use mcw_core::transaction::{GeneratedTransaction, TransactionDestination};
use mcw_core::wallet::{AddressBase, WalletBase, WalletType};
use mcw_engine::fees::DEFAULT_GAS_LIMIT;
use mcw_engine::operators::{CoinOperators, OperatorManager};
use mcw_engine::spending::{FeeSpec, TransactionSource};
use std::fs;

pub fn load_coins(path: Option<&str>) -> Result<Vec<Coin>, WalletError> {
    match path {
        Some(path) => {
            let data = fs::read_to_string(path).map_err(|e| {
                WalletError::InvalidParameters(format!("cannot read coin list {path}: {e}"))
            })?;
            serde_json::from_str(&data)
                .map_err(|e| WalletError::InvalidParameters(format!("invalid coin list: {e}")))
        }
        None => Ok(mcw_core::coins::default_coins()),
    }
}

pub fn find_coin(coins: &[Coin], symbol: &str) -> Result<Coin, WalletError> {
    coins
        .iter()
        .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
        .cloned()
        .ok_or_else(|| WalletError::InvalidParameters(format!("unknown coin: {symbol}")))
}

pub fn list_coins(coins: &[Coin]) {
    for coin in coins {
        println!(
            "{}\t{}\t{:?}\t{}",
            coin.symbol, coin.name, coin.family, coin.node_url
        );
    }
}

/// A watch-only wallet wrapping the addresses given on the command line.
fn watch_wallet(addresses: Vec<String>) -> WalletBase {
    WalletBase {
        id: "cli".to_string(),
        label: "cli".to_string(),
        encrypted: false,
        is_hardware: false,
        wallet_type: WalletType::XPub,
        addresses: addresses
            .into_iter()
            .map(|address| AddressBase {
                address,
                is_change: false,
            })
            .collect(),
    }
}

pub async fn print_balances(coin: Coin, addresses: Vec<String>) -> Result<(), WalletError> {
    let decimals = coin.decimals;
    let symbol = coin.symbol.clone();
    let operators = CoinOperators::build(coin, vec![watch_wallet(addresses)], None)?;
    if !operators.balance.poll_once().await {
        return Err(WalletError::UnexpectedResponse(
            "balance fetch failed".to_string(),
        ));
    }
    let wallets = operators.balance.subscribe_wallets().borrow().clone();
    for wallet in &wallets {
        for address in &wallet.addresses {
            println!(
                "{}\t{} {symbol}\t({} pending)",
                address.address,
                display_amount(address.balance.confirmed, decimals),
                display_amount(address.balance.predicted, decimals),
            );
        }
        println!(
            "total\t{} {symbol} confirmed, {} {symbol} spendable",
            display_amount(wallet.balance.confirmed, decimals),
            display_amount(wallet.balance.available, decimals),
        );
    }
    Ok(())
}

/// Runs the balance and sync pollers until Ctrl-C, printing every change.
pub async fn watch(coin: Coin, addresses: Vec<String>) -> Result<(), WalletError> {
    let decimals = coin.decimals;
    let symbol = coin.symbol.clone();
    let manager = OperatorManager::new();
    let operators =
        manager.activate(CoinOperators::build(coin, vec![watch_wallet(addresses)], None)?);
    let mut wallets_rx = operators.balance.subscribe_wallets();
    let mut sync_rx = operators.sync.subscribe_snapshot();
    info!("watching {symbol}, press Ctrl-C to stop");
    loop {
        tokio::select! {
            changed = wallets_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                for wallet in wallets_rx.borrow_and_update().iter() {
                    println!(
                        "{} {symbol} confirmed, {} {symbol} predicted",
                        display_amount(wallet.balance.confirmed, decimals),
                        display_amount(wallet.balance.predicted, decimals),
                    );
                }
            }
            changed = sync_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = *sync_rx.borrow_and_update() {
                    println!(
                        "block {}/{} synchronized={}",
                        snapshot.current_block, snapshot.highest_block, snapshot.synchronized
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }
    manager.deactivate();
    Ok(())
}

pub async fn print_fees(coin: Coin) -> Result<(), WalletError> {
    let unit = coin.fee_unit.clone();
    let operators = CoinOperators::build(coin, Vec::new(), None)?;
    let fees = operators.spending.recommended_fees().await?;
    println!("very low\t{} {unit}", fees.very_low);
    println!("low\t\t{} {unit}", fees.low);
    println!("normal\t\t{} {unit}", fees.normal);
    println!("high\t\t{} {unit}", fees.high);
    println!("very high\t{} {unit}", fees.very_high);
    Ok(())
}

fn fee_spec(
    coin: &Coin,
    fee_rate: Option<u64>,
    gas_price: Option<u128>,
    gas_limit: Option<u64>,
) -> Result<FeeSpec, WalletError> {
    match coin.family {
        CoinFamily::UtxoWithFee => {
            let rate = fee_rate.ok_or_else(|| {
                WalletError::InvalidParameters("--fee-rate is required for this coin".to_string())
            })?;
            Ok(FeeSpec::PerUnit(rate))
        }
        CoinFamily::AccountBased => {
            let price = gas_price.ok_or_else(|| {
                WalletError::InvalidParameters("--gas-price is required for this coin".to_string())
            })?;
            Ok(FeeSpec::Gas {
                price,
                limit: gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            })
        }
        CoinFamily::UtxoWithHours => Ok(FeeSpec::None),
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn send(
    coin: Coin,
    from: Vec<String>,
    to: String,
    amount: &str,
    change_address: Option<String>,
    fee_rate: Option<u64>,
    gas_price: Option<u128>,
    gas_limit: Option<u64>,
) -> Result<(), WalletError> {
    let fee = fee_spec(&coin, fee_rate, gas_price, gas_limit)?;
    let amount = parse_amount(amount, coin.decimals)?;
    let decimals = coin.decimals;
    let fee_unit = coin.fee_unit.clone();
    let operators = CoinOperators::build(coin, Vec::new(), None)?;
    let destinations = vec![TransactionDestination {
        address: to,
        amount,
        hours: None,
    }];
    let transaction = operators
        .spending
        .create_transaction(
            &TransactionSource::Addresses(from),
            &destinations,
            change_address.as_deref(),
            None,
            true,
            &fee,
        )
        .await?;
    println!("from\t{}", transaction.from);
    println!("to\t{}", transaction.to);
    println!("amount\t{}", display_amount(transaction.amount, decimals));
    println!("fee\t{} {fee_unit}", transaction.fee);
    println!("inputs\t{}", transaction.inputs.len());
    println!("outputs\t{}", transaction.outputs.len());
    println!("unsigned\t{}", transaction.encoded);
    Ok(())
}

pub async fn broadcast(coin: Coin, raw: String) -> Result<(), WalletError> {
    let operators = CoinOperators::build(coin, Vec::new(), None)?;
    let transaction = GeneratedTransaction {
        inputs: Vec::new(),
        outputs: Vec::new(),
        amount: 0,
        fee: 0,
        from: String::new(),
        to: String::new(),
        encoded: raw,
        inner_hash: None,
        note: None,
    };
    let transaction_id = operators.broadcast(&transaction, None).await?;
    println!("{transaction_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcw_core::coins::default_coins;

    #[test]
    fn test_find_coin_ignores_case() {
        let coins = default_coins();
        assert_eq!(find_coin(&coins, "btc").unwrap().symbol, "BTC");
        assert!(find_coin(&coins, "DOGE").is_err());
    }

    #[test]
    fn test_fee_spec_per_family() {
        let coins = default_coins();
        let btc = find_coin(&coins, "BTC").unwrap();
        let eth = find_coin(&coins, "ETH").unwrap();
        let sky = find_coin(&coins, "SKY").unwrap();

        assert!(fee_spec(&btc, None, None, None).is_err());
        assert_eq!(
            fee_spec(&btc, Some(12), None, None).unwrap(),
            FeeSpec::PerUnit(12)
        );
        assert!(fee_spec(&eth, None, None, None).is_err());
        assert_eq!(
            fee_spec(&eth, None, Some(20_000_000_000), None).unwrap(),
            FeeSpec::Gas {
                price: 20_000_000_000,
                limit: DEFAULT_GAS_LIMIT
            }
        );
        assert_eq!(fee_spec(&sky, None, None, None).unwrap(), FeeSpec::None);
    }

    #[test]
    fn test_load_coins_defaults_without_path() {
        assert_eq!(load_coins(None).unwrap().len(), 3);
    }

    #[test]
    fn test_unreadable_coin_list_is_a_parameter_error() {
        let result = load_coins(Some("/nonexistent/coins.json"));
        assert!(matches!(result, Err(WalletError::InvalidParameters(_))));
    }
}
