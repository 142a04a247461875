use clap::Parser;
use mcw_cli::cli::{Cli, RootCommands};
use mcw_cli::commands;
use mcw_core::errors::WalletError;
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> Result<(), WalletError> {
    let cli = Cli::parse();
    SimpleLogger::new().env().init().unwrap_or_default();
    let coins = commands::load_coins(cli.coins.as_deref())?;
    match cli.action {
        RootCommands::Coins => {
            commands::list_coins(&coins);
            Ok(())
        }
        RootCommands::Balance { coin, addresses } => {
            commands::print_balances(commands::find_coin(&coins, &coin)?, addresses).await
        }
        RootCommands::Watch { coin, addresses } => {
            commands::watch(commands::find_coin(&coins, &coin)?, addresses).await
        }
        RootCommands::Fees { coin } => {
            commands::print_fees(commands::find_coin(&coins, &coin)?).await
        }
        RootCommands::Send {
            coin,
            from,
            to,
            amount,
            change_address,
            fee_rate,
            gas_price,
            gas_limit,
        } => {
            commands::send(
                commands::find_coin(&coins, &coin)?,
                from,
                to,
                &amount,
                change_address,
                fee_rate,
                gas_price,
                gas_limit,
            )
            .await
        }
        RootCommands::Broadcast { coin, raw } => {
            commands::broadcast(commands::find_coin(&coins, &coin)?, raw).await
        }
    }
}
