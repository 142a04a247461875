use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file with coin descriptors; the built-in set is used when
    /// omitted.
    #[arg(long, value_name = "Path to a coin list")]
    pub coins: Option<String>,

    #[command(subcommand)]
    pub action: RootCommands,
}

#[derive(Debug, Subcommand)]
pub enum RootCommands {
    #[command(about = "Lists the configured coins", long_about = None)]
    Coins,
    #[command(about = "Fetches the balance of a set of addresses once", long_about = None)]
    Balance {
        #[arg(short, long)]
        coin: String,
        #[arg(short, long, required = true)]
        addresses: Vec<String>,
    },
    #[command(about = "Polls balances and sync state until interrupted", long_about = None)]
    Watch {
        #[arg(short, long)]
        coin: String,
        #[arg(short, long, required = true)]
        addresses: Vec<String>,
    },
    #[command(about = "Shows the recommended fee tiers", long_about = None)]
    Fees {
        #[arg(short, long)]
        coin: String,
    },
    #[command(about = "Builds an unsigned transaction and prints it", long_about = None)]
    Send {
        #[arg(short, long)]
        coin: String,
        #[arg(short, long, required = true)]
        from: Vec<String>,
        #[arg(short, long)]
        to: String,
        #[arg(short, long, value_name = "Amount in display units")]
        amount: String,
        #[arg(long)]
        change_address: Option<String>,
        #[arg(long, value_name = "Fee rate in smallest units per byte")]
        fee_rate: Option<u64>,
        #[arg(long, value_name = "Gas price in wei")]
        gas_price: Option<u128>,
        #[arg(long, value_name = "Gas limit")]
        gas_limit: Option<u64>,
    },
    #[command(about = "Broadcasts a signed raw transaction", long_about = None)]
    Broadcast {
        #[arg(short, long)]
        coin: String,
        #[arg(short, long, value_name = "Signed transaction, hex")]
        raw: String,
    },
}
