pub mod balance;
pub mod coins;
pub mod errors;
pub mod formatting;
pub mod output;
pub mod transaction;
pub mod wallet;

fn _version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
fn _pkg_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

pub fn version() -> String {
    format!("{}: {}", _pkg_name(), _version())
}

#[test]
fn test_version() {
    println!("{}", version());
}
