pub mod balance;
pub mod coin_select;
pub mod fees;
pub mod hardware;
pub mod notes;
pub mod operators;
pub mod sources;
pub mod spending;
pub mod sync;

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
