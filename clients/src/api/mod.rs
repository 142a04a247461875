pub mod blockbook;
pub mod btc;
pub mod eth;
pub mod fiber;
pub mod responses;
