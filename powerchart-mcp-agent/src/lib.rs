pub mod server;
pub mod utils;

pub use server::PowerChartServer;
