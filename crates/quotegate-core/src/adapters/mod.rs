mod finnhub;

pub use finnhub::FinnhubSource;
