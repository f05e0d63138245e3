pub mod breakdowns;
pub mod recent;
pub mod rollup;
pub mod stats;
pub mod timeseries;
pub mod window;
