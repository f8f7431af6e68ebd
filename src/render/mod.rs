pub mod chart;
pub mod csv;
pub mod helpers;
