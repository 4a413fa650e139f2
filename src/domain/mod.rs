pub mod company;
pub mod display;
pub mod parse_outcome;
pub mod sanitize;
