pub mod adf;
pub mod ticket;
