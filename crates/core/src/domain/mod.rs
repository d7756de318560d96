pub mod approval;
pub mod quote;
pub mod rates;
pub mod revision;
pub mod rules;
pub mod ticket;
