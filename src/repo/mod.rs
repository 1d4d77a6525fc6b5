//! Diesel queries grouped by entity. Functions take a borrowed connection so
//! handlers can compose them inside one `db::run` call or one transaction.

pub mod cats;
pub mod toys;
pub mod users;
