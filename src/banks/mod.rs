// 🏦 Bank Transformers - one module per supported export format

pub mod bog;
pub mod tbc;

pub use bog::{BogTransformer, BOG_COLUMNS};
pub use tbc::{TbcTransformer, TBC_COLUMNS};
