mod clock;
mod expense;
mod ledger;
mod money;

pub use clock::*;
pub use expense::*;
pub use ledger::*;
pub use money::*;
