// Order execution module
pub mod order_manager;
pub mod position_sizer;
pub mod scheduler;

pub use order_manager::{OpenPosition, OrderManager};
pub use position_sizer::{size, EntryPlan, PositionSizer, SizingResult};
pub use scheduler::{CycleOutcome, TradingLoop};
