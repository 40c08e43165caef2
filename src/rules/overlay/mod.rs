mod high_amount;
mod indicators;
mod micro_night;
mod new_receiver;
mod vip;

pub use high_amount::HighAmountRule;
pub use indicators::RiskIndicatorRule;
pub use micro_night::MicroNightRule;
pub use new_receiver::NewReceiverRule;
pub use vip::VipDowngradeRule;
