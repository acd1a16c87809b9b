pub mod classifier;
pub mod cooldown;

pub use classifier::compute_risk;
pub use cooldown::AlertCooldown;
