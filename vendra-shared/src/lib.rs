pub mod money;
pub mod pii;
pub mod slug;

pub use money::retail_round;
pub use pii::Masked;
pub use slug::slugify;
