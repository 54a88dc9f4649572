pub mod enums;
pub mod deficiency;
pub mod plan;
pub mod report;
pub mod user;

pub use enums::*;
pub use deficiency::*;
pub use plan::*;
pub use report::*;
pub use user::*;
