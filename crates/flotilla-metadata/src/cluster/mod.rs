mod spec;
mod status;

pub use self::spec::*;
pub use self::status::*;
