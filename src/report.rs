mod error;
mod message;
mod notice;
mod visual;

pub use error::*;
pub use message::*;
pub use notice::{capture, Deprecation};
pub use visual::{Pointer, Visual};

pub(crate) use notice::deprecated;

const RED: &str = "\x1B[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1B[0m";
