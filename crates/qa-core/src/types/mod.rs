pub mod enums;
pub mod event;
pub mod ids;
pub mod io;
pub mod review;

pub use enums::*;
pub use event::*;
pub use ids::*;
pub use io::*;
pub use review::*;
