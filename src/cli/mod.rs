pub mod session;
pub mod utils;

pub use session::{MenuAction, SessionController, SessionState};
pub use utils::Console;
