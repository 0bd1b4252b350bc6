pub mod types;
pub mod rules;
pub mod loader;
pub mod validator;
pub mod resolved;
pub mod settings;

pub use types::*;
pub use rules::*;
pub use loader::*;
pub use validator::*;
pub use resolved::*;
pub use settings::*;
