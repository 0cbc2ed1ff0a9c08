pub mod config;
pub mod error;
pub mod table;

pub use config::load_dotenv;
pub use error::CoreError;
pub use table::Table;
