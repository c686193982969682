pub mod config;
pub mod error;
pub mod naming;
pub mod types;

pub use config::{parse_site_toml, parse_site_toml_str};
pub use error::{Error, Result};
pub use naming::TypeNaming;
pub use types::*;
