//! Configuration module

mod blog;
mod timezone;

pub use blog::BlogConfig;
pub use blog::HighlightConfig;
pub use blog::DEFAULT_DATABASE_URL;
pub use timezone::Timezone;
