mod settings;
mod timeouts;

pub use settings::Settings;
pub use timeouts::TimeoutConfig;
