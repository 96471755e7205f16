pub mod cli;
pub mod error;
/// JSON analysis manifests consumed by the replay driver.
pub mod manifest;
pub mod replay;
pub mod settings;
