pub mod flags;
pub mod measure;
pub mod metrics;
pub mod profile;
pub mod record;
pub mod scored;
