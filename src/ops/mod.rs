//! Operational tasks run from the `site-ops` binary

pub mod deploy;
pub mod prerender;
pub mod reaper;
pub mod register;
