pub(crate) mod domain_probe;
pub mod headless;
pub(crate) mod search;
