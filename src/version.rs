/// Git version captured by `build.rs`, `"dev"` outside a checkout.
pub const GIT_VERSION: &str = env!("GIT_VERSION");
