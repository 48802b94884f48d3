//! Cross-component integration scenarios.

pub mod harness;

#[cfg(test)]
mod cross_chain;
#[cfg(test)]
mod lifecycle;
#[cfg(test)]
mod local_match;
#[cfg(test)]
mod relay_retry;
