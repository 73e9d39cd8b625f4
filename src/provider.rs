//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`): HTTPS endpoints for
//! authorization, token, and profile calls, supported grant flags, the client
//! authentication preference, and quirks such as the scope delimiter. `strategy` defines
//! [`ProviderStrategy`], the hook used to augment token request forms and to classify token
//! endpoint errors.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
