//! Login-domain identifiers, caller parameters, and issued credentials.

pub mod credentials;
pub mod id;
pub mod params;
pub mod secret;

pub use credentials::*;
pub use id::*;
pub use params::*;
pub use secret::*;
