//! The four pipeline plugins.
//!
//! | Kind         | Plugin               | Rejects with          |
//! |--------------|----------------------|-----------------------|
//! | `jwt`        | [`JwtPlugin`]        | `AuthenticationError` |
//! | `validation` | [`ValidationPlugin`] | `ValidationError`     |
//! | `protect`    | [`ProtectPlugin`]    | `ProtectionError`     |
//! | `exec`       | [`ExecPlugin`]       | `UserError`           |

mod exec;
mod jwt;
mod protect;
mod validation;

pub use exec::{ExecPlugin, ExecState};
pub use jwt::JwtPlugin;
pub use protect::{ProtectPlugin, ProtectState, SqlDetection, SqlScanner, SqlState};
pub use validation::{ValidationPlugin, ValidationState};
