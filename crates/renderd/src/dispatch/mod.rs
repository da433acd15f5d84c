//! Per-request render dispatch.
//!
//! The [`Dispatcher`] resolves a request's `name` in the registry, invokes
//! the caller-supplied render function with the component and the request
//! props, and turns every outcome into a value:
//!
//! | outcome                 | log level                          | stream | unary              |
//! |-------------------------|------------------------------------|--------|--------------------|
//! | rendered                | `DEBUG`                            | content| content            |
//! | name not registered     | `WARNING` (stream) / `ERROR` (unary)| `null` | `INVALID_ARGUMENT` |
//! | render error or panic   | `ERROR`                            | `null` | `UNKNOWN`          |

mod dispatcher;
mod errors;

pub use self::dispatcher::{CallMode, Dispatcher, RenderFn};
pub use self::errors::{CallStatus, RenderError, RenderFailure, StatusCode};
