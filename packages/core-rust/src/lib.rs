//! `Launchpad` Core: module route table, registry, request validation, and
//! the launch request data model.

pub mod registry;
pub mod types;
pub mod validate;

pub use registry::{ModuleRegistry, ModuleRoute, RouteTableError, UnknownModule, MODULE_ROUTES};
pub use types::{LaunchEvent, LaunchRequest, NewLaunchRequest, Requester};
pub use validate::{is_valid_email, RequestValidator, ValidationError};
