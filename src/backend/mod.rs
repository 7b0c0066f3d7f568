//! Routed backend for user policy mappings.
//!
//! ## Paths
//!
//! | Pattern | Operations |
//! |---------|------------|
//! | `users/?$` | list |
//! | `users/(?P<name>.+)` | read, update, delete |
//!
//! The storage handle and request context are parameters of every call;
//! the backend itself holds only the compiled path table.

pub mod context;
pub mod error;
pub mod fields;
pub mod paths;
pub mod request;
pub mod users;

use tracing::{debug, warn};

use crate::store::Storage;

pub use context::RequestContext;
pub use error::BackendError;
pub use fields::{FieldData, FieldSchema, FieldType};
pub use paths::{PathDef, PathHandler, USER_PATH_PREFIX};
pub use request::{Operation, Request, Response};
pub use users::get_user;

/// Router over the user paths.
#[derive(Debug)]
pub struct Backend {
    paths: Vec<PathDef>,
}

impl Backend {
    /// Build the backend with the user path table.
    pub fn new() -> Result<Self, BackendError> {
        Ok(Self::with_paths(vec![
            paths::users_list_path()?,
            paths::users_path()?,
        ]))
    }

    /// Build a backend over an explicit path table. First match wins.
    pub fn with_paths(paths: Vec<PathDef>) -> Self {
        Self { paths }
    }

    /// Registered paths.
    pub fn paths(&self) -> &[PathDef] {
        &self.paths
    }

    /// Route a request to its handler.
    ///
    /// `Ok(None)` means success with no response body; for a read it means
    /// the user does not exist.
    pub async fn handle_request<S>(
        &self,
        ctx: &RequestContext,
        storage: &S,
        request: &Request,
    ) -> Result<Option<Response>, BackendError>
    where
        S: Storage + ?Sized,
    {
        let path = request.path.trim_start_matches('/');

        let (def, captures) = self
            .paths
            .iter()
            .find_map(|def| def.matches(path).map(|caps| (def, caps)))
            .ok_or_else(|| {
                warn!(request_id = %ctx.request_id(), path = %path, "No route for path");
                BackendError::UnsupportedPath(path.to_string())
            })?;

        debug!(
            request_id = %ctx.request_id(),
            operation = %request.operation,
            path = %path,
            pattern = def.pattern(),
            "Routing request"
        );

        if request.operation == Operation::Help {
            return Ok(Some(Response::help(def.help_text())));
        }

        let handler = def.handler(request.operation).ok_or_else(|| {
            warn!(
                request_id = %ctx.request_id(),
                operation = %request.operation,
                path = %path,
                "Operation not supported on path"
            );
            BackendError::UnsupportedOperation {
                path: path.to_string(),
                operation: request.operation,
            }
        })?;

        let mut raw = request.data.clone();
        raw.extend(captures);
        let fields = FieldData::new(raw, def.fields())?;

        match handler {
            PathHandler::ListUsers => users::list_users(ctx, storage).await,
            PathHandler::ReadUser => users::read_user(ctx, storage, &fields).await,
            PathHandler::WriteUser => users::write_user(ctx, storage, &fields).await,
            PathHandler::DeleteUser => users::delete_user(ctx, storage, &fields).await,
        }
    }
}
