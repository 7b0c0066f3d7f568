//! User path handlers.
//!
//! Each handler performs exactly one storage call.

use serde_json::Value;
use tracing::debug;

use crate::codec::{decode_entry, encode_entry};
use crate::policy::parse_policies;
use crate::store::Storage;
use crate::types::{user_key, UserEntry, UserLookup, USER_STORAGE_PREFIX};

use super::context::RequestContext;
use super::error::BackendError;
use super::fields::FieldData;
use super::request::Response;

/// Look up the record stored for `name`.
pub async fn get_user<S>(
    ctx: &RequestContext,
    storage: &S,
    name: &str,
) -> Result<UserLookup, BackendError>
where
    S: Storage + ?Sized,
{
    let entry = ctx.run(storage.get(&user_key(name))).await?;

    match entry {
        None => Ok(UserLookup::NotFound),
        Some(ref stored) => {
            let user: UserEntry = decode_entry(stored)?;
            Ok(UserLookup::from_entry(user))
        }
    }
}

/// List user names, sorted.
pub async fn list_users<S>(
    ctx: &RequestContext,
    storage: &S,
) -> Result<Option<Response>, BackendError>
where
    S: Storage + ?Sized,
{
    let keys = ctx.run(storage.list(USER_STORAGE_PREFIX)).await?;

    let mut names: Vec<String> = keys
        .iter()
        .filter_map(|key| key.strip_prefix(USER_STORAGE_PREFIX))
        .map(str::to_string)
        .collect();
    names.sort();

    debug!(request_id = %ctx.request_id(), count = names.len(), "Listed users");
    Ok(Some(Response::list(names)))
}

/// Read one user's policies. `None` when the user does not exist.
pub async fn read_user<S>(
    ctx: &RequestContext,
    storage: &S,
    fields: &FieldData<'_>,
) -> Result<Option<Response>, BackendError>
where
    S: Storage + ?Sized,
{
    let name = fields.require_string("name")?;

    let entry = match get_user(ctx, storage, &name).await?.into_entry() {
        Some(entry) => entry,
        None => {
            debug!(request_id = %ctx.request_id(), name = %name, "User not found");
            return Ok(None);
        }
    };

    Ok(Some(
        Response::default().with_data("policies", Value::from(entry.policy_list())),
    ))
}

/// Replace a user's policies. No merge with the previous record.
pub async fn write_user<S>(
    ctx: &RequestContext,
    storage: &S,
    fields: &FieldData<'_>,
) -> Result<Option<Response>, BackendError>
where
    S: Storage + ?Sized,
{
    let name = fields.require_string("name")?;
    let policies = parse_policies(fields.get_comma_string_slice("policies")?)?;

    let entry = encode_entry(user_key(&name), &UserEntry::new(policies))?;

    ctx.run(storage.put(entry)).await?;

    debug!(request_id = %ctx.request_id(), name = %name, "Wrote user");
    Ok(None)
}

/// Delete a user. Deleting an unknown user succeeds.
pub async fn delete_user<S>(
    ctx: &RequestContext,
    storage: &S,
    fields: &FieldData<'_>,
) -> Result<Option<Response>, BackendError>
where
    S: Storage + ?Sized,
{
    let name = fields.require_string("name")?;

    ctx.run(storage.delete(&user_key(&name))).await?;

    debug!(request_id = %ctx.request_id(), name = %name, "Deleted user");
    Ok(None)
}
