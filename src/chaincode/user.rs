//! User registry chaincode.
//!
//! Users are stored as JSON under the composite key `user\0<id>\0`, so
//! `queryAllUser` is a prefix query over the `user` object type.

use serde::{Deserialize, Serialize};

use crate::kv::Key;
use crate::logging::info;

use super::error::{expect_args, ChaincodeError, StoreContext};
use super::response::Response;
use super::router::Router;
use super::stub::ChaincodeStub;
use super::Chaincode;

const USER_TYPE: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub sex: String,
}

impl UserInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sex: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sex: sex.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserChaincode {
    router: Router,
}

impl UserChaincode {
    pub fn new() -> Self {
        let router = Router::new()
            .route("addUser", add_user)
            .route("queryOnceUser", query_once_user)
            .route("queryAllUser", query_all_user)
            .route("alterUser", alter_user)
            .route("delUser", del_user);
        Self { router }
    }
}

impl Default for UserChaincode {
    fn default() -> Self {
        Self::new()
    }
}

impl Chaincode for UserChaincode {
    fn init(&self, stub: &ChaincodeStub<'_>) -> Response {
        Response::from_result(seed(stub))
    }

    fn router(&self) -> &Router {
        &self.router
    }
}

fn seed(stub: &ChaincodeStub<'_>) -> Result<Response, ChaincodeError> {
    for user in [UserInfo::new("1", "lzb1", "男"), UserInfo::new("2", "lzb2", "女")] {
        let key = user_key(stub, &user.id)?;
        stub.put_state(&key, serde_json::to_vec(&user)?)
            .context("put user key and info")?;
    }
    info!(chaincode = "user", tx_id = stub.tx_id(), "seeded users");
    Ok(Response::success("Init success"))
}

fn user_key(stub: &ChaincodeStub<'_>, id: &str) -> Result<Key, ChaincodeError> {
    stub.create_composite_key(USER_TYPE, &[id]).context("create user key")
}

/// The single JSON-encoded user argument of a call.
fn user_arg(args: &[String]) -> Result<UserInfo, ChaincodeError> {
    expect_args(args, 1)?;
    let raw = args.first().map(String::as_str).unwrap_or_default();
    Ok(serde_json::from_str(raw)?)
}

fn add_user(stub: &ChaincodeStub<'_>, args: &[String]) -> Result<Response, ChaincodeError> {
    let user = user_arg(args)?;
    let key = user_key(stub, &user.id)?;
    if stub.get_state(&key).context("get user state")?.is_some() {
        return Err(ChaincodeError::validation("user exist"));
    }
    stub.put_state(&key, serde_json::to_vec(&user)?)
        .context("put user state")?;
    Ok(Response::success("add user success"))
}

fn query_once_user(
    stub: &ChaincodeStub<'_>,
    args: &[String],
) -> Result<Response, ChaincodeError> {
    let user = user_arg(args)?;
    let key = user_key(stub, &user.id)?;
    let bytes = stub
        .get_state(&key)
        .context("get user state")?
        .ok_or_else(|| does_not_exist(&user.id))?;
    Ok(Response::success("get once user success").with_payload(bytes))
}

fn query_all_user(
    stub: &ChaincodeStub<'_>,
    _args: &[String],
) -> Result<Response, ChaincodeError> {
    let mut users = Vec::new();
    for kv in stub
        .get_state_by_partial_composite_key::<&str>(USER_TYPE, &[])
        .context("get user info by partial composite key")?
    {
        let kv = kv.context("get user info by partial composite key")?;
        users.push(serde_json::from_slice::<UserInfo>(&kv.value)?);
    }
    Response::success("get all user info success").with_json(&users)
}

fn alter_user(stub: &ChaincodeStub<'_>, args: &[String]) -> Result<Response, ChaincodeError> {
    let update = user_arg(args)?;
    let key = user_key(stub, &update.id)?;
    let bytes = stub
        .get_state(&key)
        .context("get user state")?
        .ok_or_else(|| does_not_exist(&update.id))?;

    let mut user: UserInfo = serde_json::from_slice(&bytes)?;
    user.name = update.name;
    user.sex = update.sex;
    stub.put_state(&key, serde_json::to_vec(&user)?)
        .context("put user")?;
    Ok(Response::success("alter user success"))
}

fn del_user(stub: &ChaincodeStub<'_>, args: &[String]) -> Result<Response, ChaincodeError> {
    let user = user_arg(args)?;
    let key = user_key(stub, &user.id)?;
    stub.del_state(&key).context("del user")?;
    Ok(Response::success("del user state success"))
}

fn does_not_exist(id: &str) -> ChaincodeError {
    ChaincodeError::validation(format!("user {id} does not exist"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_arg() {
        let user = user_arg(&[r#"{"id":"3","name":"lzb3","sex":"男"}"#.to_string()]).unwrap();
        assert_eq!(user, UserInfo::new("3", "lzb3", "男"));

        assert!(matches!(user_arg(&[]), Err(ChaincodeError::Validation(_))));
        assert!(matches!(
            user_arg(&["not json".to_string()]),
            Err(ChaincodeError::Json(_))
        ));
    }

    #[test]
    fn test_user_json_field_names() {
        let json = serde_json::to_string(&UserInfo::new("1", "lzb1", "男")).unwrap();
        assert_eq!(json, r#"{"id":"1","name":"lzb1","sex":"男"}"#);
    }
}
