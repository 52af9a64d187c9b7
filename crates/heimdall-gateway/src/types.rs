//! Wire shapes of the authorization service's JSON bodies.

use serde::Deserialize;

use heimdall_domain::model::{AuthzId, GroupMembership};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateObjectResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupBody {
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl GroupBody {
    pub fn into_membership(self) -> Result<GroupMembership, String> {
        let mut membership = GroupMembership::default();
        for raw in self.actors {
            let id = AuthzId::new(raw).map_err(|err| err.to_string())?;
            membership.actors.insert(id);
        }
        for raw in self.groups {
            let id = AuthzId::new(raw).map_err(|err| err.to_string())?;
            membership.groups.insert(id);
        }
        Ok(membership)
    }
}
