//! Project Request Types

use agents_core::{ModelSettings, Project, StopWhen, TenantScope, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateProjectRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub models: Option<ModelSettings>,
    #[serde(default)]
    pub stop_when: Option<StopWhen>,
}

impl CreateProjectRequest {
    pub fn into_entity(self, tenant: &TenantScope, now: Timestamp) -> Project {
        Project {
            tenant_id: tenant.tenant_id.clone(),
            id: self.id,
            name: self.name,
            description: self.description,
            models: self.models,
            stop_when: self.stop_when,
            created_at: now,
            updated_at: now,
        }
    }
}
