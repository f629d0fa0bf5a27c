//! `healthCheck() -> { status, components }` (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Ok,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: ComponentStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: ComponentStatus,
    pub components: Vec<ComponentHealth>,
}

impl HealthStatus {
    /// Overall status is the worst of its components; `Down` dominates
    /// `Degraded` dominates `Ok`.
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let status = if components.iter().any(|c| c.status == ComponentStatus::Down) {
            ComponentStatus::Down
        } else if components.iter().any(|c| c.status == ComponentStatus::Degraded) {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Ok
        };
        Self { status, components }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_down_component_makes_overall_status_down() {
        let health = HealthStatus::from_components(vec![
            ComponentHealth { name: "store".into(), status: ComponentStatus::Ok, detail: None },
            ComponentHealth { name: "llm".into(), status: ComponentStatus::Down, detail: Some("timeout".into()) },
        ]);
        assert_eq!(health.status, ComponentStatus::Down);
    }

    #[test]
    fn all_ok_components_make_overall_status_ok() {
        let health = HealthStatus::from_components(vec![ComponentHealth {
            name: "store".into(),
            status: ComponentStatus::Ok,
            detail: None,
        }]);
        assert_eq!(health.status, ComponentStatus::Ok);
    }
}
