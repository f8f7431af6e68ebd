use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::error::AppError;
use crate::survey::types::{Role, SurveyStatus};
use crate::util::text::same_username;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Edit,
    Delete,
    ManageQuestions,
    View,
    Submit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ManageQuestions => "manage questions of",
            Self::View => "view",
            Self::Submit => "submit responses to",
        })
    }
}

/// A user account being added, edited or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChange {
    pub username: String,
    /// `None` when the account does not exist yet.
    pub current_role: Option<Role>,
    /// `None` when the role is left untouched.
    pub requested_role: Option<Role>,
    /// Administrators currently stored.
    pub administrators: usize,
    /// The account seeded on first start, whatever it is called now.
    pub seed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// The survey collection: listing and creating.
    Surveys,
    Survey { creator: String, status: SurveyStatus },
    /// The reporting dashboard.
    Reports,
    /// Reports for one survey.
    Report { creator: String },
    /// The user list.
    Users,
    User(UserChange),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("{role} accounts cannot {action} this resource.")]
    RoleNotPermitted { role: Role, action: ActionName },
    #[error("You can only modify surveys you created.")]
    NotOwner,
    #[error("You can only view reports for surveys you created.")]
    NotReportOwner,
    #[error("Only administrators can manage users.")]
    AdminOnly,
    #[error("You cannot remove your own Administrator role.")]
    SelfDemotion,
    #[error("The maximum of {0} administrators has been reached.")]
    AdminLimit(usize),
    #[error("You cannot delete your own account.")]
    SelfDeletion,
    #[error("'{0}' is the default administrator account and cannot be deleted.")]
    SeedAccount(String),
    #[error("Only Active surveys accept responses.")]
    SurveyNotActive,
}

/// `Action` carried inside an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionName(pub Action);

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    pub max_administrators: usize,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            max_administrators: 3,
        }
    }
}

impl AccessPolicy {
    pub fn new(max_administrators: usize) -> Self {
        Self { max_administrators }
    }

    /// Total decision function over every (actor, action, resource) triple.
    pub fn decide(&self, actor: &Actor, action: Action, resource: &Resource) -> Decision {
        match actor.role {
            Role::Administrator => self.decide_admin(actor, action, resource),
            Role::SurveyCreator => decide_creator(actor, action, resource),
            Role::DataEntry => decide_data_entry(action, resource),
        }
    }

    pub fn can_perform(&self, actor: &Actor, action: Action, resource: &Resource) -> bool {
        self.decide(actor, action, resource).is_allowed()
    }

    /// `decide`, turned into an error for callers that must stop on refusal.
    pub fn authorize(&self, actor: &Actor, action: Action, resource: &Resource) -> Result<(), AppError> {
        match self.decide(actor, action, resource) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                log::warn!(
                    "denied {} ({}) {:?} on {:?}: {}",
                    actor.username,
                    actor.role,
                    action,
                    resource,
                    reason
                );
                Err(AppError::Permission(reason))
            }
        }
    }

    fn decide_admin(&self, actor: &Actor, action: Action, resource: &Resource) -> Decision {
        let Resource::User(change) = resource else {
            return Decision::Allow;
        };
        let is_self = same_username(&change.username, &actor.username);
        let gains_admin = change.requested_role == Some(Role::Administrator)
            && change.current_role != Some(Role::Administrator);
        match action {
            Action::Delete if is_self => Decision::Deny(DenyReason::SelfDeletion),
            Action::Delete if change.seed => {
                Decision::Deny(DenyReason::SeedAccount(change.username.clone()))
            }
            Action::Edit
                if is_self
                    && change.current_role == Some(Role::Administrator)
                    && matches!(change.requested_role, Some(r) if r != Role::Administrator) =>
            {
                Decision::Deny(DenyReason::SelfDemotion)
            }
            Action::Create | Action::Edit
                if gains_admin && change.administrators >= self.max_administrators =>
            {
                Decision::Deny(DenyReason::AdminLimit(self.max_administrators))
            }
            _ => Decision::Allow,
        }
    }
}

fn refuse(role: Role, action: Action) -> Decision {
    Decision::Deny(DenyReason::RoleNotPermitted {
        role,
        action: ActionName(action),
    })
}

fn decide_creator(actor: &Actor, action: Action, resource: &Resource) -> Decision {
    match (resource, action) {
        (Resource::Surveys, Action::Create | Action::View) => Decision::Allow,
        (Resource::Survey { .. }, Action::View) => Decision::Allow,
        // Ownership is an exact, case-sensitive username match here.
        (Resource::Survey { creator, .. }, Action::Edit | Action::Delete | Action::ManageQuestions) => {
            if *creator == actor.username {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwner)
            }
        }
        (Resource::Reports, Action::View) => Decision::Allow,
        // Report visibility matches the creator ignoring case.
        (Resource::Report { creator }, Action::View) => {
            if same_username(creator, &actor.username) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotReportOwner)
            }
        }
        (Resource::Users | Resource::User(_), _) => Decision::Deny(DenyReason::AdminOnly),
        _ => refuse(actor.role, action),
    }
}

fn decide_data_entry(action: Action, resource: &Resource) -> Decision {
    match (resource, action) {
        (Resource::Surveys, Action::Submit) => Decision::Allow,
        (Resource::Survey { status, .. }, Action::Submit) => {
            if *status == SurveyStatus::Active {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::SurveyNotActive)
            }
        }
        (Resource::Users | Resource::User(_), _) => Decision::Deny(DenyReason::AdminOnly),
        _ => refuse(Role::DataEntry, action),
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessPolicy, Action, Actor, Decision, DenyReason, Resource, UserChange};
    use crate::error::AppError;
    use crate::survey::types::{Role, SurveyStatus};

    fn survey(creator: &str, status: SurveyStatus) -> Resource {
        Resource::Survey {
            creator: creator.to_string(),
            status,
        }
    }

    fn promote(username: &str, current: Role, administrators: usize) -> Resource {
        Resource::User(UserChange {
            username: username.to_string(),
            current_role: Some(current),
            requested_role: Some(Role::Administrator),
            administrators,
            seed: false,
        })
    }

    #[test]
    fn creator_edits_only_own_surveys() {
        let policy = AccessPolicy::default();
        let bob = Actor::new("bob", Role::SurveyCreator);
        let own = survey("bob", SurveyStatus::Draft);
        let other = survey("alice", SurveyStatus::Draft);
        for action in [Action::Edit, Action::Delete, Action::ManageQuestions] {
            assert!(policy.can_perform(&bob, action, &own));
            assert_eq!(
                policy.decide(&bob, action, &other),
                Decision::Deny(DenyReason::NotOwner)
            );
        }
        let err = policy
            .authorize(&bob, Action::Edit, &other)
            .expect_err("alice's survey");
        assert!(matches!(err, AppError::Permission(DenyReason::NotOwner)));
        assert!(policy.can_perform(&bob, Action::View, &other));
        assert!(policy.can_perform(&bob, Action::Create, &Resource::Surveys));
    }

    #[test]
    fn creator_case_rules_differ_between_edit_and_reports() {
        let policy = AccessPolicy::default();
        let bob = Actor::new("bob", Role::SurveyCreator);
        assert!(!policy.can_perform(&bob, Action::Edit, &survey("Bob", SurveyStatus::Active)));
        assert!(policy.can_perform(
            &bob,
            Action::View,
            &Resource::Report {
                creator: "Bob".to_string()
            }
        ));
        assert!(!policy.can_perform(
            &bob,
            Action::View,
            &Resource::Report {
                creator: "alice".to_string()
            }
        ));
    }

    #[test]
    fn fourth_administrator_is_refused() {
        let policy = AccessPolicy::default();
        let admin = Actor::new("admin", Role::Administrator);
        assert_eq!(
            policy.decide(&admin, Action::Edit, &promote("carol", Role::DataEntry, 3)),
            Decision::Deny(DenyReason::AdminLimit(3))
        );
        assert!(policy.can_perform(&admin, Action::Edit, &promote("carol", Role::DataEntry, 2)));
        let new_admin = Resource::User(UserChange {
            username: "dave".to_string(),
            current_role: None,
            requested_role: Some(Role::Administrator),
            administrators: 3,
            seed: false,
        });
        assert!(!policy.can_perform(&admin, Action::Create, &new_admin));
        // Saving an existing administrator is not a promotion.
        assert!(policy.can_perform(&admin, Action::Edit, &promote("root", Role::Administrator, 3)));
    }

    #[test]
    fn administrators_cannot_demote_or_delete_themselves() {
        let policy = AccessPolicy::default();
        let root = Actor::new("root", Role::Administrator);
        let demote = Resource::User(UserChange {
            username: "root".to_string(),
            current_role: Some(Role::Administrator),
            requested_role: Some(Role::DataEntry),
            administrators: 2,
            seed: false,
        });
        assert_eq!(
            policy.decide(&root, Action::Edit, &demote),
            Decision::Deny(DenyReason::SelfDemotion)
        );
        assert!(!policy.can_perform(&root, Action::Delete, &demote));
        let seed = Resource::User(UserChange {
            username: "renamed".to_string(),
            current_role: Some(Role::Administrator),
            requested_role: None,
            administrators: 2,
            seed: true,
        });
        assert_eq!(
            policy.decide(&root, Action::Delete, &seed),
            Decision::Deny(DenyReason::SeedAccount("renamed".to_string()))
        );
        assert!(policy.can_perform(&root, Action::Edit, &seed));
        let namesake = Resource::User(UserChange {
            username: "admin".to_string(),
            current_role: Some(Role::DataEntry),
            requested_role: None,
            administrators: 2,
            seed: false,
        });
        assert!(policy.can_perform(&root, Action::Delete, &namesake));
    }

    #[test]
    fn data_entry_submits_only_to_active_surveys() {
        let policy = AccessPolicy::default();
        let clerk = Actor::new("clerk", Role::DataEntry);
        assert!(policy.can_perform(&clerk, Action::Submit, &survey("bob", SurveyStatus::Active)));
        for status in [SurveyStatus::Draft, SurveyStatus::Archived] {
            assert_eq!(
                policy.decide(&clerk, Action::Submit, &survey("bob", status)),
                Decision::Deny(DenyReason::SurveyNotActive)
            );
        }
        assert!(!policy.can_perform(&clerk, Action::View, &survey("bob", SurveyStatus::Active)));
        assert!(!policy.can_perform(&clerk, Action::View, &Resource::Reports));
        assert!(!policy.can_perform(&clerk, Action::View, &Resource::Users));
    }

    #[test]
    fn only_administrators_manage_users() {
        let policy = AccessPolicy::default();
        let bob = Actor::new("bob", Role::SurveyCreator);
        assert_eq!(
            policy.decide(&bob, Action::View, &Resource::Users),
            Decision::Deny(DenyReason::AdminOnly)
        );
        let admin = Actor::new("admin", Role::Administrator);
        assert!(policy.can_perform(&admin, Action::View, &Resource::Users));
        assert!(policy.can_perform(&admin, Action::Delete, &survey("bob", SurveyStatus::Archived)));
    }
}
