use uuid::Uuid;

use super::value_objects::{MembershipStatus, TeamRole};

/// Domain events raised by the Team aggregate and its memberships
///
/// These events mark state changes worth recording. The membership
/// service logs every event it receives from the aggregates.
///
/// # Example
/// ```
/// use prompt_teams_api::domain::team::events::TeamEvent;
/// use uuid::Uuid;
///
/// let event = TeamEvent::Created {
///     team_id: Uuid::new_v4(),
///     owner_id: Uuid::new_v4(),
///     is_personal: false,
/// };
/// assert_eq!(event.name(), "team_created");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamEvent {
    /// Fired when a team is created together with its owner membership
    Created {
        team_id: Uuid,
        owner_id: Uuid,
        is_personal: bool,
    },
    /// Fired when name, description or avatar change
    Updated { team_id: Uuid },
    /// Fired when a member is invited or re-invited
    MemberInvited {
        team_id: Uuid,
        membership_id: Uuid,
        invited_by: Uuid,
        role: TeamRole,
    },
    /// Fired when a pending membership becomes active
    MemberJoined {
        team_id: Uuid,
        membership_id: Uuid,
        user_id: Option<Uuid>,
    },
    /// Fired when a member's role changes
    RoleChanged {
        team_id: Uuid,
        membership_id: Uuid,
        from: TeamRole,
        to: TeamRole,
    },
    /// Fired when an active member leaves, is removed or is blocked
    MemberDeparted {
        team_id: Uuid,
        membership_id: Uuid,
        status: MembershipStatus,
    },
    /// Fired when the team owner changes
    OwnershipTransferred {
        team_id: Uuid,
        from: Uuid,
        to: Uuid,
    },
}

impl TeamEvent {
    /// Returns the team_id for this event
    pub fn team_id(&self) -> Uuid {
        match self {
            TeamEvent::Created { team_id, .. }
            | TeamEvent::Updated { team_id }
            | TeamEvent::MemberInvited { team_id, .. }
            | TeamEvent::MemberJoined { team_id, .. }
            | TeamEvent::RoleChanged { team_id, .. }
            | TeamEvent::MemberDeparted { team_id, .. }
            | TeamEvent::OwnershipTransferred { team_id, .. } => *team_id,
        }
    }

    /// Returns a stable event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            TeamEvent::Created { .. } => "team_created",
            TeamEvent::Updated { .. } => "team_updated",
            TeamEvent::MemberInvited { .. } => "member_invited",
            TeamEvent::MemberJoined { .. } => "member_joined",
            TeamEvent::RoleChanged { .. } => "role_changed",
            TeamEvent::MemberDeparted { .. } => "member_departed",
            TeamEvent::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_id_is_exposed_for_every_variant() {
        let team_id = Uuid::new_v4();
        let membership_id = Uuid::new_v4();

        let events = vec![
            TeamEvent::Created {
                team_id,
                owner_id: Uuid::new_v4(),
                is_personal: true,
            },
            TeamEvent::Updated { team_id },
            TeamEvent::MemberJoined {
                team_id,
                membership_id,
                user_id: None,
            },
            TeamEvent::MemberDeparted {
                team_id,
                membership_id,
                status: MembershipStatus::Left,
            },
        ];

        for event in events {
            assert_eq!(event.team_id(), team_id);
        }
    }

    #[test]
    fn ownership_transferred_name() {
        let event = TeamEvent::OwnershipTransferred {
            team_id: Uuid::new_v4(),
            from: Uuid::new_v4(),
            to: Uuid::new_v4(),
        };
        assert_eq!(event.name(), "ownership_transferred");
    }
}
