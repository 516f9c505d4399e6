use super::errors::TeamError;
use super::events::TeamEvent;
use super::value_objects::TeamName;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Team aggregate root
///
/// A workspace that owns prompts and groups users through memberships.
///
/// # Invariants
/// - Name is never blank and is stored trimmed
/// - `is_personal` never changes after creation
/// - Exactly one owner at any time
///
/// # Example
/// ```
/// use prompt_teams_api::domain::team::Team;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let (team, event) = Team::new(" Prompt Lab ", None, None, false, owner)
///     .expect("valid team");
///
/// assert_eq!(team.name(), "Prompt Lab");
/// assert_eq!(team.owner_id(), owner);
/// assert_eq!(event.team_id(), team.id());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    id: Uuid,
    name: String,
    description: Option<String>,
    avatar_url: Option<String>,
    is_personal: bool,
    owner_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Default name given to auto-created personal teams
    pub const PERSONAL_TEAM_NAME: &'static str = "Personal workspace";

    /// Default description given to auto-created personal teams
    pub const PERSONAL_TEAM_DESCRIPTION: &'static str = "Auto-generated personal space";

    /// Creates a new Team aggregate owned (and created) by `owner_id`
    ///
    /// # Returns
    /// * `Ok((Team, TeamEvent))` - New team and its Created event
    /// * `Err(TeamError::InvalidTeamName)` - If the name is blank
    pub fn new(
        name: &str,
        description: Option<String>,
        avatar_url: Option<String>,
        is_personal: bool,
        owner_id: Uuid,
    ) -> Result<(Self, TeamEvent), TeamError> {
        let name = TeamName::new(name)?;
        let now = Utc::now();

        let team = Self {
            id: Uuid::new_v4(),
            name: name.into_inner(),
            description: normalize_optional(description),
            avatar_url: normalize_optional(avatar_url),
            is_personal,
            owner_id,
            created_by: owner_id,
            created_at: now,
            updated_at: now,
        };

        let event = TeamEvent::Created {
            team_id: team.id,
            owner_id,
            is_personal,
        };

        Ok((team, event))
    }

    /// Applies a partial update of the editable fields
    ///
    /// `None` leaves a field untouched. An empty description or avatar
    /// clears it. Returns `Ok(None)` when nothing was supplied.
    pub fn apply_update(
        &mut self,
        name: Option<&str>,
        description: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Option<TeamEvent>, TeamError> {
        if name.is_none() && description.is_none() && avatar_url.is_none() {
            return Ok(None);
        }

        // validate before touching anything
        let name = name.map(TeamName::new).transpose()?;

        if let Some(name) = name {
            self.name = name.into_inner();
        }
        if let Some(description) = description {
            self.description = normalize_optional(Some(description));
        }
        if let Some(avatar_url) = avatar_url {
            self.avatar_url = normalize_optional(Some(avatar_url));
        }
        self.updated_at = Utc::now();

        Ok(Some(TeamEvent::Updated { team_id: self.id }))
    }

    /// Hands the team over to a new owner
    pub(crate) fn transfer_to(&mut self, new_owner: Uuid) -> TeamEvent {
        let previous = self.owner_id;
        self.owner_id = new_owner;
        self.updated_at = Utc::now();

        TeamEvent::OwnershipTransferred {
            team_id: self.id,
            from: previous,
            to: new_owner,
        }
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn is_personal(&self) -> bool {
        self.is_personal
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Bypasses validation; only for store implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        description: Option<String>,
        avatar_url: Option<String>,
        is_personal: bool,
        owner_id: Uuid,
        created_by: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            avatar_url,
            is_personal,
            owner_id,
            created_by,
            created_at,
            updated_at,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_team_with_valid_name() {
        let owner = Uuid::new_v4();

        let (team, event) = Team::new(
            "Prompt Lab",
            Some("Shared prompts".to_string()),
            None,
            false,
            owner,
        )
        .unwrap();

        assert_eq!(team.name(), "Prompt Lab");
        assert_eq!(team.description(), Some("Shared prompts"));
        assert_eq!(team.owner_id(), owner);
        assert_eq!(team.created_by(), owner);
        assert!(!team.is_personal());
        assert_eq!(
            event,
            TeamEvent::Created {
                team_id: team.id(),
                owner_id: owner,
                is_personal: false,
            }
        );
    }

    #[test]
    fn create_team_trims_name() {
        let (team, _) = Team::new("  Spaced  ", None, None, false, Uuid::new_v4()).unwrap();
        assert_eq!(team.name(), "Spaced");
    }

    #[test]
    fn create_team_with_blank_name_fails() {
        let result = Team::new("   ", None, None, false, Uuid::new_v4());
        assert!(matches!(result, Err(TeamError::InvalidTeamName)));
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let (mut team, _) = Team::new("Team", None, None, false, Uuid::new_v4()).unwrap();
        let before = team.clone();

        let event = team.apply_update(None, None, None).unwrap();

        assert!(event.is_none());
        assert_eq!(team, before);
    }

    #[test]
    fn update_with_blank_name_leaves_team_untouched() {
        let (mut team, _) = Team::new("Team", None, None, false, Uuid::new_v4()).unwrap();

        let result = team.apply_update(Some("  "), Some("new".to_string()), None);

        assert!(matches!(result, Err(TeamError::InvalidTeamName)));
        assert_eq!(team.name(), "Team");
        assert_eq!(team.description(), None);
    }

    #[test]
    fn update_clears_description_with_empty_string() {
        let (mut team, _) = Team::new(
            "Team",
            Some("old".to_string()),
            Some("https://cdn.example.com/a.png".to_string()),
            false,
            Uuid::new_v4(),
        )
        .unwrap();

        team.apply_update(Some("Renamed"), Some(String::new()), None)
            .unwrap();

        assert_eq!(team.name(), "Renamed");
        assert_eq!(team.description(), None);
        assert_eq!(team.avatar_url(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn transfer_changes_owner_but_not_creator() {
        let creator = Uuid::new_v4();
        let next = Uuid::new_v4();
        let (mut team, _) = Team::new("Team", None, None, false, creator).unwrap();

        let event = team.transfer_to(next);

        assert_eq!(team.owner_id(), next);
        assert_eq!(team.created_by(), creator);
        assert_eq!(
            event,
            TeamEvent::OwnershipTransferred {
                team_id: team.id(),
                from: creator,
                to: next,
            }
        );
    }
}
