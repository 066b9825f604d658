//! Session list feeding the preparation wizard
//!
//! Holds the last successful snapshot of sessions plus the course, group and
//! user catalogs needed to display them.

use crate::collaborators::SessionStore;
use crate::error::{Error, Result};
use slidecast_common::models::{Course, Group, User};
use slidecast_common::{Session, SessionId, SessionStatus};
use std::collections::HashMap;
use std::str::FromStr;

/// Title shown for a session whose course is not in the catalog
pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// Status filter for the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(SessionStatus),
}

impl StatusFilter {
    fn matches(&self, status: SessionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<SessionStatus>()
            .map(StatusFilter::Only)
            .map_err(|e| e.to_string())
    }
}

/// Column the list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Teacher,
    Course,
    Groups,
    Status,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "teacher" => Ok(SortKey::Teacher),
            "course" => Ok(SortKey::Course),
            "group" | "groups" => Ok(SortKey::Groups),
            "status" => Ok(SortKey::Status),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

/// A session picked for preparation, with what the wizard needs to seed it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSelection {
    pub session: Session,
    /// Title of the session's course, when known
    pub course_title: Option<String>,
}

/// Filterable, sortable view over the session store
#[derive(Debug, Default)]
pub struct SessionListView {
    sessions: Vec<Session>,
    courses: HashMap<i64, Course>,
    groups: HashMap<i64, Group>,
    users: HashMap<i64, User>,
    status_filter: StatusFilter,
    teacher_filter: Option<i64>,
    sort_key: Option<SortKey>,
}

impl SessionListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the view to one teacher's sessions (trainer view)
    pub fn for_teacher(teacher_id: i64) -> Self {
        Self {
            teacher_filter: Some(teacher_id),
            ..Self::default()
        }
    }

    /// Reload everything from the store
    ///
    /// All four lists are fetched concurrently. On any failure the previous
    /// snapshot is kept and the error returned.
    pub async fn refresh(&mut self, store: &dyn SessionStore) -> Result<()> {
        let (sessions, courses, groups, users) = tokio::try_join!(
            store.list_sessions(),
            store.list_courses(),
            store.list_groups(),
            store.list_users(),
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Session list refresh failed, keeping previous data");
            Error::Api(e)
        })?;

        tracing::debug!(
            sessions = sessions.len(),
            courses = courses.len(),
            groups = groups.len(),
            users = users.len(),
            "Session list refreshed"
        );

        self.sessions = sessions;
        self.courses = courses.into_iter().map(|c| (c.id, c)).collect();
        self.groups = groups.into_iter().map(|g| (g.id, g)).collect();
        self.users = users.into_iter().map(|u| (u.id, u)).collect();
        Ok(())
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
    }

    pub fn set_teacher_filter(&mut self, teacher_id: Option<i64>) {
        self.teacher_filter = teacher_id;
    }

    pub fn set_sort(&mut self, key: Option<SortKey>) {
        self.sort_key = key;
    }

    /// Sessions passing the current filters, in the current sort order
    pub fn visible(&self) -> Vec<&Session> {
        let mut rows: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| self.status_filter.matches(s.status))
            .filter(|s| self.teacher_filter.map_or(true, |t| s.teacher_id == t))
            .collect();

        if let Some(key) = self.sort_key {
            // sort_by is stable, so ties keep store order
            match key {
                SortKey::Teacher => rows.sort_by(|a, b| {
                    self.teacher_name(a.teacher_id)
                        .cmp(&self.teacher_name(b.teacher_id))
                }),
                SortKey::Course => {
                    rows.sort_by(|a, b| self.course_title(a).cmp(self.course_title(b)))
                }
                SortKey::Groups => {
                    rows.sort_by(|a, b| self.group_names(a).cmp(&self.group_names(b)))
                }
                SortKey::Status => rows.sort_by_key(|s| s.status.rank()),
            }
        }

        rows
    }

    /// Sessions awaiting preparation, ignoring the status filter
    pub fn pending(&self) -> Vec<&Session> {
        self.with_status(SessionStatus::Pending)
    }

    /// Sessions already validated, ignoring the status filter
    pub fn validated(&self) -> Vec<&Session> {
        self.with_status(SessionStatus::Validated)
    }

    fn with_status(&self, status: SessionStatus) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.status == status)
            .filter(|s| self.teacher_filter.map_or(true, |t| s.teacher_id == t))
            .collect()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Pick a session for the wizard
    pub fn selection(&self, id: SessionId) -> Option<SessionSelection> {
        let session = self.get(id)?;
        Some(SessionSelection {
            session: session.clone(),
            course_title: self.courses.get(&session.course_id).map(|c| c.title.clone()),
        })
    }

    pub fn course_title(&self, session: &Session) -> &str {
        self.courses
            .get(&session.course_id)
            .map(|c| c.title.as_str())
            .unwrap_or(UNKNOWN_COURSE)
    }

    /// Group names joined with ", "; unknown ids are skipped
    pub fn group_names(&self, session: &Session) -> String {
        session
            .group_ids
            .iter()
            .filter_map(|id| self.groups.get(id))
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn teacher_name(&self, teacher_id: i64) -> String {
        self.users
            .get(&teacher_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| format!("Teacher {}", teacher_id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
