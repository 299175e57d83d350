// SPDX-License-Identifier: BUSL-1.1
//! In-memory storage backend using DashMap.
//!
//! Users are keyed by lower-cased email, registrations and final
//! submissions by `(event id, email)` so that duplicate detection is a
//! single `entry()` call. Every row carries a sequence number taken from one
//! counter, which gives listings a stable insertion order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::StubError;

/// Conflict message for a duplicate account.
pub const USER_EXISTS: &str = "User with this email already exists";
/// Reply message for a repeated event registration.
pub const ALREADY_REGISTERED: &str = "You are already registered for this hackathon";
/// Reply message for a first event registration.
pub const REGISTERED: &str = "Successfully registered for hackathon";
/// Conflict message for a second final submission.
pub const ALREADY_SUBMITTED: &str = "You have already submitted a project for this hackathon";
/// Rejection message for bad credentials.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl UserRow {
    /// Public view, never includes the password.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "role": self.role,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EventRow {
    pub seq: u64,
    pub id: String,
    pub title: String,
    pub registration_open: bool,
}

impl EventRow {
    pub fn status(&self) -> &'static str {
        if self.registration_open {
            "REGISTRATION_OPEN"
        } else {
            "REGISTRATION_CLOSED"
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "status": self.status(),
            "type": "ONLINE",
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationRow {
    pub seq: u64,
    pub email: String,
    pub selected_track: Option<u32>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubmissionRow {
    pub seq: u64,
    pub id: String,
    pub event_id: String,
    pub email: String,
    pub body: Value,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
}

impl SubmissionRow {
    pub fn to_json(&self, submitter: Option<&UserRow>) -> Value {
        let mut v = self.body.clone();
        if let Some(obj) = v.as_object_mut() {
            obj.insert("id".into(), json!(self.id));
            obj.insert("hackathonId".into(), json!(self.event_id));
            obj.insert("isDraft".into(), json!(self.is_draft));
            obj.insert(
                "status".into(),
                json!(if self.is_draft { "DRAFT" } else { "SUBMITTED" }),
            );
            obj.insert("createdAt".into(), json!(self.created_at.to_rfc3339()));
            if let Some(user) = submitter {
                obj.insert("submitterId".into(), json!(user.id));
                obj.insert(
                    "submitter".into(),
                    json!({
                        "id": user.id,
                        "email": user.email,
                        "firstName": user.first_name,
                        "lastName": user.last_name,
                    }),
                );
            }
        }
        v
    }
}

struct Inner {
    seq: AtomicU64,
    users: DashMap<String, UserRow>,
    tokens: DashMap<String, String>,
    events: DashMap<String, EventRow>,
    registrations: DashMap<(String, String), RegistrationRow>,
    submissions: DashMap<String, SubmissionRow>,
    final_submissions: DashMap<(String, String), String>,
    submission_attempts: DashMap<String, u32>,
}

/// Shared application state holding all in-memory stores.
///
/// Cheaply cloneable via `Arc`; all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                seq: AtomicU64::new(0),
                users: DashMap::new(),
                tokens: DashMap::new(),
                events: DashMap::new(),
                registrations: DashMap::new(),
                submissions: DashMap::new(),
                final_submissions: DashMap::new(),
                submission_attempts: DashMap::new(),
            }),
        }
    }

    fn next_seq(&self) -> u64 {
        self.inner.seq.fetch_add(1, Ordering::SeqCst)
    }

    // ── seeding ─────────────────────────────────────────────────────

    /// Insert or replace an event.
    pub fn seed_event(&self, id: &str, title: &str, registration_open: bool) {
        let row = EventRow {
            seq: self.next_seq(),
            id: id.to_string(),
            title: title.to_string(),
            registration_open,
        };
        self.inner.events.insert(id.to_string(), row);
    }

    /// Insert a user directly, bypassing the conflict check. Returns the user id.
    pub fn seed_user(&self, email: &str, password: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.inner.users.insert(
            key(email),
            UserRow {
                id: id.clone(),
                email: email.to_string(),
                password: password.to_string(),
                first_name: "Seeded".into(),
                last_name: "User".into(),
                role: "PARTICIPANT".into(),
            },
        );
        id
    }

    /// Record a final submission for `email` without going through the API.
    ///
    /// The user does not have to be registered for the event; the
    /// participant listing picks submitters up regardless.
    pub fn seed_submission(&self, event_id: &str, email: &str, title: &str) -> String {
        let row = self.new_submission(event_id, email, json!({ "title": title }), false);
        let id = row.id.clone();
        self.inner
            .final_submissions
            .insert((event_id.to_string(), key(email)), id.clone());
        self.inner.submissions.insert(id.clone(), row);
        id
    }

    /// How many times `email` called `POST /submissions`.
    pub fn submission_attempts(&self, email: &str) -> u32 {
        self.inner
            .submission_attempts
            .get(&key(email))
            .map(|v| *v.value())
            .unwrap_or(0)
    }

    /// Number of accounts.
    pub fn user_count(&self) -> usize {
        self.inner.users.len()
    }

    // ── auth ────────────────────────────────────────────────────────

    fn issue_token(&self, email: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.inner.tokens.insert(token.clone(), key(email));
        token
    }

    /// Drop every issued token, as if they all expired.
    pub fn expire_tokens(&self) {
        self.inner.tokens.clear();
    }

    pub fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> Result<(UserRow, String), StubError> {
        let row = match self.inner.users.entry(key(email)) {
            Entry::Occupied(_) => return Err(StubError::Conflict(USER_EXISTS.into())),
            Entry::Vacant(slot) => {
                let row = UserRow {
                    id: Uuid::new_v4().to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    role: role.to_string(),
                };
                slot.insert(row.clone());
                row
            }
        };
        let token = self.issue_token(email);
        Ok((row, token))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<(UserRow, String), StubError> {
        let row = self
            .inner
            .users
            .get(&key(email))
            .filter(|u| u.password == password)
            .map(|u| u.value().clone())
            .ok_or_else(|| StubError::Unauthorized(INVALID_CREDENTIALS.into()))?;
        let token = self.issue_token(email);
        Ok((row, token))
    }

    /// Resolve a bearer token to its user.
    pub fn user_for_token(&self, token: &str) -> Result<UserRow, StubError> {
        let email = self
            .inner
            .tokens
            .get(token)
            .map(|e| e.value().clone())
            .ok_or_else(|| StubError::Unauthorized("Unauthorized".into()))?;
        self.inner
            .users
            .get(&email)
            .map(|u| u.value().clone())
            .ok_or_else(|| StubError::Unauthorized("Unauthorized".into()))
    }

    // ── events ──────────────────────────────────────────────────────

    pub fn events(&self) -> Vec<EventRow> {
        let mut rows: Vec<EventRow> = self.inner.events.iter().map(|e| e.value().clone()).collect();
        rows.sort_by_key(|r| r.seq);
        rows
    }

    pub fn event(&self, id: &str) -> Result<EventRow, StubError> {
        self.inner
            .events
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| StubError::NotFound("Hackathon not found".into()))
    }

    /// Register `user` for an event. `Ok(true)` on a new registration,
    /// `Ok(false)` when the user was already registered.
    pub fn register(&self, event_id: &str, user: &UserRow, selected_track: Option<u32>) -> Result<bool, StubError> {
        let event = self.event(event_id)?;
        if !event.registration_open {
            return Err(StubError::BadRequest(
                "Registration is not open for this hackathon".into(),
            ));
        }
        match self
            .inner
            .registrations
            .entry((event_id.to_string(), key(&user.email)))
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(RegistrationRow {
                    seq: self.next_seq(),
                    email: user.email.clone(),
                    selected_track,
                    joined_at: Utc::now(),
                });
                Ok(true)
            }
        }
    }

    /// Participant listing: registered users first (in registration order),
    /// then submitters who never registered.
    pub fn participants(&self, event_id: &str) -> Result<Vec<Value>, StubError> {
        self.event(event_id)?;

        let mut regs: Vec<RegistrationRow> = self
            .inner
            .registrations
            .iter()
            .filter(|e| e.key().0 == event_id)
            .map(|e| e.value().clone())
            .collect();
        regs.sort_by_key(|r| r.seq);

        let mut out = Vec::with_capacity(regs.len());
        let mut seen = std::collections::HashSet::new();
        for reg in regs {
            let k = key(&reg.email);
            let submission_id = self.final_submission_id(event_id, &k);
            out.push(self.participant_json(&k, &reg.email, reg.joined_at, submission_id));
            seen.insert(k);
        }

        let mut unregistered: Vec<SubmissionRow> = self
            .inner
            .submissions
            .iter()
            .filter(|s| s.event_id == event_id && !s.is_draft && !seen.contains(&key(&s.email)))
            .map(|s| s.value().clone())
            .collect();
        unregistered.sort_by_key(|s| s.seq);
        for sub in unregistered {
            let k = key(&sub.email);
            if seen.insert(k.clone()) {
                out.push(self.participant_json(&k, &sub.email, sub.created_at, Some(sub.id.clone())));
            }
        }
        Ok(out)
    }

    fn final_submission_id(&self, event_id: &str, email_key: &str) -> Option<String> {
        self.inner
            .final_submissions
            .get(&(event_id.to_string(), email_key.to_string()))
            .map(|id| id.value().clone())
    }

    fn participant_json(
        &self,
        email_key: &str,
        email: &str,
        registered_at: DateTime<Utc>,
        submission_id: Option<String>,
    ) -> Value {
        let user = self.inner.users.get(email_key).map(|u| u.value().clone());
        json!({
            "id": user.as_ref().map(|u| u.id.clone()),
            "firstName": user.as_ref().map(|u| u.first_name.clone()),
            "lastName": user.as_ref().map(|u| u.last_name.clone()),
            "email": email,
            "registeredAt": registered_at.to_rfc3339(),
            "hasSubmission": submission_id.is_some(),
            "submissionId": submission_id,
        })
    }

    // ── submissions ─────────────────────────────────────────────────

    fn new_submission(&self, event_id: &str, email: &str, body: Value, is_draft: bool) -> SubmissionRow {
        let seq = self.next_seq();
        SubmissionRow {
            seq,
            id: format!("submission-{seq}"),
            event_id: event_id.to_string(),
            email: email.to_string(),
            body,
            is_draft,
            created_at: Utc::now(),
        }
    }

    /// Create a submission. A second final submission by the same user for
    /// the same event is a conflict; drafts are never deduplicated.
    pub fn submit(&self, user: &UserRow, event_id: &str, body: Value, is_draft: bool) -> Result<Value, StubError> {
        *self
            .inner
            .submission_attempts
            .entry(key(&user.email))
            .or_insert(0) += 1;

        self.event(event_id)?;
        let row = self.new_submission(event_id, &user.email, body, is_draft);
        if !is_draft {
            match self
                .inner
                .final_submissions
                .entry((event_id.to_string(), key(&user.email)))
            {
                Entry::Occupied(_) => return Err(StubError::Conflict(ALREADY_SUBMITTED.into())),
                Entry::Vacant(slot) => {
                    slot.insert(row.id.clone());
                }
            }
        }
        let view = row.to_json(Some(user));
        self.inner.submissions.insert(row.id.clone(), row);
        Ok(view)
    }

    pub fn submissions_for(&self, event_id: Option<&str>) -> Vec<Value> {
        let mut rows: Vec<SubmissionRow> = self
            .inner
            .submissions
            .iter()
            .filter(|s| event_id.map_or(true, |id| s.event_id == id))
            .map(|s| s.value().clone())
            .collect();
        rows.sort_by_key(|s| s.seq);
        rows.iter()
            .map(|s| {
                let user = self.inner.users.get(&key(&s.email)).map(|u| u.value().clone());
                s.to_json(user.as_ref())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_account_is_conflict_case_insensitive() {
        let state = AppState::new();
        state.create_user("A@x.com", "pw", "A", "B", "PARTICIPANT").unwrap();
        let err = state.create_user("a@x.com", "pw", "A", "B", "PARTICIPANT").unwrap_err();
        assert_eq!(err, StubError::Conflict(USER_EXISTS.into()));
        assert_eq!(state.user_count(), 1);
    }

    #[test]
    fn login_checks_password() {
        let state = AppState::new();
        state.seed_user("a@x.com", "right");
        assert!(state.login("a@x.com", "right").is_ok());
        assert_eq!(
            state.login("a@x.com", "wrong").unwrap_err(),
            StubError::Unauthorized(INVALID_CREDENTIALS.into())
        );
        assert!(state.login("nobody@x.com", "right").is_err());
    }

    #[test]
    fn expired_tokens_no_longer_resolve() {
        let state = AppState::new();
        let (_, token) = state.create_user("a@x.com", "pw", "A", "B", "PARTICIPANT").unwrap();
        assert!(state.user_for_token(&token).is_ok());
        state.expire_tokens();
        assert!(state.user_for_token(&token).is_err());
    }

    #[test]
    fn registration_is_idempotent() {
        let state = AppState::new();
        state.seed_event("E1", "Jam", true);
        let (user, _) = state.create_user("a@x.com", "pw", "A", "B", "PARTICIPANT").unwrap();
        assert!(state.register("E1", &user, Some(1)).unwrap());
        assert!(!state.register("E1", &user, Some(1)).unwrap());
        assert_eq!(state.participants("E1").unwrap().len(), 1);
    }

    #[test]
    fn closed_event_rejects_registration() {
        let state = AppState::new();
        state.seed_event("E1", "Jam", false);
        let (user, _) = state.create_user("a@x.com", "pw", "A", "B", "PARTICIPANT").unwrap();
        assert!(matches!(state.register("E1", &user, None), Err(StubError::BadRequest(_))));
    }

    #[test]
    fn second_final_submission_conflicts_but_drafts_do_not() {
        let state = AppState::new();
        state.seed_event("E1", "Jam", true);
        let (user, _) = state.create_user("a@x.com", "pw", "A", "B", "PARTICIPANT").unwrap();
        state.submit(&user, "E1", json!({"title": "d"}), true).unwrap();
        state.submit(&user, "E1", json!({"title": "p"}), false).unwrap();
        let err = state.submit(&user, "E1", json!({"title": "p2"}), false).unwrap_err();
        assert_eq!(err, StubError::Conflict(ALREADY_SUBMITTED.into()));
        assert_eq!(state.submission_attempts("a@x.com"), 3);
    }

    #[test]
    fn seeded_submitter_appears_without_registration() {
        let state = AppState::new();
        state.seed_event("E1", "Jam", true);
        let (user, _) = state.create_user("a@x.com", "pw", "A", "B", "PARTICIPANT").unwrap();
        state.register("E1", &user, None).unwrap();
        state.seed_submission("E1", "ghost@x.com", "Ghost");

        let rows = state.participants("E1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["email"], "a@x.com");
        assert_eq!(rows[0]["hasSubmission"], false);
        assert_eq!(rows[1]["email"], "ghost@x.com");
        assert_eq!(rows[1]["hasSubmission"], true);
    }

    #[test]
    fn events_listed_in_seed_order() {
        let state = AppState::new();
        state.seed_event("B", "Second", true);
        state.seed_event("A", "First", true);
        let ids: Vec<String> = state.events().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }
}
