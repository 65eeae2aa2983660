//! Email/password authentication with server-side sessions.
//!
//! Sign-up and sign-in issue a signed bearer token; only a hash of the
//! session id is stored. [`AuthService`] is shared by every request, while an
//! [`AuthClient`] holds one client's session and broadcasts only that
//! session's changes, so an expense book follows its own user.

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::constants::{
    AUTH_EVENT_CAPACITY, ERR_INVALID_EMAIL, ERR_INVALID_USERNAME, ERR_PASSWORD_TOO_SHORT,
    MAX_USERNAME_LEN, MIN_PASSWORD_LEN,
};
use crate::db::{decode, encode, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{Profile, ProfileRecord, SessionRecord, User, UserRecord};
use crate::security::{hash_session_id, issue_token, verify_token};
use crate::store::{profiles, run_blocking};

/// Auth state change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: String },
}

/// A session handed back to the client after sign-up or sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Sign-up request fields
#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Email/password authentication provider backed by redb
#[derive(Clone)]
pub struct AuthService {
    db: Db,
    secret: String,
    session_ttl_secs: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(db: Db, secret: String, session_ttl_secs: i64, bcrypt_cost: u32) -> Self {
        Self {
            db,
            secret,
            session_ttl_secs,
            bcrypt_cost,
        }
    }

    /// Register a new user with a profile and start a session
    pub async fn sign_up(&self, request: SignUp) -> Result<AuthSession> {
        let email = User::normalize_email(&request.email);
        if !User::validate_email(&email) {
            return Err(AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(ERR_PASSWORD_TOO_SHORT.to_string()));
        }
        let username = request.username.trim().to_string();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidInput(ERR_INVALID_USERNAME.to_string()));
        }

        let cost = self.bcrypt_cost;
        let password = request.password;
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let user_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let record = UserRecord {
            email,
            password_hash,
            created_at: now.timestamp_millis(),
        };
        let profile = ProfileRecord {
            username,
            avatar_url: String::new(),
            updated_at: now.timestamp_millis(),
        };

        let id = user_id.clone();
        let stored = record.clone();
        run_blocking(&self.db, move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut emails = write_txn.open_table(tables::USER_EMAILS)?;
                if emails.get(stored.email.as_str())?.is_some() {
                    tracing::info!("Sign-up attempt for registered email");
                    return Err(AppError::EmailAlreadyRegistered);
                }
                emails.insert(stored.email.as_str(), id.as_str())?;

                let mut users = write_txn.open_table(tables::USERS)?;
                let bytes = encode(&stored)?;
                users.insert(id.as_str(), bytes.as_slice())?;

                let mut profiles = write_txn.open_table(tables::PROFILES)?;
                let bytes = encode(&profile)?;
                profiles.insert(id.as_str(), bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await?;

        tracing::info!("New user registered: {}", user_id);
        self.start_session(User::from_record(user_id, record)).await
    }

    /// Verify email and password and start a session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = User::normalize_email(email);
        let found = run_blocking(&self.db, move |db| {
            let read_txn = db.begin_read()?;
            let emails = read_txn.open_table(tables::USER_EMAILS)?;
            let Some(user_id) = emails.get(email.as_str())?.map(|v| v.value().to_string()) else {
                return Ok(None);
            };
            let users = read_txn.open_table(tables::USERS)?;
            let record = users
                .get(user_id.as_str())?
                .map(|bytes| decode::<UserRecord>(bytes.value()))
                .transpose()?;
            Ok(record.map(|r| (user_id, r)))
        })
        .await?;

        let Some((user_id, record)) = found else {
            tracing::info!("Sign-in attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = record.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        if !valid {
            tracing::info!("Invalid password for user {}", user_id);
            return Err(AppError::InvalidCredentials);
        }

        self.start_session(User::from_record(user_id, record)).await
    }

    /// Revoke the session behind a token
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        let key = self.session_key(token)?;
        let removed = run_blocking(&self.db, move |db| {
            let write_txn = db.begin_write()?;
            let mut sessions = write_txn.open_table(tables::SESSIONS)?;
            let removed = sessions
                .remove(key.as_str())?
                .map(|bytes| decode::<SessionRecord>(bytes.value()))
                .transpose()?;
            drop(sessions);
            write_txn.commit()?;
            Ok(removed)
        })
        .await?;

        let session = removed.ok_or(AppError::Unauthorized)?;
        tracing::info!("User {} signed out", session.user_id);
        Ok(())
    }

    /// Resolve a bearer token to its user
    pub async fn get_session(&self, token: &str) -> Result<User> {
        let key = self.session_key(token)?;
        let now = Utc::now().timestamp();

        run_blocking(&self.db, move |db| {
            let read_txn = db.begin_read()?;
            let sessions = read_txn.open_table(tables::SESSIONS)?;
            let session: SessionRecord = sessions
                .get(key.as_str())?
                .map(|bytes| decode(bytes.value()))
                .transpose()?
                .ok_or(AppError::Unauthorized)?;

            if session.is_expired(now) {
                drop(sessions);
                drop(read_txn);
                remove_session(db, &key)?;
                tracing::info!("Expired session for user {}", session.user_id);
                return Err(AppError::Unauthorized);
            }

            drop(sessions);
            load_user(db, &session.user_id)?.ok_or(AppError::Unauthorized)
        })
        .await
    }

    /// Delete every session past its expiry, returning how many were removed
    pub async fn purge_expired_sessions(&self) -> Result<usize> {
        let now = Utc::now().timestamp();
        let purged = run_blocking(&self.db, move |db| purge_expired(db, now)).await?;
        if purged > 0 {
            tracing::info!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    /// Current user together with their profile
    pub async fn get_session_with_profile(&self, token: &str) -> Result<(User, Option<Profile>)> {
        let user = self.get_session(token).await?;
        let user_id = user.id.clone();
        let profile =
            run_blocking(&self.db, move |db| profiles::fetch_profile(db, &user_id)).await?;
        Ok((user, profile))
    }

    async fn start_session(&self, user: User) -> Result<AuthSession> {
        self.purge_expired_sessions().await?;

        let issued = issue_token(&self.secret);
        let key = hash_session_id(&issued.session_id, &self.secret);
        let expires_at = Utc::now().timestamp() + self.session_ttl_secs;
        let record = SessionRecord {
            user_id: user.id.clone(),
            expires_at,
        };

        run_blocking(&self.db, move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut sessions = write_txn.open_table(tables::SESSIONS)?;
                let bytes = encode(&record)?;
                sessions.insert(key.as_str(), bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await?;

        tracing::info!("User {} signed in", user.id);

        Ok(AuthSession {
            access_token: issued.token,
            expires_at: DateTime::from_timestamp(expires_at, 0).unwrap_or_else(Utc::now),
            user,
        })
    }

    fn session_key(&self, token: &str) -> Result<String> {
        let session_id = verify_token(token, &self.secret).ok_or(AppError::Unauthorized)?;
        Ok(hash_session_id(session_id, &self.secret))
    }
}

/// One client's view of authentication
///
/// Holds at most one session and notifies subscribers when it starts or ends.
/// Sessions started by other clients of the same [`AuthService`] are never
/// reported here.
pub struct AuthClient {
    service: AuthService,
    session: Option<AuthSession>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(service: AuthService) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            service,
            session: None,
            events,
        }
    }

    /// Subscribe to this client's sign-in and sign-out notifications
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub async fn sign_up(&mut self, request: SignUp) -> Result<&AuthSession> {
        let session = self.service.sign_up(request).await?;
        Ok(self.replace_session(session))
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&AuthSession> {
        let session = self.service.sign_in(email, password).await?;
        Ok(self.replace_session(session))
    }

    /// End the current session, if any
    pub async fn sign_out(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let result = self.service.sign_out(&session.access_token).await;
        self.notify(AuthEvent::SignedOut {
            user_id: session.user.id,
        });
        match result {
            // Already gone server-side
            Err(AppError::Unauthorized) => Ok(()),
            other => other,
        }
    }

    /// Re-validate the held token, dropping the session if it was revoked or expired
    pub async fn refresh(&mut self) -> Result<Option<&User>> {
        let Some(token) = self.session.as_ref().map(|s| s.access_token.clone()) else {
            return Ok(None);
        };
        match self.service.get_session(&token).await {
            Ok(_) => Ok(self.session.as_ref().map(|s| &s.user)),
            Err(AppError::Unauthorized) => {
                if let Some(session) = self.session.take() {
                    self.notify(AuthEvent::SignedOut {
                        user_id: session.user.id,
                    });
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn replace_session(&mut self, session: AuthSession) -> &AuthSession {
        if let Some(previous) = self.session.take() {
            self.notify(AuthEvent::SignedOut {
                user_id: previous.user.id,
            });
        }
        self.notify(AuthEvent::SignedIn {
            user_id: session.user.id.clone(),
        });
        self.session.insert(session)
    }

    fn notify(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn load_user(db: &Database, user_id: &str) -> Result<Option<User>> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;
    let user = users
        .get(user_id)?
        .map(|bytes| decode::<UserRecord>(bytes.value()))
        .transpose()?
        .map(|record| User::from_record(user_id.to_string(), record));
    Ok(user)
}

fn purge_expired(db: &Database, now: i64) -> Result<usize> {
    let write_txn = db.begin_write()?;
    let purged = {
        let mut sessions = write_txn.open_table(tables::SESSIONS)?;
        let mut expired = Vec::new();
        for entry in sessions.iter()? {
            let (key, value) = entry?;
            let session: SessionRecord = decode(value.value())?;
            if session.is_expired(now) {
                expired.push(key.value().to_string());
            }
        }
        for key in &expired {
            sessions.remove(key.as_str())?;
        }
        expired.len()
    };
    write_txn.commit()?;
    Ok(purged)
}

fn remove_session(db: &Database, key: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut sessions = write_txn.open_table(tables::SESSIONS)?;
        sessions.remove(key)?;
    }
    write_txn.commit()?;
    Ok(())
}
