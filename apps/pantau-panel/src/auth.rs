use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// bcrypt hash. The legacy dashboard stored unsalted SHA-256 here;
    /// seeds and resets now go through bcrypt.
    pub password: String,
    pub role: String,
    pub created_at: String,
}

/// Flat-file credential store: username -> record, persisted as JSON.
pub struct UserStore {
    path: PathBuf,
    users: Mutex<HashMap<String, UserRecord>>,
}

impl UserStore {
    /// Load the store from disk, seeding the default admin/user accounts
    /// on first run (or when the file is unreadable).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let users = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Malformed users file {}", path.display()))?,
            Err(_) => {
                info!("Users file {} not found, seeding defaults", path.display());
                let users = Self::default_users()?;
                let store = Self {
                    path: path.clone(),
                    users: Mutex::new(users),
                };
                store.save()?;
                return Ok(store);
            }
        };

        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    fn default_users() -> Result<HashMap<String, UserRecord>> {
        let mut users = HashMap::new();
        users.insert(
            "admin".to_string(),
            UserRecord {
                password: hash_password("password")?,
                role: "admin".to_string(),
                created_at: "2025-01-01 00:00:00".to_string(),
            },
        );
        users.insert(
            "user".to_string(),
            UserRecord {
                password: hash_password("user123")?,
                role: "user".to_string(),
                created_at: "2025-01-01 00:00:00".to_string(),
            },
        );
        Ok(users)
    }

    fn save(&self) -> Result<()> {
        let users = self.users.lock().unwrap();
        let contents = serde_json::to_string_pretty(&*users)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write users file {}", self.path.display()))?;
        Ok(())
    }

    /// Verify a username/password pair, returning the role on success.
    pub fn verify(&self, username: &str, password: &str) -> Option<String> {
        let users = self.users.lock().unwrap();
        let record = users.get(username)?;
        if bcrypt::verify(password, &record.password).unwrap_or(false) {
            Some(record.role.clone())
        } else {
            None
        }
    }

    pub fn add_user(&self, username: &str, password: &str, role: &str) -> Result<()> {
        {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(username) {
                anyhow::bail!("User '{}' already exists", username);
            }
            users.insert(
                username.to_string(),
                UserRecord {
                    password: hash_password(password)?,
                    role: role.to_string(),
                    created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                },
            );
        }
        self.save()
    }

    pub fn set_password(&self, username: &str, new_password: &str) -> Result<()> {
        {
            let mut users = self.users.lock().unwrap();
            let record = users
                .get_mut(username)
                .with_context(|| format!("Unknown user '{}'", username))?;
            record.password = hash_password(new_password)?;
        }
        self.save()
    }

    /// The seeded admin account cannot be removed.
    pub fn remove_user(&self, username: &str) -> Result<()> {
        {
            let mut users = self.users.lock().unwrap();
            if username == "admin" {
                anyhow::bail!("Cannot delete the admin user");
            }
            if users.remove(username).is_none() {
                anyhow::bail!("Unknown user '{}'", username);
            }
        }
        self.save()
    }

    pub fn usernames(&self) -> Vec<String> {
        let users = self.users.lock().unwrap();
        let mut names: Vec<String> = users.keys().cloned().collect();
        names.sort();
        names
    }
}

fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")
}

/// An authenticated session. Expiry is a pure function of the login time
/// so the policy window stays configurable and testable.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: String,
    pub login_time: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now - self.login_time > timeout
    }
}

/// In-process session map keyed by opaque token.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn insert(&self, token: String, session: Session) {
        self.sessions.lock().unwrap().insert(token, session);
    }

    /// Fetch a live session; expired entries are dropped on access and
    /// behave exactly like absent ones.
    pub fn get_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> Option<Session> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(token) {
            Some(s) if s.is_expired(now, timeout) => {
                sessions.remove(token);
                None
            }
            Some(s) => Some(s.clone()),
            None => None,
        }
    }

    pub fn remove(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(dir.path().join("users.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn seeds_default_accounts_with_bcrypt_hashes() {
        let (_dir, store) = temp_store();
        assert_eq!(store.verify("admin", "password").as_deref(), Some("admin"));
        assert_eq!(store.verify("user", "user123").as_deref(), Some("user"));
        assert_eq!(store.verify("admin", "wrong"), None);
        assert_eq!(store.verify("ghost", "password"), None);
    }

    #[test]
    fn add_reset_and_remove_users() {
        let (_dir, store) = temp_store();
        store.add_user("ops", "s3cret", "user").unwrap();
        assert_eq!(store.verify("ops", "s3cret").as_deref(), Some("user"));

        store.set_password("ops", "rotated").unwrap();
        assert_eq!(store.verify("ops", "s3cret"), None);
        assert_eq!(store.verify("ops", "rotated").as_deref(), Some("user"));

        store.remove_user("ops").unwrap();
        assert_eq!(store.verify("ops", "rotated"), None);
        assert!(store.remove_user("admin").is_err());
    }

    #[test]
    fn session_expires_at_the_configured_boundary() {
        let timeout = chrono::Duration::hours(4);
        let login = Utc::now();
        let session = Session {
            username: "admin".to_string(),
            role: "admin".to_string(),
            login_time: login,
        };

        assert!(!session.is_expired(login + chrono::Duration::hours(4), timeout));
        assert!(session.is_expired(
            login + chrono::Duration::hours(4) + chrono::Duration::seconds(1),
            timeout
        ));
    }

    #[test]
    fn expired_sessions_are_dropped_on_access() {
        let store = SessionStore::default();
        let timeout = chrono::Duration::hours(4);
        let login = Utc::now() - chrono::Duration::hours(5);
        store.insert(
            "tok".to_string(),
            Session {
                username: "admin".to_string(),
                role: "admin".to_string(),
                login_time: login,
            },
        );

        assert!(store.get_active("tok", Utc::now(), timeout).is_none());
        // Gone for good, not just filtered.
        assert!(
            store
                .get_active("tok", login + chrono::Duration::minutes(1), timeout)
                .is_none()
        );
    }
}
