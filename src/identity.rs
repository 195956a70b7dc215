use crate::config::env_string;
use crate::types::User;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    #[error("Sign-in popup was blocked")]
    PopupBlocked,

    #[error("Sign-in was cancelled")]
    Cancelled,

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Short text suitable for showing to the player
    pub fn user_message(&self) -> &'static str {
        match self {
            IdentityError::PopupBlocked => "Please allow popups to sign in.",
            IdentityError::Cancelled => "Sign-in cancelled.",
            IdentityError::Unavailable(_) => "Sign-in is not available right now.",
        }
    }
}

/// Sign-in collaborator; the quiz only needs the current user for score submission
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<User>;
    async fn sign_in(&self) -> Result<User, IdentityError>;
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Identity backed by a locally configured profile
#[derive(Debug, Default)]
pub struct LocalIdentity {
    profile: Option<User>,
    current: RwLock<Option<User>>,
}

impl LocalIdentity {
    pub fn new(profile: User) -> Self {
        Self {
            profile: Some(profile),
            current: RwLock::new(None),
        }
    }

    /// No profile configured; sign-in is unavailable
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Profile from QUIZ_USER_ID / QUIZ_USER_NAME (QUIZ_USER_PHOTO optional)
    pub fn from_env() -> Self {
        match (env_string("QUIZ_USER_ID"), env_string("QUIZ_USER_NAME")) {
            (Some(id), name) => {
                let display_name = name.unwrap_or_else(|| id.clone());
                tracing::info!("Local profile configured for {}", display_name);
                Self::new(User {
                    id,
                    display_name,
                    photo_url: env_string("QUIZ_USER_PHOTO"),
                })
            }
            (None, Some(_)) => {
                tracing::warn!("QUIZ_USER_NAME set without QUIZ_USER_ID, playing anonymously");
                Self::anonymous()
            }
            (None, None) => Self::anonymous(),
        }
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    async fn sign_in(&self) -> Result<User, IdentityError> {
        let Some(profile) = self.profile.clone() else {
            return Err(IdentityError::Unavailable(
                "no local profile configured".to_string(),
            ));
        };
        *self.current.write().await = Some(profile.clone());
        tracing::info!("Signed in as {}", profile.display_name);
        Ok(profile)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        if let Some(user) = self.current.write().await.take() {
            tracing::info!("Signed out {}", user.display_name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn profile() -> User {
        User {
            id: "u-1".to_string(),
            display_name: "Ruth".to_string(),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let identity = LocalIdentity::new(profile());
        assert_eq!(identity.current_user().await, None);

        let user = identity.sign_in().await.unwrap();
        assert_eq!(user.display_name, "Ruth");
        assert_eq!(identity.current_user().await, Some(profile()));

        identity.sign_out().await.unwrap();
        assert_eq!(identity.current_user().await, None);
        // Signing out twice is fine
        identity.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_anonymous_sign_in_unavailable() {
        let identity = LocalIdentity::anonymous();
        let err = identity.sign_in().await.unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
        assert_eq!(err.user_message(), "Sign-in is not available right now.");
        assert_eq!(identity.current_user().await, None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            IdentityError::PopupBlocked.user_message(),
            "Please allow popups to sign in."
        );
        assert_eq!(IdentityError::Cancelled.to_string(), "Sign-in was cancelled");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("QUIZ_USER_ID", " abc ");
        std::env::remove_var("QUIZ_USER_NAME");
        std::env::remove_var("QUIZ_USER_PHOTO");
        let identity = LocalIdentity::from_env();
        assert!(identity.has_profile());
        assert_eq!(identity.profile.as_ref().unwrap().display_name, "abc");

        std::env::remove_var("QUIZ_USER_ID");
        std::env::set_var("QUIZ_USER_NAME", "Ruth");
        assert!(!LocalIdentity::from_env().has_profile());
        std::env::remove_var("QUIZ_USER_NAME");
    }
}
