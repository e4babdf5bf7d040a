use crate::error::{CropSyncError, Result};
use serde::Serialize;

/// Sign-up form as filled in by the user. `confirm_password` stays local.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Body sent to `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl RegistrationForm {
    pub fn into_request(self) -> Result<RegistrationRequest> {
        for (label, value) in [
            ("Name", &self.name),
            ("Email", &self.email),
            ("Username", &self.username),
            ("Password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(CropSyncError::InvalidData(format!("{} is required", label)));
            }
        }

        if !self.email.contains('@') {
            return Err(CropSyncError::InvalidData(format!(
                "'{}' is not an email address",
                self.email
            )));
        }

        if self.password != self.confirm_password {
            return Err(CropSyncError::InvalidData("Passwords do not match".into()));
        }

        Ok(RegistrationRequest {
            name: self.name,
            email: self.email,
            username: self.username,
            password: self.password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            username: "asha".into(),
            password: "hunter2".into(),
            confirm_password: "hunter2".into(),
        }
    }

    #[test]
    fn valid_form_drops_confirmation() {
        let request = form().into_request().unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["username"], "asha");
        assert!(json.get("confirmPassword").is_none());
        assert!(json.get("confirm_password").is_none());
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn mismatched_passwords_rejected() {
        let mut f = form();
        f.confirm_password = "hunter3".into();
        let err = f.into_request().unwrap_err();
        assert!(err.to_string().contains("Passwords do not match"));
    }

    #[test]
    fn blank_fields_rejected() {
        let mut f = form();
        f.username = "  ".into();
        assert!(f.into_request().is_err());

        let mut f = form();
        f.email = "not-an-email".into();
        assert!(f.into_request().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let request = form().into_request().unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
