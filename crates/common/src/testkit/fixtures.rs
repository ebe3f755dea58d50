use uuid::Uuid;

use crate::access::GrantLevel;
use crate::crypto::PasswordHash;
use crate::share::Share;

/// A fresh user id.
pub fn user() -> Uuid {
    Uuid::new_v4()
}

/// Builder for shares in test scenarios.
#[derive(Debug, Clone)]
pub struct ShareFixture {
    owner: Uuid,
    name: String,
    description: String,
    public: bool,
    password: Option<String>,
    grants: Vec<(Uuid, GrantLevel)>,
}

impl ShareFixture {
    pub fn new() -> Self {
        Self {
            owner: user(),
            name: "quarterly numbers".to_string(),
            description: "spreadsheets and exports".to_string(),
            public: false,
            password: None,
            grants: Vec::new(),
        }
    }

    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.owner = owner;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_password(mut self, plaintext: &str) -> Self {
        self.password = Some(plaintext.to_string());
        self
    }

    pub fn granting(mut self, user: Uuid, level: GrantLevel) -> Self {
        self.grants.push((user, level));
        self
    }

    pub fn build(self) -> Share {
        let mut share = Share::new(self.owner, self.name, self.description);
        if self.public {
            share.enable_public_link();
        }
        if let Some(plaintext) = &self.password {
            let hash = PasswordHash::new(plaintext).expect("hash fixture password");
            share.set_password(Some(hash));
        }
        for (user, level) in self.grants {
            share.grant(user, level);
        }
        share
    }
}

impl Default for ShareFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::access::Permission;

    #[test]
    fn test_fixture_builds_configured_share() {
        let owner = user();
        let reader = user();
        let share = ShareFixture::new()
            .owned_by(owner)
            .named("misc")
            .public()
            .with_password("swordfish")
            .granting(reader, GrantLevel::Read)
            .build();

        assert_eq!(share.owner_id(), owner);
        assert_eq!(share.name(), "misc");
        assert!(share.is_public());
        assert!(share.has_password());
        assert!(share.password().unwrap().verify("swordfish"));
        assert_eq!(share.permission_for(Some(reader)), Permission::Read);
    }
}
