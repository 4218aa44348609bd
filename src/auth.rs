use crate::models::Role;

pub trait CredentialVerifier {
    fn verify(&self, role: Role, username: &str, password: &str) -> bool;
}

/// The two demo accounts. Plain-text comparison is a placeholder for a
/// real identity provider and must not be reused outside the demo.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCredentials;

const DEMO_ACCOUNTS: [(Role, &str, &str); 2] = [
    (Role::DecisionMaker, "admin", "admin123"),
    (Role::Physician, "doc", "doc123"),
];

impl CredentialVerifier for DemoCredentials {
    fn verify(&self, role: Role, username: &str, password: &str) -> bool {
        DEMO_ACCOUNTS
            .iter()
            .any(|&(r, u, p)| r == role && u == username && p == password)
    }
}
