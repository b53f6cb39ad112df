// Service identity for delegated access
// Inspection and import can run as a dedicated service account instead of
// the invoking user. Delegation wraps the argv in `sudo -n -u <account> --`;
// `-n` keeps sudo non-interactive, so a missing sudoers grant fails fast
// instead of hanging on a password prompt.

/// The account that filesystem inspection and import invocations run as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceIdentity {
    account: Option<String>,
}

impl ServiceIdentity {
    /// Run as the invoking user, no wrapping.
    pub fn current() -> Self {
        Self { account: None }
    }

    /// Run as `account` through sudo.
    pub fn delegate(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
        }
    }

    pub fn from_option(account: Option<String>) -> Self {
        Self { account }
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn is_delegated(&self) -> bool {
        self.account.is_some()
    }

    /// Final argv for running `program` with `args` under this identity.
    pub fn wrap(&self, program: &str, args: &[String]) -> (String, Vec<String>) {
        match &self.account {
            Some(account) => {
                let mut wrapped = vec![
                    "-n".to_string(),
                    "-u".to_string(),
                    account.clone(),
                    "--".to_string(),
                    program.to_string(),
                ];
                wrapped.extend(args.iter().cloned());
                ("sudo".to_string(), wrapped)
            }
            None => (program.to_string(), args.to_vec()),
        }
    }
}
