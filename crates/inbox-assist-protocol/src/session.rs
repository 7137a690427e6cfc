//! Explicit per-user context for driving the API.
//!
//! A `Session` replaces ambient client state: it owns the token set from the
//! login and the last inbox listing, and is handed to each client call.

use reqwest::Url;

use crate::client::ClientError;
use crate::types::{AuthTokenSet, EmailMessage, PriorityAssignment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    tokens: AuthTokenSet,
    emails: Vec<EmailMessage>,
}

impl Session {
    pub fn new(tokens: AuthTokenSet) -> Self {
        Self {
            tokens,
            emails: Vec::new(),
        }
    }

    /// Capture tokens from the redirect issued by `GET /api/token`.
    ///
    /// The server redirects to `<base>/?access_token=…&refresh_token=…&expires_in=…`;
    /// an empty `refresh_token` means the provider issued none.
    pub fn from_redirect_url(url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let mut access_token = None;
        let mut refresh_token = None;
        let mut expires_in = 0;

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "access_token" if !value.is_empty() => access_token = Some(value.into_owned()),
                "refresh_token" if !value.is_empty() => refresh_token = Some(value.into_owned()),
                "expires_in" => expires_in = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        let access_token = access_token.ok_or(ClientError::MissingAccessToken)?;

        Ok(Self::new(AuthTokenSet {
            access_token,
            refresh_token,
            expires_in,
        }))
    }

    pub fn tokens(&self) -> &AuthTokenSet {
        &self.tokens
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    /// Messages from the most recent `list_emails` call, newest first.
    pub fn emails(&self) -> &[EmailMessage] {
        &self.emails
    }

    pub(crate) fn replace_emails(&mut self, emails: Vec<EmailMessage>) {
        self.emails = emails;
    }

    /// Pair each cached email with the assignment whose `index` points at it.
    ///
    /// Assignments are positional, so they are only meaningful against the
    /// exact list that was prioritized. Re-listing the inbox in between
    /// invalidates them.
    pub fn prioritized<'a>(
        &'a self,
        assignments: &'a [PriorityAssignment],
    ) -> Vec<(&'a EmailMessage, Option<&'a PriorityAssignment>)> {
        self.emails
            .iter()
            .enumerate()
            .map(|(position, email)| {
                let assignment = assignments.iter().find(|a| a.index == position);
                (email, assignment)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    #[test]
    fn test_from_redirect_url() {
        let session = Session::from_redirect_url(
            "https://mail.example.com/?access_token=ya29.a%2Fb&refresh_token=&expires_in=3599",
        )
        .unwrap();

        assert_eq!(session.access_token(), "ya29.a/b");
        assert_eq!(session.tokens().refresh_token, None);
        assert_eq!(session.tokens().expires_in, 3599);
        assert!(session.emails().is_empty());
    }

    #[test]
    fn test_from_redirect_url_without_token() {
        let err = Session::from_redirect_url("https://mail.example.com/?expires_in=10").unwrap_err();
        assert!(matches!(err, ClientError::MissingAccessToken));
    }

    #[test]
    fn test_prioritized_correlates_by_position() {
        let mut session = Session::new(AuthTokenSet {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_in: 0,
        });
        session.replace_emails(vec![
            EmailMessage {
                id: "a".to_string(),
                ..Default::default()
            },
            EmailMessage {
                id: "b".to_string(),
                ..Default::default()
            },
        ]);

        let assignments = vec![PriorityAssignment {
            index: 1,
            priority: Priority::High,
            reason: "Deadline".to_string(),
        }];

        let paired = session.prioritized(&assignments);
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[0].0.id, "a");
        assert!(paired[0].1.is_none());
        assert_eq!(paired[1].0.id, "b");
        assert_eq!(paired[1].1.map(|a| a.priority), Some(Priority::High));
    }
}
