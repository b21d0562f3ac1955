use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                /// Generates a fresh random identifier.
                #[must_use]
                pub fn generate() -> Self {
                    Self(Uuid::new_v4())
                }

                #[must_use]
                pub fn from_uuid(id: Uuid) -> Self {
                    Self(id)
                }

                #[must_use]
                pub fn as_uuid(&self) -> Uuid {
                    self.0
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($name), self.0)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = ParseIdError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Uuid::parse_str(s).map(Self).map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
                }
            }
        )*
    };
}

uuid_id! {
    /// Unique identifier for a quiz set
    QuizSetId,
    /// Unique identifier for a question
    QuestionId,
    /// Unique identifier for a registered user
    UserId,
    /// Unique identifier for a progress row
    ProgressId,
    /// Unique identifier for a quiz attempt
    AttemptId,
}

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_set_id_display_is_hyphenated_uuid() {
        let raw = Uuid::from_u128(0x1234);
        let id = QuizSetId::from_uuid(raw);
        assert_eq!(id.to_string(), raw.hyphenated().to_string());
    }

    #[test]
    fn question_id_from_str() {
        let id: QuestionId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(
            id.as_uuid(),
            Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap()
        );
    }

    #[test]
    fn user_id_from_str_invalid() {
        let err = "not-a-uuid".parse::<UserId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse UserId from string");
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(AttemptId::generate(), AttemptId::generate());
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = ProgressId::from_uuid(Uuid::from_u128(7));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", Uuid::from_u128(7)));
    }
}
