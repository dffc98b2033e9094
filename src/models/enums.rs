use serde::{Deserialize, Serialize};

/// Error returned when a string names no known enum variant.
#[derive(Debug, thiserror::Error)]
#[error("invalid {field} value: '{value}'")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DocumentType {
    Estimation => "estimation",
    Payment => "payment",
    Contract => "contract",
    Other => "other",
});

str_enum!(DocumentStatus {
    Uploaded => "uploaded",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

str_enum!(CheckStatus {
    Pass => "pass",
    Fail => "fail",
    Warning => "warning",
    Error => "error",
});

str_enum!(TriggerType {
    Progress => "progress",
    Time => "time",
    Milestone => "milestone",
    Acceptance => "acceptance",
    Unknown => "unknown",
});

impl DocumentType {
    /// Map a free-form label to a document type, falling back to `Other`.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::Other)
    }
}
