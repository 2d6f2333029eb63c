use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::capture::CaptureArtifact;
use crate::host::HostSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" | "medium" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(ValidationError::InvalidPriority {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Subject is required.")]
    EmptySubject,
    #[error("Description is required.")]
    EmptyDescription,
    #[error("Priority '{value}' is not one of Low, Normal, High, Urgent.")]
    InvalidPriority { value: String },
}

/// Pre-filled material a session opens with.
#[derive(Debug, Clone)]
pub struct TicketSeed {
    pub host: HostSnapshot,
    pub capture: Arc<CaptureArtifact>,
}

impl TicketSeed {
    pub fn default_subject(&self) -> String {
        format!(
            "Support Request from {} on {}",
            self.host.username, self.host.hostname
        )
    }
}

/// Raw, user-editable form input. Priority stays a label until validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFields {
    pub subject: String,
    pub description: String,
    pub priority: String,
}

impl TicketFields {
    pub fn for_seed(seed: &TicketSeed) -> Self {
        Self {
            subject: seed.default_subject(),
            description: String::new(),
            priority: Priority::default().label().to_string(),
        }
    }

    pub fn validate(&self) -> Result<ValidatedFields, ValidationError> {
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let priority = self.priority.parse::<Priority>()?;

        Ok(ValidatedFields {
            subject: subject.to_string(),
            description: description.to_string(),
            priority,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub subject: String,
    pub description: String,
    pub priority: Priority,
}

/// A validated ticket ready for the submission client.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub subject: String,
    pub description: String,
    pub priority: Priority,
    pub host: HostSnapshot,
    pub capture: Arc<CaptureArtifact>,
}

impl TicketDraft {
    pub fn new(fields: ValidatedFields, seed: &TicketSeed) -> Self {
        Self {
            subject: fields.subject,
            description: fields.description,
            priority: fields.priority,
            host: seed.host.clone(),
            capture: Arc::clone(&seed.capture),
        }
    }
}
