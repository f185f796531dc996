//! Session state.
//!
//! The bridge serves exactly one conversation per process. The session owns
//! the append-only turn history and the resolved project root that file
//! operations are scoped to.

use std::io;
use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};

use crate::types::{ModeInfo, SessionModes};

/// Fixed identifier of the single session.
pub const DEFAULT_SESSION_ID: &str = "glm-session-001";

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Session mode. Only plain chat exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Chat,
}

impl SessionMode {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
        }
    }

    pub fn info(&self) -> ModeInfo {
        match self {
            Self::Chat => ModeInfo {
                id: self.id().to_string(),
                name: "Chat".to_string(),
                description: "General conversation mode".to_string(),
            },
        }
    }

    /// Modes advertised on `session/new`.
    pub fn advertised(current: SessionMode) -> SessionModes {
        SessionModes {
            current_mode_id: current.id().to_string(),
            available_modes: vec![SessionMode::Chat.info()],
        }
    }
}

/// The single active conversation.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    project_root: PathBuf,
    history: Vec<Turn>,
    current_mode: SessionMode,
}

impl Session {
    /// Create a session rooted at `project_root` with an empty history.
    pub fn new(session_id: impl Into<String>, project_root: PathBuf) -> Self {
        Self {
            session_id: session_id.into(),
            project_root,
            history: Vec::new(),
            current_mode: SessionMode::Chat,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Re-root the session. History is kept.
    pub fn set_project_root(&mut self, project_root: PathBuf) {
        self.project_root = project_root;
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Append a turn to the history.
    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    pub fn current_mode(&self) -> SessionMode {
        self.current_mode
    }
}

/// Resolve a project path to an absolute path.
///
/// Relative paths are taken against the process working directory. Existing
/// paths are canonicalized; paths that do not exist yet are made absolute
/// lexically.
pub fn resolve_project_root(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        dunce::canonicalize(path)
    } else {
        Ok(path.absolutize()?.into_owned())
    }
}
