//! Incoming writing requests and their option enums.

use serde::{Deserialize, Serialize};

/// What the caller wants done to their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Create,
    Edit,
    Review,
    Research,
    Format,
    Delete,
    Replace,
}

impl TaskKind {
    /// Destructive kinds rewrite or remove user text outright.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Delete | Self::Replace)
    }
}

/// How much autonomy the platform has over the user's document.
///
/// Ordered from least to most autonomous; `required <= granted` comparisons
/// rely on this ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Every write requires explicit human approval.
    Assistant,
    /// Interactive back-and-forth; the default.
    Collaborative,
    /// Writes land by default, the human may veto.
    SemiAutonomous,
    /// Writes without prompting.
    Autonomous,
}

impl Default for PermissionLevel {
    fn default() -> Self {
        Self::Collaborative
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Normal,
    High,
}

impl Default for Urgency {
    fn default() -> Self {
        Self::Normal
    }
}

/// Depth of the hallucination checker's verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    Basic,
    Standard,
    Comprehensive,
    Critical,
}

impl Default for VerificationLevel {
    fn default() -> Self {
        Self::Standard
    }
}

/// Kind of document being produced; drives quality thresholds and
/// completeness expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Article,
    BlogPost,
    AcademicPaper,
    BusinessDocument,
    CreativeWriting,
    TechnicalDocumentation,
    LegalDocument,
    MedicalDocument,
    Email,
    SocialMedia,
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Article
    }
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::BlogPost => "blog_post",
            Self::AcademicPaper => "academic_paper",
            Self::BusinessDocument => "business_document",
            Self::CreativeWriting => "creative_writing",
            Self::TechnicalDocumentation => "technical_documentation",
            Self::LegalDocument => "legal_document",
            Self::MedicalDocument => "medical_document",
            Self::Email => "email",
            Self::SocialMedia => "social_media",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionLevel {
    Conservative,
    Moderate,
    Aggressive,
}

impl Default for CorrectionLevel {
    fn default() -> Self {
        Self::Moderate
    }
}

/// Recognized per-request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Permission level granted by the user. Restricts, never elevates,
    /// what the router computes.
    pub permission_level: Option<PermissionLevel>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub verification_level: VerificationLevel,
    #[serde(default)]
    pub content_type: ContentType,
    pub audience: Option<String>,
    #[serde(default)]
    pub preserve_voice: bool,
    #[serde(default)]
    pub correction_level: CorrectionLevel,
}

/// A user writing request, the root input of every workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub task_kind: TaskKind,
    /// Free-form description of the work, e.g. "Write a 900-word article on
    /// urban beekeeping".
    pub content: String,
    pub context: Option<String>,
    #[serde(default)]
    pub options: RequestOptions,
    pub project_id: Option<String>,
    pub document_id: Option<String>,
    pub user_id: Option<String>,
}

impl Request {
    pub fn new(task_kind: TaskKind, content: impl Into<String>) -> Self {
        Self {
            task_kind,
            content: content.into(),
            context: None,
            options: RequestOptions::default(),
            project_id: None,
            document_id: None,
            user_id: None,
        }
    }

    /// Permission level granted by this request (default collaborative).
    pub fn granted_permission(&self) -> PermissionLevel {
        self.options.permission_level.unwrap_or_default()
    }
}
