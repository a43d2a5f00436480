pub mod domain;
pub mod ports;
pub mod stats;

pub use domain::{
    Activity, Assignee, Attachment, Breadcrumb, CommandStats, DateRange, Identity, Project,
    ProjectPatch, ProviderToken, ResearchImage, ResearchSections, ResearchSubmission,
    SessionEntry, SubTask, Tag, UserStats,
};
pub use ports::{
    DocumentStore, IdentityProvider, PortError, PortResult, ResearchPublisher,
};
pub use stats::{summarize, time_ago, StatsSummary};
