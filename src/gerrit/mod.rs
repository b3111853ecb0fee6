pub mod api;
pub mod client;
pub mod reference;
pub mod rest;
pub mod session;

pub use api::{BranchInfo, ChangeInfo, RevisionInfo};
pub use client::{GerritClient, GerritError, XSSI_PREFIX, strip_xssi_prefix};
pub use reference::Ref;
pub use rest::RestGerritClient;
pub use session::{FetchApply, RevisionSession, SessionEvent, SessionState};
