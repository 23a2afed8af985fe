//! callwatch-live - live campaign client
//!
//! Connects to the orchestrator's per-group transcript socket, projects
//! call-by-call events into per-provider state, and derives a campaign
//! summary for rendering. The projector is a pure reducer; the socket
//! loop, snapshot fetches and outbound commands live at the edges.

pub mod api;
pub mod ingest;
pub mod projector;
pub mod socket;
pub mod store;

pub use projector::view::CampaignView;
pub use projector::CampaignProjection;
pub use store::CampaignStore;
