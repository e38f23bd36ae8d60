//! The five invocation handlers and their shared SMTP path.

pub mod archive;
pub mod delivery;
pub mod dispatch;
pub mod outbound;
pub mod pings;
pub mod replies;

pub use archive::{archive_to_sent, ArchiveOutcome};
pub use delivery::{deliver_recipient, DeliveryOutcome};
pub use dispatch::{run_dispatch, DispatchReport};
pub use pings::{run_ping_scan, PingScanReport};
pub use replies::{run_reply_scan, ReplyScanReport};
