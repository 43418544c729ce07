//! Todo list session core.
//!
//! A session pairs two independent components:
//!
//! - the **todo list**: an ordered list of items with add, toggle, delete
//!   and filter commands, run by [`TodoReducer`]
//! - the **identity loader**: a one-shot lookup of the current user that
//!   falls back to a guest identity on failure, run by [`IdentityReducer`]
//!
//! Both run in their own [`tasklist_runtime::Store`], so every read sees a
//! complete snapshot and the identity lookup never blocks todo commands.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use tasklist_todo::{SessionConfig, TodoSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = TodoSession::start(&SessionConfig::default()).await?;
//!
//! session.add("Buy milk").await?;
//! let id = session.todos().items()[0].id;
//! session.toggle(id).await?;
//!
//! session.wait_for_identity(Duration::from_secs(1)).await?;
//! println!("{}", session.view().heading);
//!
//! session.shutdown(Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod identity;
pub mod priority;
pub mod reducer;
pub mod session;
pub mod types;
pub mod view;

pub use config::{ConfigError, SessionConfig};
pub use identity::{
    Identity, IdentityAction, IdentityEnvironment, IdentityError, IdentityOutcome, IdentityReducer,
    IdentityService, IdentityState, IdentityStatus, SimulatedIdentityService,
};
pub use priority::{AlternatingPriority, FixedPriority, PriorityPolicy, RandomPriority};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use session::{IdentityStore, TodoSession, TodoStore, follow_count_changes};
pub use types::{
    DebugInfo, Filter, ParseFilterError, Priority, TodoAction, TodoCounts, TodoId, TodoItem,
    TodoState,
};
pub use view::{TodoView, empty_message, heading, window_title};
