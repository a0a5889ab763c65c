// Client core for the StayJ guesthouse booking service

pub mod access_gate;
pub mod account;
pub mod api_client;
pub mod availability;
pub mod booking_flow;
pub mod config;
pub mod host;
pub mod models;
pub mod profile;
pub mod search;
pub mod session_store;

// Re-export key types for convenience
pub use access_gate::{enter, logout, resolve, Action, RequiredRole, Route};
pub use account::{check_login_id, login, sign_up, AccountError, SignUpForm};
pub use api_client::{ApiClient, ApiError, ClientStats, ReqwestTransport, Transport};
pub use availability::{
    compute_bookability, is_bookable, nights, total_price, validate_selection, AvailabilitySet,
    BookingSelection, ValidationError,
};
pub use booking_flow::{BookingError, BookingFlow, BookingState, GuesthousePage};
pub use config::{ClientConfig, ClientError};
pub use host::{partition_reservations, GuesthouseDraft, GuesthouseDraftError, RoomDraft};
pub use models::{Role, Room};
pub use profile::{is_cancelable, CancellationError, ProfileEdit, ReviewDraft, ReviewError};
pub use search::{SearchParams, SortOrder};
pub use session_store::{ClientStorage, LocalStorage, Session, SessionStore};
